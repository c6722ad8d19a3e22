//! Evaluation observer: drives a model, a trigger and a results sink
//!
//! For every event the observer asks the trigger whether to score it, whether
//! to buffer it, and which buffered instances to fit right now. Scored
//! predictions accumulate until the next fit, at which point they are reported
//! to the sink as one batch (so each reported batch covers exactly the
//! predictions made with one version of the model).

use crate::event::{Event, Features, Label};
use crate::event_reader::EventError;
use crate::model::StreamModel;
use crate::report::{ResultsSink, SinkError};
use crate::trigger::{BufferView, TrainEvalTrigger, TriggerError};
use serde::Serialize;

#[derive(Debug)]
pub enum EvalError {
    Event(EventError),
    Trigger(TriggerError),
    /// A supervised model received an event without a label (1-based position)
    MissingLabel { position: u64 },
    Sink(SinkError),
}

impl From<EventError> for EvalError {
    fn from(err: EventError) -> Self {
        EvalError::Event(err)
    }
}

impl From<TriggerError> for EvalError {
    fn from(err: TriggerError) -> Self {
        EvalError::Trigger(err)
    }
}

impl From<SinkError> for EvalError {
    fn from(err: SinkError) -> Self {
        EvalError::Sink(err)
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Event(e) => write!(f, "Event error: {}", e),
            EvalError::Trigger(e) => write!(f, "Trigger error: {}", e),
            EvalError::MissingLabel { position } => {
                write!(f, "Event {} has no label but the model is supervised", position)
            }
            EvalError::Sink(e) => write!(f, "Sink error: {}", e),
        }
    }
}

impl std::error::Error for EvalError {}

/// Counters describing one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObserverStats {
    pub events: u64,
    pub predictions: u64,
    pub buffered: u64,
    pub fits: u64,
    pub fitted_instances: u64,
    pub reports: u64,
    pub reported_predictions: u64,
}

pub struct EvaluationObserver<M, S> {
    model: M,
    trigger: Box<dyn TrainEvalTrigger>,
    sink: S,
    classes: Vec<Label>,

    // pending-fit buffer
    t_buffer: Vec<f64>,
    x_buffer: Vec<Features>,
    y_buffer: Vec<Option<Label>>,

    // scored predictions not yet reported
    y_pred_buffer: Vec<Label>,
    y_true_buffer: Vec<Option<Label>>,

    stats: ObserverStats,
}

impl<M: StreamModel, S: ResultsSink> EvaluationObserver<M, S> {
    pub fn new(model: M, trigger: Box<dyn TrainEvalTrigger>, sink: S, classes: Vec<Label>) -> Self {
        log::info!(
            "Evaluating {} model with {} protocol, reporting to {}",
            model.algorithm_type().as_str(),
            trigger.name(),
            sink.backend_type()
        );
        Self {
            model,
            trigger,
            sink,
            classes,
            t_buffer: Vec::new(),
            x_buffer: Vec::new(),
            y_buffer: Vec::new(),
            y_pred_buffer: Vec::new(),
            y_true_buffer: Vec::new(),
            stats: ObserverStats::default(),
        }
    }

    /// Process one event
    ///
    /// Malformed events are rejected before the trigger sees them, leaving all
    /// state untouched.
    pub fn update(&mut self, event: &Event) -> Result<(), EvalError> {
        let position = self.stats.events + 1;
        let y_true = if self.model.algorithm_type().uses_labels() {
            Some(event.y.ok_or(EvalError::MissingLabel { position })?)
        } else {
            None
        };
        self.trigger.check_event(event)?;

        self.trigger.update(event);
        self.stats.events = position;

        if self.trigger.shall_predict() {
            let y_pred = self.model.predict(&event.x);
            self.y_pred_buffer.push(y_pred);
            self.y_true_buffer.push(y_true);
            self.stats.predictions += 1;
        }

        if self.trigger.shall_buffer() {
            let t = self.trigger.event_time(event).unwrap_or(position as f64);
            self.t_buffer.push(t);
            self.x_buffer.push(event.x.clone());
            self.y_buffer.push(y_true);
            self.stats.buffered += 1;
        }

        // instances_to_fit has consumed the trigger's latches; reconcile even on a failed report
        let fitted = self.fit_pending();
        self.reconcile_buffer();
        fitted
    }

    /// Feed every event of `events`, then finish the run
    pub fn replay<I>(&mut self, events: I) -> Result<ObserverStats, EvalError>
    where
        I: IntoIterator<Item = Result<Event, EventError>>,
    {
        for event in events {
            self.update(&event?)?;
        }
        self.finish()
    }

    /// Report predictions still pending and flush the sink
    pub fn finish(&mut self) -> Result<ObserverStats, EvalError> {
        self.report_pending()?;
        self.sink.flush()?;

        match serde_json::to_string(&self.stats) {
            Ok(json) => log::info!("✅ {} evaluation finished: {}", self.trigger.name(), json),
            Err(e) => log::warn!("Failed to serialize observer stats: {}", e),
        }
        Ok(self.stats.clone())
    }

    fn fit_pending(&mut self) -> Result<(), EvalError> {
        let view = BufferView::new(&self.t_buffer, &self.x_buffer, &self.y_buffer);
        let fit = self.trigger.instances_to_fit(view);
        if fit.is_empty() {
            return Ok(());
        }

        let mut reported = Ok(());
        if !self.y_pred_buffer.is_empty() {
            log::debug!("Reporting {} predictions before fit", self.y_pred_buffer.len());
            match self.sink.report(&self.y_pred_buffer, &self.y_true_buffer) {
                Ok(()) => {
                    self.stats.reports += 1;
                    self.stats.reported_predictions += self.y_pred_buffer.len() as u64;
                    self.y_pred_buffer.clear();
                    self.y_true_buffer.clear();
                }
                Err(e) => {
                    log::warn!(
                        "Failed to report {} predictions, keeping them pending: {}",
                        self.y_pred_buffer.len(),
                        e
                    );
                    reported = Err(EvalError::Sink(e));
                }
            }
        }

        log::debug!("Fitting {} instances", fit.len());
        self.model.partial_fit(fit.x, fit.y, &self.classes);
        self.stats.fits += 1;
        self.stats.fitted_instances += fit.len() as u64;
        reported
    }

    fn report_pending(&mut self) -> Result<(), EvalError> {
        if self.y_pred_buffer.is_empty() {
            return Ok(());
        }
        self.sink.report(&self.y_pred_buffer, &self.y_true_buffer)?;
        self.stats.reports += 1;
        self.stats.reported_predictions += self.y_pred_buffer.len() as u64;
        self.y_pred_buffer.clear();
        self.y_true_buffer.clear();
        Ok(())
    }

    /// Replace the buffer with what the trigger says remains
    fn reconcile_buffer(&mut self) {
        let view = BufferView::new(&self.t_buffer, &self.x_buffer, &self.y_buffer);
        let remaining = self.trigger.remaining_buffer(view);

        if std::ptr::eq(remaining.x, view.x) {
            return;
        }

        if remaining.is_empty() {
            self.t_buffer.clear();
            self.x_buffer.clear();
            self.y_buffer.clear();
            return;
        }

        let (t, x, y) = (remaining.t.to_vec(), remaining.x.to_vec(), remaining.y.to_vec());
        self.t_buffer = t;
        self.x_buffer = x;
        self.y_buffer = y;
    }

    pub fn stats(&self) -> &ObserverStats {
        &self.stats
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of instances currently waiting to be fit
    pub fn buffered_len(&self) -> usize {
        self.x_buffer.len()
    }

    /// Number of scored predictions not yet reported
    pub fn pending_predictions(&self) -> usize {
        self.y_pred_buffer.len()
    }
}
