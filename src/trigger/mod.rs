//! Train/evaluate triggers for streaming evaluation protocols
//!
//! A trigger decides, event by event, whether the current event is scored
//! against a prediction, buffered for fitting, and which part of the buffer is
//! fit right now. The driving loop (see [`crate::observer`]) calls
//! [`TrainEvalTrigger::update`] exactly once per event and then queries the
//! trigger. Buffers themselves are owned by the driver; the trigger only hands
//! back borrowed sub-views of them.
//!
//! ## Protocols
//!
//! - `prequential` - test-then-train after a warm-up count
//! - `time_holdout` - train/test phases delimited by elapsed event time
//! - `quantity_holdout` - train/test phases delimited by event counts
//! - `time_crossval` - after an initial window, score everything and fit the
//!   accumulated buffer once per elapsed test window

pub mod prequential;
pub mod quantity_holdout;
pub mod time_crossval;
pub mod time_holdout;
pub mod window_clock;

pub use prequential::PrequentialTrigger;
pub use quantity_holdout::QuantityBasedHoldoutTrigger;
pub use time_crossval::TimeBasedCrossvalidationTrigger;
pub use time_holdout::TimeBasedHoldoutTrigger;
pub use window_clock::{TimeWindows, WindowClock};

use crate::config::ConfigError;
use crate::event::{Event, EventTimeFn, Features, Label};

/// Borrowed view of the driver's pending-fit buffer
///
/// The three slices are parallel: index `i` of each belongs to the same event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferView<'a> {
    pub t: &'a [f64],
    pub x: &'a [Features],
    pub y: &'a [Option<Label>],
}

impl<'a> BufferView<'a> {
    pub fn new(t: &'a [f64], x: &'a [Features], y: &'a [Option<Label>]) -> Self {
        Self { t, x, y }
    }

    pub fn empty() -> Self {
        Self { t: &[], x: &[], y: &[] }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Features and labels of the whole view, to be fit as one batch
    pub fn fit_set(&self) -> FitSet<'a> {
        FitSet { x: self.x, y: self.y }
    }
}

/// Instances selected for an immediate `partial_fit`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSet<'a> {
    pub x: &'a [Features],
    pub y: &'a [Option<Label>],
}

impl<'a> FitSet<'a> {
    pub fn empty() -> Self {
        Self { x: &[], y: &[] }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerError {
    /// The time extractor found no usable timestamp on the event
    MissingTimestamp,
    /// Event time went backwards relative to the last accepted event
    OutOfOrder { previous: f64, current: f64 },
}

impl std::fmt::Display for TriggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerError::MissingTimestamp => write!(f, "Event has no extractable timestamp"),
            TriggerError::OutOfOrder { previous, current } => write!(
                f,
                "Out-of-order event: time {} is earlier than previous {}",
                current, previous
            ),
        }
    }
}

impl std::error::Error for TriggerError {}

/// Capability interface shared by every evaluation protocol
///
/// `update` mutates phase state; `shall_predict`/`shall_buffer` are pure reads.
/// `instances_to_fit`/`remaining_buffer` may consume single-shot boundary
/// latches so that a buffer crossing a boundary is fit exactly once.
pub trait TrainEvalTrigger {
    /// Protocol name for logging
    fn name(&self) -> &'static str;

    /// Validate an event before it is passed to `update`
    fn check_event(&self, _event: &Event) -> Result<(), TriggerError> {
        Ok(())
    }

    /// Timestamp the trigger would assign to `event`, if it tracks time
    fn event_time(&self, _event: &Event) -> Option<f64> {
        None
    }

    /// Consume one event, in arrival order
    fn update(&mut self, event: &Event);

    /// Whether the most recent event should be scored
    fn shall_predict(&self) -> bool;

    /// Whether the most recent event should be added to the fit buffer
    fn shall_buffer(&self) -> bool;

    /// Subset of the buffer to fit now
    fn instances_to_fit<'a>(&mut self, buffer: BufferView<'a>) -> FitSet<'a>;

    /// What stays buffered after the fit decision
    fn remaining_buffer<'a>(&mut self, buffer: BufferView<'a>) -> BufferView<'a>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Prequential,
    TimeHoldout,
    QuantityHoldout,
    TimeCrossval,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Prequential => "prequential",
            Protocol::TimeHoldout => "time_holdout",
            Protocol::QuantityHoldout => "quantity_holdout",
            Protocol::TimeCrossval => "time_crossval",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "prequential" => Some(Protocol::Prequential),
            "time_holdout" => Some(Protocol::TimeHoldout),
            "quantity_holdout" => Some(Protocol::QuantityHoldout),
            "time_crossval" => Some(Protocol::TimeCrossval),
            _ => None,
        }
    }

    pub fn is_time_based(&self) -> bool {
        matches!(self, Protocol::TimeHoldout | Protocol::TimeCrossval)
    }
}

/// All parameters needed to build any trigger
///
/// Only the fields relevant to `protocol` are read by [`TriggerConfig::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub protocol: Protocol,

    /// Prequential warm-up count
    pub n_wait_to_fit: u64,

    /// Time-based window lengths (seconds)
    pub windows: TimeWindows,

    /// Quantity-based holdout counts
    pub first_time_wait: u64,
    pub n_wait_to_test: u64,
    pub test_size: u64,
}

impl TriggerConfig {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            n_wait_to_fit: 0,
            windows: TimeWindows::new(0.0, 0.0, 0.0),
            first_time_wait: 0,
            n_wait_to_test: 0,
            test_size: 0,
        }
    }

    /// Construct the configured trigger
    ///
    /// Time-based protocols require `get_event_time`; a missing extractor or
    /// an invalid window is a configuration error and never reaches streaming.
    pub fn build(
        &self,
        get_event_time: Option<EventTimeFn>,
    ) -> Result<Box<dyn TrainEvalTrigger>, ConfigError> {
        if self.protocol.is_time_based() {
            self.windows.validate()?;
        }

        let trigger: Box<dyn TrainEvalTrigger> = match self.protocol {
            Protocol::Prequential => Box::new(PrequentialTrigger::new(self.n_wait_to_fit)),
            Protocol::QuantityHoldout => Box::new(QuantityBasedHoldoutTrigger::new(
                self.first_time_wait,
                self.n_wait_to_test,
                self.test_size,
            )),
            Protocol::TimeHoldout => {
                let get_event_time = get_event_time
                    .ok_or(ConfigError::MissingTimeExtractor(self.protocol.as_str()))?;
                Box::new(TimeBasedHoldoutTrigger::new(self.windows, get_event_time))
            }
            Protocol::TimeCrossval => {
                let get_event_time = get_event_time
                    .ok_or(ConfigError::MissingTimeExtractor(self.protocol.as_str()))?;
                Box::new(TimeBasedCrossvalidationTrigger::new(self.windows, get_event_time))
            }
        };

        log::info!("Built {} trigger: {:?}", trigger.name(), self);
        Ok(trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::field_time_extractor;

    #[test]
    fn test_protocol_names_roundtrip() {
        for protocol in [
            Protocol::Prequential,
            Protocol::TimeHoldout,
            Protocol::QuantityHoldout,
            Protocol::TimeCrossval,
        ] {
            assert_eq!(Protocol::from_str(protocol.as_str()), Some(protocol));
        }
        assert_eq!(Protocol::from_str(" Time_Holdout "), Some(Protocol::TimeHoldout));
        assert_eq!(Protocol::from_str("kfold"), None);
    }

    #[test]
    fn test_build_time_based_requires_extractor() {
        let mut config = TriggerConfig::new(Protocol::TimeHoldout);
        config.windows = TimeWindows::new(10.0, 5.0, 8.0);

        match config.build(None) {
            Err(ConfigError::MissingTimeExtractor(name)) => assert_eq!(name, "time_holdout"),
            other => panic!("expected MissingTimeExtractor, got {:?}", other.map(|t| t.name())),
        }

        config.protocol = Protocol::TimeCrossval;
        assert!(config.build(None).is_err());

        let trigger = config.build(Some(field_time_extractor("ts"))).unwrap();
        assert_eq!(trigger.name(), "time_crossval");
    }

    #[test]
    fn test_build_rejects_invalid_windows() {
        let mut config = TriggerConfig::new(Protocol::TimeCrossval);
        config.windows = TimeWindows::new(10.0, -1.0, 8.0);
        assert!(matches!(
            config.build(Some(field_time_extractor("ts"))),
            Err(ConfigError::InvalidValue(_))
        ));

        config.windows = TimeWindows::new(f64::NAN, 1.0, 8.0);
        assert!(config.build(Some(field_time_extractor("ts"))).is_err());
    }

    #[test]
    fn test_build_count_based_ignores_extractor() {
        let mut config = TriggerConfig::new(Protocol::QuantityHoldout);
        config.first_time_wait = 4;
        config.n_wait_to_test = 2;
        config.test_size = 3;
        assert_eq!(config.build(None).unwrap().name(), "quantity_holdout");

        let config = TriggerConfig::new(Protocol::Prequential);
        assert_eq!(config.build(None).unwrap().name(), "prequential");
    }

    #[test]
    fn test_buffer_view_fit_set() {
        let t = vec![0.0, 1.0];
        let x = vec![vec![1.0], vec![2.0]];
        let y = vec![Some(0.0), None];
        let view = BufferView::new(&t, &x, &y);

        assert_eq!(view.len(), 2);
        let fit = view.fit_set();
        assert_eq!(fit.x, &x[..]);
        assert_eq!(fit.y, &y[..]);
        assert!(BufferView::empty().is_empty());
        assert!(FitSet::empty().is_empty());
    }
}
