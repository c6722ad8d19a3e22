//! Elapsed-time window tracking shared by the time-based triggers

use super::TriggerError;
use crate::config::ConfigError;
use crate::event::{Event, EventTimeFn};

/// Window lengths (seconds) of a time-based protocol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindows {
    /// First window, before any phase change
    pub initial: f64,
    /// Training window between two test windows
    pub wait_to_test: f64,
    /// Scoring window
    pub test: f64,
}

impl TimeWindows {
    pub fn new(initial: f64, wait_to_test: f64, test: f64) -> Self {
        Self {
            initial,
            wait_to_test,
            test,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("initial", self.initial),
            ("wait_to_test", self.wait_to_test),
            ("test", self.test),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} time window must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Reference-time bookkeeping for one time-based trigger
///
/// A boundary is crossed when `event_time - reference_time > target_window`
/// (strictly greater). The first observed event only sets the reference.
pub struct WindowClock {
    get_event_time: EventTimeFn,
    reference_time: Option<f64>,
    last_time: Option<f64>,
    target_window: f64,
}

impl WindowClock {
    pub fn new(target_window: f64, get_event_time: EventTimeFn) -> Self {
        Self {
            get_event_time,
            reference_time: None,
            last_time: None,
            target_window,
        }
    }

    pub fn event_time(&self, event: &Event) -> Option<f64> {
        (self.get_event_time)(event)
    }

    /// Reject events without a timestamp or earlier than the last one seen
    pub fn check(&self, event: &Event) -> Result<(), TriggerError> {
        let current = self.event_time(event).ok_or(TriggerError::MissingTimestamp)?;
        match self.last_time {
            Some(previous) if current < previous => {
                Err(TriggerError::OutOfOrder { previous, current })
            }
            _ => Ok(()),
        }
    }

    /// Advance to `event`; returns true when this event crosses a boundary
    ///
    /// On a crossing the reference time moves to the event time. Events with
    /// no timestamp leave the clock untouched.
    pub fn tick(&mut self, event: &Event) -> bool {
        let Some(event_time) = self.event_time(event) else {
            log::warn!("Ignoring event without timestamp in window clock");
            return false;
        };
        self.last_time = Some(event_time);

        let reference_time = *self.reference_time.get_or_insert(event_time);
        if event_time - reference_time > self.target_window {
            self.reference_time = Some(event_time);
            true
        } else {
            false
        }
    }

    pub fn set_target_window(&mut self, target_window: f64) {
        self.target_window = target_window;
    }

    pub fn target_window(&self) -> f64 {
        self.target_window
    }

    pub fn reference_time(&self) -> Option<f64> {
        self.reference_time
    }
}
