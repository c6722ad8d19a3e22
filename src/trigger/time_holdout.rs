//! Holdout protocol with phases delimited by elapsed event time

use super::window_clock::{TimeWindows, WindowClock};
use super::{BufferView, FitSet, TrainEvalTrigger, TriggerError};
use crate::event::{Event, EventTimeFn};

/// Alternates between a training phase and a testing phase
///
/// Starts training for `windows.initial` seconds, then scores for
/// `windows.test` seconds, trains for `windows.wait_to_test` seconds, and so
/// on. Buffering and scoring are mutually exclusive.
pub struct TimeBasedHoldoutTrigger {
    windows: TimeWindows,
    clock: WindowClock,
    test_mode: bool,
}

impl TimeBasedHoldoutTrigger {
    pub fn new(windows: TimeWindows, get_event_time: EventTimeFn) -> Self {
        Self {
            windows,
            clock: WindowClock::new(windows.initial, get_event_time),
            test_mode: false,
        }
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn target_window(&self) -> f64 {
        self.clock.target_window()
    }
}

impl TrainEvalTrigger for TimeBasedHoldoutTrigger {
    fn name(&self) -> &'static str {
        "time_holdout"
    }

    fn check_event(&self, event: &Event) -> Result<(), TriggerError> {
        self.clock.check(event)
    }

    fn event_time(&self, event: &Event) -> Option<f64> {
        self.clock.event_time(event)
    }

    fn update(&mut self, event: &Event) {
        if !self.clock.tick(event) {
            return;
        }

        self.test_mode = !self.test_mode;
        let next_window = if self.test_mode {
            self.windows.test
        } else {
            self.windows.wait_to_test
        };
        self.clock.set_target_window(next_window);

        log::debug!(
            "Holdout switched to {} at reference time {:?} (window {}s)",
            if self.test_mode { "test" } else { "train" },
            self.clock.reference_time(),
            next_window
        );
    }

    fn shall_predict(&self) -> bool {
        self.test_mode
    }

    fn shall_buffer(&self) -> bool {
        !self.test_mode
    }

    fn instances_to_fit<'a>(&mut self, buffer: BufferView<'a>) -> FitSet<'a> {
        buffer.fit_set()
    }

    fn remaining_buffer<'a>(&mut self, _buffer: BufferView<'a>) -> BufferView<'a> {
        BufferView::empty()
    }
}
