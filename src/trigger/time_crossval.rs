//! Time-windowed cross-validation protocol
//!
//! During the initial window every event is fit immediately and nothing is
//! scored. Once the initial window has elapsed the trigger switches for good:
//! every event is scored and buffered, and the accumulated buffer is fit in one
//! batch each time a test window elapses.
//!
//! Two single-shot latches, both re-armed by each boundary crossing, make the
//! batch fit happen exactly once per boundary even though `instances_to_fit`
//! and `remaining_buffer` are called for every event:
//!
//! - `fit_buffered_instances`: the next `instances_to_fit` call returns the
//!   whole buffer, later calls return nothing
//! - `remaining_buffer_checked`: the next `remaining_buffer` call clears the
//!   buffer, later calls hand it back unchanged

use super::window_clock::{TimeWindows, WindowClock};
use super::{BufferView, FitSet, TrainEvalTrigger, TriggerError};
use crate::event::{Event, EventTimeFn};

pub struct TimeBasedCrossvalidationTrigger {
    windows: TimeWindows,
    clock: WindowClock,
    completed_initial_time_window: bool,
    fit_buffered_instances: bool,
    remaining_buffer_checked: bool,
}

impl TimeBasedCrossvalidationTrigger {
    /// `windows.wait_to_test` is accepted for parity with the holdout trigger
    /// but never used: after the initial window every window is a test window.
    pub fn new(windows: TimeWindows, get_event_time: EventTimeFn) -> Self {
        Self {
            windows,
            clock: WindowClock::new(windows.initial, get_event_time),
            completed_initial_time_window: false,
            fit_buffered_instances: false,
            remaining_buffer_checked: false,
        }
    }

    pub fn completed_initial_time_window(&self) -> bool {
        self.completed_initial_time_window
    }
}

impl TrainEvalTrigger for TimeBasedCrossvalidationTrigger {
    fn name(&self) -> &'static str {
        "time_crossval"
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

        if !self.completed_initial_time_window {
            log::debug!(
                "Cross-validation initial window complete at {:?}",
                self.clock.reference_time()
            );
        }
        self.completed_initial_time_window = true;
        self.fit_buffered_instances = true;
        self.remaining_buffer_checked = false;
        self.clock.set_target_window(self.windows.test);
    }

    fn shall_predict(&self) -> bool {
        self.completed_initial_time_window
    }

    fn shall_buffer(&self) -> bool {
        true
    }

    fn instances_to_fit<'a>(&mut self, buffer: BufferView<'a>) -> FitSet<'a> {
        if !self.completed_initial_time_window {
            return buffer.fit_set();
        }

        if self.fit_buffered_instances {
            self.fit_buffered_instances = false;
            log::debug!("Cross-validation fitting {} buffered instances", buffer.len());
            return buffer.fit_set();
        }

        FitSet::empty()
    }

    fn remaining_buffer<'a>(&mut self, buffer: BufferView<'a>) -> BufferView<'a> {
        if !self.completed_initial_time_window {
            return BufferView::empty();
        }

        if !self.remaining_buffer_checked {
            self.remaining_buffer_checked = true;
            return BufferView::empty();
        }

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::field_time_extractor;

    fn at(ts: f64) -> Event {
        Event::new(vec![ts], Some(0.0)).with_field("ts", ts)
    }

    fn trigger() -> TimeBasedCrossvalidationTrigger {
        TimeBasedCrossvalidationTrigger::new(
            TimeWindows::new(10.0, 100.0, 5.0),
            field_time_extractor("ts"),
        )
    }

    #[test]
    fn test_initial_window_fits_everything() {
        let mut trigger = trigger();
        let t = vec![0.0];
        let x = vec![vec![0.0]];
        let y = vec![Some(0.0)];

        for ts in [0.0, 4.0, 10.0] {
            trigger.update(&at(ts));
            assert!(!trigger.shall_predict());
            assert!(trigger.shall_buffer());

            let view = BufferView::new(&t, &x, &y);
            assert_eq!(trigger.instances_to_fit(view).len(), 1);
            assert!(trigger.remaining_buffer(view).is_empty());
        }
    }

    #[test]
    fn test_completed_window_never_reverts() {
        let mut trigger = trigger();
        let mut transitions = 0;
        let mut previous = trigger.completed_initial_time_window();

        for ts in [0.0, 5.0, 11.0, 12.0, 17.0, 30.0, 31.0] {
            trigger.update(&at(ts));
            let current = trigger.completed_initial_time_window();
            assert!(!(previous && !current));
            if current != previous {
                transitions += 1;
            }
            previous = current;
            assert_eq!(trigger.shall_predict(), current);
        }

        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_repeated_reads_do_not_advance() {
        let mut trigger = trigger();

        for ts in [0.0, 4.0, 11.0, 12.0, 16.5] {
            trigger.update(&at(ts));
            let predict = trigger.shall_predict();
            for _ in 0..3 {
                assert_eq!(trigger.shall_predict(), predict, "at t={}", ts);
                assert!(trigger.shall_buffer());
            }
            assert_eq!(predict, ts > 10.0);
        }
    }

    #[test]
    fn test_fit_once_per_boundary() {
        let mut trigger = trigger();
        let t = vec![0.0, 1.0];
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![Some(0.0), Some(1.0)];

        // initial window 10s, then test windows of 5s
        let expected = [
            (0.0, true),
            (11.0, true),
            (13.0, false),
            (16.0, false),
            (16.5, true),
            (18.0, false),
        ];

        for (ts, fits) in expected {
            trigger.update(&at(ts));
            let view = BufferView::new(&t, &x, &y);
            let fit = trigger.instances_to_fit(view);
            assert_eq!(!fit.is_empty(), fits, "at t={}", ts);

            // repeated call within the same event never fits again
            if trigger.completed_initial_time_window() {
                assert!(trigger.instances_to_fit(view).is_empty());
            }
        }
    }

    #[test]
    fn test_remaining_buffer_clears_once_per_boundary() {
        let mut trigger = trigger();
        let t = vec![0.0];
        let x = vec![vec![0.0]];
        let y = vec![None];
        let view = BufferView::new(&t, &x, &y);

        trigger.update(&at(0.0));
        assert!(trigger.remaining_buffer(view).is_empty());

        trigger.update(&at(11.0));
        assert!(trigger.remaining_buffer(view).is_empty());
        assert_eq!(trigger.remaining_buffer(view), view);

        trigger.update(&at(12.0));
        assert_eq!(trigger.remaining_buffer(view), view);

        trigger.update(&at(17.0));
        assert!(trigger.remaining_buffer(view).is_empty());
        assert_eq!(trigger.remaining_buffer(view), view);
    }
}
