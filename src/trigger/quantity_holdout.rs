//! Holdout protocol with phases delimited by event counts

use super::{BufferView, FitSet, TrainEvalTrigger};
use crate::event::Event;

/// Alternates between training and testing phases by counting events
///
/// The first training phase lasts `max(first_time_wait, n_wait_to_test)`
/// events, testing phases last `test_size` events and later training phases
/// `n_wait_to_test` events.
#[derive(Debug, Clone)]
pub struct QuantityBasedHoldoutTrigger {
    n_wait_to_test: u64,
    test_size: u64,
    events_counter: u64,
    events_target: u64,
    test_mode: bool,
}

impl QuantityBasedHoldoutTrigger {
    pub fn new(first_time_wait: u64, n_wait_to_test: u64, test_size: u64) -> Self {
        Self {
            n_wait_to_test,
            test_size,
            events_counter: 0,
            events_target: first_time_wait.max(n_wait_to_test),
            test_mode: false,
        }
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

impl TrainEvalTrigger for QuantityBasedHoldoutTrigger {
    fn name(&self) -> &'static str {
        "quantity_holdout"
    }

    fn update(&mut self, _event: &Event) {
        // Flip before counting: a zero target still yields one event in the phase
        if self.events_counter == self.events_target {
            self.test_mode = !self.test_mode;
            self.events_counter = 0;
            self.events_target = if self.test_mode {
                self.test_size
            } else {
                self.n_wait_to_test
            };
            log::debug!(
                "Quantity holdout switched to {} for {} events",
                if self.test_mode { "test" } else { "train" },
                self.events_target
            );
        }

        if self.events_counter < self.events_target {
            self.events_counter += 1;
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn modes(trigger: &mut QuantityBasedHoldoutTrigger, n: usize) -> Vec<bool> {
        let event = Event::new(vec![0.0], Some(0.0));
        (0..n)
            .map(|_| {
                trigger.update(&event);
                assert_ne!(trigger.shall_buffer(), trigger.shall_predict());
                trigger.shall_predict()
            })
            .collect()
    }

    #[test]
    fn test_train_test_cycle() {
        let mut trigger = QuantityBasedHoldoutTrigger::new(4, 2, 3);
        let (f, t) = (false, true);
        assert_eq!(
            modes(&mut trigger, 14),
            vec![f, f, f, f, t, t, t, f, f, t, t, t, f, f]
        );
    }

    #[test]
    fn test_first_wait_is_at_least_wait_to_test() {
        let mut trigger = QuantityBasedHoldoutTrigger::new(1, 3, 1);
        let (f, t) = (false, true);
        assert_eq!(modes(&mut trigger, 8), vec![f, f, f, t, f, f, f, t]);
    }

    #[test]
    fn test_zero_test_size_scores_one_event() {
        let mut trigger = QuantityBasedHoldoutTrigger::new(2, 2, 0);
        let (f, t) = (false, true);
        assert_eq!(modes(&mut trigger, 9), vec![f, f, t, f, f, t, f, f, t]);
    }

    #[test]
    fn test_repeated_reads_do_not_advance() {
        let mut trigger = QuantityBasedHoldoutTrigger::new(1, 1, 2);
        let event = Event::new(vec![0.0], Some(0.0));
        let mut seen = Vec::new();

        for _ in 0..6 {
            trigger.update(&event);
            let (predict, buffer) = (trigger.shall_predict(), trigger.shall_buffer());
            for _ in 0..3 {
                assert_eq!(trigger.shall_predict(), predict);
                assert_eq!(trigger.shall_buffer(), buffer);
            }
            seen.push(predict);
        }

        let (f, t) = (false, true);
        assert_eq!(seen, vec![f, t, t, f, t, t]);
    }

    #[test]
    fn test_fit_passes_buffer_through() {
        let mut trigger = QuantityBasedHoldoutTrigger::new(1, 1, 1);
        let t = vec![0.0, 1.0];
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![Some(0.0), Some(1.0)];
        let view = BufferView::new(&t, &x, &y);

        assert_eq!(trigger.instances_to_fit(view).len(), 2);
        assert_eq!(trigger.remaining_buffer(view), BufferView::empty());
    }
}
