//! Test-then-train after an initial warm-up

use super::{BufferView, FitSet, TrainEvalTrigger};
use crate::event::Event;

/// Prequential protocol
///
/// The first `n_wait_to_fit + 1` events only train the model. Every later
/// event is scored first and then fit immediately.
#[derive(Debug, Clone)]
pub struct PrequentialTrigger {
    n_wait_to_fit: u64,
    warmup_counter: u64,
    /// Decision for the current event, taken against the counter on arrival
    warming_up: bool,
}

impl PrequentialTrigger {
    pub fn new(n_wait_to_fit: u64) -> Self {
        Self {
            n_wait_to_fit,
            warmup_counter: 0,
            warming_up: true,
        }
    }
}

impl TrainEvalTrigger for PrequentialTrigger {
    fn name(&self) -> &'static str {
        "prequential"
    }

    fn update(&mut self, _event: &Event) {
        self.warming_up = self.warmup_counter <= self.n_wait_to_fit;
        if self.warming_up {
            self.warmup_counter += 1;
            if self.warmup_counter > self.n_wait_to_fit {
                log::debug!("Prequential warm-up of {} events complete", self.warmup_counter);
            }
        }
    }

    fn shall_predict(&self) -> bool {
        !self.warming_up
    }

    fn shall_buffer(&self) -> bool {
        true
    }

    fn instances_to_fit<'a>(&mut self, buffer: BufferView<'a>) -> FitSet<'a> {
        buffer.fit_set()
    }

    fn remaining_buffer<'a>(&mut self, _buffer: BufferView<'a>) -> BufferView<'a> {
        BufferView::empty()
    }
}
