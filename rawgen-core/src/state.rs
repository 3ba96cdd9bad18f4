//! Generation state machine.

use crate::host::OutputSink;
use crate::types::{GenerationResult, GenerationState};
use std::sync::{Mutex, MutexGuard};

/// Idle / InFlight / Succeeded / Failed, with at most one submission in flight.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: Mutex<GenerationState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn current(&self) -> GenerationState {
        *self.lock()
    }

    /// Accept a submission: Idle or terminal moves to InFlight.
    ///
    /// Returns `None` when a submission is already in flight. The returned
    /// guard turns the busy affordance on and is the only way back out of
    /// InFlight.
    pub fn begin<'a>(&'a self, sink: &'a dyn OutputSink) -> Option<InFlight<'a>> {
        {
            let mut state = self.lock();
            if *state == GenerationState::InFlight {
                return None;
            }
            tracing::debug!(from = ?*state, "generation state -> InFlight");
            *state = GenerationState::InFlight;
        }

        sink.set_busy(true);
        Some(InFlight {
            machine: self,
            sink,
            finished: false,
        })
    }

    fn settle(&self, next: GenerationState) {
        let mut state = self.lock();
        debug_assert_eq!(*state, GenerationState::InFlight);
        tracing::debug!(to = ?next, "generation state settled");
        *state = next;
    }

    fn lock(&self) -> MutexGuard<'_, GenerationState> {
        // The state is a plain Copy value, so a poisoned lock still holds a valid one.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Proof that a submission is in flight.
///
/// Finishing settles the machine in the outcome's terminal state and
/// releases the busy affordance. Dropping it unfinished settles in `Failed`.
#[derive(Debug)]
pub struct InFlight<'a> {
    machine: &'a StateMachine,
    sink: &'a dyn OutputSink,
    finished: bool,
}

impl InFlight<'_> {
    /// Settle according to the outcome
    pub fn finish(mut self, result: &GenerationResult) {
        self.release(result.terminal_state());
    }

    fn release(&mut self, next: GenerationState) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.machine.settle(next);
        self.sink.set_busy(false);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("generation abandoned before completion");
            self.release(GenerationState::Failed);
        }
    }
}
