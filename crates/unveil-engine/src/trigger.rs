//! Debounced initialization trigger.
//!
//! Holds at most one pending task. Arming cancels whatever is pending and
//! schedules a replacement, so a burst of N arms yields one run.
//!
//! Each arm gets a generation number. A task only fires if its generation is
//! still the pending one when it runs; this covers a cancel that arrives after
//! the scheduler has already started the task.

use crate::scheduler::{Scheduler, Task, TaskId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    generation: u64,
    task: TaskId,
}

pub struct InitTrigger {
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<TriggerState>,
}

#[derive(Default)]
struct TriggerState {
    generation: u64,
    pending: Option<Pending>,
}

impl InitTrigger {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            state: Mutex::new(TriggerState::default()),
        }
    }

    /// Cancel any pending task and schedule `make(generation)` instead.
    ///
    /// The built task should call [`InitTrigger::settle`] with its generation
    /// and only proceed when that returns true.
    pub fn arm<F>(&self, make: F)
    where
        F: FnOnce(u64) -> Task,
    {
        let mut state = self.state.lock();
        if let Some(previous) = state.pending.take() {
            tracing::trace!(generation = previous.generation, "init trigger: cancel");
            self.scheduler.cancel(previous.task);
        }
        state.generation += 1;
        let generation = state.generation;
        let task = self.scheduler.schedule(make(generation));
        state.pending = Some(Pending { generation, task });
        tracing::debug!(generation, "init trigger: armed");
    }

    /// Claim the pending slot for `generation`.
    ///
    /// Returns false if the trigger was re-armed or cancelled meanwhile.
    pub fn settle(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        match state.pending {
            Some(pending) if pending.generation == generation => {
                state.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        match state.pending.take() {
            Some(pending) => {
                self.scheduler.cancel(pending.task);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// How many times the trigger has been armed.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}
