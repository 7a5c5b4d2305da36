//! Selection context and candidates.

use crate::models::{SlotTime, TaskInstance, Worker};
use crate::planning::TaskType;

/// One instance a worker could start now.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub instance: &'a TaskInstance,
    pub task_type: &'a TaskType,
}

impl<'a> Candidate<'a> {
    pub fn new(instance: &'a TaskInstance, task_type: &'a TaskType) -> Self {
        Self {
            instance,
            task_type,
        }
    }
}

/// Runtime state passed to selection rules.
///
/// Describes the worker choosing and what it did last.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Worker making the choice.
    pub worker: &'a Worker,
    /// Product of the worker's previous assignment, if any.
    pub previous_product: Option<&'a str>,
    /// Current slot.
    pub now: SlotTime,
}

impl<'a> SelectionContext<'a> {
    /// Creates a context for a worker with no previous assignment.
    pub fn for_worker(worker: &'a Worker, now: SlotTime) -> Self {
        Self {
            worker,
            previous_product: None,
            now,
        }
    }

    /// Sets the product of the previous assignment.
    pub fn with_previous_product(mut self, product: Option<&'a str>) -> Self {
        self.previous_product = product;
        self
    }
}
