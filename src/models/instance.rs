//! Task instances: one concrete unit of a recipe step.
//!
//! # Lifecycle
//! `Pending → InProgress → Completed`. Instances are created pending by the
//! expander, move to in-progress when a worker is committed for their first
//! slot, and complete once their last slot has elapsed, at which point their
//! [`OutputKey`] enters the inventory. Instances are never dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AssignedRole, SlotTime};

/// Dense identifier of a task instance within one planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense identifier of a task type (product × recipe step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskTypeId(pub usize);

/// Inventory key of a produced output.
///
/// `unit` is set when dependencies are tracked per physical unit and `None`
/// when all units of a step share one pooled gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputKey {
    pub product: String,
    pub code: String,
    pub unit: Option<u32>,
}

impl OutputKey {
    pub fn new(product: impl Into<String>, code: impl Into<String>, unit: Option<u32>) -> Self {
        Self {
            product: product.into(),
            code: code.into(),
            unit,
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}/{}#{}", self.product, self.code, unit),
            None => write!(f, "{}/{}", self.product, self.code),
        }
    }
}

/// Progress state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One concrete unit of a task definition being produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Run-unique identifier.
    pub id: InstanceId,
    /// Task type shared by every unit of the same recipe step.
    pub task_type: TaskTypeId,
    /// Product name.
    pub product: String,
    /// 1-based unit number within the order line.
    pub unit: u32,
    /// Output code of the recipe step.
    pub code: String,
    /// Name of the recipe step.
    pub name: String,
    /// Slots the instance occupies.
    pub duration_slots: u32,
    /// Length of the longest prerequisite chain leading to this step.
    pub depth: u32,
    /// What completing this instance adds to the inventory.
    pub output: OutputKey,
    /// Inventory keys that gate the start of this instance.
    pub requires: Vec<OutputKey>,
    /// Current status.
    pub status: InstanceStatus,
    /// Roster index of the assigned worker.
    pub worker: Option<usize>,
    /// Role under which the worker performs it.
    pub role: Option<AssignedRole>,
    /// First occupied slot.
    pub start: Option<SlotTime>,
    /// Last occupied slot (inclusive).
    pub end: Option<SlotTime>,
}

impl TaskInstance {
    /// Whether the instance has not been started.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == InstanceStatus::Pending
    }

    /// Whether the instance finished.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == InstanceStatus::Completed
    }

    /// Human-readable label, e.g. `Boot#2:SOL`.
    pub fn label(&self) -> String {
        format!("{}#{}:{}", self.product, self.unit, self.code)
    }
}
