//! Schedule (solution) model.
//!
//! A schedule is a worker × day × slot grid. Each cell is either idle or
//! holds the task instance the worker performs in that slot, tagged with
//! the role under which it was assigned.
//!
//! # Time Representation
//! Slots are addressed either as a [`SlotTime`] (day, slot-of-day) or as a
//! global index `day * slots_per_day + slot`. Days are 0-based internally;
//! exports present them 1-based.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{InstanceId, WorkerRole};

/// A (day, slot-of-day) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotTime {
    /// 0-based day.
    pub day: u32,
    /// 0-based slot within the day.
    pub slot: u32,
}

impl SlotTime {
    pub fn new(day: u32, slot: u32) -> Self {
        Self { day, slot }
    }

    /// Converts a global slot index.
    #[inline]
    pub fn from_index(index: u32, slots_per_day: u32) -> Self {
        Self {
            day: index / slots_per_day,
            slot: index % slots_per_day,
        }
    }

    /// Global slot index.
    #[inline]
    pub fn index(self, slots_per_day: u32) -> u32 {
        self.day * slots_per_day + self.slot
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}s{}", self.day + 1, self.slot)
    }
}

/// Role tag recorded on an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    Fixed,
    Flow,
    /// Moved to this worker by the rebalancer.
    Rebalanced,
}

impl From<WorkerRole> for AssignedRole {
    fn from(role: WorkerRole) -> Self {
        match role {
            WorkerRole::Fixed => AssignedRole::Fixed,
            WorkerRole::Flow => AssignedRole::Flow,
        }
    }
}

impl fmt::Display for AssignedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignedRole::Fixed => "fixed",
            AssignedRole::Flow => "flow",
            AssignedRole::Rebalanced => "rebalanced",
        };
        f.write_str(s)
    }
}

/// Contents of a non-idle cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub instance: InstanceId,
    pub role: AssignedRole,
}

/// Worker × day × slot assignment grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    slots_per_day: u32,
    days: u32,
    /// Worker ids in roster order (row labels).
    workers: Vec<String>,
    /// Per worker, one cell per global slot.
    grid: Vec<Vec<Option<Occupancy>>>,
}

impl Schedule {
    /// Creates an empty schedule with zero days.
    pub fn new(workers: Vec<String>, slots_per_day: u32) -> Self {
        let grid = vec![Vec::new(); workers.len()];
        Self {
            slots_per_day,
            days: 0,
            workers,
            grid,
        }
    }

    /// Extends every row so that at least `days` days exist.
    pub fn ensure_days(&mut self, days: u32) {
        if days <= self.days {
            return;
        }
        self.days = days;
        let len = (days * self.slots_per_day) as usize;
        for row in &mut self.grid {
            row.resize(len, None);
        }
    }

    /// Drops trailing days beyond `days`.
    pub fn truncate_days(&mut self, days: u32) {
        if days >= self.days {
            return;
        }
        self.days = days;
        let len = (days * self.slots_per_day) as usize;
        for row in &mut self.grid {
            row.truncate(len);
        }
    }

    #[inline]
    pub fn slots_per_day(&self) -> u32 {
        self.slots_per_day
    }

    #[inline]
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Total number of global slots per worker.
    #[inline]
    pub fn horizon(&self) -> u32 {
        self.days * self.slots_per_day
    }

    /// Worker ids in roster order.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Cell at a global index (`None` = idle or out of range).
    #[inline]
    pub fn at(&self, worker: usize, index: u32) -> Option<&Occupancy> {
        self.grid
            .get(worker)
            .and_then(|row| row.get(index as usize))
            .and_then(Option::as_ref)
    }

    /// Cell at a (day, slot) position.
    pub fn cell(&self, worker: usize, time: SlotTime) -> Option<&Occupancy> {
        self.at(worker, time.index(self.slots_per_day))
    }

    /// Whether a slot exists and is idle.
    #[inline]
    pub fn is_free(&self, worker: usize, index: u32) -> bool {
        index < self.horizon() && self.at(worker, index).is_none()
    }

    /// Marks `slots` as occupied by `instance`.
    ///
    /// Returns `false` and leaves the grid untouched when any slot is
    /// already taken or outside the horizon.
    pub fn occupy(
        &mut self,
        worker: usize,
        slots: &[u32],
        instance: InstanceId,
        role: AssignedRole,
    ) -> bool {
        if !slots.iter().all(|&s| self.is_free(worker, s)) {
            return false;
        }
        let row = &mut self.grid[worker];
        for &s in slots {
            row[s as usize] = Some(Occupancy { instance, role });
        }
        true
    }

    /// Clears `slots` of `worker` that currently hold `instance`.
    pub fn release(&mut self, worker: usize, slots: &[u32], instance: InstanceId) {
        if let Some(row) = self.grid.get_mut(worker) {
            for &s in slots {
                if let Some(cell) = row.get_mut(s as usize) {
                    if cell.map(|o| o.instance) == Some(instance) {
                        *cell = None;
                    }
                }
            }
        }
    }

    /// Cells of one worker for one day.
    pub fn day_row(&self, worker: usize, day: u32) -> &[Option<Occupancy>] {
        let from = (day * self.slots_per_day) as usize;
        let to = from + self.slots_per_day as usize;
        self.grid
            .get(worker)
            .and_then(|row| row.get(from..to))
            .unwrap_or(&[])
    }

    /// Latest occupied cell strictly before `index`.
    pub fn last_before(&self, worker: usize, index: u32) -> Option<&Occupancy> {
        let row = self.grid.get(worker)?;
        let end = (index as usize).min(row.len());
        row[..end].iter().rev().find_map(Option::as_ref)
    }

    /// Global slot indices where `worker` performs `instance`.
    pub fn slots_of(&self, worker: usize, instance: InstanceId) -> Vec<u32> {
        self.grid
            .get(worker)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, c)| c.map(|o| o.instance) == Some(instance))
                    .map(|(i, _)| i as u32)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Idle slots of `worker` on `day`, counted from `from_slot`.
    pub fn idle_slots(&self, worker: usize, day: u32, from_slot: u32) -> u32 {
        self.day_row(worker, day)
            .iter()
            .skip(from_slot as usize)
            .filter(|c| c.is_none())
            .count() as u32
    }

    /// Occupied slots of `worker` across the whole horizon.
    pub fn busy_slots(&self, worker: usize) -> u32 {
        self.grid
            .get(worker)
            .map(|row| row.iter().filter(|c| c.is_some()).count() as u32)
            .unwrap_or(0)
    }

    /// Occupied slot count per worker.
    pub fn all_busy_slots(&self) -> Vec<u32> {
        (0..self.workers.len()).map(|w| self.busy_slots(w)).collect()
    }

    /// One past the latest occupied global slot across all workers.
    pub fn makespan_slots(&self) -> u32 {
        self.grid
            .iter()
            .filter_map(|row| row.iter().rposition(Option::is_some))
            .map(|i| i as u32 + 1)
            .max()
            .unwrap_or(0)
    }

    /// Busy fraction of a worker over the first `horizon` slots.
    ///
    /// Returns `None` if `horizon` is zero.
    pub fn worker_utilization(&self, worker: usize, horizon: u32) -> Option<f64> {
        if horizon == 0 {
            return None;
        }
        let busy = self
            .grid
            .get(worker)?
            .iter()
            .take(horizon as usize)
            .filter(|c| c.is_some())
            .count();
        Some(busy as f64 / horizon as f64)
    }

    /// Number of occupied cells in the whole grid.
    pub fn occupied_cells(&self) -> u64 {
        self.grid
            .iter()
            .map(|row| row.iter().filter(|c| c.is_some()).count() as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new(vec!["W1".into(), "W2".into()], 4);
        s.ensure_days(2);
        assert!(s.occupy(0, &[0, 1], InstanceId(0), AssignedRole::Fixed));
        assert!(s.occupy(1, &[2], InstanceId(1), AssignedRole::Flow));
        assert!(s.occupy(0, &[5], InstanceId(2), AssignedRole::Fixed));
        s
    }

    #[test]
    fn test_slot_time_conversion() {
        let t = SlotTime::from_index(37, 16);
        assert_eq!(t, SlotTime::new(2, 5));
        assert_eq!(t.index(16), 37);
        assert_eq!(t.to_string(), "d3s5");
    }

    #[test]
    fn test_occupy_rejects_conflict() {
        let mut s = sample_schedule();
        assert!(!s.occupy(0, &[1, 2], InstanceId(9), AssignedRole::Flow));
        // Untouched on failure
        assert!(s.is_free(0, 2));
        assert!(!s.occupy(0, &[8], InstanceId(9), AssignedRole::Flow)); // beyond horizon
    }

    #[test]
    fn test_cell_queries() {
        let s = sample_schedule();
        assert_eq!(s.horizon(), 8);
        assert_eq!(s.cell(0, SlotTime::new(0, 1)).unwrap().instance, InstanceId(0));
        assert!(s.cell(1, SlotTime::new(0, 0)).is_none());
        assert_eq!(s.last_before(0, 5).unwrap().instance, InstanceId(0));
        assert_eq!(s.last_before(0, 7).unwrap().instance, InstanceId(2));
        assert!(s.last_before(1, 2).is_none());
        assert_eq!(s.slots_of(0, InstanceId(0)), vec![0, 1]);
    }

    #[test]
    fn test_release() {
        let mut s = sample_schedule();
        s.release(0, &[0, 1, 5], InstanceId(0));
        assert!(s.is_free(0, 0));
        assert!(s.is_free(0, 1));
        // Slot 5 belongs to another instance
        assert!(!s.is_free(0, 5));
    }

    #[test]
    fn test_idle_and_busy_counts() {
        let s = sample_schedule();
        assert_eq!(s.idle_slots(0, 0, 0), 2);
        assert_eq!(s.idle_slots(0, 0, 2), 2);
        assert_eq!(s.idle_slots(1, 1, 0), 4);
        assert_eq!(s.busy_slots(0), 3);
        assert_eq!(s.all_busy_slots(), vec![3, 1]);
        assert_eq!(s.occupied_cells(), 4);
    }

    #[test]
    fn test_makespan_and_utilization() {
        let s = sample_schedule();
        assert_eq!(s.makespan_slots(), 6);
        let u = s.worker_utilization(0, 6).unwrap();
        assert!((u - 0.5).abs() < 1e-10);
        assert!(s.worker_utilization(0, 0).is_none());
    }

    #[test]
    fn test_truncate_days() {
        let mut s = sample_schedule();
        s.ensure_days(5);
        s.truncate_days(2);
        assert_eq!(s.days(), 2);
        assert_eq!(s.day_row(0, 1).len(), 4);
        assert!(s.day_row(0, 2).is_empty());
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new(vec!["W1".into()], 16);
        assert_eq!(s.makespan_slots(), 0);
        assert_eq!(s.horizon(), 0);
        assert!(!s.is_free(0, 0));
    }
}
