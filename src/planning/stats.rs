//! Plan statistics.
//!
//! Computes completion and workload indicators from a finished plan.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Completion % | 100 · completed / total instances |
//! | Completed per day | Completed instances by the day of their last slot |
//! | Completed per product | Completed instances by product |
//! | Worker breakdown | Completed instances and fixed / flow / rebalanced slots |
//! | Idle slots | Free slots per day from the worker's start slot on |
//! | Makespan | One past the latest occupied slot |
//! | Avg Utilization | Mean busy fraction over the days used |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{AssignedRole, Schedule, TaskInstance, WorkerRole};

/// Per-worker statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: String,
    pub role: WorkerRole,
    /// Completed instances the worker ended up owning.
    pub completed: u32,
    pub fixed_slots: u32,
    pub flow_slots: u32,
    pub rebalanced_slots: u32,
    pub idle_slots: u32,
    /// Busy fraction over the days used (0.0..1.0).
    pub utilization: f64,
}

/// Aggregate statistics of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total_instances: usize,
    pub completed_instances: usize,
    /// Completion percentage (0–100).
    pub completion_pct: f64,
    /// Completed instances per 0-based day.
    pub completed_per_day: Vec<u32>,
    pub completed_per_product: BTreeMap<String, u32>,
    pub workers: Vec<WorkerStats>,
    pub days_used: u32,
    pub makespan_slots: u32,
    /// Mean worker utilization (0.0..1.0).
    pub avg_utilization: f64,
}

impl PlanStats {
    /// Computes statistics from a schedule and its instances.
    ///
    /// # Arguments
    /// * `schedule` - Final schedule; its days define the horizon.
    /// * `instances` - Every instance of the run.
    /// * `roles` - Role per schedule row.
    /// * `start_slots` - First working slot of the day per schedule row.
    pub fn calculate(
        schedule: &Schedule,
        instances: &[TaskInstance],
        roles: &[WorkerRole],
        start_slots: &[u32],
    ) -> Self {
        let days_used = schedule.days();
        let spd = schedule.slots_per_day();
        let horizon = schedule.horizon();

        let mut completed_per_day = vec![0u32; days_used as usize];
        let mut completed_per_product: BTreeMap<String, u32> = BTreeMap::new();
        let mut completed_by_worker = vec![0u32; schedule.worker_count()];
        let mut completed_instances = 0usize;

        for inst in instances.iter().filter(|i| i.is_completed()) {
            completed_instances += 1;
            *completed_per_product.entry(inst.product.clone()).or_insert(0) += 1;
            if let Some(end) = inst.end {
                let day = end.day as usize;
                if day >= completed_per_day.len() {
                    completed_per_day.resize(day + 1, 0);
                }
                completed_per_day[day] += 1;
            }
            if let Some(c) = inst.worker.and_then(|w| completed_by_worker.get_mut(w)) {
                *c += 1;
            }
        }

        let workers: Vec<WorkerStats> = schedule
            .workers()
            .iter()
            .enumerate()
            .map(|(w, id)| {
                let (mut fixed, mut flow, mut rebalanced) = (0, 0, 0);
                for idx in 0..horizon {
                    match schedule.at(w, idx).map(|o| o.role) {
                        Some(AssignedRole::Fixed) => fixed += 1,
                        Some(AssignedRole::Flow) => flow += 1,
                        Some(AssignedRole::Rebalanced) => rebalanced += 1,
                        None => {}
                    }
                }
                let start = start_slots.get(w).copied().unwrap_or(0).min(spd);
                let idle: u32 = (0..days_used).map(|day| schedule.idle_slots(w, day, start)).sum();
                WorkerStats {
                    worker: id.clone(),
                    role: roles.get(w).copied().unwrap_or(WorkerRole::Flow),
                    completed: completed_by_worker[w],
                    fixed_slots: fixed,
                    flow_slots: flow,
                    rebalanced_slots: rebalanced,
                    idle_slots: idle,
                    utilization: schedule.worker_utilization(w, horizon).unwrap_or(0.0),
                }
            })
            .collect();

        let avg_utilization = if workers.is_empty() {
            0.0
        } else {
            workers.iter().map(|w| w.utilization).sum::<f64>() / workers.len() as f64
        };

        let total_instances = instances.len();
        let completion_pct = if total_instances == 0 {
            100.0
        } else {
            100.0 * completed_instances as f64 / total_instances as f64
        };

        Self {
            total_instances,
            completed_instances,
            completion_pct,
            completed_per_day,
            completed_per_product,
            workers,
            days_used,
            makespan_slots: schedule.makespan_slots(),
            avg_utilization,
        }
    }

    /// Whether every instance completed.
    pub fn is_complete(&self) -> bool {
        self.completed_instances == self.total_instances
    }
}
