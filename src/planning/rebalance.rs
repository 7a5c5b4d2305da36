//! Post-day rebalancer.
//!
//! After each simulated day, a fixed worker that spent more than
//! `ceiling` slots on one task type hands whole instances of that type to
//! workers who were idle for more than half of their available day.
//!
//! # Rules
//! - Idle candidates: idle slots (from the start gate) > `(slots_per_day − start_slot) / 2`.
//! - Donors: fixed-role workers, per task type with a day count above the ceiling.
//! - Only instances lying entirely within the day move, latest first.
//! - Targets are tried round-robin, most idle first; a target must be past
//!   its start gate and free over the instance's whole range.
//! - Moved instances keep their time range and are tagged `Rebalanced`.
//!
//! Moving is one-for-one, so the total idle slot count of the day never grows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

use crate::models::{AssignedRole, InstanceId, Schedule, TaskInstance, TaskTypeId, WorkerRole};

/// One instance handed from a fixed worker to an idle one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceMove {
    pub instance: InstanceId,
    /// 0-based day.
    pub day: u32,
    /// Schedule row of the donor.
    pub from: usize,
    /// Schedule row of the receiver.
    pub to: usize,
}

/// Rebalances one day of the schedule in place.
///
/// `roles` and `start_slots` are indexed by schedule row. Returns the moves
/// made, in order; an empty list when nothing was over-concentrated or no
/// target could take the excess.
pub fn rebalance_day(
    schedule: &mut Schedule,
    instances: &mut [TaskInstance],
    roles: &[WorkerRole],
    start_slots: &[u32],
    day: u32,
    ceiling: u32,
) -> Vec<RebalanceMove> {
    let spd = schedule.slots_per_day();
    let mut moves = Vec::new();

    let mut idle: Vec<(usize, u32)> = (0..schedule.worker_count())
        .filter_map(|w| {
            let start = start_slots.get(w).copied().unwrap_or(0).min(spd);
            let available = spd - start;
            let free = schedule.idle_slots(w, day, start);
            (free as f64 > available as f64 / 2.0).then_some((w, free))
        })
        .collect();
    if idle.is_empty() {
        return moves;
    }
    // Most idle first; roster order breaks ties
    idle.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let targets: Vec<usize> = idle.into_iter().map(|(w, _)| w).collect();
    let mut cursor = 0usize;

    let day_start = day * spd;
    let day_end = day_start + spd;

    for donor in 0..schedule.worker_count() {
        if roles.get(donor) != Some(&WorkerRole::Fixed) {
            continue;
        }

        for (task_type, mut count) in type_counts(schedule, instances, donor, day) {
            if count <= ceiling {
                continue;
            }

            // Whole instances of this type inside the day, latest first
            let mut movable: Vec<(InstanceId, Vec<u32>)> = distinct_instances(schedule, donor, day)
                .into_iter()
                .filter(|id| instances[id.0].task_type == task_type)
                .map(|id| (id, schedule.slots_of(donor, id)))
                .filter(|(id, slots)| {
                    slots.len() as u32 == instances[id.0].duration_slots
                        && slots.iter().all(|&s| (day_start..day_end).contains(&s))
                })
                .collect();
            movable.sort_by(|a, b| b.1[0].cmp(&a.1[0]));

            for (id, slots) in movable {
                if count <= ceiling {
                    break;
                }
                let first_slot = slots[0] - day_start;
                let accepted = (0..targets.len()).find_map(|k| {
                    let to = targets[(cursor + k) % targets.len()];
                    let gate = start_slots.get(to).copied().unwrap_or(0);
                    let fits = to != donor
                        && gate <= first_slot
                        && slots.iter().all(|&s| schedule.is_free(to, s));
                    fits.then_some((k, to))
                });
                let Some((k, to)) = accepted else {
                    continue;
                };
                cursor = (cursor + k + 1) % targets.len();

                schedule.release(donor, &slots, id);
                schedule.occupy(to, &slots, id, AssignedRole::Rebalanced);
                let inst = &mut instances[id.0];
                inst.worker = Some(to);
                inst.role = Some(AssignedRole::Rebalanced);
                count = count.saturating_sub(slots.len() as u32);

                trace!(instance = %id, from = donor, to, "rebalanced");
                moves.push(RebalanceMove {
                    instance: id,
                    day,
                    from: donor,
                    to,
                });
            }
        }
    }

    moves
}

/// Slots per task type a worker spent on `day`, in type order.
fn type_counts(
    schedule: &Schedule,
    instances: &[TaskInstance],
    worker: usize,
    day: u32,
) -> BTreeMap<TaskTypeId, u32> {
    let mut counts = BTreeMap::new();
    for cell in schedule.day_row(worker, day).iter().flatten() {
        *counts
            .entry(instances[cell.instance.0].task_type)
            .or_insert(0) += 1;
    }
    counts
}

fn distinct_instances(schedule: &Schedule, worker: usize, day: u32) -> Vec<InstanceId> {
    let mut ids: Vec<InstanceId> = schedule
        .day_row(worker, day)
        .iter()
        .flatten()
        .map(|o| o.instance)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
