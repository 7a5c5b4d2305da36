//! Plan consistency audit.
//!
//! Re-checks a finished plan against the rules the engine is meant to
//! uphold. A correct run yields no violations; `plan` logs any it finds.
//!
//! # Checks
//! - **Placement**: a started instance occupies exactly `duration_slots`
//!   cells of its worker, from its recorded start to its recorded end.
//! - **Precedence**: every requirement of a started instance was produced
//!   (or, under the partial-progress gate, sufficiently progressed) before
//!   the instance's first slot.
//! - **Start gate**: no cell precedes its worker's start slot.
//! - **Terminal state**: every instance ends completed or pending, and an
//!   instance has a worker iff it was started.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::PlanResult;
use crate::config::DependencyGate;
use crate::models::{InstanceId, InstanceStatus, OutputKey, SlotTime};

/// Category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    Placement,
    Precedence,
    StartGate,
    TerminalState,
}

/// A broken plan invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub instance: Option<InstanceId>,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, instance: Option<InstanceId>, message: String) -> Self {
        Self {
            kind,
            instance,
            message,
        }
    }
}

/// Audits a plan under the dependency gate it was planned with.
pub fn audit(result: &PlanResult, gate: DependencyGate) -> Vec<Violation> {
    let schedule = &result.schedule;
    let spd = schedule.slots_per_day();
    let mut violations = Vec::new();

    // Occupied slots per started instance
    let mut slots: HashMap<InstanceId, Vec<u32>> = HashMap::new();
    for inst in &result.instances {
        if let Some(w) = inst.worker {
            slots.insert(inst.id, schedule.slots_of(w, inst.id));
        }
    }

    // Producers per output key
    let mut producers: HashMap<&OutputKey, Vec<InstanceId>> = HashMap::new();
    for inst in &result.instances {
        producers.entry(&inst.output).or_default().push(inst.id);
    }

    for inst in &result.instances {
        let label = inst.label();
        match (inst.status, inst.worker) {
            (InstanceStatus::InProgress, _) => violations.push(Violation::new(
                ViolationKind::TerminalState,
                Some(inst.id),
                format!("{label} is still in progress"),
            )),
            (InstanceStatus::Completed, None) => violations.push(Violation::new(
                ViolationKind::TerminalState,
                Some(inst.id),
                format!("{label} completed without a worker"),
            )),
            (InstanceStatus::Pending, Some(_)) => violations.push(Violation::new(
                ViolationKind::TerminalState,
                Some(inst.id),
                format!("{label} is pending but assigned"),
            )),
            _ => {}
        }

        let Some(own) = slots.get(&inst.id) else {
            continue;
        };
        let expected = (inst.start, inst.end);
        let actual = (
            own.first().map(|&s| SlotTime::from_index(s, spd)),
            own.last().map(|&s| SlotTime::from_index(s, spd)),
        );
        if own.len() as u32 != inst.duration_slots || expected != actual {
            violations.push(Violation::new(
                ViolationKind::Placement,
                Some(inst.id),
                format!(
                    "{label} occupies {} slots, expected {} from {:?} to {:?}",
                    own.len(),
                    inst.duration_slots,
                    inst.start,
                    inst.end
                ),
            ));
        }

        if let Some(w) = inst.worker {
            let gate_slot = result.start_slots.get(w).copied().unwrap_or(0);
            if own.iter().any(|&s| s % spd < gate_slot) {
                violations.push(Violation::new(
                    ViolationKind::StartGate,
                    Some(inst.id),
                    format!("{label} starts before worker {} is available", schedule.workers()[w]),
                ));
            }
        }

        let Some(&start) = own.first() else {
            continue;
        };
        for key in &inst.requires {
            let met = producers.get(key).is_some_and(|ids| {
                ids.iter().any(|id| {
                    let Some(p) = slots.get(id) else {
                        return false;
                    };
                    let before = p.iter().filter(|&&s| s < start).count();
                    match gate {
                        DependencyGate::Completed => !p.is_empty() && before == p.len(),
                        DependencyGate::PartialProgress { min_fraction } => {
                            !p.is_empty() && before as f64 / p.len() as f64 >= min_fraction
                        }
                    }
                })
            });
            if !met {
                violations.push(Violation::new(
                    ViolationKind::Precedence,
                    Some(inst.id),
                    format!("{label} started before requirement {key} was available"),
                ));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::models::{Order, Product, TaskDefinition, Worker};
    use crate::planning::{plan, PlanRequest};
    use crate::store::MasterData;

    fn planned() -> PlanResult {
        let data = MasterData::new()
            .with_product(
                Product::new("P")
                    .with_task(TaskDefinition::new("A", "a").with_duration(2))
                    .with_task(TaskDefinition::new("B", "b").with_requirement("A")),
            )
            .with_worker(Worker::new("W1"))
            .with_worker(Worker::new("W2").with_start_time("09:00"));
        plan(&data, &PlanRequest::new(Order::new().with("P", 3)), &PlannerConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_plan_has_no_violations() {
        let result = planned();
        assert!(audit(&result, DependencyGate::Completed).is_empty());
    }

    #[test]
    fn test_detects_precedence_violation() {
        let mut result = planned();
        // Pretend B of unit 1 needed an output nobody produced
        let b = result.instances.iter_mut().find(|i| i.label() == "P#1:B").unwrap();
        b.requires.push(OutputKey::new("P", "GHOST", Some(1)));
        let v = audit(&result, DependencyGate::Completed);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ViolationKind::Precedence);
    }

    #[test]
    fn test_detects_terminal_state() {
        let mut result = planned();
        result.instances[0].status = InstanceStatus::InProgress;
        let v = audit(&result, DependencyGate::Completed);
        assert!(v.iter().any(|v| v.kind == ViolationKind::TerminalState));
    }

    #[test]
    fn test_detects_placement_mismatch() {
        let mut result = planned();
        result.instances[0].duration_slots = 5;
        let v = audit(&result, DependencyGate::Completed);
        assert!(v.iter().any(|v| v.kind == ViolationKind::Placement && v.instance == Some(InstanceId(0))));
    }
}
