//! Task-to-worker planning.
//!
//! [`plan`] turns master data, an order and a configuration into a
//! slot-level schedule:
//!
//! ```text
//! catalogue ─► recipe ─► expander ─► instances ─┐
//! roster ───► scoring (roles) ──────────────────┼─► engine ⇄ rebalance ─► stats
//! order ────────────────────────────────────────┘
//! ```
//!
//! Fatal input problems are reported as [`PlanError`] before anything is
//! simulated. Instances that cannot be planned are part of the result, each
//! with an [`UnassignedReason`].
//!
//! # Example
//!
//! ```
//! use u_workforce::config::PlannerConfig;
//! use u_workforce::models::{Order, Product, TaskDefinition, Worker};
//! use u_workforce::planning::{plan, PlanRequest};
//! use u_workforce::store::MasterData;
//!
//! let data = MasterData::new()
//!     .with_product(
//!         Product::new("ProductA")
//!             .with_task(TaskDefinition::new("T1", "Cut"))
//!             .with_task(TaskDefinition::new("T2", "Sew"))
//!             .with_task(TaskDefinition::new("T3", "Join").with_requirement("T1").with_requirement("T2")),
//!     )
//!     .with_worker(Worker::new("W1"));
//!
//! let result = plan(&data, &PlanRequest::new(Order::new().with("ProductA", 1)), &PlannerConfig::default()).unwrap();
//! assert!((result.stats.completion_pct - 100.0).abs() < 1e-10);
//! ```

pub mod audit;
pub mod engine;
pub mod expander;
pub mod rebalance;
pub mod recipe;
pub mod scoring;
pub mod stats;

pub use audit::{audit, Violation, ViolationKind};
pub use engine::{EngineOutcome, SlotPlanner};
pub use expander::{Expansion, TaskType};
pub use rebalance::RebalanceMove;
pub use recipe::Recipe;
pub use scoring::{skill_match, RoleAssessment, RoleClassifier};
pub use stats::{PlanStats, WorkerStats};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{info, instrument, warn};

use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::models::{InstanceId, Inventory, Order, OutputKey, Schedule, TaskInstance, Worker, WorkerRole};
use crate::store::MasterData;
use crate::validation::validate_roster;

/// What to plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub order: Order,
    /// Explicit worker ids; `None` uses every worker flagged `selected`.
    pub workers: Option<Vec<String>>,
    /// `HH:MM` start times overriding the roster, by worker id.
    pub start_times: BTreeMap<String, String>,
}

impl PlanRequest {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    /// Restricts the run to the given worker ids.
    pub fn with_workers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workers = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides one worker's start time.
    pub fn with_start_time(mut self, worker: impl Into<String>, time: impl Into<String>) -> Self {
        self.start_times.insert(worker.into(), time.into());
        self
    }
}

/// Why an instance was never started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "missing", rename_all = "snake_case")]
pub enum UnassignedReason {
    /// Longer than any worker's working window.
    DoesNotFit,
    /// Requirements never became available.
    UnmetRequirements(Vec<OutputKey>),
    /// Eligible and fitting, but the day budget ran out first.
    DayBudgetExhausted,
}

impl fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnassignedReason::DoesNotFit => f.write_str("does not fit"),
            UnassignedReason::UnmetRequirements(keys) => {
                let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
                write!(f, "unmet requirements: {}", keys.join(", "))
            }
            UnassignedReason::DayBudgetExhausted => f.write_str("day budget exhausted"),
        }
    }
}

/// An instance left pending at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedInstance {
    pub instance: InstanceId,
    pub label: String,
    pub reason: UnassignedReason,
}

/// Everything a planning run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub schedule: Schedule,
    pub instances: Vec<TaskInstance>,
    pub inventory: Inventory,
    pub unassigned: Vec<UnassignedInstance>,
    /// Role assessment per schedule row.
    pub roles: Vec<RoleAssessment>,
    /// Start slot per schedule row.
    pub start_slots: Vec<u32>,
    pub rebalance_moves: Vec<RebalanceMove>,
    pub stats: PlanStats,
    pub days_used: u32,
    /// Days the engine simulated before stopping.
    pub days_simulated: u32,
    /// The engine stopped on a day where nothing could change.
    pub stalled: bool,
}

impl PlanResult {
    /// Instance by id.
    pub fn instance(&self, id: InstanceId) -> Option<&TaskInstance> {
        self.instances.get(id.0)
    }

    /// Schedule row of a worker id.
    pub fn worker_index(&self, id: &str) -> Option<usize> {
        self.schedule.workers().iter().position(|w| w == id)
    }
}

/// Plans an order.
///
/// # Errors
/// - [`PlanError::Config`] for an invalid configuration
/// - [`PlanError::NoWorkers`] when no worker is selected
/// - [`PlanError::UnknownWorker`] for an unknown id in the selection
/// - [`PlanError::EmptyOrder`] when no order line has a positive quantity
/// - [`PlanError::InvalidCatalogue`] for structural catalogue or roster problems
/// - [`PlanError::UnknownProduct`] for an order line naming no product
/// - [`PlanError::InvalidStartTime`] for an unparsable start time
#[instrument(skip_all, fields(units = request.order.total_units()))]
pub fn plan(data: &MasterData, request: &PlanRequest, config: &PlannerConfig) -> Result<PlanResult> {
    config.validate()?;
    let workers = select_workers(data, request)?;
    if request.order.is_empty() {
        return Err(PlanError::EmptyOrder);
    }
    let recipes = recipe::build_recipes(&data.products).map_err(PlanError::InvalidCatalogue)?;
    validate_roster(&data.workers).map_err(PlanError::InvalidCatalogue)?;

    let expansion = expander::expand(&data.products, &recipes, &request.order, config.dependency_scope)?;
    let start_slots = start_slots(&workers, request, config)?;

    let classifier = RoleClassifier::new(config, &data.products);
    let roles = classifier.classify_all(workers.iter().copied());
    info!(
        instances = expansion.instances.len(),
        workers = workers.len(),
        fixed = roles.iter().filter(|r| r.role == WorkerRole::Fixed).count(),
        "planning started"
    );

    let outcome = SlotPlanner::new(
        config,
        workers,
        roles.iter().map(|r| r.role).collect(),
        start_slots.clone(),
        expansion,
    )
    .run();

    let EngineOutcome {
        mut schedule,
        instances,
        inventory,
        moves,
        days_simulated,
        stalled,
        ..
    } = outcome;

    let spd = schedule.slots_per_day();
    let days_used = schedule.makespan_slots().div_ceil(spd);
    schedule.truncate_days(days_used);

    let unassigned = classify_unassigned(&instances, &inventory, &start_slots, config);
    let role_list: Vec<_> = roles.iter().map(|r| r.role).collect();
    let stats = PlanStats::calculate(&schedule, &instances, &role_list, &start_slots);

    let result = PlanResult {
        schedule,
        instances,
        inventory,
        unassigned,
        roles,
        start_slots,
        rebalance_moves: moves,
        stats,
        days_used,
        days_simulated,
        stalled,
    };

    let violations = audit(&result, config.dependency_gate);
    for v in &violations {
        warn!(kind = ?v.kind, "{}", v.message);
    }
    info!(
        completed = result.stats.completed_instances,
        total = result.stats.total_instances,
        unassigned = result.unassigned.len(),
        days = days_used,
        stalled,
        "planning finished"
    );
    Ok(result)
}

fn select_workers<'a>(data: &'a MasterData, request: &PlanRequest) -> Result<Vec<&'a Worker>> {
    let workers: Vec<&Worker> = match &request.workers {
        Some(ids) => {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            if let Some(unknown) = ids.iter().find(|id| data.worker(id).is_none()) {
                return Err(PlanError::UnknownWorker(unknown.clone()));
            }
            data.workers
                .iter()
                .filter(|w| wanted.contains(w.id.as_str()))
                .collect()
        }
        None => data.workers.iter().filter(|w| w.selected).collect(),
    };
    if workers.is_empty() {
        return Err(PlanError::NoWorkers);
    }
    Ok(workers)
}

fn start_slots(workers: &[&Worker], request: &PlanRequest, config: &PlannerConfig) -> Result<Vec<u32>> {
    workers
        .iter()
        .map(|w| {
            let time = request
                .start_times
                .get(&w.id)
                .or(w.start_time.as_ref());
            match time {
                Some(t) => config
                    .slot_from_time(t)
                    .map_err(|source| PlanError::InvalidStartTime {
                        worker: w.id.clone(),
                        source,
                    }),
                None => Ok(0),
            }
        })
        .collect()
}

fn classify_unassigned(
    instances: &[TaskInstance],
    inventory: &Inventory,
    start_slots: &[u32],
    config: &PlannerConfig,
) -> Vec<UnassignedInstance> {
    let spd = config.slots_per_day();
    let widest = start_slots
        .iter()
        .map(|&s| spd.saturating_sub(s))
        .max()
        .unwrap_or(0);

    instances
        .iter()
        .filter(|i| i.is_pending())
        .map(|inst| {
            let missing: Vec<OutputKey> = inventory.missing(&inst.requires).into_iter().cloned().collect();
            let too_long = if config.allow_cross_day_span {
                widest == 0
            } else {
                inst.duration_slots > widest
            };
            let reason = if too_long {
                UnassignedReason::DoesNotFit
            } else if !missing.is_empty() {
                UnassignedReason::UnmetRequirements(missing)
            } else {
                UnassignedReason::DayBudgetExhausted
            };
            UnassignedInstance {
                instance: inst.id,
                label: inst.label(),
                reason,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, TaskDefinition};

    fn data() -> MasterData {
        MasterData::new()
            .with_product(
                Product::new("ProductA")
                    .with_task(TaskDefinition::new("T1", "t1"))
                    .with_task(TaskDefinition::new("T2", "t2"))
                    .with_task(TaskDefinition::new("T3", "t3").with_requirement("T1").with_requirement("T2")),
            )
            .with_worker(Worker::new("W1"))
            .with_worker(Worker::new("W2").deselected())
    }

    #[test]
    fn test_plan_simple_order() {
        let r = plan(&data(), &PlanRequest::new(Order::new().with("ProductA", 1)), &PlannerConfig::default()).unwrap();
        assert_eq!(r.schedule.worker_count(), 1);
        assert_eq!(r.days_used, 1);
        assert!(r.unassigned.is_empty());
        assert!(r.stats.is_complete());
        assert_eq!(r.inventory.total(), 3);
        assert_eq!(r.days_simulated, 1);
        assert!(!r.stalled);
    }

    #[test]
    fn test_explicit_selection() {
        let req = PlanRequest::new(Order::new().with("ProductA", 1)).with_workers(["W2"]);
        let r = plan(&data(), &req, &PlannerConfig::default()).unwrap();
        assert_eq!(r.schedule.workers(), &["W2".to_string()]);
        assert_eq!(r.worker_index("W2"), Some(0));
    }

    #[test]
    fn test_unknown_worker() {
        let req = PlanRequest::new(Order::new().with("ProductA", 1)).with_workers(["W9"]);
        let err = plan(&data(), &req, &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::UnknownWorker(ref w) if w == "W9"));
    }

    #[test]
    fn test_no_workers() {
        let d = MasterData::new().with_products(data().products);
        let err = plan(&d, &PlanRequest::new(Order::new().with("ProductA", 1)), &PlannerConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "no workers available");
    }

    #[test]
    fn test_empty_order() {
        let err = plan(&data(), &PlanRequest::new(Order::new().with("ProductA", 0)), &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::EmptyOrder));
    }

    #[test]
    fn test_bad_start_time() {
        let req = PlanRequest::new(Order::new().with("ProductA", 1)).with_start_time("W1", "later");
        let err = plan(&data(), &req, &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidStartTime { .. }));
    }

    #[test]
    fn test_start_time_override() {
        let req = PlanRequest::new(Order::new().with("ProductA", 1)).with_start_time("W1", "10:00");
        let r = plan(&data(), &req, &PlannerConfig::default()).unwrap();
        assert_eq!(r.start_slots, vec![4]);
        assert_eq!(r.instances[0].start.map(|s| s.slot), Some(4));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlannerConfig::default().with_day(8, 16, 7);
        let err = plan(&data(), &PlanRequest::new(Order::new().with("ProductA", 1)), &config).unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn test_unassigned_reasons() {
        let d = MasterData::new()
            .with_product(
                Product::new("P")
                    .with_task(TaskDefinition::new("BIG", "big").with_duration(20))
                    .with_task(TaskDefinition::new("NEXT", "next").with_requirement("BIG")),
            )
            .with_worker(Worker::new("W1"));
        let r = plan(&d, &PlanRequest::new(Order::new().with("P", 1)), &PlannerConfig::default()).unwrap();
        assert_eq!(r.unassigned.len(), 2);
        assert_eq!(r.unassigned[0].reason, UnassignedReason::DoesNotFit);
        assert_eq!(r.unassigned[0].reason.to_string(), "does not fit");
        assert_eq!(
            r.unassigned[1].reason,
            UnassignedReason::UnmetRequirements(vec![OutputKey::new("P", "BIG", Some(1))])
        );
        assert_eq!(r.days_used, 0);
        assert!(r.stalled);
        assert_eq!(r.days_simulated, 1);
    }

    #[test]
    fn test_budget_exhausted_reason() {
        let d = MasterData::new()
            .with_product(Product::new("P").with_task(TaskDefinition::new("A", "a").with_duration(16)))
            .with_worker(Worker::new("W1"));
        let config = PlannerConfig::default().with_day_budget(1);
        let r = plan(&d, &PlanRequest::new(Order::new().with("P", 2)), &config).unwrap();
        assert_eq!(r.unassigned.len(), 1);
        assert_eq!(r.unassigned[0].reason, UnassignedReason::DayBudgetExhausted);
        // Out of days, not out of options
        assert!(!r.stalled);
        assert_eq!(r.days_simulated, 1);
    }

    #[test]
    fn test_roles_reported() {
        let r = plan(&data(), &PlanRequest::new(Order::new().with("ProductA", 1)), &PlannerConfig::default()).unwrap();
        assert_eq!(r.roles.len(), 1);
        // No skills: 0 + 10 + 20 = 30, below the threshold
        assert_eq!(r.roles[0].role, WorkerRole::Flow);
    }

    #[test]
    fn test_result_serializes() {
        let r = plan(&data(), &PlanRequest::new(Order::new().with("ProductA", 1)), &PlannerConfig::default()).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert!(json["schedule"].is_object());
        assert_eq!(json["stats"]["completed_instances"], 3);
    }
}
