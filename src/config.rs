//! Planner configuration.
//!
//! Every tunable of a planning run lives in [`PlannerConfig`]: the working
//! day and its slot grid, role thresholds, the rebalancing ceiling, and one
//! policy per dependency/role flag. Configurations deserialize from JSON
//! with every field optional.
//!
//! # Slot clock
//! `slot = ((hour - day_start_hour) * 60 + minute) / slot_minutes`, clamped
//! to `0..=slots_per_day`. With 30-minute slots this is
//! `(hour - day_start_hour) * 2 + (minute >= 30 ? 1 : 0)`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dispatching::EvaluationMode;
use crate::error::ConfigError;

/// When a requirement counts as met.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DependencyGate {
    /// At least one completed unit is in the inventory.
    #[default]
    Completed,
    /// Completed, or a started producer reached `min_fraction` of its slots.
    PartialProgress { min_fraction: f64 },
}

/// How dependencies between units are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyScope {
    /// Unit N's steps depend only on unit N's outputs.
    #[default]
    PerUnit,
    /// Any completed unit of a prerequisite opens the gate for every unit.
    Pooled,
}

/// How workers are classified into fixed and flow roles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RoleRule {
    /// Blended score against the fixed-role threshold only.
    Blended,
    /// As `Blended`, but a flow affinity of at least `min_affinity` forces flow.
    BlendedWithFlowAffinity { min_affinity: f64 },
}

impl Default for RoleRule {
    fn default() -> Self {
        RoleRule::BlendedWithFlowAffinity { min_affinity: 0.6 }
    }
}

/// Weights of the flow-worker selection score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowWeights {
    pub skill: f64,
    pub continuity: f64,
    pub favorite: f64,
    pub advancement: f64,
}

impl Default for FlowWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            continuity: 0.2,
            favorite: 0.15,
            advancement: 0.15,
        }
    }
}

/// Configuration of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Hour the working day starts (0–23).
    pub day_start_hour: u32,
    /// Hour the working day ends (exclusive, 1–24).
    pub day_end_hour: u32,
    /// Slot length in minutes; must divide 60.
    pub slot_minutes: u32,
    /// Blended role score above which a worker becomes fixed (0–100).
    pub fixed_role_threshold: f64,
    /// Neutral motivation used in role classification (0–100).
    pub neutral_motivation: f64,
    /// Motivation used when a worker declares favourite products (0–100).
    pub favorite_motivation: f64,
    /// Slots of one task type per day a fixed worker keeps before rebalancing.
    pub rebalance_ceiling: u32,
    /// Task types a fixed worker may own per day.
    pub owned_type_cap: usize,
    pub dependency_gate: DependencyGate,
    pub dependency_scope: DependencyScope,
    pub role_rule: RoleRule,
    pub flow_weights: FlowWeights,
    /// How the flow rules combine: weighted sum, or strict rule order.
    pub flow_mode: EvaluationMode,
    /// Weight of task similarity against skill match when a fixed worker
    /// claims a new type after a previous task (0–1).
    pub similarity_weight: f64,
    /// Let a task continue on the worker's next working day.
    pub allow_cross_day_span: bool,
    /// Days to plan. `None` = until every instance completes.
    pub day_budget: Option<u32>,
    /// Hard cap on planned days.
    pub max_days: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 8,
            day_end_hour: 16,
            slot_minutes: 30,
            fixed_role_threshold: 70.0,
            neutral_motivation: 50.0,
            favorite_motivation: 80.0,
            rebalance_ceiling: 8,
            owned_type_cap: 2,
            dependency_gate: DependencyGate::default(),
            dependency_scope: DependencyScope::default(),
            role_rule: RoleRule::default(),
            flow_weights: FlowWeights::default(),
            flow_mode: EvaluationMode::Weighted,
            similarity_weight: 0.7,
            allow_cross_day_span: false,
            day_budget: None,
            max_days: 60,
        }
    }
}

impl PlannerConfig {
    /// Creates the default configuration (08:00–16:00, 30-minute slots).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the working day.
    pub fn with_day(mut self, start_hour: u32, end_hour: u32, slot_minutes: u32) -> Self {
        self.day_start_hour = start_hour;
        self.day_end_hour = end_hour;
        self.slot_minutes = slot_minutes;
        self
    }

    /// Sets the dependency gate policy.
    pub fn with_gate(mut self, gate: DependencyGate) -> Self {
        self.dependency_gate = gate;
        self
    }

    /// Sets the dependency scope.
    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.dependency_scope = scope;
        self
    }

    /// Sets the role rule.
    pub fn with_role_rule(mut self, rule: RoleRule) -> Self {
        self.role_rule = rule;
        self
    }

    /// Sets the day budget.
    pub fn with_day_budget(mut self, days: u32) -> Self {
        self.day_budget = Some(days);
        self
    }

    /// Allows tasks to span into the next working day.
    pub fn with_cross_day_span(mut self, allow: bool) -> Self {
        self.allow_cross_day_span = allow;
        self
    }

    /// Sets the rebalancing ceiling.
    pub fn with_rebalance_ceiling(mut self, slots: u32) -> Self {
        self.rebalance_ceiling = slots;
        self
    }

    /// Checks value ranges and internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                message: message.into(),
            }
        }

        if self.day_start_hour > 23 {
            return Err(invalid("day_start_hour", "must be 0-23"));
        }
        if self.day_end_hour > 24 || self.day_end_hour <= self.day_start_hour {
            return Err(invalid(
                "day_end_hour",
                format!("must be after day_start_hour ({}) and at most 24", self.day_start_hour),
            ));
        }
        if self.slot_minutes == 0 || 60 % self.slot_minutes != 0 {
            return Err(invalid("slot_minutes", "must be a positive divisor of 60"));
        }
        if !(0.0..=100.0).contains(&self.fixed_role_threshold) {
            return Err(invalid("fixed_role_threshold", "must be within 0-100"));
        }
        if self.owned_type_cap == 0 {
            return Err(invalid("owned_type_cap", "must be at least 1"));
        }
        if self.max_days == 0 {
            return Err(invalid("max_days", "must be at least 1"));
        }
        if self.day_budget == Some(0) {
            return Err(invalid("day_budget", "must be at least 1 when set"));
        }
        let w = &self.flow_weights;
        if [w.skill, w.continuity, w.favorite, w.advancement]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(invalid("flow_weights", "weights must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&self.similarity_weight) {
            return Err(invalid("similarity_weight", "must be within 0-1"));
        }
        if let DependencyGate::PartialProgress { min_fraction } = self.dependency_gate {
            if !(min_fraction > 0.0 && min_fraction <= 1.0) {
                return Err(invalid("dependency_gate", "min_fraction must be within (0, 1]"));
            }
        }
        if let RoleRule::BlendedWithFlowAffinity { min_affinity } = self.role_rule {
            if !(0.0..=1.0).contains(&min_affinity) {
                return Err(invalid("role_rule", "min_affinity must be within 0-1"));
            }
        }
        Ok(())
    }

    /// Number of slots in one working day.
    #[inline]
    pub fn slots_per_day(&self) -> u32 {
        (self.day_end_hour.saturating_sub(self.day_start_hour)) * 60 / self.slot_minutes.max(1)
    }

    /// Days the planner may simulate.
    pub fn effective_day_budget(&self) -> u32 {
        self.day_budget.unwrap_or(self.max_days).min(self.max_days)
    }

    /// Converts an `HH:MM` time to a slot index of the day.
    ///
    /// Times before the day starts map to slot 0; times at or after the end
    /// map to `slots_per_day` (never available).
    pub fn slot_from_time(&self, time: &str) -> Result<u32, ConfigError> {
        let bad = || ConfigError::InvalidTime(time.to_string());
        let (h, m) = time.trim().split_once(':').ok_or_else(bad)?;
        let hour: u32 = h.trim().parse().map_err(|_| bad())?;
        let minute: u32 = m.trim().parse().map_err(|_| bad())?;
        if hour > 24 || minute > 59 {
            return Err(bad());
        }
        let minutes = (hour * 60 + minute) as i64 - (self.day_start_hour * 60) as i64;
        if minutes <= 0 {
            return Ok(0);
        }
        let slot = (minutes as u32) / self.slot_minutes;
        Ok(slot.min(self.slots_per_day()))
    }

    /// Formats the start time of a slot as `HH:MM`.
    pub fn time_from_slot(&self, slot: u32) -> String {
        let total = self.day_start_hour * 60 + slot * self.slot_minutes;
        format!("{:02}:{:02}", total / 60, total % 60)
    }

    /// Converts a raw duration in seconds to whole slots (at least one).
    pub fn slots_for_seconds(&self, seconds: u64) -> u32 {
        let slot_seconds = u64::from(self.slot_minutes.max(1)) * 60;
        seconds.div_ceil(slot_seconds).max(1) as u32
    }
}
