//! Selection rules and rule engine for flow-role workers.
//!
//! A flow worker does not own task types; at every free slot it picks the
//! eligible instance with the best blended score over several criteria
//! (skill match, product continuity, favourite products, recipe
//! advancement). Each criterion is a [`SelectionRule`]; a [`RuleEngine`]
//! combines them.
//!
//! # Usage
//!
//! ```
//! use u_workforce::config::FlowWeights;
//! use u_workforce::dispatching::RuleEngine;
//!
//! let engine = RuleEngine::from_weights(&FlowWeights::default());
//! assert_eq!(engine.len(), 4);
//! // let best = engine.select_best(&candidates, &context);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::{Candidate, SelectionContext};
pub use engine::{EvaluationMode, RuleEngine};

use std::fmt::Debug;

/// Score returned by a selection rule.
///
/// Higher scores = preferred. Built-in rules score on the 0–100 scale.
pub type RuleScore = f64;

/// A rule that scores one candidate instance for one worker.
///
/// # Score Convention
/// **Higher score = higher priority.** Rules should return larger values
/// for candidates the worker should take first.
pub trait SelectionRule: Send + Sync + Debug {
    /// Rule name (e.g., "SKILL", "CONT").
    fn name(&self) -> &'static str;

    /// Scores a candidate in the given context.
    fn evaluate(&self, candidate: &Candidate<'_>, context: &SelectionContext<'_>) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
