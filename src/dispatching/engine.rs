//! Rule engine for multi-criteria selection.
//!
//! Composes selection rules in one of two evaluation modes, chosen by
//! `PlannerConfig::flow_mode`. Ties always keep the earlier candidate, so
//! the candidate order decides between equally scored instances.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rules::{Advancement, Continuity, Favorite, SkillMatch};
use super::{Candidate, SelectionContext, SelectionRule};
use crate::config::FlowWeights;

/// How multiple rules are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Rules in order; a later rule only breaks ties of the earlier ones.
    Sequential,
    /// Weighted sum of all rule scores.
    #[default]
    Weighted,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn SelectionRule>,
    weight: f64,
}

/// A composable rule engine for candidate selection.
///
/// # Example
/// ```
/// use u_workforce::dispatching::{EvaluationMode, RuleEngine};
/// use u_workforce::dispatching::rules;
///
/// let engine = RuleEngine::new()
///     .with_mode(EvaluationMode::Sequential)
///     .with_rule(rules::Advancement)
///     .with_rule(rules::SkillMatch);
/// assert_eq!(engine.len(), 2);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty weighted engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Weighted,
            epsilon: 1e-9,
        }
    }

    /// The flow-worker engine: skill, continuity, favourite and advancement
    /// weighted by `weights`. A zero weight leaves the rule out.
    pub fn from_weights(weights: &FlowWeights) -> Self {
        let mut engine = Self::new();
        if weights.skill > 0.0 {
            engine = engine.with_weighted_rule(SkillMatch, weights.skill);
        }
        if weights.continuity > 0.0 {
            engine = engine.with_weighted_rule(Continuity, weights.continuity);
        }
        if weights.favorite > 0.0 {
            engine = engine.with_weighted_rule(Favorite, weights.favorite);
        }
        if weights.advancement > 0.0 {
            engine = engine.with_weighted_rule(Advancement, weights.advancement);
        }
        engine
    }

    /// Adds a rule (weight 1.0).
    pub fn with_rule<R: SelectionRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 1.0)
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: SelectionRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the index of the best candidate; ties keep the earlier one.
    pub fn select_best(&self, candidates: &[Candidate<'_>], context: &SelectionContext<'_>) -> Option<usize> {
        match self.mode {
            EvaluationMode::Sequential => {
                let mut best: Option<usize> = None;
                for i in 0..candidates.len() {
                    match best {
                        Some(b) if self.compare_sequential(&candidates[i], &candidates[b], context) != Ordering::Greater => {}
                        _ => best = Some(i),
                    }
                }
                best
            }
            EvaluationMode::Weighted => {
                let mut best: Option<(usize, f64)> = None;
                for (i, c) in candidates.iter().enumerate() {
                    let score = self.weighted_score(c, context);
                    match best {
                        Some((_, b)) if score <= b + self.epsilon => {}
                        _ => best = Some((i, score)),
                    }
                }
                best.map(|(i, _)| i)
            }
        }
    }

    /// Weighted sum of all rule scores.
    pub fn weighted_score(&self, candidate: &Candidate<'_>, context: &SelectionContext<'_>) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(candidate, context) * wr.weight)
            .sum()
    }

    /// `Greater` if `a` beats `b` on the first rule that separates them.
    fn compare_sequential(&self, a: &Candidate<'_>, b: &Candidate<'_>, context: &SelectionContext<'_>) -> Ordering {
        for wr in &self.rules {
            let score_a = wr.rule.evaluate(a, context);
            let score_b = wr.rule.evaluate(b, context);
            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyScope;
    use crate::dispatching::rules;
    use crate::models::{Order, Product, ProductCatalog, SkillId, SlotTime, TaskDefinition, Worker};
    use crate::planning::expander::{expand, Expansion};
    use crate::planning::recipe::build_recipes;

    fn expansion() -> Expansion {
        let c = ProductCatalog::new()
            .with_product(
                Product::new("Boot")
                    .with_task(TaskDefinition::new("SOL", "Sole").with_skill(SkillId(0), 100.0))
                    .with_task(TaskDefinition::new("ASM", "Assemble").with_requirement("SOL")),
            )
            .with_product(
                Product::new("Belt").with_task(TaskDefinition::new("CUT", "Cut").with_skill(SkillId(1), 100.0)),
            );
        let r = build_recipes(&c).unwrap();
        expand(&c, &r, &Order::new().with("Boot", 1).with("Belt", 1), DependencyScope::PerUnit).unwrap()
    }

    fn candidates(e: &Expansion) -> Vec<Candidate<'_>> {
        e.instances.iter().map(|i| Candidate::new(i, e.task_type(i))).collect()
    }

    #[test]
    fn test_weighted_prefers_skill() {
        let e = expansion();
        let cands = candidates(&e);
        let w = Worker::new("W").with_skill(SkillId(1), 90.0);
        let ctx = SelectionContext::for_worker(&w, SlotTime::new(0, 0));
        let engine = RuleEngine::from_weights(&FlowWeights::default());
        let best = engine.select_best(&cands, &ctx).unwrap();
        assert_eq!(cands[best].instance.label(), "Belt#1:CUT");
    }

    #[test]
    fn test_weighted_blend() {
        let e = expansion();
        let cands = candidates(&e);
        let w = Worker::new("W").with_skill(SkillId(1), 40.0).with_favorite("Boot");
        let ctx = SelectionContext::for_worker(&w, SlotTime::new(0, 5)).with_previous_product(Some("Boot"));
        let engine = RuleEngine::from_weights(&FlowWeights::default());
        // Boot#1:ASM: 0·0.5 + 100·0.2 + 100·0.15 + 100·0.15 = 50
        // Belt#1:CUT: 40·0.5 = 20
        let asm = cands.iter().find(|c| c.instance.label() == "Boot#1:ASM").unwrap();
        assert!((engine.weighted_score(asm, &ctx) - 50.0).abs() < 1e-10);
        let best = engine.select_best(&cands, &ctx).unwrap();
        assert_eq!(cands[best].instance.label(), "Boot#1:ASM");
    }

    #[test]
    fn test_ties_keep_earlier() {
        let e = expansion();
        let cands = candidates(&e);
        let w = Worker::new("W");
        let ctx = SelectionContext::for_worker(&w, SlotTime::new(0, 0));
        let engine = RuleEngine::new().with_rule(rules::Continuity);
        assert_eq!(engine.select_best(&cands, &ctx), Some(0));
        let sequential = engine.with_mode(EvaluationMode::Sequential);
        assert_eq!(sequential.select_best(&cands, &ctx), Some(0));
    }

    #[test]
    fn test_sequential_mode() {
        let e = expansion();
        let cands = candidates(&e);
        let w = Worker::new("W").with_skill(SkillId(0), 10.0).with_skill(SkillId(1), 90.0);
        let ctx = SelectionContext::for_worker(&w, SlotTime::new(0, 0));
        let engine = RuleEngine::new()
            .with_mode(EvaluationMode::Sequential)
            .with_rule(rules::Advancement)
            .with_rule(rules::SkillMatch);
        // ASM is deepest
        let best = engine.select_best(&cands, &ctx).unwrap();
        assert_eq!(cands[best].instance.label(), "Boot#1:ASM");

        // SOL and CUT tie on advancement, skill breaks it
        let shallow: Vec<Candidate<'_>> = cands
            .iter()
            .filter(|c| c.instance.code != "ASM")
            .cloned()
            .collect();
        let best = engine.select_best(&shallow, &ctx).unwrap();
        assert_eq!(shallow[best].instance.label(), "Belt#1:CUT");
    }

    #[test]
    fn test_zero_weight_drops_rule() {
        let weights = FlowWeights {
            favorite: 0.0,
            ..FlowWeights::default()
        };
        let engine = RuleEngine::from_weights(&weights);
        assert_eq!(engine.len(), 3);
        assert!(!format!("{engine:?}").contains("FAV"));
    }

    #[test]
    fn test_empty_candidates() {
        let w = Worker::new("W");
        let ctx = SelectionContext::for_worker(&w, SlotTime::new(0, 0));
        let engine = RuleEngine::from_weights(&FlowWeights::default());
        assert!(engine.select_best(&[], &ctx).is_none());
        assert!(engine.with_mode(EvaluationMode::Sequential).select_best(&[], &ctx).is_none());
    }
}
