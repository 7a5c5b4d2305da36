//! Built-in selection rules.
//!
//! | Rule | Score |
//! |------|-------|
//! | [`SkillMatch`] | requirement-weighted skill match of the worker |
//! | [`Continuity`] | 100 when the product equals the previous assignment's |
//! | [`Favorite`] | `100 · (n − rank) / n` for the product's favourite rank |
//! | [`Advancement`] | `100 · depth / max_depth` of the recipe step |
//!
//! # Score Convention
//! All rules return higher scores for preferred candidates, on 0–100.

use super::{Candidate, RuleScore, SelectionContext, SelectionRule};
use crate::planning::scoring::skill_match;

/// Skill match of the worker for the candidate's task type.
#[derive(Debug, Clone, Copy)]
pub struct SkillMatch;

impl SelectionRule for SkillMatch {
    fn name(&self) -> &'static str {
        "SKILL"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, context: &SelectionContext<'_>) -> RuleScore {
        skill_match(&context.worker.skills, &candidate.task_type.requirements)
    }

    fn description(&self) -> &'static str {
        "Skill Match"
    }
}

/// Rewards staying on the product of the previous assignment.
#[derive(Debug, Clone, Copy)]
pub struct Continuity;

impl SelectionRule for Continuity {
    fn name(&self) -> &'static str {
        "CONT"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, context: &SelectionContext<'_>) -> RuleScore {
        match context.previous_product {
            Some(p) if p == candidate.instance.product => 100.0,
            _ => 0.0,
        }
    }

    fn description(&self) -> &'static str {
        "Product Continuity"
    }
}

/// Rewards products the worker lists as favourites, most-preferred first.
#[derive(Debug, Clone, Copy)]
pub struct Favorite;

impl SelectionRule for Favorite {
    fn name(&self) -> &'static str {
        "FAV"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, context: &SelectionContext<'_>) -> RuleScore {
        let favorites = &context.worker.favorite_products;
        match context.worker.favorite_rank(&candidate.instance.product) {
            Some(rank) => 100.0 * (favorites.len() - rank) as f64 / favorites.len() as f64,
            None => 0.0,
        }
    }

    fn description(&self) -> &'static str {
        "Favourite Product"
    }
}

/// Rewards steps deep in the recipe, pushing started units toward completion.
#[derive(Debug, Clone, Copy)]
pub struct Advancement;

impl SelectionRule for Advancement {
    fn name(&self) -> &'static str {
        "ADV"
    }

    fn evaluate(&self, candidate: &Candidate<'_>, _context: &SelectionContext<'_>) -> RuleScore {
        let max = candidate.task_type.max_depth;
        if max == 0 {
            0.0
        } else {
            100.0 * candidate.instance.depth as f64 / max as f64
        }
    }

    fn description(&self) -> &'static str {
        "Recipe Advancement"
    }
}
