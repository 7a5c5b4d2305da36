//! Skill matching and role classification.
//!
//! # Skill Match
//! ```text
//! score = Σ skill[s] · w(s) / Σ w(s),   w(s) = req[s] / 100,   over req[s] > 0
//! ```
//! A requirement-weighted mean of the worker's skill levels, on the 0–100
//! scale. Tasks without positive requirements score 0.
//!
//! # Task Similarity
//! ```text
//! sim(a, b) = mean over s with a[s] > 0 and b[s] > 0 of (100 - |a[s] - b[s]|)
//! ```
//!
//! # Role Classification
//! ```text
//! final = avg_skill · 0.6 + motivation · 0.2 + preference · 0.2
//! ```
//! where `avg_skill` is the mean skill match over every catalogued task,
//! `motivation` is the neutral or favourite-product motivation, and
//! `preference` is 100 for a stated fixed preference and 0 otherwise. A
//! worker is fixed iff `final` exceeds the configured threshold.

use serde::{Deserialize, Serialize};

use crate::config::{PlannerConfig, RoleRule};
use crate::models::{ProductCatalog, RolePreference, SkillVector, Worker, WorkerRole, SKILL_SCALE_MAX};

const SKILL_WEIGHT: f64 = 0.6;
const MOTIVATION_WEIGHT: f64 = 0.2;
const PREFERENCE_WEIGHT: f64 = 0.2;

/// Requirement-weighted skill match of a worker for a task (0–100).
///
/// Pure function of its inputs.
pub fn skill_match(skills: &SkillVector, requirements: &SkillVector) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (id, req) in requirements.positive() {
        let w = req / SKILL_SCALE_MAX;
        weighted += skills.get(id) * w;
        total += w;
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Similarity of two tasks' skill requirements (0–100).
///
/// Mean of `100 − |a[s] − b[s]|` over the skills both tasks require; 0 when
/// they share none.
pub fn task_similarity(a: &SkillVector, b: &SkillVector) -> f64 {
    let (sum, shared) = a
        .positive()
        .filter(|&(id, _)| b.get(id) > 0.0)
        .fold((0.0, 0usize), |(sum, n), (id, level)| {
            (sum + SKILL_SCALE_MAX - (level - b.get(id)).abs(), n + 1)
        });
    if shared == 0 {
        0.0
    } else {
        sum / shared as f64
    }
}

/// Outcome of classifying one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssessment {
    pub worker: String,
    /// Mean skill match over the catalogue.
    pub avg_skill: f64,
    pub motivation: f64,
    pub preference: f64,
    /// Blended score compared against the threshold.
    pub score: f64,
    pub role: WorkerRole,
    /// Whether the flow-affinity override decided the role.
    pub forced_by_affinity: bool,
}

/// Classifies workers into fixed and flow roles.
#[derive(Debug, Clone)]
pub struct RoleClassifier<'a> {
    config: &'a PlannerConfig,
    catalogue: &'a ProductCatalog,
}

impl<'a> RoleClassifier<'a> {
    pub fn new(config: &'a PlannerConfig, catalogue: &'a ProductCatalog) -> Self {
        Self { config, catalogue }
    }

    /// Mean skill match of a worker over every task of every product.
    pub fn average_skill(&self, worker: &Worker) -> f64 {
        let (sum, n) = self
            .catalogue
            .all_tasks()
            .fold((0.0, 0usize), |(sum, n), t| {
                (sum + skill_match(&worker.skills, &t.requirements), n + 1)
            });
        if n == 0 {
            0.0
        } else {
            sum / n as f64
        }
    }

    /// Classifies one worker.
    pub fn classify(&self, worker: &Worker) -> RoleAssessment {
        let avg_skill = self.average_skill(worker);
        let motivation = if worker.has_favorites() {
            self.config.favorite_motivation
        } else {
            self.config.neutral_motivation
        };
        let preference = match worker.preference {
            RolePreference::Fixed => SKILL_SCALE_MAX,
            RolePreference::Flow => 0.0,
        };
        let score =
            avg_skill * SKILL_WEIGHT + motivation * MOTIVATION_WEIGHT + preference * PREFERENCE_WEIGHT;

        let forced_by_affinity = match self.config.role_rule {
            RoleRule::Blended => false,
            RoleRule::BlendedWithFlowAffinity { min_affinity } => {
                worker.flow_affinity.is_some_and(|a| a >= min_affinity)
            }
        };
        let role = if !forced_by_affinity && score > self.config.fixed_role_threshold {
            WorkerRole::Fixed
        } else {
            WorkerRole::Flow
        };

        RoleAssessment {
            worker: worker.id.clone(),
            avg_skill,
            motivation,
            preference,
            score,
            role,
            forced_by_affinity,
        }
    }

    /// Classifies every worker, preserving order.
    pub fn classify_all<'w>(&self, workers: impl IntoIterator<Item = &'w Worker>) -> Vec<RoleAssessment> {
        workers.into_iter().map(|w| self.classify(w)).collect()
    }
}
