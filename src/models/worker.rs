//! Worker model.
//!
//! Workers are the only resource kind the planner assigns. Each worker has
//! a skill vector, a stated role preference, optional favourite products
//! and the time of day from which they are available.

use serde::{Deserialize, Serialize};

use super::{SkillId, SkillVector};

/// The role a worker says they prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePreference {
    /// Repeat one or two task types.
    #[default]
    Fixed,
    /// Follow products through their task sequence.
    Flow,
}

/// Role a worker is given for one planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Specialises in at most a few task types per day.
    Fixed,
    /// Picks work by skill, continuity, favourites and advancement.
    Flow,
}

/// A worker profile (master data, read-only during planning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique worker identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Proficiency per skill dimension (0–100).
    pub skills: SkillVector,
    /// Favourite products, most preferred first.
    pub favorite_products: Vec<String>,
    /// Stated role preference.
    pub preference: RolePreference,
    /// Continuous flow affinity (0.0–1.0), when the source provides one.
    pub flow_affinity: Option<f64>,
    /// Earliest availability as `HH:MM`. `None` = from the start of the day.
    pub start_time: Option<String>,
    /// Whether the worker takes part in a run unless explicitly deselected.
    pub selected: bool,
}

impl Worker {
    /// Creates a selected worker with no skills and a fixed preference.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            skills: SkillVector::new(),
            favorite_products: Vec::new(),
            preference: RolePreference::Fixed,
            flow_affinity: None,
            start_time: None,
            selected: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a skill level (0–100).
    pub fn with_skill(mut self, skill: SkillId, level: f64) -> Self {
        self.skills.set(skill, level);
        self
    }

    /// Replaces the whole skill vector.
    pub fn with_skills(mut self, skills: SkillVector) -> Self {
        self.skills = skills;
        self
    }

    /// Appends a favourite product (lower priority than those already listed).
    pub fn with_favorite(mut self, product: impl Into<String>) -> Self {
        self.favorite_products.push(product.into());
        self
    }

    /// Sets the stated preference.
    pub fn with_preference(mut self, preference: RolePreference) -> Self {
        self.preference = preference;
        self
    }

    /// Sets the continuous flow affinity (clamped to 0–1).
    pub fn with_flow_affinity(mut self, affinity: f64) -> Self {
        self.flow_affinity = Some(affinity.clamp(0.0, 1.0));
        self
    }

    /// Sets the availability start time (`HH:MM`).
    pub fn with_start_time(mut self, time: impl Into<String>) -> Self {
        self.start_time = Some(time.into());
        self
    }

    /// Marks the worker as deselected by default.
    pub fn deselected(mut self) -> Self {
        self.selected = false;
        self
    }

    /// Rank of a product in the favourites list (0 = most preferred).
    pub fn favorite_rank(&self, product: &str) -> Option<usize> {
        self.favorite_products.iter().position(|p| p == product)
    }

    /// Whether the worker declared any favourite product.
    pub fn has_favorites(&self) -> bool {
        !self.favorite_products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_builder() {
        let w = Worker::new("W1")
            .with_name("Ahmad")
            .with_skill(SkillId(0), 90.0)
            .with_favorite("Boot")
            .with_favorite("Sandal")
            .with_preference(RolePreference::Flow)
            .with_flow_affinity(1.4)
            .with_start_time("09:30");

        assert_eq!(w.id, "W1");
        assert_eq!(w.name, "Ahmad");
        assert!((w.skills.get(SkillId(0)) - 90.0).abs() < 1e-10);
        assert_eq!(w.favorite_rank("Sandal"), Some(1));
        assert_eq!(w.favorite_rank("Clog"), None);
        assert_eq!(w.preference, RolePreference::Flow);
        assert_eq!(w.flow_affinity, Some(1.0));
        assert_eq!(w.start_time.as_deref(), Some("09:30"));
        assert!(w.selected);
    }

    #[test]
    fn test_worker_defaults() {
        let w = Worker::new("W2").deselected();
        assert_eq!(w.name, "W2");
        assert_eq!(w.preference, RolePreference::Fixed);
        assert!(!w.has_favorites());
        assert!(!w.selected);
    }
}
