//! Task definition model.
//!
//! A task definition is one recipe step of a product: it produces an output
//! code, takes a whole number of slots, needs a weighted mix of skills, and
//! may require the outputs of other steps of the same product.

use serde::{Deserialize, Serialize};

use super::{SkillId, SkillVector};

/// A recipe step template.
///
/// # Invariants
/// - `duration_slots >= 1`
/// - `requires` only names output codes of the same product and, together
///   with the other steps, forms a DAG (checked by [`crate::validation`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Output code, unique within the product.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Position in the product's task list (as authored).
    pub sequence: u32,
    /// Number of consecutive slots the task occupies.
    pub duration_slots: u32,
    /// Skill weights (0–100) the task asks for.
    pub requirements: SkillVector,
    /// Output codes that must be available before the task may start.
    pub requires: Vec<String>,
}

impl TaskDefinition {
    /// Creates a one-slot task with no requirements.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            sequence: 0,
            duration_slots: 1,
            requirements: SkillVector::new(),
            requires: Vec::new(),
        }
    }

    /// Sets the authored sequence index.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets the duration in slots.
    pub fn with_duration(mut self, slots: u32) -> Self {
        self.duration_slots = slots;
        self
    }

    /// Adds a skill requirement weight.
    pub fn with_skill(mut self, skill: SkillId, weight: f64) -> Self {
        self.requirements.set(skill, weight);
        self
    }

    /// Replaces the whole requirement vector.
    pub fn with_requirements(mut self, requirements: SkillVector) -> Self {
        self.requirements = requirements;
        self
    }

    /// Adds a prerequisite output code.
    pub fn with_requirement(mut self, code: impl Into<String>) -> Self {
        self.requires.push(code.into());
        self
    }

    /// Whether the task has no prerequisites.
    pub fn is_entry_point(&self) -> bool {
        self.requires.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let t = TaskDefinition::new("SOL", "Cut sole")
            .with_sequence(3)
            .with_duration(2)
            .with_skill(SkillId(1), 80.0)
            .with_requirement("LEATHER");

        assert_eq!(t.code, "SOL");
        assert_eq!(t.name, "Cut sole");
        assert_eq!(t.sequence, 3);
        assert_eq!(t.duration_slots, 2);
        assert!((t.requirements.get(SkillId(1)) - 80.0).abs() < 1e-10);
        assert_eq!(t.requires, vec!["LEATHER".to_string()]);
        assert!(!t.is_entry_point());
    }

    #[test]
    fn test_task_defaults() {
        let t = TaskDefinition::new("A", "a");
        assert_eq!(t.duration_slots, 1);
        assert!(t.is_entry_point());
        assert!(t.requirements.is_zero());
    }
}
