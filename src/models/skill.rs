//! Skill dimensions and dense skill vectors.
//!
//! Skill names come from open-ended tabular headers, but scoring runs in a
//! tight loop. Names are therefore interned once into a [`SkillCatalog`],
//! and both worker proficiencies and task requirements are stored as dense
//! [`SkillVector`]s indexed by [`SkillId`].
//!
//! # Scale
//! All values live on a 0–100 scale. Fraction-scale input (0–1) must be
//! converted at import time via [`SkillVector::from_fractions`] or
//! [`SkillScale`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound of the skill scale.
pub const SKILL_SCALE_MAX: f64 = 100.0;

/// Dense index of a skill dimension within a [`SkillCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(pub usize);

/// Scale in which raw skill values are expressed on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillScale {
    /// 0–100 (optionally with a `%` suffix).
    #[default]
    Percent,
    /// 0.0–1.0.
    Fraction,
}

impl SkillScale {
    /// Converts a raw value to the 0–100 scale, clamping out-of-range input.
    pub fn normalize(self, raw: f64) -> f64 {
        let value = match self {
            SkillScale::Percent => raw,
            SkillScale::Fraction => raw * SKILL_SCALE_MAX,
        };
        value.clamp(0.0, SKILL_SCALE_MAX)
    }
}

/// Registry of skill dimension names.
///
/// Interning is append-only: a name keeps its [`SkillId`] for the lifetime
/// of the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SkillCatalog {
    names: Vec<String>,
    index: HashMap<String, SkillId>,
}

impl From<Vec<String>> for SkillCatalog {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<SkillCatalog> for Vec<String> {
    fn from(catalog: SkillCatalog) -> Self {
        catalog.names
    }
}

impl SkillCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from a list of names (duplicates collapse).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for name in names {
            catalog.intern(name);
        }
        catalog
    }

    /// Returns the id for `name`, registering it if unseen.
    pub fn intern(&mut self, name: impl Into<String>) -> SkillId {
        let name = name.into();
        let key = name.trim().to_string();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = SkillId(self.names.len());
        self.names.push(key.clone());
        self.index.insert(key, id);
        id
    }

    /// Looks up a registered skill.
    pub fn id(&self, name: &str) -> Option<SkillId> {
        self.index.get(name.trim()).copied()
    }

    /// Name of a skill dimension.
    pub fn name(&self, id: SkillId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Number of registered dimensions.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no dimension is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(id, name)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SkillId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (SkillId(i), n.as_str()))
    }
}

/// Dense vector of skill values indexed by [`SkillId`].
///
/// Entries beyond the stored length read as zero, so vectors built before
/// a catalog grew stay valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillVector {
    values: Vec<f64>,
}

impl SkillVector {
    /// Creates an all-zero vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from 0–1 values, scaling them to 0–100.
    pub fn from_fractions(values: &[(SkillId, f64)]) -> Self {
        let mut v = Self::new();
        for &(id, value) in values {
            v.set(id, SkillScale::Fraction.normalize(value));
        }
        v
    }

    /// Sets a value (clamped to 0–100).
    pub fn set(&mut self, id: SkillId, value: f64) {
        if self.values.len() <= id.0 {
            self.values.resize(id.0 + 1, 0.0);
        }
        self.values[id.0] = value.clamp(0.0, SKILL_SCALE_MAX);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, id: SkillId, value: f64) -> Self {
        self.set(id, value);
        self
    }

    /// Value for a dimension (0.0 when unset).
    #[inline]
    pub fn get(&self, id: SkillId) -> f64 {
        self.values.get(id.0).copied().unwrap_or(0.0)
    }

    /// Dense values (may be shorter than the catalog).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterates dimensions with a strictly positive value.
    pub fn positive(&self) -> impl Iterator<Item = (SkillId, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > 0.0)
            .map(|(i, &v)| (SkillId(i), v))
    }

    /// Whether every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut c = SkillCatalog::new();
        let a = c.intern("cutting");
        let b = c.intern("sewing");
        assert_eq!(c.intern(" cutting "), a);
        assert_ne!(a, b);
        assert_eq!(c.len(), 2);
        assert_eq!(c.name(b), Some("sewing"));
        assert_eq!(c.id("missing"), None);
    }

    #[test]
    fn test_vector_reads_zero_past_end() {
        let mut c = SkillCatalog::from_names(["a", "b", "c"]);
        let v = SkillVector::new().with(SkillId(0), 40.0);
        let late = c.intern("d");
        assert!((v.get(late) - 0.0).abs() < 1e-10);
        assert!((v.get(SkillId(0)) - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_clamping_and_fractions() {
        let v = SkillVector::new()
            .with(SkillId(0), 150.0)
            .with(SkillId(1), -3.0);
        assert!((v.get(SkillId(0)) - 100.0).abs() < 1e-10);
        assert!((v.get(SkillId(1)) - 0.0).abs() < 1e-10);

        let f = SkillVector::from_fractions(&[(SkillId(2), 0.75)]);
        assert!((f.get(SkillId(2)) - 75.0).abs() < 1e-10);
    }

    #[test]
    fn test_positive_skips_zeros() {
        let v = SkillVector::new().with(SkillId(0), 0.0).with(SkillId(3), 20.0);
        let pos: Vec<_> = v.positive().collect();
        assert_eq!(pos, vec![(SkillId(3), 20.0)]);
        assert!(!v.is_zero());
        assert!(SkillVector::new().is_zero());
    }

    #[test]
    fn test_catalog_serializes_as_names() {
        let c = SkillCatalog::from_names(["x", "y"]);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: SkillCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id("y"), Some(SkillId(1)));
    }
}
