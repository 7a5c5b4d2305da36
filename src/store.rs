//! Master data store.
//!
//! Bundles the read-only inputs of a planning run: the skill catalogue, the
//! product catalogue and the worker roster. Planning borrows a `MasterData`
//! and never mutates it; all run state lives in the engine.

use serde::{Deserialize, Serialize};

use crate::models::{Product, ProductCatalog, SkillCatalog, Worker};
use crate::validation::{validate_catalogue, validate_roster, ValidationError};

/// Read-only master data for planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterData {
    /// Skill dimensions; ids index every [`SkillVector`](crate::models::SkillVector).
    pub skills: SkillCatalog,
    /// Product recipes.
    pub products: ProductCatalog,
    /// Worker roster in declaration order.
    pub workers: Vec<Worker>,
}

impl MasterData {
    /// Creates empty master data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the skill catalogue.
    pub fn with_skills(mut self, skills: SkillCatalog) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the product catalogue.
    pub fn with_products(mut self, products: ProductCatalog) -> Self {
        self.products = products;
        self
    }

    /// Adds a product.
    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    /// Adds a worker.
    pub fn with_worker(mut self, worker: Worker) -> Self {
        self.workers.push(worker);
        self
    }

    /// Adds several workers.
    pub fn with_workers(mut self, workers: impl IntoIterator<Item = Worker>) -> Self {
        self.workers.extend(workers);
        self
    }

    /// Looks up a worker by id.
    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Validates catalogue and roster, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Err(e) = validate_catalogue(&self.products) {
            errors.extend(e);
        }
        if let Err(e) = validate_roster(&self.workers) {
            errors.extend(e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDefinition;

    #[test]
    fn test_builder_and_lookup() {
        let data = MasterData::new()
            .with_skills(SkillCatalog::from_names(["cut"]))
            .with_product(Product::new("P").with_task(TaskDefinition::new("A", "a")))
            .with_workers([Worker::new("W1"), Worker::new("W2")]);
        assert_eq!(data.products.len(), 1);
        assert_eq!(data.worker("W2").map(|w| w.id.as_str()), Some("W2"));
        assert!(data.worker("W3").is_none());
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_both_sources() {
        let data = MasterData::new()
            .with_product(Product::new("Empty"))
            .with_worker(Worker::new("W1"))
            .with_worker(Worker::new("W1"));
        assert_eq!(data.validate().unwrap_err().len(), 2);
    }
}
