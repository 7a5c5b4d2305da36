//! Recipe graph builder.
//!
//! Turns each validated product into a [`Recipe`]: its tasks in a stable
//! topological order plus the dependency depth of every task.
//!
//! # Algorithm
//! Kahn's algorithm with a ready set ordered by `(sequence, declaration
//! index)`, so independent tasks keep their catalogue order. Depth is the
//! length of the longest prerequisite chain, computed in topological order.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks", CACM 5(11)

use std::collections::{BTreeSet, HashMap};

use crate::models::{Product, ProductCatalog};
use crate::validation::{validate_catalogue, ValidationError};

/// One product's recipe in dependency order.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    /// Product name.
    pub product: String,
    /// Task indices (into `Product::tasks`) in topological order.
    pub order: Vec<usize>,
    /// Depth per task index; entry points have depth 0.
    pub depth: Vec<u32>,
    /// Largest depth in the recipe.
    pub max_depth: u32,
}

impl Recipe {
    /// Position of a task index within the topological order.
    pub fn position(&self, task: usize) -> Option<usize> {
        self.order.iter().position(|&t| t == task)
    }
}

/// Validates the catalogue and builds one recipe per product, in catalogue order.
///
/// # Errors
/// Every structural problem found by [`validate_catalogue`].
pub fn build_recipes(catalogue: &ProductCatalog) -> Result<Vec<Recipe>, Vec<ValidationError>> {
    validate_catalogue(catalogue)?;
    Ok(catalogue.products().iter().map(build_recipe).collect())
}

/// Builds the recipe of a product already known to be acyclic.
fn build_recipe(product: &Product) -> Recipe {
    let n = product.tasks.len();
    let index: HashMap<&str, usize> = product
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.code.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, task) in product.tasks.iter().enumerate() {
        for req in &task.requires {
            if let Some(&p) = index.get(req.as_str()) {
                in_degree[i] += 1;
                dependents[p].push(i);
            }
        }
    }

    let mut ready: BTreeSet<(u32, usize)> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(|i| (product.tasks[i].sequence, i))
        .collect();
    let mut order = Vec::with_capacity(n);
    let mut depth = vec![0u32; n];

    while let Some(first) = ready.pop_first() {
        let (_, i) = first;
        order.push(i);
        for &d in &dependents[i] {
            depth[d] = depth[d].max(depth[i] + 1);
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                ready.insert((product.tasks[d].sequence, d));
            }
        }
    }

    let max_depth = depth.iter().copied().max().unwrap_or(0);
    Recipe {
        product: product.name.clone(),
        order,
        depth,
        max_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDefinition;

    fn diamond() -> Product {
        // D needs B and C, both need A. Declared out of order.
        Product::new("Diamond")
            .with_task(TaskDefinition::new("D", "d").with_sequence(4).with_requirement("B").with_requirement("C"))
            .with_task(TaskDefinition::new("C", "c").with_sequence(3).with_requirement("A"))
            .with_task(TaskDefinition::new("B", "b").with_sequence(2).with_requirement("A"))
            .with_task(TaskDefinition::new("A", "a").with_sequence(1))
    }

    fn codes(product: &Product, recipe: &Recipe) -> Vec<String> {
        recipe.order.iter().map(|&i| product.tasks[i].code.clone()).collect()
    }

    #[test]
    fn test_topological_order() {
        let p = diamond();
        let recipes = build_recipes(&ProductCatalog::new().with_product(p.clone())).unwrap();
        assert_eq!(codes(&p, &recipes[0]), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_depths() {
        let p = diamond();
        let r = &build_recipes(&ProductCatalog::new().with_product(p.clone())).unwrap()[0];
        let depth_of = |code: &str| r.depth[p.tasks.iter().position(|t| t.code == code).unwrap()];
        assert_eq!(depth_of("A"), 0);
        assert_eq!(depth_of("B"), 1);
        assert_eq!(depth_of("C"), 1);
        assert_eq!(depth_of("D"), 2);
        assert_eq!(r.max_depth, 2);
    }

    #[test]
    fn test_independent_tasks_keep_sequence() {
        let p = Product::new("Flat")
            .with_task(TaskDefinition::new("X", "x").with_sequence(2))
            .with_task(TaskDefinition::new("Y", "y").with_sequence(1))
            .with_task(TaskDefinition::new("Z", "z").with_sequence(1));
        let r = &build_recipes(&ProductCatalog::new().with_product(p.clone())).unwrap()[0];
        // Same sequence → declaration order
        assert_eq!(codes(&p, r), vec!["Y", "Z", "X"]);
        assert_eq!(r.max_depth, 0);
        assert_eq!(r.position(0), Some(2));
    }

    #[test]
    fn test_invalid_catalogue_rejected() {
        let p = Product::new("Loop")
            .with_task(TaskDefinition::new("A", "a").with_requirement("B"))
            .with_task(TaskDefinition::new("B", "b").with_requirement("A"));
        assert!(build_recipes(&ProductCatalog::new().with_product(p)).is_err());
    }
}
