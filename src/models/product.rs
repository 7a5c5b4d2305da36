//! Products and the product catalogue.

use serde::{Deserialize, Serialize};

use super::TaskDefinition;

/// A product: a name and its ordered recipe steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product name.
    pub name: String,
    /// Recipe steps in authored order.
    pub tasks: Vec<TaskDefinition>,
}

impl Product {
    /// Creates a product with no tasks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Appends a task, assigning its sequence index if left at zero.
    pub fn with_task(mut self, mut task: TaskDefinition) -> Self {
        if task.sequence == 0 {
            task.sequence = self.tasks.len() as u32;
        }
        self.tasks.push(task);
        self
    }

    /// Finds a task by output code.
    pub fn task(&self, code: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.code == code)
    }

    /// Whether any task produces `code`.
    pub fn produces(&self, code: &str) -> bool {
        self.task(code).is_some()
    }
}

/// Ordered collection of products, immutable during a planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product (builder form).
    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    /// Adds a product.
    pub fn push(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Looks up a product by name.
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Position of a product in catalogue order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.products.iter().position(|p| p.name == name)
    }

    /// Products in catalogue order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Iterates every task of every product.
    pub fn all_tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.products.iter().flat_map(|p| p.tasks.iter())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
