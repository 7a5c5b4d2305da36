//! Input validation for product recipes and worker rosters.
//!
//! Checks structural integrity of master data before planning. Detects:
//! - Duplicate product names, output codes and worker ids; blank worker ids
//! - Products without tasks and tasks with a zero duration
//! - Requirements naming unknown output codes, or codes of another product
//! - Circular requirements (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{Product, ProductCatalog, Worker};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two products, tasks or workers share the same identifier.
    DuplicateId,
    /// A worker has a blank id.
    EmptyId,
    /// A product has no tasks.
    EmptyProduct,
    /// A task has a zero duration.
    InvalidDuration,
    /// A requirement names an output code no product defines.
    UnknownRequirement,
    /// A requirement names an output code of a different product.
    CrossProductRequirement,
    /// Requirements contain a cycle.
    CyclicRequirement,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates every product of a catalogue.
///
/// Checks:
/// 1. No duplicate product names
/// 2. Every product has at least one task
/// 3. No duplicate output codes within a product
/// 4. Every task takes at least one slot
/// 5. Every requirement names an output code of the same product
/// 6. No circular requirements
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalogue(catalogue: &ProductCatalog) -> ValidationResult {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for product in catalogue.products() {
        if !names.insert(product.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate product name: {}", product.name),
            ));
        }
    }

    // code → owning products, to tell cross-product from unknown references
    let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
    for product in catalogue.products() {
        for task in &product.tasks {
            owners
                .entry(task.code.as_str())
                .or_default()
                .push(product.name.as_str());
        }
    }

    for product in catalogue.products() {
        validate_product(product, &owners, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_product(
    product: &Product,
    owners: &HashMap<&str, Vec<&str>>,
    errors: &mut Vec<ValidationError>,
) {
    if product.tasks.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyProduct,
            format!("Product '{}' has no tasks", product.name),
        ));
        return;
    }

    let mut codes = HashSet::new();
    for task in &product.tasks {
        if !codes.insert(task.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!(
                    "Duplicate output code '{}' in product '{}'",
                    task.code, product.name
                ),
            ));
        }
        if task.duration_slots == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Task '{}' of product '{}' has a zero duration",
                    task.code, product.name
                ),
            ));
        }
    }

    for task in &product.tasks {
        for req in &task.requires {
            if codes.contains(req.as_str()) {
                continue;
            }
            match owners.get(req.as_str()) {
                Some(others) => errors.push(ValidationError::new(
                    ValidationErrorKind::CrossProductRequirement,
                    format!(
                        "Task '{}' of product '{}' requires '{}', which belongs to {}",
                        task.code,
                        product.name,
                        req,
                        others.join(", ")
                    ),
                )),
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownRequirement,
                    format!(
                        "Task '{}' of product '{}' requires unknown output '{}'",
                        task.code, product.name, req
                    ),
                )),
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(product) {
        errors.push(cycle_err);
    }
}

/// Validates a worker roster: ids must be unique and non-empty.
pub fn validate_roster(workers: &[Worker]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();
    for w in workers {
        if w.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                format!("Worker '{}' has an empty id", w.name),
            ));
        } else if !ids.insert(w.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate worker ID: {}", w.id),
            ));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in a product's requirement graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(product: &Product) -> Option<ValidationError> {
    // Adjacency list: prerequisite code → dependent codes
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in &product.tasks {
        for req in &task.requires {
            adj.entry(req.as_str()).or_default().push(task.code.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    // Declaration order keeps the reported node deterministic
    for task in &product.tasks {
        let node = task.code.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicRequirement,
                format!(
                    "Circular requirement in product '{}' involving output '{node}'",
                    product.name
                ),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDefinition;

    fn shoe() -> Product {
        Product::new("Shoe")
            .with_task(TaskDefinition::new("SOLE", "Cut sole"))
            .with_task(TaskDefinition::new("UPPER", "Sew upper"))
            .with_task(
                TaskDefinition::new("SHOE", "Assemble")
                    .with_requirement("SOLE")
                    .with_requirement("UPPER"),
            )
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_catalogue() {
        let c = ProductCatalog::new().with_product(shoe());
        assert!(validate_catalogue(&c).is_ok());
    }

    #[test]
    fn test_duplicate_product_name() {
        let c = ProductCatalog::new().with_product(shoe()).with_product(shoe());
        assert!(kinds(validate_catalogue(&c)).contains(&ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_duplicate_output_code() {
        let p = Product::new("P")
            .with_task(TaskDefinition::new("A", "a"))
            .with_task(TaskDefinition::new("A", "again"));
        let c = ProductCatalog::new().with_product(p);
        let errors = validate_catalogue(&c).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("output code")));
    }

    #[test]
    fn test_empty_product() {
        let c = ProductCatalog::new().with_product(Product::new("Nothing"));
        assert_eq!(
            kinds(validate_catalogue(&c)),
            vec![ValidationErrorKind::EmptyProduct]
        );
    }

    #[test]
    fn test_zero_duration() {
        let p = Product::new("P").with_task(TaskDefinition::new("A", "a").with_duration(0));
        let c = ProductCatalog::new().with_product(p);
        assert!(kinds(validate_catalogue(&c)).contains(&ValidationErrorKind::InvalidDuration));
    }

    #[test]
    fn test_unknown_requirement() {
        let p = Product::new("P").with_task(TaskDefinition::new("A", "a").with_requirement("GHOST"));
        let c = ProductCatalog::new().with_product(p);
        assert_eq!(
            kinds(validate_catalogue(&c)),
            vec![ValidationErrorKind::UnknownRequirement]
        );
    }

    #[test]
    fn test_cross_product_requirement() {
        let bag = Product::new("Bag").with_task(TaskDefinition::new("STRAP", "Strap").with_requirement("SOLE"));
        let c = ProductCatalog::new().with_product(shoe()).with_product(bag);
        let errors = validate_catalogue(&c).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::CrossProductRequirement);
        assert!(errors[0].message.contains("Shoe"));
    }

    #[test]
    fn test_cyclic_requirement() {
        // A → B → C → A
        let p = Product::new("Loop")
            .with_task(TaskDefinition::new("A", "a").with_requirement("C"))
            .with_task(TaskDefinition::new("B", "b").with_requirement("A"))
            .with_task(TaskDefinition::new("C", "c").with_requirement("B"));
        let c = ProductCatalog::new().with_product(p);
        assert!(kinds(validate_catalogue(&c)).contains(&ValidationErrorKind::CyclicRequirement));
    }

    #[test]
    fn test_self_requirement_is_a_cycle() {
        let p = Product::new("Selfish").with_task(TaskDefinition::new("A", "a").with_requirement("A"));
        let c = ProductCatalog::new().with_product(p);
        assert!(kinds(validate_catalogue(&c)).contains(&ValidationErrorKind::CyclicRequirement));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let c = ProductCatalog::new()
            .with_product(Product::new("Empty"))
            .with_product(Product::new("Bad").with_task(TaskDefinition::new("X", "x").with_requirement("Y")));
        assert!(validate_catalogue(&c).unwrap_err().len() >= 2);
    }

    #[test]
    fn test_roster_duplicates() {
        let roster = vec![Worker::new("W1"), Worker::new("W2"), Worker::new("W1")];
        let errors = validate_roster(&roster).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(validate_roster(&roster[..2]).is_ok());
    }

    #[test]
    fn test_roster_empty_id() {
        let roster = vec![Worker::new("W1"), Worker::new("  ").with_name("Nameless")];
        let errors = validate_roster(&roster).unwrap_err();
        assert_eq!(kinds(Err(errors.clone())), vec![ValidationErrorKind::EmptyId]);
        assert!(errors[0].message.contains("Nameless"));
    }
}
