//! Task instance expander.
//!
//! Multiplies every recipe step by the ordered quantity of its product.
//! Each unit becomes its own [`TaskInstance`] with a fresh dense id, and its
//! requirement codes become [`OutputKey`]s scoped by the configured
//! [`DependencyScope`].
//!
//! # Ordering
//! Instances are emitted by recipe position first, then order-line position,
//! then unit number. With the tie-breaking rules of the engine this means
//! early recipe steps of every ordered product are preferred.

use serde::{Deserialize, Serialize};

use super::recipe::Recipe;
use crate::config::DependencyScope;
use crate::error::PlanError;
use crate::models::{
    InstanceId, InstanceStatus, Order, OutputKey, ProductCatalog, SkillVector, TaskInstance,
    TaskTypeId,
};

/// A recipe step of one product, shared by every unit produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskType {
    pub id: TaskTypeId,
    pub product: String,
    pub code: String,
    pub name: String,
    /// Index of the definition within `Product::tasks`.
    pub task_index: usize,
    /// Position of the step within the recipe's topological order.
    pub recipe_position: usize,
    pub depth: u32,
    /// Largest depth of the product's recipe.
    pub max_depth: u32,
    pub duration_slots: u32,
    pub requirements: SkillVector,
}

/// Result of expanding an order.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// One entry per (product, recipe step) of the catalogue.
    pub task_types: Vec<TaskType>,
    /// Instances in planning order; `instances[i].id == InstanceId(i)`.
    pub instances: Vec<TaskInstance>,
}

impl Expansion {
    /// Task type of an instance.
    #[inline]
    pub fn task_type(&self, instance: &TaskInstance) -> &TaskType {
        &self.task_types[instance.task_type.0]
    }
}

/// Builds the task type table of a catalogue from its recipes.
pub fn task_types(catalogue: &ProductCatalog, recipes: &[Recipe]) -> Vec<TaskType> {
    let mut types = Vec::new();
    for (product, recipe) in catalogue.products().iter().zip(recipes) {
        for (task_index, def) in product.tasks.iter().enumerate() {
            types.push(TaskType {
                id: TaskTypeId(types.len()),
                product: product.name.clone(),
                code: def.code.clone(),
                name: def.name.clone(),
                task_index,
                recipe_position: recipe.position(task_index).unwrap_or(task_index),
                depth: recipe.depth[task_index],
                max_depth: recipe.max_depth,
                duration_slots: def.duration_slots,
                requirements: def.requirements.clone(),
            });
        }
    }
    types
}

/// Expands an order into task instances.
///
/// # Errors
/// [`PlanError::UnknownProduct`] if an active order line names a product
/// missing from the catalogue, [`PlanError::EmptyOrder`] if no line has a
/// positive quantity.
pub fn expand(
    catalogue: &ProductCatalog,
    recipes: &[Recipe],
    order: &Order,
    scope: DependencyScope,
) -> Result<Expansion, PlanError> {
    let types = task_types(catalogue, recipes);

    // (product index, quantity) per active line, in order-line order
    let mut lines = Vec::new();
    for line in order.active_lines() {
        let idx = catalogue
            .position(&line.product)
            .ok_or_else(|| PlanError::UnknownProduct(line.product.clone()))?;
        lines.push((idx, line.quantity));
    }
    if lines.is_empty() {
        return Err(PlanError::EmptyOrder);
    }

    // First type id of every product
    let mut offsets = Vec::with_capacity(catalogue.len());
    let mut next = 0;
    for p in catalogue.products() {
        offsets.push(next);
        next += p.tasks.len();
    }

    let longest = lines
        .iter()
        .map(|&(p, _)| recipes[p].order.len())
        .max()
        .unwrap_or(0);

    let mut instances = Vec::new();
    for position in 0..longest {
        for &(p, quantity) in &lines {
            let Some(&task_index) = recipes[p].order.get(position) else {
                continue;
            };
            let product = &catalogue.products()[p];
            let def = &product.tasks[task_index];
            let tt = &types[offsets[p] + task_index];
            for unit in 1..=quantity {
                let key_unit = match scope {
                    DependencyScope::PerUnit => Some(unit),
                    DependencyScope::Pooled => None,
                };
                instances.push(TaskInstance {
                    id: InstanceId(instances.len()),
                    task_type: tt.id,
                    product: product.name.clone(),
                    unit,
                    code: def.code.clone(),
                    name: def.name.clone(),
                    duration_slots: def.duration_slots,
                    depth: tt.depth,
                    output: OutputKey::new(&product.name, &def.code, key_unit),
                    requires: def
                        .requires
                        .iter()
                        .map(|code| OutputKey::new(&product.name, code, key_unit))
                        .collect(),
                    status: InstanceStatus::Pending,
                    worker: None,
                    role: None,
                    start: None,
                    end: None,
                });
            }
        }
    }

    Ok(Expansion {
        task_types: types,
        instances,
    })
}
