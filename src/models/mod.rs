//! Planning domain models.
//!
//! Static master data (skills, products, workers, orders) and the dynamic
//! state a planning run produces (task instances, inventory, schedule).
//!
//! # Domain Mappings
//!
//! | u-workforce | Shoe workshop | Kitchen | Assembly line |
//! |-------------|---------------|---------|---------------|
//! | Product | Leather shoe | Dish | Sub-assembly |
//! | TaskDefinition | Cut sole | Prep step | Station operation |
//! | TaskInstance | Sole of pair #3 | Prep for cover #12 | Unit #7 at station |
//! | Worker | Craftsman | Cook | Operator |

mod instance;
mod inventory;
mod order;
mod product;
mod schedule;
mod skill;
mod task;
mod worker;

pub use instance::{InstanceId, InstanceStatus, OutputKey, TaskInstance, TaskTypeId};
pub use inventory::{Inventory, InventoryEntry};
pub use order::{Order, OrderLine};
pub use product::{Product, ProductCatalog};
pub use schedule::{AssignedRole, Occupancy, Schedule, SlotTime};
pub use skill::{SkillCatalog, SkillId, SkillScale, SkillVector, SKILL_SCALE_MAX};
pub use task::TaskDefinition;
pub use worker::{RolePreference, Worker, WorkerRole};
