//! Slot-based workforce planning for the U-Engine ecosystem.
//!
//! Turns a product catalogue, a worker roster and an order into a
//! worker × day × slot schedule. Each product is a recipe of task steps
//! with output dependencies; every ordered unit expands into concrete task
//! instances which are assigned greedily, slot by slot, to workers acting
//! in a fixed or a flow role.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `SkillCatalog`, `Product`, `TaskDefinition`,
//!   `Worker`, `Order`, `TaskInstance`, `Inventory`, `Schedule`
//! - **`store`**: `MasterData`, the read-only inputs of a run
//! - **`validation`**: Catalogue integrity (duplicate codes, unknown or
//!   cyclic requirements) and roster checks
//! - **`dispatching`**: Weighted selection rules for flow workers
//! - **`planning`**: Recipe ordering, expansion, role classification, the
//!   slot engine, rebalancing, statistics and the [`plan`] facade
//! - **`config`**: `PlannerConfig` (clock, policies, weights)
//! - **`import`** / **`export`**: CSV master data in, schedule CSV out
//! - **`logging`**: `tracing-subscriber` setup for binaries and tests
//!
//! # Example
//!
//! ```
//! use u_workforce::{plan, MasterData, PlanRequest, PlannerConfig};
//! use u_workforce::models::{Order, Product, TaskDefinition, Worker};
//!
//! let data = MasterData::new()
//!     .with_product(
//!         Product::new("Boot")
//!             .with_task(TaskDefinition::new("CUT", "Cut upper"))
//!             .with_task(TaskDefinition::new("SEW", "Sew upper").with_requirement("CUT")),
//!     )
//!     .with_worker(Worker::new("W1"))
//!     .with_worker(Worker::new("W2"));
//!
//! let request = PlanRequest::new(Order::new().with("Boot", 2));
//! let result = plan(&data, &request, &PlannerConfig::default()).unwrap();
//! assert!(result.stats.is_complete());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

pub mod config;
pub mod dispatching;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod planning;
pub mod store;
pub mod validation;

pub use config::PlannerConfig;
pub use error::{ImportError, PlanError, Result};
pub use planning::{plan, PlanRequest, PlanResult};
pub use store::MasterData;
