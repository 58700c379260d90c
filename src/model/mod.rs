//! Domain types for warehouse tasks and the action wizard.
//!
//! Mirrors the task payload served by the task repository. These types are
//! serialized to/from YAML by the in-memory warehouse and consumed by every
//! service in the crate.

mod action;
mod entity;
mod rules;
mod step;
mod task;
mod value;

pub use action::{ActionTemplate, FactAction, PlannedAction, WmsAction};
pub use entity::{BinX, Pallet, Product, ProductStatus, TaskProduct};
pub use rules::{ValidationRule, ValidationRuleItem, ValidationRuleKind};
pub use step::{ActionObjectType, ActionStep, StepRole};
pub use task::{Task, TaskStatus, TaskType};
pub use value::{StepResult, StepValue};
