//! Course content and student progress
//!
//! Covers the content model, module loading with its fallback fetch chains,
//! completion evaluation, progress aggregation and item routes.

pub mod links;
pub mod loader;
pub mod model;
pub mod progress;
pub mod resolve;

pub use links::{LinkKind, lesson_link};
pub use loader::{LoadError, ModuleLoader, ModuleView, sort_sections};
pub use model::{ContentKind, Item, Module, Section};
pub use progress::{
    ProgressSnapshot, ProgressSummary, calculate_course_progress, calculate_module_progress,
    is_component_completed, is_item_completed, is_section_completed,
};
pub use resolve::{Resolved, ResolverChain};
