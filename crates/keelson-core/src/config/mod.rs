//! Configuration system for Keelson

pub mod defaults;
mod loader;
pub mod merge;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use merge::{deep_merge, merge_layers};
pub use types::*;
pub use validation::*;
