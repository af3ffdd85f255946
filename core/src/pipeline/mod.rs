// derp/src/pipeline/mod.rs

//! Defines the `Pipeline<T>` struct, its registration methods, and execution logic.

pub mod definition;
pub mod execution;
pub mod registration;
pub(crate) mod schedule;
pub mod workers;
pub(crate) mod working_set;

// Re-export the main Pipeline struct
pub use definition::Pipeline;
