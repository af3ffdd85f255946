pub mod element;
pub mod instruction;
pub mod options;

// Re-export key types for easier access from other modules (and lib.rs)
pub use element::{CloneMemo, Element};
pub use instruction::{InstructionKind, Order};
pub use options::{ApplyOption, ClonePolicy, ResolvedOptions, Throttle};
