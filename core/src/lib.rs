// src/lib.rs

//! derp: a Deferred Execution, Reusable data-processing Pipeline.
//!
//! A `Pipeline<T>` records operations without holding any data:
//!  - `filter`, `map`, `foreach`, `skip`, `take` run in declaration order.
//!  - a single `reduce` is always run last, wherever it was declared.
//!  - `apply` replays the operations against an input and returns a new `Vec<T>`.
//!
//! Each operation fans out over a bounded worker pool and joins before the next
//! one starts. Chunk results are recombined by worker index, so the output is
//! identical whatever the worker count.

pub mod core;
pub mod error;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::element::{default_clone_policy, CloneMemo, Element};
pub use crate::core::instruction::{InstructionKind, Order};
pub use crate::core::options::{ApplyOption, ClonePolicy, OptionCategory, Throttle};

pub use crate::pipeline::definition::Pipeline;
pub use crate::pipeline::workers::Partition;

pub use crate::error::{PipelineError, PipelineResult};

/*
    Core Workflow:
    1. Implement `Element` for your element type (`impl Element for MyRecord {}`),
       overriding `structural_clone` and `deep_clone` if it holds shared handles.
    2. Create a `Pipeline<MyRecord>` and register operations, e.g.
       `pipeline.filter(|r| r.active, &["only active"])`.
    3. Call `pipeline.apply(&mut input, &[])`, optionally with `ApplyOption`s
       (clone policy, throttle, concurrent foreach, parallel reduce, reset).
    4. Reuse the same pipeline on further inputs, or `reset()` it.
*/
