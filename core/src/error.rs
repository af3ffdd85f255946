// derp/src/error.rs
use crate::core::instruction::InstructionKind;
use crate::core::options::OptionCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
  // --- Validation: raised at the call that broke the contract, state left unchanged ---
  #[error("{operation}({count}): count must be at least 1, no order submitted")]
  InvalidCount { operation: InstructionKind, count: usize },

  #[error("Reduce has already been set")]
  ReduceAlreadySet,

  #[error("Conflicting {category} options: {first} and {second}")]
  ConflictingOptions {
    category: OptionCategory,
    first: String,
    second: String,
  },

  // --- Raised during apply, aborting the remaining instructions ---
  #[error("{operation}({count}) is out of range for a working set of length {len}")]
  OutOfRange {
    operation: InstructionKind,
    count: usize,
    len: usize,
  },

  #[error("Reduce cannot run on an empty working set")]
  EmptyReduce,

  #[error("User-provided {kind} closure (index {index}) panicked: {message}")]
  ClosurePanicked {
    kind: InstructionKind,
    index: usize,
    message: String,
  },

  #[error("Failed to start worker pool. Source: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
  /// True for errors raised synchronously by registration or option validation.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      PipelineError::InvalidCount { .. } | PipelineError::ReduceAlreadySet | PipelineError::ConflictingOptions { .. }
    )
  }
}

pub type PipelineResult<T, E = PipelineError> = std::result::Result<T, E>;
