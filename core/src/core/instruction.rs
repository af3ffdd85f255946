// derp/src/core/instruction.rs

//! Defines the instruction kinds, the closure shapes registered for each kind,
//! and the order record kept in a pipeline's order list.

use std::fmt;

// Type aliases for the closures stored per kind.
// Boxed so a single pipeline can hold many distinct closure types per kind.
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync + 'static>;
pub type Transform<T> = Box<dyn Fn(usize, &mut T) + Send + Sync + 'static>;
pub type Action<T> = Box<dyn Fn(&T) + Send + Sync + 'static>;
pub type Combiner<T> = Box<dyn Fn(T, T) -> T + Send + Sync + 'static>;

/// The six operations a pipeline can replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
  Filter,
  Map,
  Foreach,
  Reduce,
  Skip,
  Take,
}

impl InstructionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      InstructionKind::Filter => "filter",
      InstructionKind::Map => "map",
      InstructionKind::Foreach => "foreach",
      InstructionKind::Reduce => "reduce",
      InstructionKind::Skip => "skip",
      InstructionKind::Take => "take",
    }
  }
}

impl fmt::Display for InstructionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One entry of the order list.
///
/// `index` is the slot inside the per-kind storage of the owning pipeline
/// (the closure list for filter/map/foreach, the count list for skip/take).
/// Reduce always uses slot 0 since only one may be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub kind: InstructionKind,
  pub index: usize,
  pub comments: Vec<String>,
}

impl Order {
  pub(crate) fn new(kind: InstructionKind, index: usize, comments: &[&str]) -> Self {
    Self {
      kind,
      index,
      comments: comments.iter().map(|c| (*c).to_string()).collect(),
    }
  }
}
