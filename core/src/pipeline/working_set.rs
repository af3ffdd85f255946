// derp/src/pipeline/working_set.rs

//! The in-flight sequence an `apply` call operates on.

use crate::core::element::{deep_clone_all, structural_clone_all, Element};
use crate::core::instruction::InstructionKind;
use crate::core::options::ClonePolicy;
use crate::error::{PipelineError, PipelineResult};

/// Either the caller's own storage (no-copy) or a private copy.
///
/// While `Aliased`, in-place rewrites land in the caller's slice. Any step that
/// rebuilds the sequence (filter, reduce) moves the working set to `Owned`.
#[derive(Debug)]
pub(crate) enum WorkingSet<'a, T> {
  Aliased(&'a mut [T]),
  Owned(Vec<T>),
}

impl<'a, T: Element> WorkingSet<'a, T> {
  /// Materializes the working set for `input` under `policy`.
  pub(crate) fn materialize(input: &'a mut [T], policy: ClonePolicy) -> Self {
    match policy {
      ClonePolicy::NoCopy => WorkingSet::Aliased(input),
      ClonePolicy::Clone => WorkingSet::Owned(structural_clone_all(input)),
      ClonePolicy::CycleSafeClone => WorkingSet::Owned(deep_clone_all(input)),
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.as_slice().len()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.as_slice().is_empty()
  }

  pub(crate) fn is_aliased(&self) -> bool {
    matches!(self, WorkingSet::Aliased(_))
  }

  pub(crate) fn as_slice(&self) -> &[T] {
    match self {
      WorkingSet::Aliased(s) => s,
      WorkingSet::Owned(v) => v.as_slice(),
    }
  }

  pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
    match self {
      WorkingSet::Aliased(s) => s,
      WorkingSet::Owned(v) => v.as_mut_slice(),
    }
  }

  /// Drops the first `n` elements. `n` greater than the length is an error.
  pub(crate) fn skip(self, n: usize) -> PipelineResult<Self> {
    let len = self.len();
    if n > len {
      return Err(PipelineError::OutOfRange {
        operation: InstructionKind::Skip,
        count: n,
        len,
      });
    }
    Ok(match self {
      WorkingSet::Aliased(s) => WorkingSet::Aliased(&mut s[n..]),
      WorkingSet::Owned(mut v) => {
        v.drain(..n);
        WorkingSet::Owned(v)
      }
    })
  }

  /// Keeps the first `n` elements. `n` greater than the length is an error.
  pub(crate) fn take(self, n: usize) -> PipelineResult<Self> {
    let len = self.len();
    if n > len {
      return Err(PipelineError::OutOfRange {
        operation: InstructionKind::Take,
        count: n,
        len,
      });
    }
    Ok(match self {
      WorkingSet::Aliased(s) => WorkingSet::Aliased(&mut s[..n]),
      WorkingSet::Owned(mut v) => {
        v.truncate(n);
        WorkingSet::Owned(v)
      }
    })
  }

  /// Hands the elements out by value. Aliased storage is cloned since it belongs to the caller.
  pub(crate) fn into_vec(self) -> Vec<T> {
    match self {
      WorkingSet::Aliased(s) => s.to_vec(),
      WorkingSet::Owned(v) => v,
    }
  }
}
