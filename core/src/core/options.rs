// derp/src/core/options.rs

//! Flags accepted by `Pipeline::apply` and their validated, resolved form.

use crate::error::{PipelineError, PipelineResult};
use std::fmt;

/// A single flag passed to `Pipeline::apply`.
///
/// Flags are grouped in categories (see [`ApplyOption::category`]); at most one
/// distinct flag per category may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOption {
  /// Operate directly on the caller's slice. In-place mutation is visible to the caller.
  NoCopy,
  /// Clone every element with `Clone::clone` before running.
  Clone,
  /// Clone every element with `Element::deep_clone`, preserving shared and cyclic handles.
  CycleSafeClone,
  /// Dispatch foreach actions across workers. Evaluation order is not deterministic.
  ConcurrentForeach,
  /// Fold chunks in parallel, then fold the partials. The combiner must be associative and commutative.
  ParallelReduce,
  Power25,
  Power50,
  Power75,
  Power100,
  /// Clear every registration after a successful run.
  Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionCategory {
  ClonePolicy,
  Throttle,
  ConcurrentForeach,
  ParallelReduce,
  Reset,
}

impl fmt::Display for OptionCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      OptionCategory::ClonePolicy => "clone-policy",
      OptionCategory::Throttle => "throttle",
      OptionCategory::ConcurrentForeach => "concurrent-foreach",
      OptionCategory::ParallelReduce => "parallel-reduce",
      OptionCategory::Reset => "reset",
    };
    f.write_str(name)
  }
}

impl ApplyOption {
  pub fn category(&self) -> OptionCategory {
    match self {
      ApplyOption::NoCopy | ApplyOption::Clone | ApplyOption::CycleSafeClone => OptionCategory::ClonePolicy,
      ApplyOption::Power25 | ApplyOption::Power50 | ApplyOption::Power75 | ApplyOption::Power100 => {
        OptionCategory::Throttle
      }
      ApplyOption::ConcurrentForeach => OptionCategory::ConcurrentForeach,
      ApplyOption::ParallelReduce => OptionCategory::ParallelReduce,
      ApplyOption::Reset => OptionCategory::Reset,
    }
  }
}

/// How the input is materialized into the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClonePolicy {
  NoCopy,
  Clone,
  CycleSafeClone,
}

/// Fraction of the available parallelism used to size the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Throttle {
  Quarter,
  Half,
  ThreeQuarters,
  #[default]
  Full,
}

impl Throttle {
  pub fn fraction(&self) -> f64 {
    match self {
      Throttle::Quarter => 0.25,
      Throttle::Half => 0.5,
      Throttle::ThreeQuarters => 0.75,
      Throttle::Full => 1.0,
    }
  }

  /// `max(1, ceil(available * fraction))`
  pub fn workers_for(&self, available: usize) -> usize {
    let scaled = (available as f64 * self.fraction()).ceil() as usize;
    scaled.max(1)
  }
}

/// Validated options for a single `apply` call.
///
/// `clone_policy` is `None` when the caller did not choose one; the executor
/// then falls back to the element type's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedOptions {
  pub clone_policy: Option<ClonePolicy>,
  pub throttle: Throttle,
  pub concurrent_foreach: bool,
  pub parallel_reduce: bool,
  pub reset: bool,
}

impl ResolvedOptions {
  /// Validates `options` and folds them into a `ResolvedOptions`.
  ///
  /// Repeating the same flag is accepted. Two different flags of the same
  /// category yield `PipelineError::ConflictingOptions`.
  pub fn resolve(options: &[ApplyOption]) -> PipelineResult<Self> {
    let mut seen: Vec<ApplyOption> = Vec::with_capacity(options.len());
    for opt in options {
      if let Some(prior) = seen.iter().find(|s| s.category() == opt.category() && *s != opt) {
        return Err(PipelineError::ConflictingOptions {
          category: opt.category(),
          first: format!("{:?}", prior),
          second: format!("{:?}", opt),
        });
      }
      if !seen.contains(opt) {
        seen.push(*opt);
      }
    }

    let mut resolved = ResolvedOptions::default();
    for opt in seen {
      match opt {
        ApplyOption::NoCopy => resolved.clone_policy = Some(ClonePolicy::NoCopy),
        ApplyOption::Clone => resolved.clone_policy = Some(ClonePolicy::Clone),
        ApplyOption::CycleSafeClone => resolved.clone_policy = Some(ClonePolicy::CycleSafeClone),
        ApplyOption::ConcurrentForeach => resolved.concurrent_foreach = true,
        ApplyOption::ParallelReduce => resolved.parallel_reduce = true,
        ApplyOption::Power25 => resolved.throttle = Throttle::Quarter,
        ApplyOption::Power50 => resolved.throttle = Throttle::Half,
        ApplyOption::Power75 => resolved.throttle = Throttle::ThreeQuarters,
        ApplyOption::Power100 => resolved.throttle = Throttle::Full,
        ApplyOption::Reset => resolved.reset = true,
      }
    }
    Ok(resolved)
  }
}
