// derp/src/pipeline/registration.rs

//! Registration methods. Each call appends the closure (or count) to its
//! kind's storage and appends an `Order` pointing at the new slot.
//! Comments are documentation only and never affect execution.

use tracing::{event, Level};

use crate::core::element::Element;
use crate::core::instruction::{InstructionKind, Order};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::definition::Pipeline;

impl<T: Element> Pipeline<T> {
  /// Keeps only the elements for which `predicate` returns true.
  pub fn filter<F>(&mut self, predicate: F, comments: &[&str])
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    self.filters.push(Box::new(predicate));
    let index = self.filters.len() - 1;
    self.push_order(Order::new(InstructionKind::Filter, index, comments));
  }

  /// Rewrites every element in place. `transform` receives the element's
  /// index in the current working set and a mutable reference to it.
  pub fn map<F>(&mut self, transform: F, comments: &[&str])
  where
    F: Fn(usize, &mut T) + Send + Sync + 'static,
  {
    self.mappers.push(Box::new(transform));
    let index = self.mappers.len() - 1;
    self.push_order(Order::new(InstructionKind::Map, index, comments));
  }

  /// Runs `action` on every element. The working set is not changed.
  ///
  /// Actions run sequentially in order unless `ApplyOption::ConcurrentForeach`
  /// is passed to `apply`, in which case evaluation order is unspecified.
  pub fn foreach<F>(&mut self, action: F, comments: &[&str])
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    self.foreachers.push(Box::new(action));
    let index = self.foreachers.len() - 1;
    self.push_order(Order::new(InstructionKind::Foreach, index, comments));
  }

  /// Sets the terminal fold. The accumulator starts as the first element and
  /// `combiner(acc, next)` is applied to each following one.
  ///
  /// Only one reduce can be set per pipeline. It always runs last, wherever it
  /// was declared, and `apply` then returns a single-element `Vec`.
  pub fn reduce<F>(&mut self, combiner: F, comments: &[&str]) -> PipelineResult<()>
  where
    F: Fn(T, T) -> T + Send + Sync + 'static,
  {
    if self.reducer.is_some() {
      event!(Level::WARN, "Reduce has already been set; registration rejected.");
      return Err(PipelineError::ReduceAlreadySet);
    }

    self.reducer = Some(Box::new(combiner));
    self.push_order(Order::new(InstructionKind::Reduce, 0, comments));
    Ok(())
  }

  /// Drops the first `n` elements. The comment is inferred as `skip(n)`.
  pub fn skip(&mut self, n: usize) -> PipelineResult<()> {
    let index = Self::push_count(&mut self.skip_counts, InstructionKind::Skip, n)?;
    let comment = format!("skip({})", n);
    self.push_order(Order::new(InstructionKind::Skip, index, &[comment.as_str()]));
    Ok(())
  }

  /// Keeps only the first `n` elements. The comment is inferred as `take(n)`.
  pub fn take(&mut self, n: usize) -> PipelineResult<()> {
    let index = Self::push_count(&mut self.take_counts, InstructionKind::Take, n)?;
    let comment = format!("take({})", n);
    self.push_order(Order::new(InstructionKind::Take, index, &[comment.as_str()]));
    Ok(())
  }

  fn push_count(counts: &mut Vec<usize>, kind: InstructionKind, n: usize) -> PipelineResult<usize> {
    if n < 1 {
      event!(Level::WARN, operation = %kind, count = n, "No order submitted.");
      return Err(PipelineError::InvalidCount { operation: kind, count: n });
    }
    counts.push(n);
    Ok(counts.len() - 1)
  }

  fn push_order(&mut self, order: Order) {
    event!(
      Level::TRACE,
      kind = %order.kind,
      index = order.index,
      position = self.orders.len(),
      "Order registered."
    );
    self.orders.push(order);
  }
}
