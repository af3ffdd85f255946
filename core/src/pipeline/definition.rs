// derp/src/pipeline/definition.rs

//! Contains the `Pipeline<T>` struct definition, its construction, and the
//! order invoice used for diagnostics.

use crate::core::element::Element;
use crate::core::instruction::{Action, Combiner, Order, Predicate, Transform};
use crate::pipeline::workers::WorkerPool;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// A reusable, data-free list of operations over elements of type `T`.
///
/// Operations are registered with `filter`, `map`, `foreach`, `reduce`, `skip`
/// and `take`, and replayed against an input with `apply`. Registrations are
/// not consumed by `apply`; the same pipeline can process any number of inputs.
pub struct Pipeline<T: Element> {
  /// Declaration-ordered list of orders. Each order points into one of the
  /// per-kind lists below through its `index`.
  pub(crate) orders: Vec<Order>,

  pub(crate) filters: Vec<Predicate<T>>,
  pub(crate) mappers: Vec<Transform<T>>,
  pub(crate) foreachers: Vec<Action<T>>,
  pub(crate) reducer: Option<Combiner<T>>,
  pub(crate) skip_counts: Vec<usize>,
  pub(crate) take_counts: Vec<usize>,

  /// Overrides the detected hardware parallelism when set.
  pub(crate) parallelism: Option<NonZeroUsize>,

  /// Worker pool kept between `apply` calls, rebuilt when the worker count changes.
  pub(crate) pool: Option<Arc<WorkerPool>>,
}

impl<T: Element> Pipeline<T> {
  /// Creates an empty pipeline.
  pub fn new() -> Self {
    Self {
      orders: Vec::new(),
      filters: Vec::new(),
      mappers: Vec::new(),
      foreachers: Vec::new(),
      reducer: None,
      skip_counts: Vec::new(),
      take_counts: Vec::new(),
      parallelism: None,
      pool: None,
    }
  }

  /// Sizes the worker pool from `parallelism` instead of
  /// `std::thread::available_parallelism()`. Throttle options still apply.
  pub fn with_parallelism(mut self, parallelism: NonZeroUsize) -> Self {
    self.parallelism = Some(parallelism);
    self
  }

  /// Parallelism the worker pool is sized from, before throttling.
  pub fn parallelism(&self) -> usize {
    match self.parallelism {
      Some(n) => n.get(),
      None => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    }
  }

  /// Registered orders, in declaration order.
  pub fn orders(&self) -> &[Order] {
    &self.orders
  }

  pub fn len(&self) -> usize {
    self.orders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.is_empty()
  }

  pub fn has_reduce(&self) -> bool {
    self.reducer.is_some()
  }

  /// Drops every registration. The parallelism override and worker pool are kept.
  pub fn reset(&mut self) {
    self.orders.clear();
    self.filters.clear();
    self.mappers.clear();
    self.foreachers.clear();
    self.reducer = None;
    self.skip_counts.clear();
    self.take_counts.clear();
  }
}

impl<T: Element> Default for Pipeline<T> {
  fn default() -> Self {
    Self::new()
  }
}

/// The order invoice: one block per registered order, in declaration order.
impl<T: Element> fmt::Display for Pipeline<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, order) in self.orders.iter().enumerate() {
      let mut pretty_comments = String::new();
      if order.comments.is_empty() {
        pretty_comments.push_str("[ N/A ]\n");
      }
      for comment in &order.comments {
        pretty_comments.push_str("[ ");
        pretty_comments.push_str(comment);
        pretty_comments.push_str(" ]\n\t\t");
      }

      write!(
        f,
        "Order {}:\n\tAdapter: {}\n\tIndex: {}\n\tComments: \n\t\t{}\n",
        idx + 1,
        order.kind,
        order.index,
        pretty_comments
      )?;
    }
    Ok(())
  }
}

// Closures are not Debug; summarize the storage instead.
impl<T: Element> fmt::Debug for Pipeline<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("element_type", &std::any::type_name::<T>())
      .field("orders", &self.orders)
      .field("filters", &self.filters.len())
      .field("mappers", &self.mappers.len())
      .field("foreachers", &self.foreachers.len())
      .field("reducer_present", &self.reducer.is_some())
      .field("skip_counts", &self.skip_counts)
      .field("take_counts", &self.take_counts)
      .field("parallelism", &self.parallelism)
      .field("pooled_workers", &self.pool.as_ref().map(|p| p.num_workers()))
      .finish()
  }
}
