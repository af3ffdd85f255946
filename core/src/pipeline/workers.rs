// derp/src/pipeline/workers.rs

//! Static chunk partitioning and the bounded worker pool used by `apply`.
//!
//! Every instruction forms its own fan-out/join barrier: one task per
//! non-empty chunk is spawned in a rayon scope, each task writes into its own
//! pre-sized slot, and the scope returns only once every task has finished.
//! Chunks are disjoint by construction, so element access needs no locks.

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use tracing::{event, Level};

/// Sizing of one instruction's fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
  pub num_workers: usize,
  pub chunk_size: usize,
  pub len: usize,
}

impl Partition {
  /// `chunk_size = ceil(len / num_workers)`. `num_workers` of zero is treated as one.
  pub fn new(len: usize, num_workers: usize) -> Self {
    let num_workers = num_workers.max(1);
    Self {
      num_workers,
      chunk_size: len.div_ceil(num_workers),
      len,
    }
  }

  /// Range owned by `worker`, or `None` when its start offset is past the end.
  pub fn range(&self, worker: usize) -> Option<Range<usize>> {
    let start = worker * self.chunk_size;
    if start >= self.len {
      return None;
    }
    Some(start..(start + self.chunk_size).min(self.len))
  }

  /// Ranges of the workers that have something to do, in worker-index order.
  pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
    (0..self.num_workers).filter_map(move |w| self.range(w))
  }

  pub fn active_workers(&self) -> usize {
    self.ranges().count()
  }
}

pub(crate) type PanicPayload = Box<dyn Any + Send + 'static>;

/// Extracts the message of a caught panic.
pub(crate) fn panic_message(payload: &PanicPayload) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

/// Runs `f`, turning a panic into an `Err` carrying the payload.
pub(crate) fn catch_closure_panic<R>(f: impl FnOnce() -> R) -> Result<R, PanicPayload> {
  panic::catch_unwind(AssertUnwindSafe(f))
}

/// A fixed-size pool created once per `apply` call.
pub(crate) struct WorkerPool {
  pool: rayon::ThreadPool,
  num_workers: usize,
}

impl WorkerPool {
  pub(crate) fn new(num_workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
    let num_workers = num_workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(num_workers)
      .thread_name(|i| format!("derp-worker-{}", i))
      .build()?;
    event!(Level::DEBUG, num_workers, "Worker pool started.");
    Ok(Self { pool, num_workers })
  }

  pub(crate) fn num_workers(&self) -> usize {
    self.num_workers
  }

  pub(crate) fn partition(&self, len: usize) -> Partition {
    Partition::new(len, self.num_workers)
  }

  /// Hands each worker its chunk of `data` by shared reference and collects
  /// one result per active worker, in worker-index order.
  ///
  /// `f` receives the chunk's global start offset.
  pub(crate) fn map_chunks<T, R, F>(&self, data: &[T], f: F) -> Result<Vec<R>, PanicPayload>
  where
    T: Sync,
    R: Send,
    F: Fn(usize, &[T]) -> R + Sync,
  {
    let part = self.partition(data.len());
    if part.len == 0 {
      return Ok(Vec::new());
    }

    let mut slots: Vec<Option<R>> = (0..part.num_workers).map(|_| None).collect();
    let f = &f;
    catch_closure_panic(|| {
      self.pool.scope(|s| {
        for (worker, (chunk, slot)) in data.chunks(part.chunk_size).zip(slots.iter_mut()).enumerate() {
          let offset = worker * part.chunk_size;
          s.spawn(move |_| {
            *slot = Some(f(offset, chunk));
          });
        }
      })
    })?;

    Ok(slots.into_iter().flatten().collect())
  }

  /// Hands each worker its chunk of `data` by mutable reference.
  ///
  /// `f` receives the chunk's global start offset.
  pub(crate) fn for_each_chunk_mut<T, F>(&self, data: &mut [T], f: F) -> Result<(), PanicPayload>
  where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
  {
    let part = self.partition(data.len());
    if part.len == 0 {
      return Ok(());
    }

    let f = &f;
    catch_closure_panic(|| {
      self.pool.scope(|s| {
        for (worker, chunk) in data.chunks_mut(part.chunk_size).enumerate() {
          let offset = worker * part.chunk_size;
          s.spawn(move |_| f(offset, chunk));
        }
      })
    })
  }

  /// Moves `data` into per-worker owned chunks and collects one result per
  /// active worker, in worker-index order.
  pub(crate) fn map_owned_chunks<T, R, F>(&self, mut data: Vec<T>, f: F) -> Result<Vec<R>, PanicPayload>
  where
    T: Send,
    R: Send,
    F: Fn(usize, Vec<T>) -> R + Sync,
  {
    let part = self.partition(data.len());
    if part.len == 0 {
      return Ok(Vec::new());
    }

    // Split from the back so each split_off is cheap, then restore worker order.
    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(part.num_workers);
    for range in part.ranges().collect::<Vec<_>>().into_iter().rev() {
      chunks.push(data.split_off(range.start));
    }
    chunks.reverse();

    let mut slots: Vec<Option<R>> = (0..chunks.len()).map(|_| None).collect();
    let f = &f;
    catch_closure_panic(|| {
      self.pool.scope(|s| {
        for (worker, (chunk, slot)) in chunks.into_iter().zip(slots.iter_mut()).enumerate() {
          let offset = worker * part.chunk_size;
          s.spawn(move |_| {
            *slot = Some(f(offset, chunk));
          });
        }
      })
    })?;

    Ok(slots.into_iter().flatten().collect())
  }
}
