// derp/src/pipeline/execution.rs

//! Contains `Pipeline::apply()`, which replays the registered orders against
//! an input. Each instruction is a fan-out/join barrier over the worker pool;
//! no instruction starts before the previous one has fully finished.

use crate::core::element::Element;
use crate::core::instruction::{InstructionKind, Order};
use crate::core::options::{ApplyOption, ClonePolicy, ResolvedOptions};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::definition::Pipeline;
use crate::pipeline::schedule::{Instruction, Scheduled};
use crate::pipeline::workers::{catch_closure_panic, panic_message, PanicPayload, WorkerPool};
use crate::pipeline::working_set::WorkingSet;
use std::sync::Arc;
use tracing::{event, instrument, span, Level};

impl<T: Element> Pipeline<T> {
  /// Runs every registered order against `input` and returns the result.
  ///
  /// The input is first materialized according to the clone policy: an
  /// explicit `NoCopy`/`Clone`/`CycleSafeClone` option, or else
  /// `T::DEFAULT_CLONE_POLICY`. Under `NoCopy`, maps rewrite `input` in place.
  ///
  /// Orders run in declaration order with the reduce, if any, moved last.
  /// The first failing order aborts the run; nothing partial is returned.
  /// With `ApplyOption::Reset` the pipeline is cleared after a successful run.
  #[instrument(
        name = "Pipeline::apply",
        skip_all,
        fields(
            element_type = %std::any::type_name::<T>(),
            input_len = input.len(),
            num_orders = self.orders.len(),
        ),
        err(Display)
    )]
  pub fn apply(&mut self, input: &mut [T], options: &[ApplyOption]) -> PipelineResult<Vec<T>> {
    let resolved = ResolvedOptions::resolve(options)?;
    let policy = resolved.clone_policy.unwrap_or(T::DEFAULT_CLONE_POLICY);
    let num_workers = resolved.throttle.workers_for(self.parallelism());

    event!(
      Level::DEBUG,
      ?policy,
      explicit_policy = resolved.clone_policy.is_some(),
      throttle = ?resolved.throttle,
      num_workers,
      "Pipeline apply starting."
    );

    let output = if self.orders.is_empty() {
      event!(Level::DEBUG, "No orders registered; returning the materialized input.");
      WorkingSet::materialize(input, policy).into_vec()
    } else {
      let pool = self.worker_pool(num_workers)?;
      self.run_schedule(&pool, input, policy, &resolved)?
    };

    if resolved.reset {
      self.reset();
      event!(Level::DEBUG, "Pipeline registrations cleared after run.");
    }

    event!(Level::DEBUG, output_len = output.len(), "Pipeline apply completed successfully.");
    Ok(output)
  }

  /// Returns the cached pool when it has `num_workers` threads, otherwise
  /// replaces it with a new one.
  fn worker_pool(&mut self, num_workers: usize) -> PipelineResult<Arc<WorkerPool>> {
    if let Some(pool) = &self.pool {
      if pool.num_workers() == num_workers {
        return Ok(Arc::clone(pool));
      }
    }

    let pool = Arc::new(WorkerPool::new(num_workers)?);
    self.pool = Some(Arc::clone(&pool));
    Ok(pool)
  }

  fn run_schedule(
    &self,
    pool: &WorkerPool,
    input: &mut [T],
    policy: ClonePolicy,
    options: &ResolvedOptions,
  ) -> PipelineResult<Vec<T>> {
    let schedule = self.resolve_schedule();
    let mut working = WorkingSet::materialize(input, policy);

    for (position, step) in schedule.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_instruction",
        kind = %step.order.kind,
        index = step.order.index,
        position,
        len = working.len()
      );
      let _step_span_guard = step_span.enter();

      let part = pool.partition(working.len());
      event!(
        Level::TRACE,
        chunk_size = part.chunk_size,
        active_workers = part.active_workers(),
        aliased = working.is_aliased(),
        parallel = is_parallel(step.order.kind, options),
        "Dispatching instruction."
      );

      working = self.execute(pool, step, working, options)?;
      event!(Level::DEBUG, new_len = working.len(), "Instruction finished.");
    }

    Ok(working.into_vec())
  }

  fn execute<'a>(
    &self,
    pool: &WorkerPool,
    step: &Scheduled<'_, T>,
    working: WorkingSet<'a, T>,
    options: &ResolvedOptions,
  ) -> PipelineResult<WorkingSet<'a, T>> {
    let failed = |payload: PanicPayload| closure_failure(step.order, payload);

    match &step.instruction {
      Instruction::Filter(predicate) => {
        let kept: Vec<Vec<T>> = match working {
          WorkingSet::Owned(items) => pool
            .map_owned_chunks(items, |_, chunk| chunk.into_iter().filter(|v| predicate(v)).collect())
            .map_err(failed)?,
          WorkingSet::Aliased(items) => pool
            .map_chunks(items, |_, chunk| chunk.iter().filter(|v| predicate(*v)).cloned().collect())
            .map_err(failed)?,
        };

        // Concatenate by worker index, never by completion order.
        let total = kept.iter().map(Vec::len).sum();
        let mut flattened = Vec::with_capacity(total);
        for local in kept {
          flattened.extend(local);
        }
        Ok(WorkingSet::Owned(flattened))
      }

      Instruction::Map(transform) => {
        let mut working = working;
        pool
          .for_each_chunk_mut(working.as_mut_slice(), |offset, chunk| {
            for (i, value) in chunk.iter_mut().enumerate() {
              transform(offset + i, value);
            }
          })
          .map_err(failed)?;
        Ok(working)
      }

      Instruction::Foreach(action) => {
        if options.concurrent_foreach {
          pool
            .map_chunks(working.as_slice(), |_, chunk| chunk.iter().for_each(|v| action(v)))
            .map_err(failed)?;
        } else {
          catch_closure_panic(|| working.as_slice().iter().for_each(|v| action(v))).map_err(failed)?;
        }
        Ok(working)
      }

      Instruction::Reduce(combiner) => {
        if working.is_empty() {
          event!(Level::ERROR, "Reduce reached an empty working set.");
          return Err(PipelineError::EmptyReduce);
        }

        let items = working.into_vec();
        let folded = if options.parallel_reduce {
          let partials = pool
            .map_owned_chunks(items, |_, chunk| chunk.into_iter().reduce(|acc, v| combiner(acc, v)))
            .map_err(failed)?;
          catch_closure_panic(|| partials.into_iter().flatten().reduce(|acc, v| combiner(acc, v))).map_err(failed)?
        } else {
          catch_closure_panic(|| items.into_iter().reduce(|acc, v| combiner(acc, v))).map_err(failed)?
        };

        let result = folded.ok_or(PipelineError::EmptyReduce)?;
        Ok(WorkingSet::Owned(vec![result]))
      }

      Instruction::Skip(n) => working.skip(*n),

      Instruction::Take(n) => working.take(*n),
    }
  }
}

fn closure_failure(order: &Order, payload: PanicPayload) -> PipelineError {
  let message = panic_message(&payload);
  event!(
    Level::ERROR,
    kind = %order.kind,
    index = order.index,
    panic = %message,
    "User-provided closure panicked."
  );
  PipelineError::ClosurePanicked {
    kind: order.kind,
    index: order.index,
    message,
  }
}

// Kinds that dispatch to workers; the rest run on the calling thread.
fn is_parallel(kind: InstructionKind, options: &ResolvedOptions) -> bool {
  match kind {
    InstructionKind::Filter | InstructionKind::Map => true,
    InstructionKind::Foreach => options.concurrent_foreach,
    InstructionKind::Reduce => options.parallel_reduce,
    InstructionKind::Skip | InstructionKind::Take => false,
  }
}
