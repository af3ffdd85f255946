// tests/error_handling_tests.rs
mod common;
use common::*;
use derp::{ApplyOption, InstructionKind, OptionCategory, Pipeline, PipelineError};
use std::sync::Arc;

#[test]
fn test_skip_past_end_is_out_of_range() {
  setup_tracing();
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.filter(|v| v % 2 == 0, &[]);
  pipeline.skip(6).unwrap();

  match pipeline.apply(&mut one_to_ten(), &[]) {
    Err(PipelineError::OutOfRange { operation, count, len }) => {
      assert_eq!(operation, InstructionKind::Skip);
      assert_eq!(count, 6);
      assert_eq!(len, 5);
    }
    other => panic!("Expected OutOfRange, got {:?}", other),
  }
}

#[test]
fn test_take_past_end_aborts_remaining_orders() {
  setup_tracing();
  let seen = collector::<i32>();
  let sink = Arc::clone(&seen);
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.take(11).unwrap();
  pipeline.foreach(move |v| sink.lock().push(*v), &[]);

  let result = pipeline.apply(&mut one_to_ten(), &[]);
  assert!(matches!(
    result,
    Err(PipelineError::OutOfRange {
      operation: InstructionKind::Take,
      count: 11,
      len: 10
    })
  ));
  assert!(seen.lock().is_empty());
}

#[test]
fn test_reduce_on_empty_working_set_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.reduce(|acc, v| acc + v, &[]).unwrap();
  let result = pipeline.apply(&mut Vec::<i32>::new(), &[]);
  assert!(matches!(result, Err(PipelineError::EmptyReduce)));

  // Same when an earlier filter empties the working set.
  let mut filtered = Pipeline::<i32>::new();
  filtered.filter(|v| *v > 100, &[]);
  filtered.reduce(|acc, v| acc + v, &[]).unwrap();
  let err = filtered.apply(&mut one_to_ten(), &[ApplyOption::ParallelReduce]).unwrap_err();
  assert_eq!(err.to_string(), "Reduce cannot run on an empty working set");
}

#[test]
fn test_conflicting_options_are_rejected_before_running() {
  setup_tracing();
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.map(|_, v| *v = 0, &[]);

  let mut numbers = one_to_ten();
  let err = pipeline
    .apply(&mut numbers, &[ApplyOption::NoCopy, ApplyOption::Clone])
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::ConflictingOptions {
      category: OptionCategory::ClonePolicy,
      ..
    }
  ));
  // Nothing ran, not even on aliased storage.
  assert_eq!(numbers, one_to_ten());

  let err = pipeline
    .apply(&mut numbers, &[ApplyOption::Power50, ApplyOption::Power100])
    .unwrap_err();
  assert!(err.is_validation());
}

#[test]
fn test_panicking_filter_is_reported_as_error() {
  setup_tracing();
  let mut pipeline = pipeline_with_workers::<i32>(4);
  pipeline.filter(|v| *v > 0, &[]);
  pipeline.filter(
    |v| {
      if *v == 7 {
        panic!("cannot judge seven");
      }
      true
    },
    &["fragile"],
  );

  match pipeline.apply(&mut one_to_ten(), &[]) {
    Err(PipelineError::ClosurePanicked { kind, index, message }) => {
      assert_eq!(kind, InstructionKind::Filter);
      assert_eq!(index, 1);
      assert_eq!(message, "cannot judge seven");
    }
    other => panic!("Expected ClosurePanicked, got {:?}", other),
  }
}

#[test]
fn test_panicking_map_and_reduce_are_reported() {
  setup_tracing();
  let mut map_pipeline = Pipeline::<String>::new();
  map_pipeline.map(|idx, _| panic!("bad index {}", idx), &[]);
  let err = map_pipeline.apply(&mut vec!["a".to_string()], &[]).unwrap_err();
  assert!(matches!(
    err,
    PipelineError::ClosurePanicked {
      kind: InstructionKind::Map,
      ..
    }
  ));
  assert!(err.to_string().contains("bad index 0"));

  let mut reduce_pipeline = Pipeline::<i32>::new();
  reduce_pipeline.reduce(|_, _| panic!("no folding"), &[]).unwrap();
  let err = reduce_pipeline.apply(&mut one_to_ten(), &[]).unwrap_err();
  assert!(matches!(
    err,
    PipelineError::ClosurePanicked {
      kind: InstructionKind::Reduce,
      index: 0,
      ..
    }
  ));
}

#[test]
fn test_failed_run_does_not_reset_pipeline() {
  setup_tracing();
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.take(20).unwrap();

  let result = pipeline.apply(&mut one_to_ten(), &[ApplyOption::Reset]);
  assert!(result.is_err());
  assert_eq!(pipeline.len(), 1);

  // Still usable against a long enough input.
  let mut longer: Vec<i32> = (0..25).collect();
  let out = pipeline.apply(&mut longer, &[ApplyOption::Reset]).unwrap();
  assert_eq!(out.len(), 20);
  assert!(pipeline.is_empty());
}
