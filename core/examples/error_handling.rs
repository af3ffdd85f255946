// derp/examples/error_handling.rs

use derp::{ApplyOption, Pipeline, PipelineError};
use tracing::{error, info};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum ExampleAppError {
  #[error("A custom application error occurred: {0}")]
  CustomError(String),

  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError), // Allows PipelineError to be converted into ExampleAppError
}

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  // Scenario 1: Registration rejects invalid counts
  info!("\nScenario 1: Validation error at registration");
  if let Err(e) = register_invalid_skip() {
    error!("Registration failed: {}", e);
  }

  // Scenario 2: Take past the end of the working set
  info!("\nScenario 2: Range error during apply");
  if let Err(e) = take_too_many() {
    error!("Apply failed: {}", e);
  }

  // Scenario 3: A user closure panics inside a worker
  info!("\nScenario 3: Panicking closure");
  if let Err(e) = panicking_map() {
    error!("Apply failed: {}", e);
  }

  // Scenario 4: Conflicting options
  info!("\nScenario 4: Conflicting options");
  if let Err(e) = conflicting_options() {
    error!("Apply failed: {}", e);
  }

  // Scenario 5: Application-level check on the result
  info!("\nScenario 5: Application error");
  match empty_result_is_an_error() {
    Err(ExampleAppError::CustomError(msg)) => error!("Application rejected the output: {}", msg),
    other => info!("Unexpected outcome: {:?}", other),
  }
}

fn register_invalid_skip() -> Result<(), ExampleAppError> {
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.skip(0)?;
  Ok(())
}

fn take_too_many() -> Result<Vec<i32>, ExampleAppError> {
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.take(50)?;
  Ok(pipeline.apply(&mut (1..=10).collect::<Vec<i32>>(), &[])?)
}

fn panicking_map() -> Result<Vec<String>, ExampleAppError> {
  let mut pipeline = Pipeline::<String>::new();
  pipeline.map(
    |idx, s| {
      if s.is_empty() {
        panic!("empty string at index {}", idx);
      }
      s.make_ascii_uppercase();
    },
    &["Uppercase, refusing empty strings"],
  );
  let mut words = vec!["alpha".to_string(), String::new(), "gamma".to_string()];
  Ok(pipeline.apply(&mut words, &[])?)
}

fn conflicting_options() -> Result<Vec<i32>, ExampleAppError> {
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.map(|_, v| *v += 1, &[]);
  Ok(pipeline.apply(&mut vec![1, 2, 3], &[ApplyOption::Power25, ApplyOption::Power75])?)
}

fn empty_result_is_an_error() -> Result<Vec<i32>, ExampleAppError> {
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.filter(|v| *v > 100, &["Nothing passes"]);
  let out = pipeline.apply(&mut (1..=10).collect::<Vec<i32>>(), &[])?;
  if out.is_empty() {
    return Err(ExampleAppError::CustomError("no element survived the filter".to_string()));
  }
  Ok(out)
}
