// derp/examples/basic_pipeline.rs

use derp::{Pipeline, PipelineError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Pipeline Example ---");

  // 1. Register orders. No data is involved yet.
  let mut pipeline = Pipeline::<i32>::new();
  pipeline.filter(|v| v % 2 == 0, &["Get just evens"]);
  pipeline.map(|_, v| *v *= 2, &["Double"]);
  pipeline.filter(|v| *v > 10, &["Over ten"]);

  let observed = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&observed);
  pipeline.foreach(move |v| sink.lock().push(*v), &["Record what reaches this point"]);
  pipeline.take(2)?;

  // 2. Apply to a concrete input.
  let mut numbers: Vec<i32> = (1..=10).collect();
  let result = pipeline.apply(&mut numbers, &[])?;
  info!("Result: {:?}", result);
  info!("Foreach observed: {:?}", *observed.lock());
  assert_eq!(result, vec![12, 16]);

  // 3. The same pipeline is reusable.
  let mut more: Vec<i32> = (20..30).collect();
  let result = pipeline.apply(&mut more, &[])?;
  info!("Reused on 20..30: {:?}", result);

  // 4. A terminal reduce is always executed last.
  let mut summing = Pipeline::<i32>::new();
  summing.reduce(|acc, v| acc + v, &["Sum"])?;
  summing.map(|_, v| *v *= 10, &["Declared after reduce, runs before it"]);
  let total = summing.apply(&mut (1..=10).collect::<Vec<i32>>(), &[])?;
  info!("Sum of 10..=100 step 10: {:?}", total);
  assert_eq!(total, vec![550]);

  // 5. Registering a second reduce is rejected.
  match summing.reduce(|acc, v| acc * v, &[]) {
    Err(PipelineError::ReduceAlreadySet) => info!("Second reduce rejected as expected."),
    other => anyhow::bail!("unexpected result: {:?}", other),
  }

  Ok(())
}
