// derp/examples/print_order.rs

//! Presents the order invoice of a pipeline without running it.

use derp::Pipeline;

fn main() -> anyhow::Result<()> {
  let mut pipeline = Pipeline::<u8>::new();

  pipeline.filter(|v| v % 2 == 0, &["Get just evens"]);
  pipeline.map(|_, v| *v /= 2, &["Half the value"]);
  pipeline.skip(2)?;
  pipeline.take(2)?;

  // No comment, rendered as N/A
  pipeline.foreach(|v| println!("{}", v), &[]);

  // Notice the index for this map is 1 since it's the second map registered.
  pipeline.map(|_, v| *v += 1, &["Increment value", "Check the index"]);

  print!("{}", pipeline);
  Ok(())
}
