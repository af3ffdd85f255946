// derp/examples/primes.rs

//! Fills a large buffer with pseudo-random bytes, then filters the primes.
//! Pass a size in bytes as the first argument (default 100 MB).

use derp::{ApplyOption, Pipeline};
use std::time::Instant;
use tracing::info;

const DEFAULT_SIZE: usize = 1000 * 1000 * 100;

fn is_prime(value: u8) -> bool {
  if value < 2 {
    return false;
  }
  if value == 2 || value == 3 {
    return true;
  }
  if value % 2 == 0 || value % 3 == 0 {
    return false;
  }
  let mut i: u32 = 5;
  while i * i <= value as u32 {
    if value as u32 % i == 0 || value as u32 % (i + 2) == 0 {
      return false;
    }
    i += 6;
  }
  true
}

// splitmix64, keyed by position so every worker produces the same bytes.
fn byte_at(index: usize) -> u8 {
  let mut z = (index as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
  z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  (z ^ (z >> 31)) as u8
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let size = match std::env::args().nth(1) {
    Some(arg) => arg.parse::<usize>()?,
    None => DEFAULT_SIZE,
  };
  info!("Size: {} bytes", size);

  let start = Instant::now();
  let mut numbers = vec![0u8; size];
  let mut alloc = Pipeline::<u8>::new();
  alloc.map(|idx, v| *v = byte_at(idx), &["Random fill"]);
  // u8 defaults to NoCopy, so the fill lands in `numbers` directly.
  alloc.apply(&mut numbers, &[])?;
  info!("Allocating finished in {:?}", start.elapsed());

  // The same pipeline can be run at several power levels.
  let mut prime_pipe = Pipeline::<u8>::new();
  prime_pipe.filter(|v| is_prime(*v), &["Keep primes"]);

  for power in [ApplyOption::Power25, ApplyOption::Power50, ApplyOption::Power100] {
    let start = Instant::now();
    let primes = prime_pipe.apply(&mut numbers, &[power])?;
    info!("{:?}: {} primes in {:?}", power, primes.len(), start.elapsed());
  }

  Ok(())
}
