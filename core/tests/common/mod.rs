// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use derp::{CloneMemo, Element, Pipeline};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Weak,
};
use tracing::Level;

// --- Common Element Types ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
  pub name: String,
  pub tags: Vec<String>,
  pub meta: HashMap<i32, String>,
}

impl Element for Person {}

pub fn sample_people() -> Vec<Person> {
  vec![Person {
    name: "kyle".to_string(),
    tags: vec!["x".to_string()],
    meta: HashMap::from([(1, "one".to_string())]),
  }]
}

/// Doubly linked node: strong `next`, weak `prev`.
#[derive(Clone, Debug, Default)]
pub struct Node {
  pub value: i32,
  pub prev: Option<Weak<RwLock<Node>>>,
  pub next: Option<Arc<RwLock<Node>>>,
}

impl Element for Node {
  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    Node {
      value: self.value,
      prev: self.prev.deep_clone(memo),
      next: self.next.deep_clone(memo),
    }
  }
}

/// Builds a doubly linked list and returns every node handle, head first.
pub fn make_dll(values: &[i32]) -> Vec<Arc<RwLock<Node>>> {
  let mut nodes: Vec<Arc<RwLock<Node>>> = Vec::with_capacity(values.len());
  for v in values {
    let node = Arc::new(RwLock::new(Node {
      value: *v,
      prev: nodes.last().map(Arc::downgrade),
      next: None,
    }));
    if let Some(prev) = nodes.last() {
      prev.write().next = Some(Arc::clone(&node));
    }
    nodes.push(node);
  }
  nodes
}

/// Renders a list as `Node v: prev=.., next=..` lines, walking forward from `head`.
pub fn print_list(head: &Arc<RwLock<Node>>) -> String {
  let mut out = String::new();
  let mut cursor = Some(Arc::clone(head));
  while let Some(node) = cursor {
    let guard = node.read();
    let prev = guard
      .prev
      .as_ref()
      .and_then(Weak::upgrade)
      .map_or("nil".to_string(), |p| p.read().value.to_string());
    let next = guard.next.as_ref().map_or("nil".to_string(), |n| n.read().value.to_string());
    out.push_str(&format!("Node {}: prev={}, next={}\n", guard.value, prev, next));
    cursor = guard.next.clone();
  }
  out
}

// --- Pipeline helpers ---
pub fn one_to_ten() -> Vec<i32> {
  (1..=10).collect()
}

pub fn pipeline_with_workers<T: Element>(workers: usize) -> Pipeline<T> {
  Pipeline::new().with_parallelism(NonZeroUsize::new(workers).expect("workers must be non-zero"))
}

/// Shared sink for foreach actions, safe to use from concurrent workers.
pub fn collector<T: Send + 'static>() -> Arc<Mutex<Vec<T>>> {
  Arc::new(Mutex::new(Vec::new()))
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static FIRST_REDUCER_CALLS: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static SECOND_REDUCER_CALLS: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static MAP_CALLS: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  FIRST_REDUCER_CALLS.store(0, Ordering::SeqCst);
  SECOND_REDUCER_CALLS.store(0, Ordering::SeqCst);
  MAP_CALLS.store(0, Ordering::SeqCst);
}
