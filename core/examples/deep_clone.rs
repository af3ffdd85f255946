// derp/examples/deep_clone.rs

//! Compares the clone policies on records and on a doubly linked list.

use derp::{ApplyOption, CloneMemo, Element, Pipeline};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::info;

#[derive(Clone, Debug, Default)]
struct Person {
  name: String,
  tags: Vec<String>,
  meta: HashMap<i32, String>,
}

impl Element for Person {}

#[derive(Clone, Debug, Default)]
struct Node {
  value: i32,
  prev: Option<Weak<RwLock<Node>>>,
  next: Option<Arc<RwLock<Node>>>,
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

fn values(head: &Arc<RwLock<Node>>) -> Vec<i32> {
  let mut out = Vec::new();
  let mut cursor = Some(Arc::clone(head));
  while let Some(node) = cursor {
    let guard = node.read();
    out.push(guard.value);
    cursor = guard.next.clone();
  }
  out
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  // Records: structural clone is the default, the input stays untouched.
  let mut people = vec![Person {
    name: "Kyle".to_string(),
    tags: vec!["x".to_string(), "y".to_string(), "z".to_string()],
    meta: HashMap::from([(1, "one".to_string()), (2, "two".to_string()), (3, "three".to_string())]),
  }];

  let mut pipeline = Pipeline::<Person>::new();
  pipeline.map(
    |_, p| {
      p.tags.push("a".to_string());
      p.meta.insert(4, "four".to_string());
    },
    &[],
  );

  let cloned = pipeline.apply(&mut people, &[])?;
  info!("New:\t{:?}", cloned);
  info!("Old:\t{:?}", people);

  let aliased = pipeline.apply(&mut people, &[ApplyOption::NoCopy])?;
  info!("NoCopy output:\t{:?}", aliased[0].tags);
  info!("NoCopy input:\t{:?}", people[0].tags);

  // Linked nodes: only the cycle-safe clone produces an independent graph.
  let mut nodes: Vec<Arc<RwLock<Node>>> = Vec::new();
  for v in 1..=5 {
    let node = Arc::new(RwLock::new(Node {
      value: v,
      prev: nodes.last().map(Arc::downgrade),
      next: None,
    }));
    if let Some(prev) = nodes.last() {
      prev.write().next = Some(Arc::clone(&node));
    }
    nodes.push(node);
  }

  let mut scale = Pipeline::<Arc<RwLock<Node>>>::new();
  scale.map(|_, n| n.write().value *= 10, &["Scale"]);

  let copy = scale.apply(&mut nodes, &[ApplyOption::CycleSafeClone])?;
  info!("Cycle-safe copy:\t{:?}", values(&copy[0]));
  info!("Original list:\t{:?}", values(&nodes[0]));

  // Each element gets a fresh node, but `next` still leads into the source list.
  let structural = scale.apply(&mut nodes, &[ApplyOption::Clone])?;
  info!("Structural copy, first node:\t{}", structural[0].read().value);
  info!("Walking its next links:\t{:?}", values(&structural[0]));
  info!("Original list:\t{:?}", values(&nodes[0]));

  Ok(())
}
