// derp/src/core/element.rs

//! The `Element` capability trait: what a pipeline needs from the values it
//! processes, and how those values are copied before a run.
//!
//! Default clone policy table (`Element::DEFAULT_CLONE_POLICY`):
//!
//! | Element type                                              | Default           |
//! |-----------------------------------------------------------|-------------------|
//! | `bool`, `char`, integers, floats, `()`, `&'static str`    | `NoCopy`          |
//! | `String`, `Vec`, `VecDeque`, maps, sets, `Box`, `Option`, tuples | `Clone`    |
//! | `Arc<RwLock<T>>`, `Weak<RwLock<T>>`                       | `Clone`           |
//! | user types (`impl Element for MyRecord {}`)               | `Clone`           |
//!
//! `Clone` calls `structural_clone`: every element gets storage of its own,
//! including a fresh lock behind each `Arc<RwLock<T>>` element, but a handle
//! reached twice is copied twice and `Weak` back references stay shared.
//! `CycleSafeClone` calls `deep_clone` with a memo keyed by allocation address,
//! so handles that appear several times (including back references through
//! `Weak`) map to exactly one new allocation.

use crate::core::options::ClonePolicy;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// A value that can flow through a `Pipeline`.
///
/// Plain records only need `impl Element for MyRecord {}`. Types holding shared
/// handles should override `structural_clone` and `deep_clone` and forward to
/// their fields so that both clone policies reach every handle.
pub trait Element: Clone + Send + Sync + 'static {
  const DEFAULT_CLONE_POLICY: ClonePolicy = ClonePolicy::Clone;

  /// Copy used by `ClonePolicy::Clone`. No identity tracking: shared structure
  /// is duplicated, and a strong cycle never terminates.
  fn structural_clone(&self) -> Self {
    self.clone()
  }

  fn deep_clone(&self, _memo: &mut CloneMemo) -> Self {
    self.clone()
  }
}

/// Returns the clone policy used when `apply` receives no explicit one.
pub fn default_clone_policy<T: Element>() -> ClonePolicy {
  T::DEFAULT_CLONE_POLICY
}

/// Identity memo for `Element::deep_clone`.
///
/// Maps the address of an original shared allocation to the handle that
/// replaced it in the copy.
#[derive(Default)]
pub struct CloneMemo {
  seen: HashMap<usize, Box<dyn Any + Send + Sync>>,
}

impl CloneMemo {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get<H: Clone + 'static>(&self, addr: usize) -> Option<H> {
    self.seen.get(&addr).and_then(|h| h.downcast_ref::<H>()).cloned()
  }

  pub fn insert<H: Send + Sync + 'static>(&mut self, addr: usize, handle: H) {
    self.seen.insert(addr, Box::new(handle));
  }

  pub fn len(&self) -> usize {
    self.seen.len()
  }

  pub fn is_empty(&self) -> bool {
    self.seen.is_empty()
  }
}

impl std::fmt::Debug for CloneMemo {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CloneMemo").field("entries", &self.seen.len()).finish()
  }
}

/// Structurally clones every element of `input`.
pub fn structural_clone_all<T: Element>(input: &[T]) -> Vec<T> {
  input.iter().map(Element::structural_clone).collect()
}

/// Deep-clones every element of `input`, sharing one memo across the whole slice.
pub fn deep_clone_all<T: Element>(input: &[T]) -> Vec<T> {
  let mut memo = CloneMemo::new();
  input.iter().map(|v| v.deep_clone(&mut memo)).collect()
}

macro_rules! scalar_elements {
  ($($t:ty),* $(,)?) => {
    $(
      impl Element for $t {
        const DEFAULT_CLONE_POLICY: ClonePolicy = ClonePolicy::NoCopy;
      }
    )*
  };
}

scalar_elements!(
  bool, char, (), i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, &'static str,
);

impl Element for String {}

impl<T: Element> Element for Vec<T> {
  fn structural_clone(&self) -> Self {
    self.iter().map(Element::structural_clone).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|v| v.deep_clone(memo)).collect()
  }
}

impl<T: Element> Element for VecDeque<T> {
  fn structural_clone(&self) -> Self {
    self.iter().map(Element::structural_clone).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|v| v.deep_clone(memo)).collect()
  }
}

impl<T: Element> Element for Option<T> {
  fn structural_clone(&self) -> Self {
    self.as_ref().map(Element::structural_clone)
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.as_ref().map(|v| v.deep_clone(memo))
  }
}

impl<T: Element> Element for Box<T> {
  fn structural_clone(&self) -> Self {
    Box::new((**self).structural_clone())
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    Box::new((**self).deep_clone(memo))
  }
}

impl<K: Element + Eq + Hash, V: Element> Element for HashMap<K, V> {
  fn structural_clone(&self) -> Self {
    self.iter().map(|(k, v)| (k.structural_clone(), v.structural_clone())).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|(k, v)| (k.deep_clone(memo), v.deep_clone(memo))).collect()
  }
}

impl<K: Element + Ord, V: Element> Element for BTreeMap<K, V> {
  fn structural_clone(&self) -> Self {
    self.iter().map(|(k, v)| (k.structural_clone(), v.structural_clone())).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|(k, v)| (k.deep_clone(memo), v.deep_clone(memo))).collect()
  }
}

impl<T: Element + Eq + Hash> Element for HashSet<T> {
  fn structural_clone(&self) -> Self {
    self.iter().map(Element::structural_clone).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|v| v.deep_clone(memo)).collect()
  }
}

impl<T: Element + Ord> Element for BTreeSet<T> {
  fn structural_clone(&self) -> Self {
    self.iter().map(Element::structural_clone).collect()
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    self.iter().map(|v| v.deep_clone(memo)).collect()
  }
}

impl<A: Element, B: Element> Element for (A, B) {
  fn structural_clone(&self) -> Self {
    (self.0.structural_clone(), self.1.structural_clone())
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    (self.0.deep_clone(memo), self.1.deep_clone(memo))
  }
}

impl<A: Element, B: Element, C: Element> Element for (A, B, C) {
  fn structural_clone(&self) -> Self {
    (self.0.structural_clone(), self.1.structural_clone(), self.2.structural_clone())
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    (self.0.deep_clone(memo), self.1.deep_clone(memo), self.2.deep_clone(memo))
  }
}

/// Shared, mutable node handle. `deep_clone` allocates the replacement before
/// descending into the contents, so a cycle back to this node resolves to the
/// new allocation instead of recursing forever.
impl<T: Element + Default> Element for Arc<RwLock<T>> {
  fn structural_clone(&self) -> Self {
    Arc::new(RwLock::new(self.read().structural_clone()))
  }

  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    let addr = Arc::as_ptr(self) as *const () as usize;
    if let Some(existing) = memo.get::<Arc<RwLock<T>>>(addr) {
      return existing;
    }

    let fresh = Arc::new(RwLock::new(T::default()));
    memo.insert(addr, Arc::clone(&fresh));
    let contents = self.read().deep_clone(memo);
    *fresh.write() = contents;
    fresh
  }
}

// A structurally cloned back reference keeps pointing at the source node: a
// detached copy would have no strong owner and dangle immediately.
impl<T: Element + Default> Element for Weak<RwLock<T>> {
  fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
    match self.upgrade() {
      Some(strong) => Arc::downgrade(&strong.deep_clone(memo)),
      None => Weak::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

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

  fn linked(values: &[i32]) -> Arc<RwLock<Node>> {
    let head = Arc::new(RwLock::new(Node {
      value: values[0],
      ..Default::default()
    }));
    let mut prev = Arc::clone(&head);
    for v in &values[1..] {
      let node = Arc::new(RwLock::new(Node {
        value: *v,
        prev: Some(Arc::downgrade(&prev)),
        next: None,
      }));
      prev.write().next = Some(Arc::clone(&node));
      prev = node;
    }
    head
  }

  #[test]
  fn default_policy_table() {
    assert_eq!(default_clone_policy::<u8>(), ClonePolicy::NoCopy);
    assert_eq!(default_clone_policy::<i64>(), ClonePolicy::NoCopy);
    assert_eq!(default_clone_policy::<f64>(), ClonePolicy::NoCopy);
    assert_eq!(default_clone_policy::<bool>(), ClonePolicy::NoCopy);
    assert_eq!(default_clone_policy::<&'static str>(), ClonePolicy::NoCopy);
    assert_eq!(default_clone_policy::<String>(), ClonePolicy::Clone);
    assert_eq!(default_clone_policy::<Vec<u8>>(), ClonePolicy::Clone);
    assert_eq!(default_clone_policy::<HashMap<String, i32>>(), ClonePolicy::Clone);
    assert_eq!(default_clone_policy::<Option<u8>>(), ClonePolicy::Clone);
    assert_eq!(default_clone_policy::<Arc<RwLock<Node>>>(), ClonePolicy::Clone);
    assert_eq!(default_clone_policy::<Node>(), ClonePolicy::Clone);
  }

  #[test]
  fn deep_clone_keeps_sharing_inside_the_copy() {
    let shared = Arc::new(RwLock::new(7_i32));
    let input = vec![Arc::clone(&shared), Arc::clone(&shared)];

    let copy = deep_clone_all(&input);

    assert!(Arc::ptr_eq(&copy[0], &copy[1]));
    assert!(!Arc::ptr_eq(&copy[0], &shared));
    *copy[0].write() = 99;
    assert_eq!(*shared.read(), 7);
    assert_eq!(*copy[1].read(), 99);
  }

  #[test]
  fn structural_clone_gives_each_handle_its_own_lock() {
    let shared = Arc::new(RwLock::new(vec![1_u8, 2]));
    let input = vec![Arc::clone(&shared), Arc::clone(&shared)];

    let copy = structural_clone_all(&input);

    assert!(!Arc::ptr_eq(&copy[0], &copy[1]));
    assert!(!Arc::ptr_eq(&copy[0], &shared));
    copy[0].write().push(3);
    assert_eq!(*shared.read(), vec![1, 2]);
    assert_eq!(*copy[1].read(), vec![1, 2]);
  }

  #[test]
  fn structural_clone_shares_weak_back_references() {
    let head = linked(&[1, 2]);
    let second = head.read().next.clone().unwrap();

    let copy = second.structural_clone();

    assert!(!Arc::ptr_eq(&copy, &second));
    let back = copy.read().prev.as_ref().and_then(|w| w.upgrade()).unwrap();
    assert!(Arc::ptr_eq(&back, &head));
  }

  #[test]
  fn deep_clone_handles_back_references() {
    let head = linked(&[1, 2, 3, 4]);
    let mut memo = CloneMemo::new();
    let copy = head.deep_clone(&mut memo);
    assert_eq!(memo.len(), 4);

    let mut walked = Vec::new();
    let mut cursor = Some(Arc::clone(&copy));
    while let Some(node) = cursor {
      let guard = node.read();
      let prev = guard.prev.as_ref().and_then(|w| w.upgrade()).map(|p| p.read().value);
      walked.push((guard.value, prev));
      cursor = guard.next.clone();
    }
    assert_eq!(walked, vec![(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3))]);

    // The copy is a separate graph.
    copy.write().value = 100;
    assert_eq!(head.read().value, 1);
    let second = copy.read().next.clone().unwrap();
    let back = second.read().prev.as_ref().and_then(|w| w.upgrade()).unwrap();
    assert!(Arc::ptr_eq(&back, &copy));
  }
}
