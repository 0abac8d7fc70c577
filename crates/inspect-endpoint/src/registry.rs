/*!
Handle Registry (`spec.md` §4.B): bridges a live, in-process UI-object graph
to stable, wire-safe [`Handle`] tokens.

Touched exclusively from under the [`crate::marshal::UiThreadMarshaler`]
(`spec.md` §5), so this type carries no internal locking — a single owner on
the UI-confined worker thread is the whole concurrency story.
*/

use std::collections::HashMap;
use std::hash::Hash;

use inspect_core::Handle;

/// Assigns and resolves opaque [`Handle`] tokens for live nodes of type `N`.
///
/// Invariants (`spec.md` §3, §4.B, testable property 1): every handle maps
/// to at most one node; two handles never share a node; `assign` is
/// idempotent per node within a session.
#[derive(Debug)]
pub struct HandleRegistry<N> {
  next_index: u64,
  forward: HashMap<Handle, N>,
  backward: HashMap<N, Handle>,
}

impl<N> Default for HandleRegistry<N>
where
  N: Clone + Eq + Hash,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<N> HandleRegistry<N>
where
  N: Clone + Eq + Hash,
{
  #[must_use]
  pub fn new() -> Self {
    Self { next_index: 0, forward: HashMap::new(), backward: HashMap::new() }
  }

  /// Return the existing handle for `node`, or assign and return a fresh
  /// one. Deterministic per node within a session: repeated calls for the
  /// same node (by `Eq`/`Hash` identity) always return the same handle.
  pub fn assign(&mut self, node: N) -> Handle {
    if let Some(existing) = self.backward.get(&node) {
      return existing.clone();
    }
    let handle = Handle::from_index(self.next_index);
    self.next_index += 1;
    self.forward.insert(handle.clone(), node.clone());
    self.backward.insert(node, handle.clone());
    handle
  }

  /// Resolve a handle back to its node, if still tracked in this session.
  #[must_use]
  pub fn resolve(&self, handle: &Handle) -> Option<&N> {
    self.forward.get(handle)
  }

  /// Number of handles currently tracked.
  #[must_use]
  pub fn len(&self) -> usize {
    self.forward.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.forward.is_empty()
  }

  #[must_use]
  pub fn contains(&self, handle: &Handle) -> bool {
    self.forward.contains_key(handle)
  }

  /// Drop handles for nodes no longer present in `reachable`, keeping the
  /// registry from growing unbounded across repeated tree walks of a
  /// long-lived session. Opt-in: the endpoint calls this after a full tree
  /// rebuild, not on every request (Open Question (a): handles are
  /// otherwise invalidated lazily, on `resolve` returning `NotFound`).
  pub fn forget_unreachable<'a>(&mut self, reachable: impl Iterator<Item = &'a N>)
  where
    N: 'a,
  {
    let reachable: std::collections::HashSet<&N> = reachable.collect();
    let stale: Vec<N> = self
      .backward
      .keys()
      .filter(|node| !reachable.contains(node))
      .cloned()
      .collect();
    for node in stale {
      if let Some(handle) = self.backward.remove(&node) {
        self.forward.remove(&handle);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assign_is_idempotent_per_node() {
    let mut registry = HandleRegistry::new();
    let a = registry.assign("node-a");
    let b = registry.assign("node-a");
    assert_eq!(a, b);
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn distinct_nodes_get_distinct_handles() {
    let mut registry = HandleRegistry::new();
    let a = registry.assign("node-a");
    let b = registry.assign("node-b");
    assert_ne!(a, b);
  }

  #[test]
  fn resolve_round_trips() {
    let mut registry = HandleRegistry::new();
    let handle = registry.assign("node-a");
    assert_eq!(registry.resolve(&handle), Some(&"node-a"));
  }

  #[test]
  fn resolve_of_unknown_handle_is_none() {
    let registry: HandleRegistry<&str> = HandleRegistry::new();
    assert_eq!(registry.resolve(&Handle::from_index(99)), None);
  }

  #[test]
  fn forget_unreachable_drops_stale_handles_both_ways() {
    let mut registry = HandleRegistry::new();
    let a = registry.assign("node-a");
    let b = registry.assign("node-b");
    registry.forget_unreachable(std::iter::once(&"node-a"));
    assert!(registry.contains(&a));
    assert!(!registry.contains(&b));
    assert_eq!(registry.len(), 1);
  }
}
