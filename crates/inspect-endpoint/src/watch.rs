/*!
Property-watch bookkeeping (`spec.md` §4.F "Property watching"): tracks the
last value seen per active watch so change notifications can report
`oldValue` correctly.
*/

use std::collections::HashMap;

use inspect_core::model::Watch;
use inspect_core::Handle;

/// Owns every active [`Watch`] for a session, keyed by its `watchId`.
///
/// Only ever touched under the UI-thread marshaler, matching the Handle
/// Registry's single-owner model (`spec.md` §5).
#[derive(Debug, Default)]
pub struct WatchTable {
  next_index: u64,
  watches: HashMap<String, Watch>,
}

impl WatchTable {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a freshly subscribed watch, allocating its `watchId`.
  pub fn insert(&mut self, handle: Handle, property_name: String, initial_value: String) -> Watch {
    let watch_id = format!("watch_{:x}", self.next_index);
    self.next_index += 1;
    let watch = Watch { watch_id: watch_id.clone(), handle, property_name, last_value: initial_value };
    self.watches.insert(watch_id, watch.clone());
    watch
  }

  /// Record a new observed value for `watch_id`, returning the previous
  /// value to report as `oldValue` on the emitted notification. Returns
  /// `None` if the watch is no longer tracked.
  pub fn observe(&mut self, watch_id: &str, new_value: String) -> Option<String> {
    let watch = self.watches.get_mut(watch_id)?;
    let old_value = std::mem::replace(&mut watch.last_value, new_value);
    Some(old_value)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.watches.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.watches.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_allocates_distinct_watch_ids() {
    let mut table = WatchTable::new();
    let a = table.insert(Handle::from_index(1), "Text".into(), "A".into());
    let b = table.insert(Handle::from_index(2), "Text".into(), "B".into());
    assert_ne!(a.watch_id, b.watch_id);
  }

  #[test]
  fn observe_reports_previous_value_and_updates_state() {
    let mut table = WatchTable::new();
    let watch = table.insert(Handle::from_index(1), "Text".into(), "A".into());
    let old = table.observe(&watch.watch_id, "B".into());
    assert_eq!(old.as_deref(), Some("A"));
    let old = table.observe(&watch.watch_id, "C".into());
    assert_eq!(old.as_deref(), Some("B"));
  }

  #[test]
  fn observe_of_unknown_watch_is_none() {
    let mut table = WatchTable::new();
    assert_eq!(table.observe("watch_0", "X".into()), None);
  }
}
