/*! Opaque session-scoped identifiers for live UI nodes. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// An opaque, session-scoped identifier for a live UI node.
///
/// Handles are assigned on first observation and remain valid until the
/// hosting endpoint terminates. Clients must treat them as opaque tokens —
/// they carry no meaning outside the session that produced them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
  /// Build a handle from a monotonic index, following the `elem_<hex>` form
  /// the protocol documents as the default token shape.
  #[must_use]
  pub fn from_index(index: u64) -> Self {
    Self(format!("elem_{index:x}"))
  }

  /// Borrow the underlying token text.
  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for Handle {
  fn from(value: &str) -> Self {
    Self(value.to_owned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_index_is_hex_prefixed() {
    assert_eq!(Handle::from_index(0).as_str(), "elem_0");
    assert_eq!(Handle::from_index(255).as_str(), "elem_ff");
  }

  #[test]
  fn distinct_indexes_yield_distinct_handles() {
    assert_ne!(Handle::from_index(1), Handle::from_index(2));
  }

  #[test]
  fn round_trips_through_json() {
    let handle = Handle::from_index(42);
    let json = serde_json::to_string(&handle).unwrap();
    assert_eq!(json, "\"elem_2a\"");
    let back: Handle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, handle);
  }
}
