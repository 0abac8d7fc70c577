/*! Resource dictionary records. */

use serde::{Deserialize, Serialize};

/// The scope a `GetResources` lookup walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceScope {
  Application,
  Window,
  Element,
}

/// A single resolved resource-dictionary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
  pub key: String,
  pub type_name: String,
  pub value: String,
  /// Identifies the owner this resource was resolved from (e.g. the
  /// element, a named ancestor, or `"Application"`).
  pub source: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target_type: Option<String>,
}
