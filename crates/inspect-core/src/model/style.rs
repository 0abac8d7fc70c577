/*! Style records: setters and triggers. */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSetter {
  pub property: String,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTrigger {
  pub kind: String,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A resolved style, as returned by `GetStyles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
  pub target_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub based_on: Option<String>,
  pub setters: Vec<StyleSetter>,
  pub triggers: Vec<StyleTrigger>,
  /// True when an implicit (type-keyed) style is reachable via resource
  /// lookup but distinct from the style actually active on the element.
  pub implicit_style_shadowed: bool,
}
