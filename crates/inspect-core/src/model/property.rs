/*! Property values and their value-source attribution. */

use serde::{Deserialize, Serialize};

use super::binding::BindingRecord;

/// Maximum length of a normalized property value before truncation.
pub const MAX_VALUE_LEN: usize = 200;

/// The reason a property currently holds the value it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
  Default,
  Inherited,
  DefaultStyle,
  DefaultStyleTrigger,
  Style,
  TemplateTrigger,
  StyleTrigger,
  ImplicitStyle,
  ParentTemplate,
  ParentTemplateTrigger,
  Local,
}

/// A single property read from a UI node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
  pub name: String,
  pub type_name: String,
  /// Normalized string form of the value (see [`format_value`]).
  pub value: String,
  pub source: ValueSource,
  pub is_binding: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binding_details: Option<BindingRecord>,
}

/// Truncate a normalized value to [`MAX_VALUE_LEN`] characters, appending an
/// ellipsis marker when truncation occurred. Operates on `char` boundaries
/// so multi-byte UTF-8 is never split.
#[must_use]
pub fn truncate_value(value: &str) -> String {
  if value.chars().count() <= MAX_VALUE_LEN {
    return value.to_owned();
  }
  let mut truncated: String = value.chars().take(MAX_VALUE_LEN).collect();
  truncated.push('\u{2026}');
  truncated
}

/// Substitute `"[<TypeName>]"` for a stringification that would otherwise
/// collapse to just the type name (e.g. a `ToString` impl that falls back
/// to `Debug`-style `TypeName { .. }` output carrying no useful data).
#[must_use]
pub fn format_opaque(type_name: &str) -> String {
  format!("[{type_name}]")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_values_are_unchanged() {
    assert_eq!(truncate_value("hello"), "hello");
  }

  #[test]
  fn long_values_are_truncated_with_ellipsis() {
    let long = "a".repeat(250);
    let truncated = truncate_value(&long);
    assert_eq!(truncated.chars().count(), MAX_VALUE_LEN + 1);
    assert!(truncated.ends_with('\u{2026}'));
  }

  #[test]
  fn exactly_at_limit_is_unchanged() {
    let value = "a".repeat(MAX_VALUE_LEN);
    assert_eq!(truncate_value(&value), value);
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let long = "é".repeat(250);
    let truncated = truncate_value(&long);
    assert_eq!(truncated.chars().count(), MAX_VALUE_LEN + 1);
  }
}
