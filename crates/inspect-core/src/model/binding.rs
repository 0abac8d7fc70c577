/*! Data binding metadata and error records. */

use serde::{Deserialize, Serialize};

/// Where a binding's source expression resolves from.
///
/// Derived in priority order by the analyzer: explicit `source` object,
/// then `ElementName(<n>)`, then `RelativeSource(<mode>)`, defaulting to
/// `DataContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BindingSource {
  DataContext,
  ElementName(String),
  RelativeSource(String),
  /// An explicit source type name, when the framework reports one that
  /// doesn't fit the other cases.
  Explicit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingMode {
  OneWay,
  TwoWay,
  OneWayToSource,
  OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingStatus {
  Active,
  Inactive,
  Detached,
  PathError,
  UpdateTargetError,
  UpdateSourceError,
  AsyncPending,
  Unattached,
  /// Overrides the raw reported status whenever the binding reports an
  /// error, regardless of what status the adapter would otherwise give.
  Error,
}

/// A single data binding attached to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
  pub property: String,
  pub path: String,
  pub source: BindingSource,
  pub mode: BindingMode,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub update_trigger: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub converter: Option<String>,
  pub status: BindingStatus,
  pub has_error: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current_value: Option<String>,
}

impl BindingRecord {
  /// Apply the documented override: a binding that reports an error always
  /// surfaces `status = Error`, no matter the raw status the adapter gave.
  #[must_use]
  pub fn with_error_override(mut self) -> Self {
    if self.has_error {
      self.status = BindingStatus::Error;
    }
    self
  }
}

/// The category of failure extracted from a framework's binding trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingErrorType {
  SourceNotFound,
  PathError,
  ConversionError,
  ValidationError,
  UpdateSourceError,
  Unknown,
}

/// One captured binding diagnostic, as buffered by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingErrorRecord {
  pub element_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub element_name: Option<String>,
  pub property: String,
  pub binding_path: String,
  pub error_type: BindingErrorType,
  pub message: String,
  /// Milliseconds since the Unix epoch.
  pub timestamp: u64,
}
