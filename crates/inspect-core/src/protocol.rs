/*!
Wire protocol envelopes (`spec.md` §4.C, §6): the tagged Request union, the
flat Response envelope, and the Notification union.

Requests are a closed tagged sum keyed by `type`, with the per-kind payload
(including `requestId`) nested under `data` — mirroring the single
discriminated-union decode path the protocol favors at the endpoint.
Responses carry no kind tag on the wire; a caller already knows which kind
of response to expect because it knows which request it sent, so
[`ResponseData`] exists for the endpoint's own construction rather than as a
blind decode target (a response is always decoded into the concrete type
matching the request that produced it).
*/

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::model::{
  BindingErrorRecord, BindingRecord, LayoutRecord, PropertyRecord, ResourceRecord, ResourceScope,
  StyleRecord, VisualTreeNode,
};

fn default_max_depth() -> usize {
  10
}

fn default_max_results() -> usize {
  50
}

fn default_highlight_duration_ms() -> u64 {
  2000
}

/// Clamp a requested `FindElements` result cap into the documented bound.
#[must_use]
pub fn clamp_max_results(requested: usize) -> usize {
  requested.clamp(1, 10_000)
}

// ---------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVisualTreeRequest {
  pub request_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root_handle: Option<Handle>,
  #[serde(default = "default_max_depth")]
  pub max_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogicalTreeRequest {
  pub request_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root_handle: Option<Handle>,
  #[serde(default = "default_max_depth")]
  pub max_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetElementPropertiesRequest {
  pub request_id: String,
  pub element_handle: Handle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindElementsRequest {
  pub request_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root_handle: Option<Handle>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub type_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub element_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub property_filter: Option<HashMap<String, String>>,
  #[serde(default = "default_max_results")]
  pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBindingsRequest {
  pub request_id: String,
  pub element_handle: Handle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBindingErrorsRequest {
  pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourcesRequest {
  pub request_id: String,
  pub scope: ResourceScope,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub element_handle: Option<Handle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStylesRequest {
  pub request_id: String,
  pub element_handle: Handle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightElementRequest {
  pub request_id: String,
  pub element_handle: Handle,
  #[serde(default = "default_highlight_duration_ms")]
  pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLayoutInfoRequest {
  pub request_id: String,
  pub element_handle: Handle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPropertyRequest {
  pub request_id: String,
  pub element_handle: Handle,
  pub property_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
  Json,
  Xaml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTreeRequest {
  pub request_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub element_handle: Option<Handle>,
  pub format: ExportFormat,
}

/// The closed set of request kinds, tagged by `type` with the payload
/// (including `requestId`) nested under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Request {
  GetVisualTree(GetVisualTreeRequest),
  GetLogicalTree(GetLogicalTreeRequest),
  GetElementProperties(GetElementPropertiesRequest),
  FindElements(FindElementsRequest),
  GetBindings(GetBindingsRequest),
  GetBindingErrors(GetBindingErrorsRequest),
  GetResources(GetResourcesRequest),
  GetStyles(GetStylesRequest),
  HighlightElement(HighlightElementRequest),
  GetLayoutInfo(GetLayoutInfoRequest),
  WatchProperty(WatchPropertyRequest),
  ExportTree(ExportTreeRequest),
}

impl Request {
  /// The `requestId` carried by whichever variant this is.
  #[must_use]
  pub fn request_id(&self) -> &str {
    match self {
      Self::GetVisualTree(r) => &r.request_id,
      Self::GetLogicalTree(r) => &r.request_id,
      Self::GetElementProperties(r) => &r.request_id,
      Self::FindElements(r) => &r.request_id,
      Self::GetBindings(r) => &r.request_id,
      Self::GetBindingErrors(r) => &r.request_id,
      Self::GetResources(r) => &r.request_id,
      Self::GetStyles(r) => &r.request_id,
      Self::HighlightElement(r) => &r.request_id,
      Self::GetLayoutInfo(r) => &r.request_id,
      Self::WatchProperty(r) => &r.request_id,
      Self::ExportTree(r) => &r.request_id,
    }
  }

  /// The request kind name, as it appears in the `type` tag.
  #[must_use]
  pub fn kind(&self) -> &'static str {
    match self {
      Self::GetVisualTree(_) => "GetVisualTree",
      Self::GetLogicalTree(_) => "GetLogicalTree",
      Self::GetElementProperties(_) => "GetElementProperties",
      Self::FindElements(_) => "FindElements",
      Self::GetBindings(_) => "GetBindings",
      Self::GetBindingErrors(_) => "GetBindingErrors",
      Self::GetResources(_) => "GetResources",
      Self::GetStyles(_) => "GetStyles",
      Self::HighlightElement(_) => "HighlightElement",
      Self::GetLayoutInfo(_) => "GetLayoutInfo",
      Self::WatchProperty(_) => "WatchProperty",
      Self::ExportTree(_) => "ExportTree",
    }
  }
}

// ---------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVisualTreeResponseData {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub root: Option<VisualTreeNode>,
  pub total_elements: usize,
  pub max_depth_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetElementPropertiesResponseData {
  pub properties: Vec<PropertyRecord>,
}

/// One `FindElements` match: the node plus its visual-parent path chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindElementMatch {
  pub handle: Handle,
  pub type_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// `" > "`-joined chain of `Type[Name]`-or-`Type`, root first.
  pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindElementsResponseData {
  pub matches: Vec<FindElementMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBindingsResponseData {
  pub bindings: Vec<BindingRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBindingErrorsResponseData {
  pub errors: Vec<BindingErrorRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourcesResponseData {
  pub resources: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStylesResponseData {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub style: Option<StyleRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightElementResponseData {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLayoutInfoResponseData {
  pub layout: LayoutRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPropertyResponseData {
  pub watch_id: String,
  pub initial_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTreeResponseData {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub root: Option<VisualTreeNode>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_depth_reached: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub xaml: Option<String>,
}

/// Kind-specific success fields, flattened onto [`ResponseEnvelope`].
///
/// Never used as a blind untagged decode target: the endpoint only ever
/// constructs one variant per handler, and a caller decodes the envelope
/// into the concrete type matching the request it sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
  GetVisualTree(GetVisualTreeResponseData),
  GetElementProperties(GetElementPropertiesResponseData),
  FindElements(FindElementsResponseData),
  GetBindings(GetBindingsResponseData),
  GetBindingErrors(GetBindingErrorsResponseData),
  GetResources(GetResourcesResponseData),
  GetStyles(GetStylesResponseData),
  GetLayoutInfo(GetLayoutInfoResponseData),
  WatchProperty(WatchPropertyResponseData),
  ExportTree(ExportTreeResponseData),
  HighlightElement(HighlightElementResponseData),
}

/// The flat response envelope every request kind replies with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
  pub request_id: String,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(flatten)]
  pub data: Option<ResponseData>,
}

impl ResponseEnvelope {
  /// Build a successful envelope carrying the given kind-specific data.
  #[must_use]
  pub fn ok(request_id: impl Into<String>, data: ResponseData) -> Self {
    Self { request_id: request_id.into(), success: true, error: None, data: Some(data) }
  }

  /// Build an error envelope. `requestId` is `""` when the request could
  /// not even be parsed far enough to recover one.
  #[must_use]
  pub fn err(request_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self { request_id: request_id.into(), success: false, error: Some(message.into()), data: None }
  }
}

// ---------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------

/// Unsolicited, `requestId`-less messages the endpoint may emit at any time
/// between responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notificationType", rename_all_fields = "camelCase")]
pub enum Notification {
  PropertyChanged {
    watch_id: String,
    property_name: String,
    old_value: String,
    new_value: String,
    timestamp: u64,
  },
  BindingError {
    element_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_name: Option<String>,
    property: String,
    binding_path: String,
    error_type: crate::model::BindingErrorType,
    message: String,
    timestamp: u64,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_tag_shape_round_trips() {
    let req = Request::GetElementProperties(GetElementPropertiesRequest {
      request_id: "r1".into(),
      element_handle: Handle::from("elem_1"),
    });
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("\"type\":\"GetElementProperties\""));
    assert!(json.contains("\"data\":"));
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back.request_id(), "r1");
  }

  #[test]
  fn defaults_apply_when_fields_are_absent() {
    let json = r#"{"type":"GetVisualTree","data":{"requestId":"r2"}}"#;
    let req: Request = serde_json::from_str(json).unwrap();
    let Request::GetVisualTree(data) = req else {
      panic!("wrong variant");
    };
    assert_eq!(data.max_depth, 10);
    assert!(data.root_handle.is_none());
  }

  #[test]
  fn max_results_clamps_into_bounds() {
    assert_eq!(clamp_max_results(0), 1);
    assert_eq!(clamp_max_results(50_000), 10_000);
    assert_eq!(clamp_max_results(5), 5);
  }

  #[test]
  fn error_envelope_omits_data_field() {
    let envelope = ResponseEnvelope::err("", "bad request");
    let json = serde_json::to_string(&envelope).unwrap();
    assert!(json.contains("\"success\":false"));
    assert!(!json.contains("\"root\""));
  }

  #[test]
  fn notification_tag_matches_spec_kind_names() {
    let note = Notification::PropertyChanged {
      watch_id: "w1".into(),
      property_name: "Text".into(),
      old_value: "A".into(),
      new_value: "B".into(),
      timestamp: 0,
    };
    let json = serde_json::to_string(&note).unwrap();
    assert!(json.contains("\"notificationType\":\"PropertyChanged\""));
  }
}
