/*!
Property/Binding Analyzer (`spec.md` §4.F): derives value-source
attribution, binding metadata, and binding-trace diagnostics from the raw
facts a [`crate::adapter::ToolkitAdapter`] reports.

The adapter reports framework-level facts (an explicit source object, an
`ElementName`, a `RelativeSource` mode, raw binding status); this module
owns the *documented* derivation rules — binding source priority, the
binding-trace marker probes, and the error-override status rule — so those
rules live in exactly one place regardless of which adapter is plugged in.
*/

use std::collections::VecDeque;

use inspect_core::model::{
  truncate_value, BindingErrorRecord, BindingErrorType, BindingMode, BindingRecord, BindingSource,
  BindingStatus, ValueSource,
};

/// A property value as read straight off the adapter: normalized but not
/// yet truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
  pub value: String,
  pub source: ValueSource,
  pub is_binding: bool,
}

/// Raw binding facts as reported by the adapter, before the documented
/// source-priority derivation is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
  pub property: String,
  pub path: String,
  /// An explicit `source` object the framework reported, if any. Highest
  /// priority in the source derivation order.
  pub explicit_source: Option<String>,
  pub element_name: Option<String>,
  pub relative_source_mode: Option<String>,
  pub mode: BindingMode,
  pub update_trigger: Option<String>,
  pub converter: Option<String>,
  pub status: BindingStatus,
  pub has_error: bool,
  pub error_message: Option<String>,
  pub current_value: Option<String>,
}

/// Derive a binding's `source` field in the documented priority order:
/// explicit `source` object → `ElementName(<n>)` → `RelativeSource(<mode>)`
/// → default `DataContext`.
#[must_use]
pub fn derive_binding_source(info: &BindingInfo) -> BindingSource {
  if let Some(explicit) = &info.explicit_source {
    return BindingSource::Explicit(explicit.clone());
  }
  if let Some(name) = &info.element_name {
    return BindingSource::ElementName(name.clone());
  }
  if let Some(mode) = &info.relative_source_mode {
    return BindingSource::RelativeSource(mode.clone());
  }
  BindingSource::DataContext
}

/// Build the wire [`BindingRecord`] from raw adapter facts, applying both
/// the source-priority derivation and the error-override status rule.
#[must_use]
pub fn to_binding_record(info: BindingInfo) -> BindingRecord {
  let source = derive_binding_source(&info);
  BindingRecord {
    property: info.property,
    path: info.path,
    source,
    mode: info.mode,
    update_trigger: info.update_trigger,
    converter: info.converter,
    status: info.status,
    has_error: info.has_error,
    error_message: info.error_message,
    current_value: info.current_value,
  }
  .with_error_override()
}

/// Normalize a reported property value for the wire: truncate at
/// [`inspect_core::model::MAX_VALUE_LEN`] with an ellipsis marker.
#[must_use]
pub fn normalize_value(raw: &str) -> String {
  truncate_value(raw)
}

/// Format an ARGB color as the documented `#AARRGGBB` upper-hex form.
#[must_use]
pub fn format_color(argb: u32) -> String {
  format!("#{argb:08X}")
}

// ---------------------------------------------------------------------
// Binding trace parsing
// ---------------------------------------------------------------------

/// Extract the quoted substring following `marker` in `line`, if present.
fn extract_quoted_after(line: &str, marker: &str) -> Option<String> {
  let start = line.find(marker)? + marker.len();
  let rest = &line[start..];
  let quote = rest.find(['\'', '"'])?;
  let quote_char = rest.as_bytes()[quote] as char;
  let rest = &rest[quote + 1..];
  let end = rest.find(quote_char)?;
  Some(rest[..end].to_owned())
}

/// Probe for `target element is '…'`.
#[must_use]
pub fn probe_element_type(line: &str) -> Option<String> {
  extract_quoted_after(line, "target element is")
}

/// Probe for `(Name='…')`.
#[must_use]
pub fn probe_element_name(line: &str) -> Option<String> {
  extract_quoted_after(line, "Name=")
}

/// Probe for `target property is '…'`.
#[must_use]
pub fn probe_property(line: &str) -> Option<String> {
  extract_quoted_after(line, "target property is")
}

/// Probe for `Path=<token>`, terminated by whitespace, `;`, or `)`.
#[must_use]
pub fn probe_binding_path(line: &str) -> Option<String> {
  let start = line.find("Path=")? + "Path=".len();
  let rest = &line[start..];
  let end = rest
    .find(|c: char| c.is_whitespace() || c == ';' || c == ')')
    .unwrap_or(rest.len());
  let path = rest[..end].trim_matches(['\'', '"']);
  if path.is_empty() {
    None
  } else {
    Some(path.to_owned())
  }
}

/// Classify the failure kind via substring probes (`spec.md` §4.F), falling
/// back to [`BindingErrorType::Unknown`].
#[must_use]
pub fn classify_error_type(line: &str) -> BindingErrorType {
  if line.contains("Cannot find source") {
    BindingErrorType::SourceNotFound
  } else if line.contains("path error") {
    BindingErrorType::PathError
  } else if line.contains("Cannot convert") {
    BindingErrorType::ConversionError
  } else if line.contains("ValidationError") {
    BindingErrorType::ValidationError
  } else if line.contains("UpdateSourceExceptionFilter") {
    BindingErrorType::UpdateSourceError
  } else {
    BindingErrorType::Unknown
  }
}

/// Parse one binding-trace line into a [`BindingErrorRecord`], at best
/// effort. Returns `None` when the line carries no recognizable element
/// marker — such lines are not diagnostics this endpoint can attribute.
#[must_use]
pub fn parse_binding_trace_line(line: &str, timestamp: u64) -> Option<BindingErrorRecord> {
  let element_type = probe_element_type(line)?;
  Some(BindingErrorRecord {
    element_type,
    element_name: probe_element_name(line),
    property: probe_property(line).unwrap_or_default(),
    binding_path: probe_binding_path(line).unwrap_or_default(),
    error_type: classify_error_type(line),
    message: line.to_owned(),
    timestamp,
  })
}

/// Bounded FIFO buffer of captured binding-trace diagnostics; drops the
/// oldest entry on overflow.
#[derive(Debug)]
pub struct BindingErrorBuffer {
  capacity: usize,
  entries: VecDeque<BindingErrorRecord>,
}

impl BindingErrorBuffer {
  /// Default capacity documented in `spec.md` §4.F.
  pub const DEFAULT_CAPACITY: usize = 1000;

  #[must_use]
  pub fn new(capacity: usize) -> Self {
    Self { capacity: capacity.max(1), entries: VecDeque::new() }
  }

  /// Push a new entry, dropping the oldest if at capacity.
  pub fn push(&mut self, entry: BindingErrorRecord) {
    if self.entries.len() >= self.capacity {
      self.entries.pop_front();
    }
    self.entries.push_back(entry);
  }

  /// A snapshot of all currently buffered entries, oldest first.
  #[must_use]
  pub fn snapshot(&self) -> Vec<BindingErrorRecord> {
    self.entries.iter().cloned().collect()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Default for BindingErrorBuffer {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn info(
    explicit: Option<&str>,
    element_name: Option<&str>,
    relative: Option<&str>,
  ) -> BindingInfo {
    BindingInfo {
      property: "Text".into(),
      path: "Name".into(),
      explicit_source: explicit.map(String::from),
      element_name: element_name.map(String::from),
      relative_source_mode: relative.map(String::from),
      mode: BindingMode::OneWay,
      update_trigger: None,
      converter: None,
      status: BindingStatus::Active,
      has_error: false,
      error_message: None,
      current_value: None,
    }
  }

  #[test]
  fn explicit_source_wins_over_everything() {
    let source = derive_binding_source(&info(Some("Foo"), Some("Bar"), Some("Self")));
    assert_eq!(source, BindingSource::Explicit("Foo".into()));
  }

  #[test]
  fn element_name_wins_over_relative_source() {
    let source = derive_binding_source(&info(None, Some("Bar"), Some("Self")));
    assert_eq!(source, BindingSource::ElementName("Bar".into()));
  }

  #[test]
  fn relative_source_used_when_nothing_else_present() {
    let source = derive_binding_source(&info(None, None, Some("Self")));
    assert_eq!(source, BindingSource::RelativeSource("Self".into()));
  }

  #[test]
  fn defaults_to_data_context() {
    let source = derive_binding_source(&info(None, None, None));
    assert_eq!(source, BindingSource::DataContext);
  }

  #[test]
  fn to_binding_record_applies_error_override() {
    let mut raw = info(None, None, None);
    raw.has_error = true;
    let record = to_binding_record(raw);
    assert_eq!(record.status, BindingStatus::Error);
  }

  #[test]
  fn color_formats_as_upper_hex_argb() {
    assert_eq!(format_color(0x80FF_0000), "#80FF0000");
  }

  #[test]
  fn probes_extract_documented_markers() {
    let line = "System.Windows.Data Error: target element is 'Button' (Name='SubmitButton'); \
                target property is 'Content'; Path=Label; Cannot find source";
    assert_eq!(probe_element_type(line).as_deref(), Some("Button"));
    assert_eq!(probe_element_name(line).as_deref(), Some("SubmitButton"));
    assert_eq!(probe_property(line).as_deref(), Some("Content"));
    assert_eq!(probe_binding_path(line).as_deref(), Some("Label"));
    assert_eq!(classify_error_type(line), BindingErrorType::SourceNotFound);
  }

  #[test]
  fn unmatched_marker_classifies_as_unknown() {
    assert_eq!(classify_error_type("some unrelated trace line"), BindingErrorType::Unknown);
  }

  #[test]
  fn line_without_element_marker_yields_no_record() {
    assert!(parse_binding_trace_line("no markers here", 0).is_none());
  }

  #[test]
  fn full_line_parses_into_record() {
    let line = "target element is 'Button' (Name='SubmitButton'); target property is 'Content'; \
                Path=Label; Cannot convert value";
    let record = parse_binding_trace_line(line, 1234).unwrap();
    assert_eq!(record.element_type, "Button");
    assert_eq!(record.element_name.as_deref(), Some("SubmitButton"));
    assert_eq!(record.error_type, BindingErrorType::ConversionError);
    assert_eq!(record.timestamp, 1234);
  }

  #[test]
  fn buffer_drops_oldest_on_overflow() {
    let mut buffer = BindingErrorBuffer::new(2);
    for i in 0..3u64 {
      buffer.push(BindingErrorRecord {
        element_type: "T".into(),
        element_name: None,
        property: "P".into(),
        binding_path: "Path".into(),
        error_type: BindingErrorType::Unknown,
        message: format!("m{i}"),
        timestamp: i,
      });
    }
    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].timestamp, 1);
    assert_eq!(snapshot[1].timestamp, 2);
  }
}
