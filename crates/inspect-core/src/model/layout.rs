/*! Layout (render geometry) records. */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
  pub w: f64,
  pub h: f64,
}

/// Margin/padding-style box of four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
  pub l: f64,
  pub t: f64,
  pub r: f64,
  pub b: f64,
}

impl EdgeInsets {
  /// Render as the spec's `"(l,t,r,b)"` tuple notation.
  #[must_use]
  pub fn to_tuple_string(self) -> String {
    format!("({},{},{},{})", self.l, self.t, self.r, self.b)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
  Left,
  Center,
  Right,
  Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
  Top,
  Center,
  Bottom,
  Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
  Visible,
  Hidden,
  Collapsed,
}

/// Render geometry for a renderable node, as returned by `GetLayoutInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
  pub actual_width: f64,
  pub actual_height: f64,
  pub desired_size: Size,
  pub render_size: Size,
  pub margin: EdgeInsets,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub padding: Option<EdgeInsets>,
  pub horizontal_alignment: HorizontalAlignment,
  pub vertical_alignment: VerticalAlignment,
  pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn edge_insets_tuple_format() {
    let insets = EdgeInsets { l: 1.0, t: 2.0, r: 3.0, b: 4.0 };
    assert_eq!(insets.to_tuple_string(), "(1,2,3,4)");
  }
}
