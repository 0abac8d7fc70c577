/*! Visual/logical tree wire records. */

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

/// One node in a `GetVisualTree`/`GetLogicalTree`/`ExportTree` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualTreeNode {
  pub handle: Handle,
  pub type_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub depth: usize,
  pub children: Vec<VisualTreeNode>,
}

impl VisualTreeNode {
  /// Total node count in the subtree rooted here, including itself.
  #[must_use]
  pub fn count(&self) -> usize {
    1 + self.children.iter().map(VisualTreeNode::count).sum::<usize>()
  }

  /// The deepest `depth` value present in the subtree.
  #[must_use]
  pub fn max_depth(&self) -> usize {
    self
      .children
      .iter()
      .map(VisualTreeNode::max_depth)
      .max()
      .unwrap_or(self.depth)
  }
}
