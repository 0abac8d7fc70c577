/*!
`ExportTree` rendering (`spec.md` §4.E). Both the `json` and `xaml` export
formats are produced from the exact same [`VisualTreeNode`] tree the
`GetVisualTree` handler builds — there is one tree-walking implementation
behind both formats, not two. `json` simply reuses that tree at very deep
depth; `xaml` pretty-prints it.
*/

use inspect_core::model::VisualTreeNode;

/// Minimum depth `ExportTree{format:"json"}` must walk to, per `spec.md`
/// §4.E ("very deep (≥100) depth").
pub const EXPORT_JSON_DEPTH: usize = 100;

/// The last dot-separated segment of a fully-qualified type name.
#[must_use]
pub fn short_type_name(full: &str) -> &str {
  full.rsplit('.').next().unwrap_or(full)
}

/// Pretty-print a visual tree as indentation-based XAML-like markup: each
/// node is `<ShortType x:Name="…"?>…</ShortType>`, two-space indented,
/// self-closing when it has no children.
#[must_use]
pub fn render_xaml_like(node: &VisualTreeNode) -> String {
  let mut out = String::new();
  write_node(node, 0, &mut out);
  out
}

fn write_node(node: &VisualTreeNode, indent: usize, out: &mut String) {
  let pad = "  ".repeat(indent);
  let short = short_type_name(&node.type_name);
  let name_attr = node.name.as_ref().map_or_else(String::new, |n| format!(" x:Name=\"{n}\""));

  if node.children.is_empty() {
    out.push_str(&format!("{pad}<{short}{name_attr} />\n"));
    return;
  }

  out.push_str(&format!("{pad}<{short}{name_attr}>\n"));
  for child in &node.children {
    write_node(child, indent + 1, out);
  }
  out.push_str(&format!("{pad}</{short}>\n"));
}

#[cfg(test)]
mod tests {
  use super::*;
  use inspect_core::Handle;

  fn leaf(type_name: &str, name: Option<&str>) -> VisualTreeNode {
    VisualTreeNode {
      handle: Handle::from_index(0),
      type_name: type_name.into(),
      name: name.map(String::from),
      depth: 0,
      children: Vec::new(),
    }
  }

  #[test]
  fn short_type_name_strips_namespace() {
    assert_eq!(short_type_name("System.Windows.Controls.Button"), "Button");
    assert_eq!(short_type_name("Button"), "Button");
  }

  #[test]
  fn leaf_renders_self_closing() {
    let node = leaf("System.Windows.Controls.Button", Some("SubmitButton"));
    assert_eq!(render_xaml_like(&node), "<Button x:Name=\"SubmitButton\" />\n");
  }

  #[test]
  fn nested_children_are_indented() {
    let tree = VisualTreeNode {
      handle: Handle::from_index(0),
      type_name: "System.Windows.Window".into(),
      name: None,
      depth: 0,
      children: vec![leaf("System.Windows.Controls.Button", None)],
    };
    let xaml = render_xaml_like(&tree);
    assert_eq!(xaml, "<Window>\n  <Button />\n</Window>\n");
  }
}
