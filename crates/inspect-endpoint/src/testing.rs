/*!
In-memory [`ToolkitAdapter`] mock (ambient test tooling), gated behind the
`test-util` feature. Lets the endpoint's handler semantics be exercised
without any real UI framework — every integration test in this workspace
drives the endpoint against [`MockAdapter`].
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inspect_core::model::{BindingMode, BindingStatus, LayoutRecord, ResourceRecord, ResourceScope, StyleRecord, ValueSource};
use parking_lot::Mutex;

use crate::adapter::{BindingTraceSink, PropertyChangeCallback, SubscriptionToken, ToolkitAdapter};
use crate::analyzer::{BindingInfo, PropertyValue};

/// A declarative description of one mock node, built up fluently and
/// handed to [`MockAdapter::from_tree`].
#[derive(Debug, Clone)]
pub struct MockNodeSpec {
  pub type_name: String,
  pub name: Option<String>,
  pub properties: Vec<(String, String, ValueSource)>,
  pub layout: Option<LayoutRecord>,
  pub style: Option<StyleRecord>,
  pub children: Vec<MockNodeSpec>,
}

impl MockNodeSpec {
  #[must_use]
  pub fn new(type_name: impl Into<String>) -> Self {
    Self {
      type_name: type_name.into(),
      name: None,
      properties: Vec::new(),
      layout: None,
      style: None,
      children: Vec::new(),
    }
  }

  #[must_use]
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  #[must_use]
  pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>, source: ValueSource) -> Self {
    self.properties.push((name.into(), value.into(), source));
    self
  }

  #[must_use]
  pub fn with_layout(mut self, layout: LayoutRecord) -> Self {
    self.layout = Some(layout);
    self
  }

  #[must_use]
  pub fn with_child(mut self, child: MockNodeSpec) -> Self {
    self.children.push(child);
    self
  }
}

/// An opaque identity for a node inside a [`MockAdapter`]'s arena. Cheap to
/// clone (a plain index), `Hash`/`Eq` by that index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockNode(usize);

#[derive(Debug)]
struct ArenaNode {
  type_name: String,
  name: Option<String>,
  properties: HashMap<String, (String, ValueSource)>,
  bound_properties: HashMap<String, BindingInfo>,
  layout: Option<LayoutRecord>,
  style: Option<StyleRecord>,
  parent: Option<MockNode>,
  children: Vec<MockNode>,
}

/// An in-memory [`ToolkitAdapter`] built from a [`MockNodeSpec`] tree.
/// Property-change subscriptions and the binding trace sink are honored so
/// tests can drive `WatchProperty` and binding-error capture end to end.
pub struct MockAdapter {
  arena: Mutex<Vec<ArenaNode>>,
  roots: Vec<MockNode>,
  subscriptions: Mutex<HashMap<u64, (MockNode, String, PropertyChangeCallback)>>,
  next_subscription: AtomicU64,
  trace_sink: Mutex<Option<BindingTraceSink>>,
}

impl std::fmt::Debug for MockAdapter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MockAdapter").field("roots", &self.roots).finish_non_exhaustive()
  }
}

impl MockAdapter {
  /// Build an adapter whose single root is described by `spec`.
  #[must_use]
  pub fn from_tree(spec: MockNodeSpec) -> Arc<Self> {
    let mut arena = Vec::new();
    let root = insert_spec(&mut arena, spec, None);
    Arc::new(Self {
      arena: Mutex::new(arena),
      roots: vec![root],
      subscriptions: Mutex::new(HashMap::new()),
      next_subscription: AtomicU64::new(0),
      trace_sink: Mutex::new(None),
    })
  }

  /// Directly set a property's value, firing any subscription registered
  /// for `(node, property_name)`. Used by tests to simulate a live change.
  pub fn set_property(&self, node: MockNode, property_name: &str, value: impl Into<String>) {
    let value = value.into();
    {
      let mut arena = self.arena.lock();
      let entry = arena[node.0].properties.entry(property_name.to_owned()).or_insert((
        String::new(),
        ValueSource::Local,
      ));
      entry.0.clone_from(&value);
    }
    let subscriptions = self.subscriptions.lock();
    for (watched_node, watched_property, callback) in subscriptions.values() {
      if *watched_node == node && watched_property == property_name {
        callback(value.clone());
      }
    }
  }

  /// Emit a synthetic binding-trace line as if the framework produced it.
  pub fn emit_trace_line(&self, line: impl Into<String>) {
    if let Some(sink) = self.trace_sink.lock().as_ref() {
      let _ = sink.send(line.into());
    }
  }

  /// The root node, for tests that only build a single-root tree.
  #[must_use]
  pub fn root(&self) -> MockNode {
    self.roots[0]
  }
}

fn insert_spec(arena: &mut Vec<ArenaNode>, spec: MockNodeSpec, parent: Option<MockNode>) -> MockNode {
  let index = arena.len();
  let node = MockNode(index);
  arena.push(ArenaNode {
    type_name: spec.type_name,
    name: spec.name,
    properties: spec
      .properties
      .into_iter()
      .map(|(name, value, source)| (name, (value, source)))
      .collect(),
    bound_properties: HashMap::new(),
    layout: spec.layout,
    style: spec.style,
    parent,
    children: Vec::new(),
  });
  let children: Vec<MockNode> = spec.children.into_iter().map(|child| insert_spec(arena, child, Some(node))).collect();
  arena[index].children = children;
  node
}

impl ToolkitAdapter for MockAdapter {
  type Node = MockNode;

  fn root_nodes(&self) -> Vec<Self::Node> {
    self.roots.clone()
  }

  fn children_visual(&self, node: &Self::Node) -> Vec<Self::Node> {
    self.arena.lock()[node.0].children.clone()
  }

  fn children_logical(&self, node: &Self::Node) -> Vec<Self::Node> {
    self.children_visual(node)
  }

  fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
    self.arena.lock()[node.0].parent
  }

  fn type_name(&self, node: &Self::Node) -> String {
    self.arena.lock()[node.0].type_name.clone()
  }

  fn short_type_name(&self, node: &Self::Node) -> String {
    crate::export::short_type_name(&self.type_name(node)).to_owned()
  }

  fn name(&self, node: &Self::Node) -> Option<String> {
    self.arena.lock()[node.0].name.clone()
  }

  fn properties(&self, node: &Self::Node) -> Vec<(String, String)> {
    self.arena.lock()[node.0]
      .properties
      .keys()
      .map(|name| (name.clone(), "System.String".to_owned()))
      .collect()
  }

  fn read_property(&self, node: &Self::Node, name: &str) -> Option<PropertyValue> {
    let arena = self.arena.lock();
    let entry = arena[node.0].properties.get(name)?;
    let is_binding = arena[node.0].bound_properties.contains_key(name);
    Some(PropertyValue { value: entry.0.clone(), source: entry.1, is_binding })
  }

  fn binding(&self, node: &Self::Node, property_name: &str) -> Option<BindingInfo> {
    self.arena.lock()[node.0].bound_properties.get(property_name).cloned()
  }

  fn layout(&self, node: &Self::Node) -> Option<LayoutRecord> {
    self.arena.lock()[node.0].layout
  }

  fn resources(&self, _scope: ResourceScope, _node: Option<&Self::Node>) -> Vec<ResourceRecord> {
    Vec::new()
  }

  fn style(&self, node: &Self::Node) -> Option<StyleRecord> {
    self.arena.lock()[node.0].style.clone()
  }

  fn subscribe_property_change(
    &self,
    node: &Self::Node,
    property_name: &str,
    callback: PropertyChangeCallback,
  ) -> Option<SubscriptionToken> {
    let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
    self.subscriptions.lock().insert(id, (*node, property_name.to_owned(), callback));
    Some(SubscriptionToken(id))
  }

  fn unsubscribe(&self, token: SubscriptionToken) {
    self.subscriptions.lock().remove(&token.0);
  }

  fn highlight(&self, _node: &Self::Node, _duration: Duration) {}

  fn attach_binding_trace_sink(&self, sink: BindingTraceSink) {
    *self.trace_sink.lock() = Some(sink);
  }
}

/// Lets a test keep its own `Arc<MockAdapter>` (to call `set_property` or
/// `emit_trace_line` after construction) while also handing one to
/// [`crate::endpoint::Endpoint::new`], which takes its adapter by value and
/// wraps it in an `Arc` internally.
impl ToolkitAdapter for Arc<MockAdapter> {
  type Node = MockNode;

  fn root_nodes(&self) -> Vec<Self::Node> {
    (**self).root_nodes()
  }

  fn children_visual(&self, node: &Self::Node) -> Vec<Self::Node> {
    (**self).children_visual(node)
  }

  fn children_logical(&self, node: &Self::Node) -> Vec<Self::Node> {
    (**self).children_logical(node)
  }

  fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
    (**self).parent(node)
  }

  fn type_name(&self, node: &Self::Node) -> String {
    (**self).type_name(node)
  }

  fn short_type_name(&self, node: &Self::Node) -> String {
    (**self).short_type_name(node)
  }

  fn name(&self, node: &Self::Node) -> Option<String> {
    (**self).name(node)
  }

  fn properties(&self, node: &Self::Node) -> Vec<(String, String)> {
    (**self).properties(node)
  }

  fn read_property(&self, node: &Self::Node, name: &str) -> Option<PropertyValue> {
    (**self).read_property(node, name)
  }

  fn binding(&self, node: &Self::Node, property_name: &str) -> Option<BindingInfo> {
    (**self).binding(node, property_name)
  }

  fn layout(&self, node: &Self::Node) -> Option<LayoutRecord> {
    (**self).layout(node)
  }

  fn resources(&self, scope: ResourceScope, node: Option<&Self::Node>) -> Vec<ResourceRecord> {
    (**self).resources(scope, node)
  }

  fn style(&self, node: &Self::Node) -> Option<StyleRecord> {
    (**self).style(node)
  }

  fn subscribe_property_change(
    &self,
    node: &Self::Node,
    property_name: &str,
    callback: PropertyChangeCallback,
  ) -> Option<SubscriptionToken> {
    (**self).subscribe_property_change(node, property_name, callback)
  }

  fn unsubscribe(&self, token: SubscriptionToken) {
    (**self).unsubscribe(token);
  }

  fn highlight(&self, node: &Self::Node, duration: Duration) {
    (**self).highlight(node, duration);
  }

  fn attach_binding_trace_sink(&self, sink: BindingTraceSink) {
    (**self).attach_binding_trace_sink(sink);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tree_spec_builds_the_expected_shape() {
    let adapter = MockAdapter::from_tree(
      MockNodeSpec::new("Window").with_child(MockNodeSpec::new("Button").named("SubmitButton")),
    );
    let root = adapter.root();
    assert_eq!(adapter.type_name(&root), "Window");
    let children = adapter.children_visual(&root);
    assert_eq!(children.len(), 1);
    assert_eq!(adapter.name(&children[0]).as_deref(), Some("SubmitButton"));
  }

  #[test]
  fn set_property_fires_subscribed_callback() {
    let adapter =
      MockAdapter::from_tree(MockNodeSpec::new("Button").with_property("Text", "A", ValueSource::Local));
    let root = adapter.root();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    adapter.subscribe_property_change(
      &root,
      "Text",
      Box::new(move |value| sink.lock().push(value)),
    );
    adapter.set_property(root, "Text", "B");
    assert_eq!(*observed.lock(), vec!["B".to_owned()]);
  }
}

/// Helper constants reused by `BindingStatus`/`BindingMode` in test specs
/// that build bound properties directly against the arena (not exposed to
/// production code, only to tests within this crate that need a
/// `BindingInfo` sample).
#[must_use]
pub fn sample_binding_info(property: &str, path: &str) -> BindingInfo {
  BindingInfo {
    property: property.to_owned(),
    path: path.to_owned(),
    explicit_source: None,
    element_name: None,
    relative_source_mode: None,
    mode: BindingMode::OneWay,
    update_trigger: None,
    converter: None,
    status: BindingStatus::Active,
    has_error: false,
    error_message: None,
    current_value: None,
  }
}
