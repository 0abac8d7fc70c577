/*!
Toolkit Adapter: the interface the endpoint programs against instead of any
concrete UI framework's API (`spec.md` §4.A).

Core code never touches a specific toolkit's types directly — only this
trait. A concrete adapter for a given toolkit is supplied by the host; this
crate ships only the trait and (behind `test-util`) an in-memory mock used
by every test in this workspace.
*/

use std::hash::Hash;
use std::time::Duration;

use inspect_core::model::{LayoutRecord, ResourceRecord, ResourceScope, StyleRecord};

use crate::analyzer::{BindingInfo, PropertyValue};

/// Opaque token returned by [`ToolkitAdapter::subscribe_property_change`],
/// handed back to [`ToolkitAdapter::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// Invoked by an adapter when a subscribed property changes; carries the new
/// normalized value.
pub type PropertyChangeCallback = Box<dyn Fn(String) + Send + Sync>;

/// Receives textual lines from the framework's binding diagnostic channel.
pub type BindingTraceSink = tokio::sync::mpsc::UnboundedSender<String>;

/// Abstracts one UI framework's live object graph.
///
/// Implementations are expected to be cheap to clone/share (an `Arc` around
/// the concrete adapter is the typical shape) since the endpoint calls into
/// it from every handler. All methods here are invoked exclusively from
/// under the [`crate::marshal::UiThreadMarshaler`] — an adapter never needs
/// its own internal locking against concurrent endpoint callers.
pub trait ToolkitAdapter: Send + Sync + 'static {
  /// A framework-native handle to a live UI node. Never serialized; the
  /// endpoint maps it to a wire [`inspect_core::Handle`] via its registry.
  type Node: Clone + Eq + Hash + Send + Sync + 'static;

  /// The ordered top-level surfaces (typically top-level windows).
  fn root_nodes(&self) -> Vec<Self::Node>;

  /// Visual-tree children, in rendered order.
  fn children_visual(&self, node: &Self::Node) -> Vec<Self::Node>;

  /// Logical-tree children, in authored order.
  fn children_logical(&self, node: &Self::Node) -> Vec<Self::Node>;

  /// The visual-tree parent, if any.
  fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

  /// Fully-qualified runtime type name.
  fn type_name(&self, node: &Self::Node) -> String;

  /// Unqualified type name (the last path segment of [`Self::type_name`]).
  fn short_type_name(&self, node: &Self::Node) -> String;

  /// The node's framework name, if it has one assigned.
  fn name(&self, node: &Self::Node) -> Option<String>;

  /// All properties declared on the node: `(name, declaredType)` pairs.
  fn properties(&self, node: &Self::Node) -> Vec<(String, String)>;

  /// Read one property's current value, source, and binding status.
  fn read_property(&self, node: &Self::Node, name: &str) -> Option<PropertyValue>;

  /// Binding metadata for a bound property, or `None` if unbound.
  fn binding(&self, node: &Self::Node, property_name: &str) -> Option<BindingInfo>;

  /// Render geometry; `None` for a node with no layout participation.
  fn layout(&self, node: &Self::Node) -> Option<LayoutRecord>;

  /// Resolve resources visible at the given scope.
  fn resources(&self, scope: ResourceScope, node: Option<&Self::Node>) -> Vec<ResourceRecord>;

  /// The style currently active on the node, if any.
  fn style(&self, node: &Self::Node) -> Option<StyleRecord>;

  /// Subscribe to changes of a named property; the callback receives the
  /// new normalized value on every change.
  fn subscribe_property_change(
    &self,
    node: &Self::Node,
    property_name: &str,
    callback: PropertyChangeCallback,
  ) -> Option<SubscriptionToken>;

  /// Cancel a subscription previously returned by
  /// [`Self::subscribe_property_change`].
  fn unsubscribe(&self, token: SubscriptionToken);

  /// Paint a topmost, hit-test-invisible, translucent rectangle over the
  /// node's screen bounds for `duration`, then remove it. Best-effort.
  fn highlight(&self, node: &Self::Node, duration: Duration);

  /// Attach a sink that receives the framework's raw binding-trace lines.
  /// Called once at endpoint startup.
  fn attach_binding_trace_sink(&self, sink: BindingTraceSink);
}
