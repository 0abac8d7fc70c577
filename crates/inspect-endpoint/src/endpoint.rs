/*!
Inspector Endpoint (`spec.md` §4.E): the per-process host that accepts one
connection at a time, runs the reader/dispatch/writer loop, and implements
every handler's semantics against a [`ToolkitAdapter`].
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use inspect_core::codec::{frame_line, FrameReader};
use inspect_core::model::{BindingRecord, PropertyRecord, ResourceRecord, ResourceScope, VisualTreeNode};
use inspect_core::protocol::{
  ExportFormat, ExportTreeResponseData, FindElementMatch, FindElementsResponseData,
  GetBindingErrorsResponseData, GetBindingsResponseData, GetElementPropertiesResponseData,
  GetLayoutInfoResponseData, GetResourcesResponseData, GetStylesResponseData,
  GetVisualTreeResponseData, HighlightElementResponseData, Notification, Request, ResponseData,
  ResponseEnvelope, WatchPropertyResponseData,
};
use inspect_core::{ErrorKind, Handle};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::adapter::ToolkitAdapter;
use crate::analyzer::{self, BindingErrorBuffer};
use crate::config::EndpointConfig;
use crate::export::{self, EXPORT_JSON_DEPTH};
use crate::marshal::{UiScheduler, UiThreadMarshaler};
use crate::registry::HandleRegistry;
use crate::watch::WatchTable;

fn now_millis() -> u64 {
  SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

struct SessionState<N> {
  registry: HandleRegistry<N>,
  watches: WatchTable,
  binding_errors: BindingErrorBuffer,
}

impl<N> SessionState<N>
where
  N: Clone + Eq + std::hash::Hash,
{
  fn new(binding_error_capacity: usize) -> Self {
    Self {
      registry: HandleRegistry::new(),
      watches: WatchTable::new(),
      binding_errors: BindingErrorBuffer::new(binding_error_capacity),
    }
  }
}

/// One hosted inspector endpoint: an adapter, a UI-thread marshaler, and the
/// session state they jointly maintain across however many connections the
/// endpoint serves over its lifetime.
pub struct Endpoint<A, S>
where
  A: ToolkitAdapter,
{
  adapter: Arc<A>,
  marshaler: Arc<UiThreadMarshaler<S>>,
  state: Arc<Mutex<SessionState<A::Node>>>,
  config: EndpointConfig,
  notify_tx: async_broadcast::Sender<Notification>,
  _notify_keepalive: async_broadcast::InactiveReceiver<Notification>,
}

impl<A, S> Endpoint<A, S>
where
  A: ToolkitAdapter,
  S: UiScheduler,
{
  /// Build an endpoint, wiring the adapter's binding-trace sink to the
  /// binding-error buffer and (best-effort) to a live `BindingError`
  /// notification when a connection is attached.
  #[must_use]
  pub fn new(adapter: A, scheduler: S, config: EndpointConfig) -> Self {
    let adapter = Arc::new(adapter);
    let marshaler = Arc::new(UiThreadMarshaler::new(scheduler, config.marshal_timeout));
    let state = Arc::new(Mutex::new(SessionState::new(config.binding_error_buffer_capacity)));

    let (notify_tx, notify_rx) = async_broadcast::broadcast(64);
    let notify_keepalive = notify_rx.deactivate();

    let (trace_tx, mut trace_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    adapter.attach_binding_trace_sink(trace_tx);

    let trace_state = Arc::clone(&state);
    let trace_notify = notify_tx.clone();
    tokio::spawn(async move {
      while let Some(line) = trace_rx.recv().await {
        let Some(record) = analyzer::parse_binding_trace_line(&line, now_millis()) else {
          continue;
        };
        trace_state.lock().binding_errors.push(record.clone());
        let notification = Notification::BindingError {
          element_type: record.element_type,
          element_name: record.element_name,
          property: record.property,
          binding_path: record.binding_path,
          error_type: record.error_type,
          message: record.message,
          timestamp: record.timestamp,
        };
        drop(trace_notify.try_broadcast(notification));
      }
    });

    Self { adapter, marshaler, state, config, notify_tx, _notify_keepalive: notify_keepalive }
  }

  /// The rendezvous name this endpoint should be bound to for `pid`.
  #[must_use]
  pub fn rendezvous_name(&self, pid: u32) -> String {
    self.config.rendezvous_name(pid)
  }

  /// Service one connection end-to-end: read frames, dispatch, write
  /// replies, interleaving any queued notifications, until the peer
  /// disconnects. Matches the reader loop contract in `spec.md` §4.E.
  pub async fn serve_connection<IO>(&self, io: IO) -> std::io::Result<()>
  where
    IO: AsyncRead + AsyncWrite + Unpin,
  {
    let (mut reader, mut writer) = tokio::io::split(io);
    let mut frame_reader = FrameReader::new();
    let mut notify_rx = self.notify_tx.new_receiver();
    let mut buf = [0_u8; 8192];

    loop {
      tokio::select! {
        read_result = reader.read(&mut buf) => {
          match read_result {
            Ok(0) => {
              log::debug!(target: "inspect_endpoint::endpoint", "peer disconnected");
              return Ok(());
            }
            Ok(n) => {
              for frame in frame_reader.push(&buf[..n]) {
                let response = self.handle_frame(&frame).await;
                if !write_message(&mut writer, &response).await? {
                  return Ok(());
                }
              }
            }
            Err(err) => {
              log::debug!(target: "inspect_endpoint::endpoint", "connection read error: {err}");
              return Ok(());
            }
          }
        }
        notification = notify_rx.recv() => {
          match notification {
            Ok(notification) => {
              if !write_message(&mut writer, &notification).await? {
                return Ok(());
              }
            }
            Err(async_broadcast::RecvError::Overflowed(n)) => {
              log::warn!(target: "inspect_endpoint::endpoint", "dropped {n} notifications, consumer too slow");
            }
            Err(async_broadcast::RecvError::Closed) => {}
          }
        }
      }
    }
  }

  async fn handle_frame(&self, frame: &[u8]) -> ResponseEnvelope {
    let request: Request = match serde_json::from_slice(frame) {
      Ok(request) => request,
      Err(err) => {
        log::warn!(target: "inspect_endpoint::endpoint", "invalid request frame: {err}");
        return ResponseEnvelope::err("", format!("invalid request: {err}"));
      }
    };
    let request_id = request.request_id().to_owned();
    match self.dispatch(request).await {
      Ok(data) => ResponseEnvelope::ok(request_id, data),
      Err(err) => ResponseEnvelope::err(request_id, err.to_string()),
    }
  }

  async fn dispatch(&self, request: Request) -> Result<ResponseData, ErrorKind> {
    match request {
      Request::GetVisualTree(req) => {
        self.handle_get_tree(req.root_handle, req.max_depth, true).await.map(ResponseData::GetVisualTree)
      }
      Request::GetLogicalTree(req) => {
        self.handle_get_tree(req.root_handle, req.max_depth, false).await.map(ResponseData::GetVisualTree)
      }
      Request::GetElementProperties(req) => {
        self.handle_get_element_properties(req.element_handle).await.map(ResponseData::GetElementProperties)
      }
      Request::FindElements(req) => self
        .handle_find_elements(
          req.root_handle,
          req.type_name,
          req.element_name,
          req.property_filter,
          req.max_results,
        )
        .await
        .map(ResponseData::FindElements),
      Request::GetBindings(req) => {
        self.handle_get_bindings(req.element_handle).await.map(ResponseData::GetBindings)
      }
      Request::GetBindingErrors(_req) => {
        self.handle_get_binding_errors().await.map(ResponseData::GetBindingErrors)
      }
      Request::GetResources(req) => self
        .handle_get_resources(req.scope, req.element_handle)
        .await
        .map(ResponseData::GetResources),
      Request::GetStyles(req) => {
        self.handle_get_styles(req.element_handle).await.map(ResponseData::GetStyles)
      }
      Request::HighlightElement(req) => self
        .handle_highlight(req.element_handle, req.duration_ms)
        .await
        .map(ResponseData::HighlightElement),
      Request::GetLayoutInfo(req) => {
        self.handle_get_layout(req.element_handle).await.map(ResponseData::GetLayoutInfo)
      }
      Request::WatchProperty(req) => self
        .handle_watch_property(req.element_handle, req.property_name)
        .await
        .map(ResponseData::WatchProperty),
      Request::ExportTree(req) => {
        self.handle_export_tree(req.element_handle, req.format).await.map(ResponseData::ExportTree)
      }
    }
  }

  fn resolve(state: &SessionState<A::Node>, handle: &Handle) -> Result<A::Node, ErrorKind> {
    state.registry.resolve(handle).cloned().ok_or(ErrorKind::NotFound)
  }

  async fn handle_get_tree(
    &self,
    root_handle: Option<Handle>,
    max_depth: usize,
    visual: bool,
  ) -> Result<GetVisualTreeResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetVisualTreeResponseData, ErrorKind> {
          let mut guard = state.lock();
          let root = match root_handle {
            Some(handle) => Self::resolve(&guard, &handle)?,
            None => adapter.root_nodes().into_iter().next().ok_or(ErrorKind::NotFound)?,
          };
          let children_of: fn(&A, &A::Node) -> Vec<A::Node> =
            if visual { adapter_children_visual } else { adapter_children_logical };
          let mut max_depth_reached = false;
          let tree = build_tree(&*adapter, &mut guard.registry, &root, 0, max_depth, children_of, &mut max_depth_reached);
          let total_elements = tree.count();
          Ok(GetVisualTreeResponseData { root: Some(tree), total_elements, max_depth_reached })
        },
        None,
      )
      .await?
  }

  async fn handle_get_element_properties(
    &self,
    element_handle: Handle,
  ) -> Result<GetElementPropertiesResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetElementPropertiesResponseData, ErrorKind> {
          let guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          Ok(GetElementPropertiesResponseData { properties: read_all_properties(&*adapter, &node) })
        },
        None,
      )
      .await?
  }

  #[allow(clippy::too_many_arguments)]
  async fn handle_find_elements(
    &self,
    root_handle: Option<Handle>,
    type_name: Option<String>,
    element_name: Option<String>,
    property_filter: Option<HashMap<String, String>>,
    max_results: usize,
  ) -> Result<FindElementsResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    let max_results = inspect_core::protocol::clamp_max_results(max_results);
    self
      .marshaler
      .run(
        move || -> Result<FindElementsResponseData, ErrorKind> {
          let mut guard = state.lock();
          let root = match root_handle {
            Some(handle) => Self::resolve(&guard, &handle)?,
            None => adapter.root_nodes().into_iter().next().ok_or(ErrorKind::NotFound)?,
          };
          let mut matches = Vec::new();
          let mut path_stack = Vec::new();
          find_elements_rec(
            &*adapter,
            &mut guard.registry,
            &root,
            type_name.as_deref(),
            element_name.as_deref(),
            property_filter.as_ref(),
            max_results,
            &mut matches,
            &mut path_stack,
          );
          Ok(FindElementsResponseData { matches })
        },
        None,
      )
      .await?
  }

  async fn handle_get_bindings(
    &self,
    element_handle: Handle,
  ) -> Result<GetBindingsResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetBindingsResponseData, ErrorKind> {
          let guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          let bindings = adapter
            .properties(&node)
            .into_iter()
            .filter_map(|(name, _)| adapter.binding(&node, &name))
            .map(analyzer::to_binding_record)
            .collect();
          Ok(GetBindingsResponseData { bindings })
        },
        None,
      )
      .await?
  }

  async fn handle_get_binding_errors(&self) -> Result<GetBindingErrorsResponseData, ErrorKind> {
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetBindingErrorsResponseData, ErrorKind> {
          Ok(GetBindingErrorsResponseData { errors: state.lock().binding_errors.snapshot() })
        },
        None,
      )
      .await?
  }

  async fn handle_get_resources(
    &self,
    scope: ResourceScope,
    element_handle: Option<Handle>,
  ) -> Result<GetResourcesResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetResourcesResponseData, ErrorKind> {
          let guard = state.lock();
          let resources = match scope {
            ResourceScope::Application => adapter.resources(ResourceScope::Application, None),
            ResourceScope::Window => {
              let handle = element_handle.ok_or_else(|| {
                ErrorKind::MissingField("elementHandle".to_owned())
              })?;
              let node = Self::resolve(&guard, &handle)?;
              adapter.resources(ResourceScope::Window, Some(&node))
            }
            ResourceScope::Element => {
              let handle = element_handle.ok_or_else(|| {
                ErrorKind::MissingField("elementHandle".to_owned())
              })?;
              let mut current = Some(Self::resolve(&guard, &handle)?);
              let mut resources: Vec<ResourceRecord> = Vec::new();
              while let Some(node) = current {
                resources.extend(adapter.resources(ResourceScope::Element, Some(&node)));
                current = adapter.parent(&node);
              }
              resources.extend(adapter.resources(ResourceScope::Application, None));
              resources
            }
          };
          Ok(GetResourcesResponseData { resources })
        },
        None,
      )
      .await?
  }

  async fn handle_get_styles(
    &self,
    element_handle: Handle,
  ) -> Result<GetStylesResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetStylesResponseData, ErrorKind> {
          let guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          Ok(GetStylesResponseData { style: adapter.style(&node) })
        },
        None,
      )
      .await?
  }

  async fn handle_highlight(
    &self,
    element_handle: Handle,
    duration_ms: u64,
  ) -> Result<HighlightElementResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<HighlightElementResponseData, ErrorKind> {
          let guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          adapter.highlight(&node, Duration::from_millis(duration_ms));
          Ok(HighlightElementResponseData {})
        },
        None,
      )
      .await?
  }

  async fn handle_get_layout(
    &self,
    element_handle: Handle,
  ) -> Result<GetLayoutInfoResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<GetLayoutInfoResponseData, ErrorKind> {
          let guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          let layout = adapter.layout(&node).ok_or(ErrorKind::NotRenderable)?;
          Ok(GetLayoutInfoResponseData { layout })
        },
        None,
      )
      .await?
  }

  async fn handle_watch_property(
    &self,
    element_handle: Handle,
    property_name: String,
  ) -> Result<WatchPropertyResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    let notify_tx = self.notify_tx.clone();
    self
      .marshaler
      .run(
        move || -> Result<WatchPropertyResponseData, ErrorKind> {
          let mut guard = state.lock();
          let node = Self::resolve(&guard, &element_handle)?;
          let initial = adapter
            .read_property(&node, &property_name)
            .ok_or_else(|| ErrorKind::PropertyNotFound(property_name.clone()))?;
          let initial_value = analyzer::normalize_value(&initial.value);
          let watch = guard.watches.insert(element_handle, property_name.clone(), initial_value.clone());

          let callback_state = Arc::clone(&state);
          let callback_notify = notify_tx.clone();
          let watch_id = watch.watch_id.clone();
          let callback_property = property_name.clone();
          adapter.subscribe_property_change(
            &node,
            &property_name,
            Box::new(move |new_value: String| {
              let new_value = analyzer::normalize_value(&new_value);
              let Some(old_value) = callback_state.lock().watches.observe(&watch_id, new_value.clone())
              else {
                return;
              };
              let notification = Notification::PropertyChanged {
                watch_id: watch_id.clone(),
                property_name: callback_property.clone(),
                old_value,
                new_value,
                timestamp: now_millis(),
              };
              drop(callback_notify.try_broadcast(notification));
            }),
          );

          Ok(WatchPropertyResponseData { watch_id: watch.watch_id, initial_value })
        },
        None,
      )
      .await?
  }

  async fn handle_export_tree(
    &self,
    element_handle: Option<Handle>,
    format: ExportFormat,
  ) -> Result<ExportTreeResponseData, ErrorKind> {
    let adapter = Arc::clone(&self.adapter);
    let state = Arc::clone(&self.state);
    self
      .marshaler
      .run(
        move || -> Result<ExportTreeResponseData, ErrorKind> {
          let mut guard = state.lock();
          let root = match element_handle {
            Some(handle) => Self::resolve(&guard, &handle)?,
            None => adapter.root_nodes().into_iter().next().ok_or(ErrorKind::NotFound)?,
          };
          let mut max_depth_reached = false;
          let tree = build_tree(
            &*adapter,
            &mut guard.registry,
            &root,
            0,
            EXPORT_JSON_DEPTH,
            adapter_children_visual,
            &mut max_depth_reached,
          );
          match format {
            ExportFormat::Json => {
              Ok(ExportTreeResponseData { root: Some(tree), max_depth_reached: Some(max_depth_reached), xaml: None })
            }
            ExportFormat::Xaml => {
              Ok(ExportTreeResponseData { root: None, max_depth_reached: None, xaml: Some(export::render_xaml_like(&tree)) })
            }
          }
        },
        None,
      )
      .await?
  }
}

fn adapter_children_visual<A: ToolkitAdapter>(adapter: &A, node: &A::Node) -> Vec<A::Node> {
  adapter.children_visual(node)
}

fn adapter_children_logical<A: ToolkitAdapter>(adapter: &A, node: &A::Node) -> Vec<A::Node> {
  adapter.children_logical(node)
}

#[allow(clippy::too_many_arguments)]
fn build_tree<A: ToolkitAdapter>(
  adapter: &A,
  registry: &mut HandleRegistry<A::Node>,
  root: &A::Node,
  depth: usize,
  max_depth: usize,
  children_of: fn(&A, &A::Node) -> Vec<A::Node>,
  max_depth_reached: &mut bool,
) -> VisualTreeNode {
  let handle = registry.assign(root.clone());
  let type_name = adapter.type_name(root);
  let name = adapter.name(root);
  let kids = children_of(adapter, root);

  let children = if depth >= max_depth {
    if !kids.is_empty() {
      *max_depth_reached = true;
    }
    Vec::new()
  } else {
    kids
      .into_iter()
      .map(|child| build_tree(adapter, registry, &child, depth + 1, max_depth, children_of, max_depth_reached))
      .collect()
  };

  VisualTreeNode { handle, type_name, name, depth, children }
}

fn read_all_properties<A: ToolkitAdapter>(adapter: &A, node: &A::Node) -> Vec<PropertyRecord> {
  let mut declared = adapter.properties(node);
  declared.sort_by(|a, b| a.0.cmp(&b.0));

  declared
    .into_iter()
    .filter_map(|(name, declared_type)| {
      let read = adapter.read_property(node, &name)?;
      let binding_details: Option<BindingRecord> =
        if read.is_binding { adapter.binding(node, &name).map(analyzer::to_binding_record) } else { None };
      Some(PropertyRecord {
        name,
        type_name: declared_type,
        value: analyzer::normalize_value(&read.value),
        source: read.source,
        is_binding: read.is_binding,
        binding_details,
      })
    })
    .collect()
}

fn matches_node<A: ToolkitAdapter>(
  adapter: &A,
  node: &A::Node,
  type_name_filter: Option<&str>,
  element_name_filter: Option<&str>,
  property_filter: Option<&HashMap<String, String>>,
) -> bool {
  if let Some(filter) = type_name_filter {
    let filter_lower = filter.to_lowercase();
    let full = adapter.type_name(node).to_lowercase();
    let short = adapter.short_type_name(node).to_lowercase();
    if !(full.contains(&filter_lower) || short == filter_lower) {
      return false;
    }
  }
  if let Some(filter) = element_name_filter {
    let name = adapter.name(node).unwrap_or_default().to_lowercase();
    if !name.contains(&filter.to_lowercase()) {
      return false;
    }
  }
  if let Some(filters) = property_filter {
    for (property_name, expected) in filters {
      let Some(read) = adapter.read_property(node, property_name) else {
        return false;
      };
      if read.value.to_lowercase() != expected.to_lowercase() {
        return false;
      }
    }
  }
  true
}

#[allow(clippy::too_many_arguments)]
fn find_elements_rec<A: ToolkitAdapter>(
  adapter: &A,
  registry: &mut HandleRegistry<A::Node>,
  node: &A::Node,
  type_name_filter: Option<&str>,
  element_name_filter: Option<&str>,
  property_filter: Option<&HashMap<String, String>>,
  max_results: usize,
  matches: &mut Vec<FindElementMatch>,
  path_stack: &mut Vec<String>,
) {
  if matches.len() >= max_results {
    return;
  }

  let short = adapter.short_type_name(node);
  let name = adapter.name(node);
  let segment = name.as_ref().map_or_else(|| short.clone(), |n| format!("{short}[{n}]"));
  path_stack.push(segment);

  if matches_node(adapter, node, type_name_filter, element_name_filter, property_filter) {
    let handle = registry.assign(node.clone());
    matches.push(FindElementMatch {
      handle,
      type_name: adapter.type_name(node),
      name: name.clone(),
      path: path_stack.join(" > "),
    });
  }

  if matches.len() < max_results {
    for child in adapter.children_visual(node) {
      find_elements_rec(
        adapter,
        registry,
        &child,
        type_name_filter,
        element_name_filter,
        property_filter,
        max_results,
        matches,
        path_stack,
      );
      if matches.len() >= max_results {
        break;
      }
    }
  }

  path_stack.pop();
}

/// Serialize `message` as one framed line and write it with an explicit
/// flush, matching the codec's "no buffered text abstractions" requirement.
/// Returns `Ok(false)` when the peer has gone away so the caller can stop.
async fn write_message<W, T>(writer: &mut W, message: &T) -> std::io::Result<bool>
where
  W: AsyncWrite + Unpin,
  T: serde::Serialize,
{
  let Ok(encoded) = serde_json::to_vec(message) else {
    log::error!(target: "inspect_endpoint::endpoint", "failed to encode outgoing message");
    return Ok(true);
  };
  let framed = frame_line(encoded);
  if writer.write_all(&framed).await.is_err() {
    return Ok(false);
  }
  if writer.flush().await.is_err() {
    return Ok(false);
  }
  Ok(true)
}
