//! End-to-end scenarios from `spec.md` §8, driving a real [`Endpoint`]
//! over an in-memory `tokio::io::duplex` pair instead of a real rendezvous
//! socket, against [`MockAdapter`].

#![cfg(feature = "test-util")]

use std::time::Duration;

use inspect_core::model::ValueSource;
use inspect_core::protocol::{ExportFormat, Request, ResponseEnvelope};
use inspect_endpoint::testing::{MockAdapter, MockNodeSpec};
use inspect_endpoint::{Endpoint, EndpointConfig, ThreadScheduler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn write_request(io: &mut (impl tokio::io::AsyncWrite + Unpin), request: &Request) {
  let mut line = serde_json::to_vec(request).unwrap();
  line.push(b'\n');
  io.write_all(&line).await.unwrap();
  io.flush().await.unwrap();
}

async fn read_response(io: &mut (impl tokio::io::AsyncRead + Unpin)) -> ResponseEnvelope {
  let mut buf = [0_u8; 8192];
  let mut pending = Vec::new();
  loop {
    if let Some(pos) = pending.iter().position(|&b| b == b'\n') {
      let line = pending.drain(..=pos).collect::<Vec<u8>>();
      let line = &line[..line.len() - 1];
      return serde_json::from_slice(line).unwrap();
    }
    let n = io.read(&mut buf).await.unwrap();
    assert!(n > 0, "connection closed before a response arrived");
    pending.extend_from_slice(&buf[..n]);
  }
}

fn window_with_submit_button() -> std::sync::Arc<MockAdapter> {
  MockAdapter::from_tree(
    MockNodeSpec::new("System.Windows.Window").with_child(
      MockNodeSpec::new("System.Windows.Controls.Panel").with_child(
        MockNodeSpec::new("System.Windows.Controls.Button")
          .named("SubmitButton")
          .with_property("Content", "Submit", ValueSource::Local),
      ),
    ),
  )
}

/// Scenario 1: attach, walk the tree, then read properties off the leaf.
#[tokio::test]
async fn attach_tree_then_properties() {
  let adapter = window_with_submit_button();
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(64 * 1024);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::GetVisualTree(inspect_core::protocol::GetVisualTreeRequest {
      request_id: "r1".into(),
      root_handle: None,
      max_depth: 3,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success, "{:?}", response.error);
  let Some(inspect_core::protocol::ResponseData::GetVisualTree(tree)) = response.data else {
    panic!("expected a GetVisualTree reply");
  };
  let root = tree.root.expect("tree has a root");
  assert_eq!(root.type_name, "System.Windows.Window");
  assert_eq!(root.children.len(), 1);
  let button = &root.children[0].children[0];
  assert_eq!(button.name.as_deref(), Some("SubmitButton"));
  assert!(tree.total_elements >= 3);

  write_request(
    &mut writer,
    &Request::GetElementProperties(inspect_core::protocol::GetElementPropertiesRequest {
      request_id: "r2".into(),
      element_handle: button.handle.clone(),
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success);
  let Some(inspect_core::protocol::ResponseData::GetElementProperties(props)) = response.data else {
    panic!("expected a GetElementProperties reply");
  };
  let content = props.properties.iter().find(|p| p.name == "Content").expect("Content property present");
  assert_eq!(content.value, "Submit");

  drop(writer);
  server.await.unwrap();
}

/// Scenario 2: `FindElements` clamps to the requested cap, even when more
/// nodes would match.
#[tokio::test]
async fn find_elements_respects_max_results_cap() {
  let mut window = MockNodeSpec::new("System.Windows.Window");
  for i in 0..50 {
    window = window.with_child(MockNodeSpec::new("System.Windows.Controls.Button").named(format!("Btn{i}")));
  }
  let adapter = MockAdapter::from_tree(window);
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(64 * 1024);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::FindElements(inspect_core::protocol::FindElementsRequest {
      request_id: "r1".into(),
      root_handle: None,
      type_name: Some("Button".into()),
      element_name: None,
      property_filter: None,
      max_results: 2,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success);
  let Some(inspect_core::protocol::ResponseData::FindElements(found)) = response.data else {
    panic!("expected a FindElements reply");
  };
  assert_eq!(found.matches.len(), 2);
  for m in &found.matches {
    assert!(m.path.contains("Button"));
  }

  drop(writer);
  server.await.unwrap();
}

/// Scenario 3: a frame prefixed with a UTF-8 BOM still parses and replies
/// with the original `requestId`.
#[tokio::test]
async fn bom_prefixed_frame_is_tolerated() {
  let adapter = MockAdapter::from_tree(MockNodeSpec::new("System.Windows.Window"));
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(4096);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  let mut frame = vec![0xEF, 0xBB, 0xBF];
  frame.extend_from_slice(br#"{"type":"GetBindingErrors","data":{"requestId":"x"}}"#);
  frame.push(b'\n');
  writer.write_all(&frame).await.unwrap();
  writer.flush().await.unwrap();

  let response = read_response(&mut reader).await;
  assert_eq!(response.request_id, "x");
  assert!(response.success);

  drop(writer);
  server.await.unwrap();
}

/// Scenario 4: a wedged UI scheduler yields a bounded `Timeout` error
/// rather than hanging, and the endpoint recovers once the scheduler frees
/// up for the next request.
#[tokio::test]
async fn wedged_ui_thread_times_out_then_recovers() {
  struct GateableScheduler {
    inner: inspect_endpoint::ThreadScheduler,
    blocked: std::sync::Arc<std::sync::atomic::AtomicBool>,
  }
  impl inspect_endpoint::UiScheduler for GateableScheduler {
    fn post(&self, job: inspect_endpoint::marshal::Job) {
      if self.blocked.load(std::sync::atomic::Ordering::SeqCst) {
        // Simulates a wedged UI thread: the job is simply never run.
        return;
      }
      self.inner.post(job);
    }
  }

  let adapter = MockAdapter::from_tree(MockNodeSpec::new("System.Windows.Window"));
  let blocked = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
  let scheduler = GateableScheduler { inner: ThreadScheduler::new(), blocked: std::sync::Arc::clone(&blocked) };
  let config = EndpointConfig::new().marshal_timeout(Duration::from_millis(50));
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), scheduler, config);
  let (client_io, server_io) = tokio::io::duplex(4096);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::GetVisualTree(inspect_core::protocol::GetVisualTreeRequest {
      request_id: "r1".into(),
      root_handle: None,
      max_depth: 3,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(!response.success);
  assert!(response.error.unwrap().to_lowercase().contains("timed out"));

  blocked.store(false, std::sync::atomic::Ordering::SeqCst);

  write_request(
    &mut writer,
    &Request::GetVisualTree(inspect_core::protocol::GetVisualTreeRequest {
      request_id: "r2".into(),
      root_handle: None,
      max_depth: 3,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success, "endpoint should recover once the scheduler is unblocked");

  drop(writer);
  server.await.unwrap();
}

/// Scenario 6: `WatchProperty` reports `initialValue`, and the first
/// subsequent `PropertyChanged` notification's `oldValue` matches it.
#[tokio::test]
async fn watch_property_then_change_notification() {
  let adapter = MockAdapter::from_tree(
    MockNodeSpec::new("System.Windows.Controls.TextBox").with_property("Text", "A", ValueSource::Local),
  );
  let root = adapter.root();
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(64 * 1024);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::GetVisualTree(inspect_core::protocol::GetVisualTreeRequest {
      request_id: "r0".into(),
      root_handle: None,
      max_depth: 1,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  let Some(inspect_core::protocol::ResponseData::GetVisualTree(tree)) = response.data else {
    panic!("expected a GetVisualTree reply");
  };
  let handle = tree.root.unwrap().handle;

  write_request(
    &mut writer,
    &Request::WatchProperty(inspect_core::protocol::WatchPropertyRequest {
      request_id: "r1".into(),
      element_handle: handle,
      property_name: "Text".into(),
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success);
  let Some(inspect_core::protocol::ResponseData::WatchProperty(watch)) = response.data else {
    panic!("expected a WatchProperty reply");
  };
  assert_eq!(watch.initial_value, "A");

  adapter.set_property(root, "Text", "B");

  let notification = read_response_as_notification(&mut reader).await;
  let inspect_core::protocol::Notification::PropertyChanged { watch_id, old_value, new_value, .. } = notification
  else {
    panic!("expected a PropertyChanged notification");
  };
  assert_eq!(watch_id, watch.watch_id);
  assert_eq!(old_value, "A");
  assert_eq!(new_value, "B");

  drop(writer);
  server.await.unwrap();
}

async fn read_response_as_notification(
  io: &mut (impl tokio::io::AsyncRead + Unpin),
) -> inspect_core::protocol::Notification {
  let mut buf = [0_u8; 8192];
  let mut pending = Vec::new();
  loop {
    if let Some(pos) = pending.iter().position(|&b| b == b'\n') {
      let line = pending.drain(..=pos).collect::<Vec<u8>>();
      let line = &line[..line.len() - 1];
      return serde_json::from_slice(line).unwrap();
    }
    let n = io.read(&mut buf).await.unwrap();
    assert!(n > 0);
    pending.extend_from_slice(&buf[..n]);
  }
}

/// `GetLayoutInfo` on a node with no layout participation fails with
/// `NotRenderable`.
#[tokio::test]
async fn layout_of_non_renderable_node_fails() {
  let adapter = MockAdapter::from_tree(MockNodeSpec::new("System.Windows.Controls.Button"));
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(4096);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::GetVisualTree(inspect_core::protocol::GetVisualTreeRequest {
      request_id: "r0".into(),
      root_handle: None,
      max_depth: 1,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  let Some(inspect_core::protocol::ResponseData::GetVisualTree(tree)) = response.data else {
    panic!("expected a GetVisualTree reply");
  };
  let handle = tree.root.unwrap().handle;

  write_request(
    &mut writer,
    &Request::GetLayoutInfo(inspect_core::protocol::GetLayoutInfoRequest {
      request_id: "r1".into(),
      element_handle: handle,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(!response.success);
  assert!(response.error.unwrap().contains("not renderable"));

  drop(writer);
  server.await.unwrap();
}

/// `ExportTree{format:"xaml"}` renders the same tree `GetVisualTree` would,
/// pretty-printed as nested tags.
#[tokio::test]
async fn export_tree_xaml_matches_visual_shape() {
  let adapter = window_with_submit_button();
  let endpoint = Endpoint::new(std::sync::Arc::clone(&adapter), ThreadScheduler::new(), EndpointConfig::new());
  let (client_io, server_io) = tokio::io::duplex(64 * 1024);
  let server = tokio::spawn(async move {
    let _ = endpoint.serve_connection(server_io).await;
  });
  let (mut reader, mut writer) = tokio::io::split(client_io);

  write_request(
    &mut writer,
    &Request::ExportTree(inspect_core::protocol::ExportTreeRequest {
      request_id: "r1".into(),
      element_handle: None,
      format: ExportFormat::Xaml,
    }),
  )
  .await;
  let response = read_response(&mut reader).await;
  assert!(response.success);
  let Some(inspect_core::protocol::ResponseData::ExportTree(export)) = response.data else {
    panic!("expected an ExportTree reply");
  };
  let xaml = export.xaml.expect("xaml export present");
  assert!(xaml.contains("<Window>"));
  assert!(xaml.contains("x:Name=\"SubmitButton\""));

  drop(writer);
  server.await.unwrap();
}
