/*!
Controller Bridge (`spec.md` §4.G): attaches to a target process's
inspector endpoint and invokes requests against it over a fresh,
transient connection per call — no long-lived connection pool.
*/

use std::sync::Arc;
use std::time::Duration;

use inspect_core::codec::{frame_line, FrameReader};
use inspect_core::protocol::{
  ExportFormat, ExportTreeRequest, FindElementsRequest, GetBindingErrorsRequest, GetBindingsRequest,
  GetElementPropertiesRequest, GetLayoutInfoRequest, GetLogicalTreeRequest, GetResourcesRequest,
  GetStylesRequest, GetVisualTreeRequest, HighlightElementRequest, Request, ResponseData,
  ResponseEnvelope, WatchPropertyRequest,
};
use inspect_core::{ErrorKind, Handle, Result};
use interprocess::local_socket::tokio::prelude::*;
use interprocess::local_socket::{GenericNamespaced, ToNsName};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::BridgeConfig;
use crate::discovery::ProcessProbe;

/// One attached session: a validated target PID plus the configuration
/// governing how `invoke` opens and bounds each connection.
///
/// Cloning is cheap (an `Arc` around the probe); every clone shares the
/// same attached PID and config.
#[derive(Clone)]
pub struct Bridge {
  probe: Arc<dyn ProcessProbe>,
  config: BridgeConfig,
  pid: u32,
}

impl std::fmt::Debug for Bridge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bridge").field("pid", &self.pid).finish_non_exhaustive()
  }
}

impl Bridge {
  /// Validate that `pid` currently exists and attach to it. Does not open
  /// any connection itself; `invoke` opens one per call.
  ///
  /// # Errors
  ///
  /// Returns [`ErrorKind::ProcessGone`] if `probe.exists(pid)` is false.
  pub fn attach(probe: Arc<dyn ProcessProbe>, config: BridgeConfig, pid: u32) -> Result<Self> {
    if !probe.exists(pid) {
      return Err(ErrorKind::ProcessGone(pid));
    }
    Ok(Self { probe, config, pid })
  }

  /// The PID this bridge is attached to.
  #[must_use]
  pub const fn pid(&self) -> u32 {
    self.pid
  }

  /// Send `request` and return its decoded response envelope.
  ///
  /// Follows the documented five steps: re-verify the PID exists, open a
  /// bounded connection, write one frame, read one frame with a bounded
  /// deadline, decode.
  ///
  /// # Errors
  ///
  /// - [`ErrorKind::ProcessGone`] if the PID no longer exists.
  /// - [`ErrorKind::InspectorUnreachable`] / [`ErrorKind::ConnectionTimeout`]
  ///   if the rendezvous name cannot be opened within the deadline.
  /// - [`ErrorKind::RequestTimeout`] if no reply arrives in time.
  /// - [`ErrorKind::ProtocolError`] if the reply is malformed or empty.
  pub async fn invoke(&self, request: Request) -> Result<ResponseEnvelope> {
    if !self.probe.exists(self.pid) {
      return Err(ErrorKind::ProcessGone(self.pid));
    }

    let name = self.config.rendezvous_name(self.pid);
    let ns_name = name
      .clone()
      .to_ns_name::<GenericNamespaced>()
      .map_err(|e| ErrorKind::ProtocolError(format!("invalid rendezvous name {name}: {e}")))?;

    let connect = interprocess::local_socket::tokio::Stream::connect(ns_name);
    let mut stream = match tokio::time::timeout(self.config.connection_timeout, connect).await {
      Ok(Ok(stream)) => stream,
      Ok(Err(_)) => return Err(ErrorKind::InspectorUnreachable(self.pid)),
      Err(_) => return Err(ErrorKind::ConnectionTimeout),
    };

    let encoded =
      serde_json::to_vec(&request).map_err(|e| ErrorKind::ProtocolError(format!("encode failed: {e}")))?;
    let line = frame_line(encoded);
    stream.write_all(&line).await.map_err(|e| ErrorKind::ProtocolError(format!("write failed: {e}")))?;

    read_one_response(&mut stream, self.config.request_timeout).await
  }

  async fn invoke_typed(&self, request: Request) -> Result<ResponseData> {
    let envelope = self.invoke(request).await?;
    if !envelope.success {
      return Err(ErrorKind::HandlerError(envelope.error.unwrap_or_default()));
    }
    envelope.data.ok_or_else(|| ErrorKind::ProtocolError("success reply carried no data".into()))
  }

  /// `GetVisualTree`: the live visual tree rooted at `root_handle` (or the
  /// session root when `None`), walked to `max_depth`.
  pub async fn get_visual_tree(
    &self,
    request_id: impl Into<String>,
    root_handle: Option<Handle>,
    max_depth: usize,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetVisualTree(GetVisualTreeRequest {
        request_id: request_id.into(),
        root_handle,
        max_depth,
      }))
      .await
  }

  /// `GetLogicalTree`: same shape as [`Self::get_visual_tree`] but walking
  /// logical-tree children.
  pub async fn get_logical_tree(
    &self,
    request_id: impl Into<String>,
    root_handle: Option<Handle>,
    max_depth: usize,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetLogicalTree(GetLogicalTreeRequest {
        request_id: request_id.into(),
        root_handle,
        max_depth,
      }))
      .await
  }

  /// `GetElementProperties`: every declared property on `element_handle`.
  pub async fn get_element_properties(
    &self,
    request_id: impl Into<String>,
    element_handle: Handle,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetElementProperties(GetElementPropertiesRequest {
        request_id: request_id.into(),
        element_handle,
      }))
      .await
  }

  /// `FindElements`: search for nodes matching the given filters, capped at
  /// `max_results`.
  #[allow(clippy::too_many_arguments)]
  pub async fn find_elements(
    &self,
    request_id: impl Into<String>,
    root_handle: Option<Handle>,
    type_name: Option<String>,
    element_name: Option<String>,
    property_filter: Option<std::collections::HashMap<String, String>>,
    max_results: usize,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::FindElements(FindElementsRequest {
        request_id: request_id.into(),
        root_handle,
        type_name,
        element_name,
        property_filter,
        max_results,
      }))
      .await
  }

  /// `GetBindings`: every data binding attached to `element_handle`.
  pub async fn get_bindings(&self, request_id: impl Into<String>, element_handle: Handle) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetBindings(GetBindingsRequest { request_id: request_id.into(), element_handle }))
      .await
  }

  /// `GetBindingErrors`: the session's buffered binding-error diagnostics.
  pub async fn get_binding_errors(&self, request_id: impl Into<String>) -> Result<ResponseData> {
    self.invoke_typed(Request::GetBindingErrors(GetBindingErrorsRequest { request_id: request_id.into() })).await
  }

  /// `GetResources`: resources resolvable at `scope`, optionally rooted at
  /// `element_handle`.
  pub async fn get_resources(
    &self,
    request_id: impl Into<String>,
    scope: inspect_core::model::ResourceScope,
    element_handle: Option<Handle>,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetResources(GetResourcesRequest {
        request_id: request_id.into(),
        scope,
        element_handle,
      }))
      .await
  }

  /// `GetStyles`: the style currently active on `element_handle`.
  pub async fn get_styles(&self, request_id: impl Into<String>, element_handle: Handle) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetStyles(GetStylesRequest { request_id: request_id.into(), element_handle }))
      .await
  }

  /// `HighlightElement`: flash an overlay over `element_handle` for
  /// `duration_ms`.
  pub async fn highlight_element(
    &self,
    request_id: impl Into<String>,
    element_handle: Handle,
    duration_ms: u64,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::HighlightElement(HighlightElementRequest {
        request_id: request_id.into(),
        element_handle,
        duration_ms,
      }))
      .await
  }

  /// `GetLayoutInfo`: render geometry for `element_handle`.
  pub async fn get_layout_info(&self, request_id: impl Into<String>, element_handle: Handle) -> Result<ResponseData> {
    self
      .invoke_typed(Request::GetLayoutInfo(GetLayoutInfoRequest { request_id: request_id.into(), element_handle }))
      .await
  }

  /// `WatchProperty`: subscribe to future changes of `property_name` on
  /// `element_handle`.
  pub async fn watch_property(
    &self,
    request_id: impl Into<String>,
    element_handle: Handle,
    property_name: impl Into<String>,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::WatchProperty(WatchPropertyRequest {
        request_id: request_id.into(),
        element_handle,
        property_name: property_name.into(),
      }))
      .await
  }

  /// `ExportTree`: export the tree rooted at `element_handle` (or the
  /// session root) in the given `format`.
  pub async fn export_tree(
    &self,
    request_id: impl Into<String>,
    element_handle: Option<Handle>,
    format: ExportFormat,
  ) -> Result<ResponseData> {
    self
      .invoke_typed(Request::ExportTree(ExportTreeRequest { request_id: request_id.into(), element_handle, format }))
      .await
  }
}

async fn read_one_response<IO>(stream: &mut IO, deadline: Duration) -> Result<ResponseEnvelope>
where
  IO: tokio::io::AsyncRead + Unpin,
{
  let mut frame_reader = FrameReader::new();
  let mut buf = [0_u8; 8192];

  tokio::time::timeout(deadline, async {
    loop {
      let n = stream.read(&mut buf).await.map_err(|e| ErrorKind::ProtocolError(format!("read failed: {e}")))?;
      if n == 0 {
        return Err(ErrorKind::ProtocolError("connection closed before a reply arrived".into()));
      }
      for frame in frame_reader.push(&buf[..n]) {
        return serde_json::from_slice::<ResponseEnvelope>(&frame)
          .map_err(|e| ErrorKind::ProtocolError(format!("malformed reply: {e}")));
      }
    }
  })
  .await
  .map_err(|_| ErrorKind::RequestTimeout)?
}

#[cfg(test)]
mod tests {
  use super::*;

  struct StaticProbe(bool);

  impl ProcessProbe for StaticProbe {
    fn exists(&self, _pid: u32) -> bool {
      self.0
    }

    fn candidates(&self) -> Vec<crate::discovery::ProcessHandle> {
      Vec::new()
    }
  }

  #[test]
  fn attach_to_a_dead_pid_fails_with_process_gone() {
    let probe: Arc<dyn ProcessProbe> = Arc::new(StaticProbe(false));
    let err = Bridge::attach(probe, BridgeConfig::new(), 4242).unwrap_err();
    assert!(matches!(err, ErrorKind::ProcessGone(4242)));
  }

  /// Scenario 5: a PID that terminates between `attach` and `invoke`
  /// surfaces as `ProcessGone` on the next call, carrying a remediation
  /// sentence naming re-discovery and re-attach.
  #[tokio::test]
  async fn invoke_after_pid_terminates_fails_with_process_gone() {
    let probe: Arc<dyn ProcessProbe> = Arc::new(StaticProbe(true));
    let bridge = Bridge::attach(Arc::clone(&probe), BridgeConfig::new(), 4242).unwrap();

    let probe_now_dead: Arc<dyn ProcessProbe> = Arc::new(StaticProbe(false));
    let bridge = Bridge { probe: probe_now_dead, ..bridge };

    let err = bridge
      .invoke(Request::GetBindingErrors(GetBindingErrorsRequest { request_id: "r1".into() }))
      .await
      .unwrap_err();
    assert!(matches!(err, ErrorKind::ProcessGone(4242)));
    assert!(err.remediation().unwrap().to_lowercase().contains("attach"));
  }
}
