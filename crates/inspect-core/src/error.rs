/*! Error taxonomy shared by the inspector endpoint and the controller bridge. */

/// Error *kinds*, not type names — the protocol's closed taxonomy.
///
/// Handler errors (the endpoint-side variants) are serialized into the
/// response envelope (`success: false, error: <message>`) and never
/// propagate out of the reader loop. Controller-side variants are returned
/// to the outer tool-dispatch layer with a [`ErrorKind::remediation`]
/// sentence.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
  /// Unparseable or unknown request envelope.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  /// A required request field was absent.
  #[error("missing required field: {0}")]
  MissingField(String),

  /// The handle is unknown in this session.
  #[error("handle not found in this session")]
  NotFound,

  /// The handle resolves to a node that has no layout.
  #[error("element is not renderable")]
  NotRenderable,

  /// The named property is not defined on the node.
  #[error("property not found: {0}")]
  PropertyNotFound(String),

  /// The UI scheduler did not run the work within the deadline.
  #[error("UI scheduler timeout: request timed out waiting for work to complete")]
  Timeout,

  /// Internal handler failure; the message describes it.
  #[error("{0}")]
  HandlerError(String),

  /// The target process does not exist or has exited.
  #[error("process {0} does not exist")]
  ProcessGone(u32),

  /// No inspector endpoint is reachable for the process.
  #[error("no inspector endpoint reachable for process {0}")]
  InspectorUnreachable(u32),

  /// Opening the rendezvous connection exceeded its deadline.
  #[error("connecting to the inspector endpoint timed out")]
  ConnectionTimeout,

  /// No reply arrived within the request deadline.
  #[error("request timed out waiting for a reply")]
  RequestTimeout,

  /// The reply was malformed or empty.
  #[error("malformed reply: {0}")]
  ProtocolError(String),
}

impl ErrorKind {
  /// A human-readable remediation sentence for controller-side errors.
  ///
  /// Handler-side kinds (everything the endpoint itself can raise) have no
  /// remediation beyond "the caller should inspect the message", since the
  /// caller already holds a live connection; they return `None`.
  #[must_use]
  pub fn remediation(&self) -> Option<&'static str> {
    match self {
      Self::ProcessGone(_) => {
        Some("re-run discovery and attach to the process's current PID before retrying")
      }
      Self::InspectorUnreachable(_) => Some(
        "confirm the target process has an inspector endpoint hosted, then re-discover and re-attach",
      ),
      Self::ConnectionTimeout => {
        Some("the endpoint may be overloaded or gone; re-discover and re-attach")
      }
      Self::RequestTimeout => {
        Some("the UI thread may be stalled; retry, and re-attach if retries keep timing out")
      }
      Self::ProtocolError(_) => {
        Some("the endpoint sent a reply this bridge version cannot parse; check version skew")
      }
      _ => None,
    }
  }

  /// Whether this kind only ever originates on the controller side of the
  /// wire (as opposed to being serialized into a handler's response).
  #[must_use]
  pub const fn is_controller_side(&self) -> bool {
    matches!(
      self,
      Self::ProcessGone(_)
        | Self::InspectorUnreachable(_)
        | Self::ConnectionTimeout
        | Self::RequestTimeout
        | Self::ProtocolError(_)
    )
  }
}

/// Result alias used throughout the protocol and endpoint crates.
pub type Result<T> = std::result::Result<T, ErrorKind>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn controller_errors_carry_remediation() {
    assert!(ErrorKind::ProcessGone(123).remediation().is_some());
    assert!(ErrorKind::InspectorUnreachable(123).remediation().is_some());
    assert!(ErrorKind::ConnectionTimeout.remediation().is_some());
    assert!(ErrorKind::RequestTimeout.remediation().is_some());
    assert!(ErrorKind::ProtocolError("x".into()).remediation().is_some());
  }

  #[test]
  fn handler_errors_have_no_remediation() {
    assert!(ErrorKind::NotFound.remediation().is_none());
    assert!(ErrorKind::Timeout.remediation().is_none());
  }

  #[test]
  fn process_gone_message_contains_pid() {
    let err = ErrorKind::ProcessGone(4242);
    assert!(err.to_string().contains("4242"));
  }
}
