/*!
Local-socket accept loop (`spec.md` §4.E): the endpoint's state machine is
`Idle -> Accepting -> Connected -> (Reading/Dispatching/Writing)* ->
Accepting | Stopped`. One connection is served at a time; a second peer
attempting to connect while one is already attached waits until the first
disconnects, since [`Endpoint::serve_connection`] simply isn't called again
until the previous call returns.

Binding uses `interprocess`'s cross-platform local-socket transport (a named
pipe on Windows, a Unix domain socket elsewhere) so the same code path runs
on every platform the host ships to.
*/

use std::time::Duration;

use inspect_core::ErrorKind;
use interprocess::local_socket::tokio::{prelude::*, Stream};
use interprocess::local_socket::{GenericNamespaced, ListenerOptions, ToNsName};

use crate::adapter::ToolkitAdapter;
use crate::endpoint::Endpoint;
use crate::marshal::UiScheduler;

/// Initial and maximum backoff between failed `accept` attempts, so a
/// transient OS-level error (too many open files, a momentary permission
/// issue) doesn't spin the loop hot.
const INITIAL_ACCEPT_BACKOFF: Duration = Duration::from_millis(50);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(5);

/// Bind the rendezvous name for `pid` (per the endpoint's configured
/// prefix) and serve connections one at a time until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ErrorKind::HandlerError`] if the rendezvous name cannot be
/// bound at all (e.g. another endpoint for the same pid is already
/// listening).
pub async fn run<A, S>(
  endpoint: &Endpoint<A, S>,
  pid: u32,
  mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), ErrorKind>
where
  A: ToolkitAdapter,
  S: UiScheduler,
{
  let name = endpoint.rendezvous_name(pid);
  let ns_name = name
    .clone()
    .to_ns_name::<GenericNamespaced>()
    .map_err(|e| ErrorKind::HandlerError(format!("invalid rendezvous name {name}: {e}")))?;
  let listener = ListenerOptions::new()
    .name(ns_name)
    .create_tokio()
    .map_err(|e| ErrorKind::HandlerError(format!("failed to bind rendezvous name {name}: {e}")))?;

  log::info!(target: "inspect_endpoint::listener", "listening on {name}");

  let mut backoff = INITIAL_ACCEPT_BACKOFF;
  loop {
    let accepted = tokio::select! {
      biased;
      _ = &mut shutdown => {
        log::info!(target: "inspect_endpoint::listener", "shutdown requested, stopping accept loop for {name}");
        return Ok(());
      }
      accepted = listener.accept() => accepted,
    };

    let stream = match accepted {
      Ok(stream) => {
        backoff = INITIAL_ACCEPT_BACKOFF;
        stream
      }
      Err(e) => {
        log::warn!(target: "inspect_endpoint::listener", "accept failed on {name}: {e}, retrying in {backoff:?}");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_ACCEPT_BACKOFF);
        continue;
      }
    };

    serve_one(endpoint, &name, stream).await;
  }
}

async fn serve_one<A, S>(endpoint: &Endpoint<A, S>, name: &str, stream: Stream)
where
  A: ToolkitAdapter,
  S: UiScheduler,
{
  log::debug!(target: "inspect_endpoint::listener", "connection attached on {name}");
  if let Err(e) = endpoint.serve_connection(stream).await {
    log::warn!(target: "inspect_endpoint::listener", "connection on {name} ended with error: {e}");
  } else {
    log::debug!(target: "inspect_endpoint::listener", "connection on {name} detached");
  }
}
