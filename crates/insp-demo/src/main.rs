//! Standalone host for the inspection endpoint, useful for exercising a
//! controller (or the bridge's own test suite) against a real rendezvous
//! socket without a real UI framework attached.
//!
//! Hosts a small mock window tree (`MockAdapter`) behind the same
//! `Endpoint`/`listener::run` accept loop a real toolkit integration would
//! use, and shuts down cleanly on Ctrl+C.

use std::sync::Arc;

use inspect_core::model::ValueSource;
use inspect_endpoint::testing::{MockAdapter, MockNodeSpec};
use inspect_endpoint::{Endpoint, EndpointConfig, ThreadScheduler};

fn demo_tree() -> Arc<MockAdapter> {
  MockAdapter::from_tree(
    MockNodeSpec::new("System.Windows.Window").named("MainWindow").with_child(
      MockNodeSpec::new("System.Windows.Controls.StackPanel").with_child(
        MockNodeSpec::new("System.Windows.Controls.Button")
          .named("SubmitButton")
          .with_property("Content", "Submit", ValueSource::Local),
      ),
    ),
  )
}

#[tokio::main]
async fn main() {
  env_logger::init();

  let pid = std::process::id();
  let adapter = demo_tree();
  let endpoint = Endpoint::new(adapter, ThreadScheduler::new(), EndpointConfig::new());

  let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      log::info!(target: "insp_demo", "ctrl-c received, shutting down");
      let _ = shutdown_tx.send(());
    }
  });

  log::info!(target: "insp_demo", "hosting demo tree under pid {pid}");
  if let Err(err) = inspect_endpoint::listener::run(&endpoint, pid, shutdown_rx).await {
    log::error!(target: "insp_demo", "accept loop exited with an error: {err}");
    std::process::exit(1);
  }
}
