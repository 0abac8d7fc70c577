/*!
Per-process inspector endpoint: hosts the UI inspection protocol inside a
target application's process, bridging a live [`adapter::ToolkitAdapter`]
implementation to the wire protocol defined in `inspect-core`.

A host wires this crate up by:

1. implementing [`adapter::ToolkitAdapter`] for its own UI framework (or
   using [`testing::MockAdapter`] under the `test-util` feature for tests);
2. implementing [`marshal::UiScheduler`] to post work onto its real event
   loop, or using the bundled [`marshal::ThreadScheduler`];
3. constructing an [`endpoint::Endpoint`] from the two, and handing it to
   [`listener::run`] to accept connections on the process's rendezvous
   name.

```ignore
let adapter = MyFrameworkAdapter::new();
let scheduler = MyFrameworkScheduler::new();
let endpoint = Endpoint::new(adapter, scheduler, EndpointConfig::new());
let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
listener::run(&endpoint, std::process::id(), shutdown_rx).await?;
```
*/

pub mod adapter;
pub mod analyzer;
pub mod config;
pub mod endpoint;
pub mod export;
pub mod listener;
pub mod marshal;
pub mod registry;
pub mod watch;

#[cfg(feature = "test-util")]
pub mod testing;

pub use adapter::ToolkitAdapter;
pub use config::EndpointConfig;
pub use endpoint::Endpoint;
pub use marshal::{ThreadScheduler, UiScheduler};
