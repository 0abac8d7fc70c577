/*!
Controller Bridge: the client-side half of the UI inspection protocol
(`spec.md` §4.G). Discovers candidate target processes, attaches to one by
PID, and exposes a typed method per request kind, each opening its own
transient rendezvous connection rather than pooling one.

```ignore
use inspect_bridge::{Bridge, BridgeConfig};
use inspect_bridge::discovery::SysinfoProbe;
use std::sync::Arc;

let probe = Arc::new(SysinfoProbe::new());
let bridge = Bridge::attach(probe, BridgeConfig::new(), target_pid)?;
let reply = bridge.get_visual_tree("r1", None, 10).await?;
```
*/

pub mod bridge;
pub mod config;
pub mod discovery;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use discovery::{discover_candidates, ProcessHandle, ProcessProbe, SysinfoProbe};
