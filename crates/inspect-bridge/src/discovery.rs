/*!
Process discovery (`spec.md` §4.G "`discoverCandidates`"): enumerates
plausible target processes via an OS facility the bridge consumes rather
than owns — [`ProcessProbe`] is the seam, [`SysinfoProbe`] its default
implementation.
*/

use std::time::Duration;

use interprocess::local_socket::tokio::prelude::*;
use interprocess::local_socket::{GenericNamespaced, ToNsName};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

use crate::config::BridgeConfig;

/// One process the bridge could attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHandle {
  pub pid: u32,
  pub name: String,
  /// Whether a rendezvous endpoint for this PID answered a probe connect.
  pub inspector_available: bool,
}

/// Minimal process-enumeration seam so the bridge's own discovery logic
/// (name/module heuristics, candidate marking) stays independent of any one
/// OS facility.
pub trait ProcessProbe: Send + Sync {
  /// Whether a process with this PID currently exists.
  fn exists(&self, pid: u32) -> bool;

  /// Enumerate plausible target processes, without `inspectorAvailable`
  /// populated — the caller probes that separately.
  fn candidates(&self) -> Vec<ProcessHandle>;
}

/// Default [`ProcessProbe`], backed by `sysinfo`'s cross-platform process
/// table.
pub struct SysinfoProbe {
  system: std::sync::Mutex<System>,
}

impl std::fmt::Debug for SysinfoProbe {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SysinfoProbe").finish_non_exhaustive()
  }
}

impl SysinfoProbe {
  /// Build a probe with a freshly refreshed process snapshot.
  #[must_use]
  pub fn new() -> Self {
    let mut system = System::new();
    system.refresh_all();
    Self { system: std::sync::Mutex::new(system) }
  }
}

impl Default for SysinfoProbe {
  fn default() -> Self {
    Self::new()
  }
}

impl ProcessProbe for SysinfoProbe {
  fn exists(&self, pid: u32) -> bool {
    let mut system = self.system.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
    system.process(Pid::from_u32(pid)).is_some()
  }

  fn candidates(&self) -> Vec<ProcessHandle> {
    let mut system = self.system.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    system
      .processes()
      .iter()
      .map(|(pid, process)| ProcessHandle {
        pid: pid.as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        inspector_available: false,
      })
      .collect()
  }
}

/// Default timeout for the connect-probe `discoverCandidates` performs
/// against each candidate's rendezvous name.
pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Enumerate plausible target processes via `probe`, marking each with
/// `inspectorAvailable` based on whether a connect to its rendezvous name
/// (per `config`'s prefix) succeeds within [`PROBE_CONNECT_TIMEOUT`].
///
/// Matches `spec.md` §4.G's `discoverCandidates()`: discovery itself is an
/// OS-facility concern (here, `probe`); only the "does this candidate have
/// a live inspector" check belongs to the bridge.
pub async fn discover_candidates(probe: &dyn ProcessProbe, config: &BridgeConfig) -> Vec<ProcessHandle> {
  let mut candidates = probe.candidates();
  for candidate in &mut candidates {
    candidate.inspector_available = probe_inspector(candidate.pid, config).await;
  }
  candidates
}

async fn probe_inspector(pid: u32, config: &BridgeConfig) -> bool {
  let name = config.rendezvous_name(pid);
  let Ok(ns_name) = name.to_ns_name::<GenericNamespaced>() else {
    return false;
  };
  let connect = interprocess::local_socket::tokio::Stream::connect(ns_name);
  matches!(tokio::time::timeout(PROBE_CONNECT_TIMEOUT, connect).await, Ok(Ok(_)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_process_is_reported_as_existing() {
    let probe = SysinfoProbe::new();
    let pid = std::process::id();
    assert!(probe.exists(pid));
  }

  #[test]
  fn implausible_pid_does_not_exist() {
    let probe = SysinfoProbe::new();
    assert!(!probe.exists(u32::MAX));
  }

  struct StubProbe(Vec<ProcessHandle>);

  impl ProcessProbe for StubProbe {
    fn exists(&self, _pid: u32) -> bool {
      true
    }

    fn candidates(&self) -> Vec<ProcessHandle> {
      self.0.clone()
    }
  }

  #[tokio::test]
  async fn discover_candidates_marks_unreachable_pid_as_unavailable() {
    let probe = StubProbe(vec![ProcessHandle {
      pid: std::process::id() + 1_000_000,
      name: "nonexistent.exe".into(),
      inspector_available: false,
    }]);
    let config = BridgeConfig::new();
    let found = discover_candidates(&probe, &config).await;
    assert_eq!(found.len(), 1);
    assert!(!found[0].inspector_available);
  }
}
