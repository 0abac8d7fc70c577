/*! Bridge configuration (ambient: `spec.md` leaves these tunables to the host). */

use std::time::Duration;

/// Default connection timeout (`spec.md` §4.G: "default 5 s").
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request (round-trip) timeout (`spec.md` §4.G: "default 30 s").
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default rendezvous name prefix, matching the endpoint's own default.
pub const DEFAULT_RENDEZVOUS_PREFIX: &str = "wpf_inspector";

/// Tunables for one [`crate::bridge::Bridge`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
  pub(crate) rendezvous_prefix: String,
  pub(crate) connection_timeout: Duration,
  pub(crate) request_timeout: Duration,
}

impl BridgeConfig {
  /// Start from the spec's documented defaults.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Override the rendezvous name prefix (`<prefix>_<pid>`).
  #[must_use]
  pub fn rendezvous_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.rendezvous_prefix = prefix.into();
    self
  }

  /// Override the connect-deadline.
  #[must_use]
  pub fn connection_timeout(mut self, timeout: Duration) -> Self {
    self.connection_timeout = timeout;
    self
  }

  /// Override the per-request round-trip deadline.
  #[must_use]
  pub fn request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  /// The rendezvous name for a given process id: `<prefix>_<pid>`.
  #[must_use]
  pub fn rendezvous_name(&self, pid: u32) -> String {
    format!("{}_{pid}", self.rendezvous_prefix)
  }
}

impl Default for BridgeConfig {
  fn default() -> Self {
    Self {
      rendezvous_prefix: DEFAULT_RENDEZVOUS_PREFIX.to_owned(),
      connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_rendezvous_name_matches_endpoint_default() {
    let config = BridgeConfig::new();
    assert_eq!(config.rendezvous_name(4242), "wpf_inspector_4242");
  }
}
