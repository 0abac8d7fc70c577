/*! Endpoint configuration (ambient: `spec.md` leaves these tunables to the host). */

use std::time::Duration;

use crate::analyzer::BindingErrorBuffer;

/// Default rendezvous name prefix (`spec.md` §4.E, §6: `wpf_inspector_<pid>`).
pub const DEFAULT_RENDEZVOUS_PREFIX: &str = "wpf_inspector";

/// Default UI-thread marshaler deadline (`spec.md` §4.D).
pub const DEFAULT_MARSHAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default `HighlightElement` overlay duration (`spec.md` §4.E).
pub const DEFAULT_HIGHLIGHT_DURATION_MS: u64 = 2000;

/// Tunables for one hosted [`crate::endpoint::Endpoint`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
  pub(crate) rendezvous_prefix: String,
  pub(crate) marshal_timeout: Duration,
  pub(crate) binding_error_buffer_capacity: usize,
}

impl EndpointConfig {
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

  /// Override the UI-thread marshaler's default deadline.
  #[must_use]
  pub fn marshal_timeout(mut self, timeout: Duration) -> Self {
    self.marshal_timeout = timeout;
    self
  }

  /// Override the binding-error FIFO's capacity.
  #[must_use]
  pub fn binding_error_buffer_capacity(mut self, capacity: usize) -> Self {
    self.binding_error_buffer_capacity = capacity;
    self
  }

  /// The rendezvous name for a given process id: `<prefix>_<pid>`.
  #[must_use]
  pub fn rendezvous_name(&self, pid: u32) -> String {
    format!("{}_{pid}", self.rendezvous_prefix)
  }
}

impl Default for EndpointConfig {
  fn default() -> Self {
    Self {
      rendezvous_prefix: DEFAULT_RENDEZVOUS_PREFIX.to_owned(),
      marshal_timeout: DEFAULT_MARSHAL_TIMEOUT,
      binding_error_buffer_capacity: BindingErrorBuffer::DEFAULT_CAPACITY,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_rendezvous_name_matches_spec_pattern() {
    let config = EndpointConfig::new();
    assert_eq!(config.rendezvous_name(4242), "wpf_inspector_4242");
  }

  #[test]
  fn prefix_override_is_reflected_in_rendezvous_name() {
    let config = EndpointConfig::new().rendezvous_prefix("my_app");
    assert_eq!(config.rendezvous_name(1), "my_app_1");
  }
}
