/*! Property-watch bookkeeping record. */

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

/// A live property-change subscription tracked by the endpoint.
///
/// Created by a `WatchProperty` request, destroyed implicitly on endpoint
/// shutdown — there is no explicit unwatch request in the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watch {
  pub watch_id: String,
  pub handle: Handle,
  pub property_name: String,
  pub last_value: String,
}
