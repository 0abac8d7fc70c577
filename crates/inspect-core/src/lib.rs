/*!
Shared wire protocol, data model, and error taxonomy for the UI inspection
protocol: the vocabulary both the inspector endpoint and the controller
bridge build on.

```ignore
use inspect_core::protocol::{Request, GetVisualTreeRequest};
use inspect_core::handle::Handle;

let request = Request::GetVisualTree(GetVisualTreeRequest {
  request_id: "r1".into(),
  root_handle: None,
  max_depth: 10,
});
```
*/

pub mod codec;
pub mod error;
pub mod handle;
pub mod model;
pub mod protocol;

pub use error::{ErrorKind, Result};
pub use handle::Handle;
