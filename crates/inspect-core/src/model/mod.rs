/*!
Wire data model (`spec.md` §3): the Records exchanged between the inspector
endpoint and the controller bridge.

## Module Structure

- `visual_tree` — `VisualTreeNode`
- `property` — `PropertyRecord`, `ValueSource`, value formatting helpers
- `binding` — `BindingRecord`, `BindingErrorRecord` and their sub-enums
- `layout` — `LayoutRecord` and its geometry sub-types
- `resource` — `ResourceRecord`, `ResourceScope`
- `style` — `StyleRecord`, `StyleSetter`, `StyleTrigger`
- `watch` — `Watch`
*/

pub mod binding;
pub mod layout;
pub mod property;
pub mod resource;
pub mod style;
pub mod visual_tree;
pub mod watch;

pub use binding::{BindingErrorRecord, BindingErrorType, BindingMode, BindingRecord, BindingSource, BindingStatus};
pub use layout::{EdgeInsets, HorizontalAlignment, LayoutRecord, Size, VerticalAlignment, Visibility};
pub use property::{truncate_value, PropertyRecord, ValueSource, MAX_VALUE_LEN};
pub use resource::{ResourceRecord, ResourceScope};
pub use style::{StyleRecord, StyleSetter, StyleTrigger};
pub use visual_tree::VisualTreeNode;
pub use watch::Watch;
