//! UI-side replay of offscreen operation batches.
//!
//! A [`Replayer`] drives a [`TargetTree`] from encoded batches and turns
//! native events on that tree back into [`dom::CrossThreadEvent`]s.

pub mod forward;
pub mod replayer;
pub mod shadow;
pub mod table;
pub mod tree;

pub use forward::{RawEvent, RawValue, sanitize_properties};
pub use replayer::{ReplayError, Replayer};
pub use shadow::{ReclaimPolicy, ShadowNode, ShadowTree};
pub use table::UniqueIdTable;
pub use tree::{TargetTree, TreeError};
