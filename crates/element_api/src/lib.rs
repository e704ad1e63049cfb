//! Main-thread element API.
//!
//! [`ElementApi`] is the flat set of element functions framework code calls
//! to build and mutate its tree. It wraps one [`dom::OffscreenDocument`],
//! stamps the bookkeeping attributes every element carries, keeps dataset,
//! config and handler tables that never leave the main thread, and turns
//! offscreen event delivery into [`PublishedEvent`]s for the background side.

pub mod api;
pub mod attributes;
pub mod config;
pub mod events;
pub mod inline_style;
pub mod list;

pub use api::{ApiError, ElementApi, FlushOptions, FlushedBatch, InlineStyles};
pub use config::ElementApiConfig;
pub use events::{EventInfo, EventKind, PublishedEvent, UnknownEventKind};
pub use list::{ListAction, ListCallbacks, UpdateListInfo};
