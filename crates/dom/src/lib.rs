pub mod binary;
pub mod document;
pub mod event;
pub mod linear;
pub mod operation;
pub mod reader;
pub mod sink;
pub mod snapshot;
pub mod store;
pub mod style;

mod html;

pub use binary::{BinaryBatch, BinaryLog, BufferConfig};
pub use core_types::UniqueId;
pub use document::{DomError, OffscreenDocument};
pub use event::{
    CrossThreadEvent, DispatchOutcome, ListenerFn, ListenerId, ListenerOptions, OffscreenEvent,
};
pub use linear::LinearStore;
pub use operation::{OpCode, Operation, OperationRef, keep_last_occurrence};
pub use reader::{BinaryReader, DecodeError, decode_batch};
pub use sink::{EncodedBatch, EncodingSink, ObjectLog, OperationSink};
pub use store::{ArenaStore, ElementStore};
pub use style::StyleProperty;
