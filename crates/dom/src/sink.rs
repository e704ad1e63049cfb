use crate::binary::{BinaryBatch, BinaryLog, BufferConfig};
use crate::operation::{Operation, OperationRef};
use core_types::Encoding;
use serde::{Deserialize, Serialize};

/// Destination for the operations produced by an offscreen document.
///
/// `record` is called once per mutation in call order. `commit` closes the
/// current batch, hands it out and starts a new one; it is the only batch
/// boundary.
pub trait OperationSink {
    type Batch;

    fn record(&mut self, op: OperationRef<'_>);

    fn commit(&mut self) -> Self::Batch;

    /// True when nothing was recorded since the last commit.
    fn is_empty(&self) -> bool;
}

/// Object-log encoding: one owned record per mutation.
#[derive(Debug, Default)]
pub struct ObjectLog {
    ops: Vec<Operation>,
}

impl ObjectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Operation] {
        &self.ops
    }
}

impl OperationSink for ObjectLog {
    type Batch = Vec<Operation>;

    fn record(&mut self, op: OperationRef<'_>) {
        self.ops.push(op.into_owned());
    }

    fn commit(&mut self) -> Vec<Operation> {
        log::debug!(target: "dom.log", "commit {} operations", self.ops.len());
        std::mem::take(&mut self.ops)
    }

    fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A committed batch in either encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodedBatch {
    Binary(BinaryBatch),
    Log(Vec<Operation>),
}

impl EncodedBatch {
    pub fn encoding(&self) -> Encoding {
        match self {
            EncodedBatch::Binary(_) => Encoding::Binary,
            EncodedBatch::Log(_) => Encoding::ObjectLog,
        }
    }
}

impl From<BinaryBatch> for EncodedBatch {
    fn from(batch: BinaryBatch) -> Self {
        EncodedBatch::Binary(batch)
    }
}

impl From<Vec<Operation>> for EncodedBatch {
    fn from(ops: Vec<Operation>) -> Self {
        EncodedBatch::Log(ops)
    }
}

/// Sink whose encoding is picked at runtime from configuration.
#[derive(Debug)]
pub enum EncodingSink {
    Binary(BinaryLog),
    Log(ObjectLog),
}

impl EncodingSink {
    pub fn new(encoding: Encoding, buffer: BufferConfig) -> Self {
        match encoding {
            Encoding::Binary => EncodingSink::Binary(BinaryLog::with_config(buffer)),
            Encoding::ObjectLog => EncodingSink::Log(ObjectLog::new()),
        }
    }
}

impl OperationSink for EncodingSink {
    type Batch = EncodedBatch;

    fn record(&mut self, op: OperationRef<'_>) {
        match self {
            EncodingSink::Binary(sink) => sink.record(op),
            EncodingSink::Log(sink) => sink.record(op),
        }
    }

    fn commit(&mut self) -> EncodedBatch {
        match self {
            EncodingSink::Binary(sink) => sink.commit().into(),
            EncodingSink::Log(sink) => sink.commit().into(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            EncodingSink::Binary(sink) => sink.is_empty(),
            EncodingSink::Log(sink) => sink.is_empty(),
        }
    }
}
