//! Binary operation encoding over a growable buffer of 16-bit words.
//!
//! Layout (every operation starts with `[opcode, uid]`):
//! - strings are a length word followed by that many UTF-16 code units;
//! - id lists are a count word followed by one id per entry;
//! - `InsertBefore` is `[op, uid, child, reference]` with `0` as null;
//! - style set is `[op, uid, property, value, important]` (`important` is 0/1);
//! - a batch is terminated by `[End, 0]`.
//!
//! Integer fields (ids, lengths, counts) below `0xFFFF` take one word. Larger
//! values are escaped as `0xFFFF` followed by the high and low halves, so long
//! strings and large sessions never hit a ceiling.
//!
//! The `encode_*` functions are pure: they write at `offset` and return the
//! offset past the record, or `0` when the record does not fit. Nothing is
//! written on overflow. [`BinaryLog`] owns the buffer and grows it on demand.

use crate::operation::{OpCode, OperationRef};
use crate::sink::OperationSink;
use core_types::UniqueId;
use serde::{Deserialize, Serialize};
use tools::utf16::{utf16_len, write_utf16};

/// Marker word introducing a two-word wide integer.
pub const WIDE_ESCAPE: u16 = 0xFFFF;

const ABSOLUTE_MIN_WORDS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Size of the first buffer, in words.
    pub initial_words: usize,
    /// Shrinking never goes below this many words.
    pub min_words: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_words: 32 * 1024,
            min_words: 256,
        }
    }
}

#[inline]
fn int_len(value: u32) -> usize {
    if value < WIDE_ESCAPE as u32 { 1 } else { 3 }
}

#[inline]
fn str_len(text: &str) -> usize {
    let units = utf16_len(text);
    int_len(units as u32) + units
}

#[inline]
fn ids_len(ids: &[UniqueId]) -> usize {
    int_len(ids.len() as u32) + ids.iter().map(|id| int_len(id.0)).sum::<usize>()
}

/// Words needed to encode `op`.
pub fn encoded_len(op: OperationRef<'_>) -> usize {
    let header = 1 + int_len(op.uid().0);
    let body = match op {
        OperationRef::CreateElement { tag, .. } => str_len(tag),
        OperationRef::SetAttribute { key, value, .. } => str_len(key) + str_len(value),
        OperationRef::RemoveAttribute { key, .. } => str_len(key),
        OperationRef::Append { children, .. } => ids_len(children),
        OperationRef::Remove { .. } => 0,
        OperationRef::ReplaceWith { nodes, .. } => ids_len(nodes),
        OperationRef::InsertBefore {
            child, reference, ..
        } => int_len(child.0) + int_len(reference.unwrap_or(UniqueId::INVALID).0),
        OperationRef::EnableEvent { event_type, .. } => str_len(event_type),
        OperationRef::RemoveChild { child, .. } => int_len(child.0),
        OperationRef::SetStyleProperty {
            property, value, ..
        } => str_len(property) + str_len(value) + 1,
        OperationRef::RemoveStyleProperty { property, .. } => str_len(property),
        OperationRef::SetInnerHtml { text, .. } => str_len(text),
    };
    header + body
}

/// Writer over a region whose capacity was checked up front.
struct Words<'a> {
    buf: &'a mut [u16],
    at: usize,
}

impl<'a> Words<'a> {
    fn reserve(buf: &'a mut [u16], offset: usize, required: usize) -> Option<Self> {
        let end = offset.checked_add(required)?;
        if end > buf.len() {
            return None;
        }
        Some(Self { buf, at: offset })
    }

    fn word(&mut self, word: u16) {
        self.buf[self.at] = word;
        self.at += 1;
    }

    fn int(&mut self, value: u32) {
        if value < WIDE_ESCAPE as u32 {
            self.word(value as u16);
        } else {
            self.word(WIDE_ESCAPE);
            self.word((value >> 16) as u16);
            self.word(value as u16);
        }
    }

    fn header(&mut self, op: OpCode, uid: UniqueId) {
        self.word(op.as_word());
        self.int(uid.0);
    }

    fn string(&mut self, text: &str) {
        self.int(utf16_len(text) as u32);
        // Capacity was reserved from the same length computation.
        if let Some(end) = write_utf16(self.buf, self.at, text) {
            self.at = end;
        }
    }

    fn ids(&mut self, ids: &[UniqueId]) {
        self.int(ids.len() as u32);
        for id in ids {
            self.int(id.0);
        }
    }

    fn finish(self) -> usize {
        self.at
    }
}

pub fn encode_create_element(buf: &mut [u16], offset: usize, uid: UniqueId, tag: &str) -> usize {
    encode_operation(buf, offset, OperationRef::CreateElement { uid, tag })
}

pub fn encode_set_attribute(
    buf: &mut [u16],
    offset: usize,
    uid: UniqueId,
    key: &str,
    value: &str,
) -> usize {
    encode_operation(buf, offset, OperationRef::SetAttribute { uid, key, value })
}

pub fn encode_remove_attribute(buf: &mut [u16], offset: usize, uid: UniqueId, key: &str) -> usize {
    encode_operation(buf, offset, OperationRef::RemoveAttribute { uid, key })
}

pub fn encode_append(buf: &mut [u16], offset: usize, uid: UniqueId, children: &[UniqueId]) -> usize {
    encode_operation(buf, offset, OperationRef::Append { uid, children })
}

pub fn encode_remove(buf: &mut [u16], offset: usize, uid: UniqueId) -> usize {
    encode_operation(buf, offset, OperationRef::Remove { uid })
}

pub fn encode_replace_with(buf: &mut [u16], offset: usize, uid: UniqueId, nodes: &[UniqueId]) -> usize {
    encode_operation(buf, offset, OperationRef::ReplaceWith { uid, nodes })
}

pub fn encode_insert_before(
    buf: &mut [u16],
    offset: usize,
    uid: UniqueId,
    child: UniqueId,
    reference: Option<UniqueId>,
) -> usize {
    encode_operation(
        buf,
        offset,
        OperationRef::InsertBefore {
            uid,
            child,
            reference,
        },
    )
}

pub fn encode_enable_event(buf: &mut [u16], offset: usize, uid: UniqueId, event_type: &str) -> usize {
    encode_operation(buf, offset, OperationRef::EnableEvent { uid, event_type })
}

pub fn encode_remove_child(buf: &mut [u16], offset: usize, uid: UniqueId, child: UniqueId) -> usize {
    encode_operation(buf, offset, OperationRef::RemoveChild { uid, child })
}

pub fn encode_set_style_property(
    buf: &mut [u16],
    offset: usize,
    uid: UniqueId,
    property: &str,
    value: &str,
    important: bool,
) -> usize {
    encode_operation(
        buf,
        offset,
        OperationRef::SetStyleProperty {
            uid,
            property,
            value,
            important,
        },
    )
}

pub fn encode_remove_style_property(
    buf: &mut [u16],
    offset: usize,
    uid: UniqueId,
    property: &str,
) -> usize {
    encode_operation(buf, offset, OperationRef::RemoveStyleProperty { uid, property })
}

pub fn encode_set_inner_html(buf: &mut [u16], offset: usize, uid: UniqueId, text: &str) -> usize {
    encode_operation(buf, offset, OperationRef::SetInnerHtml { uid, text })
}

/// Write the batch terminator `[End, 0]`.
pub fn encode_end(buf: &mut [u16], offset: usize) -> usize {
    let Some(mut w) = Words::reserve(buf, offset, 2) else {
        return 0;
    };
    w.header(OpCode::End, UniqueId::INVALID);
    w.finish()
}

/// Encode any operation; `0` means it did not fit.
pub fn encode_operation(buf: &mut [u16], offset: usize, op: OperationRef<'_>) -> usize {
    let Some(mut w) = Words::reserve(buf, offset, encoded_len(op)) else {
        return 0;
    };
    w.header(op.opcode(), op.uid());
    match op {
        OperationRef::CreateElement { tag, .. } => w.string(tag),
        OperationRef::SetAttribute { key, value, .. } => {
            w.string(key);
            w.string(value);
        }
        OperationRef::RemoveAttribute { key, .. } => w.string(key),
        OperationRef::Append { children, .. } => w.ids(children),
        OperationRef::Remove { .. } => {}
        OperationRef::ReplaceWith { nodes, .. } => w.ids(nodes),
        OperationRef::InsertBefore {
            child, reference, ..
        } => {
            w.int(child.0);
            w.int(reference.unwrap_or(UniqueId::INVALID).0);
        }
        OperationRef::EnableEvent { event_type, .. } => w.string(event_type),
        OperationRef::RemoveChild { child, .. } => w.int(child.0),
        OperationRef::SetStyleProperty {
            property,
            value,
            important,
            ..
        } => {
            w.string(property);
            w.string(value);
            w.word(important as u16);
        }
        OperationRef::RemoveStyleProperty { property, .. } => w.string(property),
        OperationRef::SetInnerHtml { text, .. } => w.string(text),
    }
    w.finish()
}

/// A committed binary batch.
///
/// `words` is the whole handed-off buffer, including the unused slack after
/// the `End` record; `len` marks the end of the `End` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryBatch {
    words: Vec<u16>,
    len: usize,
    op_count: usize,
}

impl BinaryBatch {
    /// Wrap words received from elsewhere; the whole slice is considered used.
    pub fn from_words(words: Vec<u16>) -> Self {
        let len = words.len();
        Self {
            words,
            len,
            op_count: 0,
        }
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn used(&self) -> &[u16] {
        &self.words[..self.len]
    }

    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Operations recorded into this batch (excluding `End`); `0` when unknown.
    pub fn op_count(&self) -> usize {
        self.op_count
    }

    pub fn into_words(self) -> Vec<u16> {
        self.words
    }
}

/// Binary encoding sink.
///
/// Growth doubles the buffer whenever a record would overflow. A commit hands
/// the buffer off and allocates the next one: same size if the batch grew,
/// half size (down to `min_words`) otherwise.
#[derive(Debug)]
pub struct BinaryLog {
    buf: Vec<u16>,
    offset: usize,
    op_count: usize,
    grew: bool,
    config: BufferConfig,
}

impl BinaryLog {
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    pub fn with_config(config: BufferConfig) -> Self {
        let min_words = config.min_words.max(ABSOLUTE_MIN_WORDS);
        let config = BufferConfig {
            initial_words: config.initial_words.max(min_words),
            min_words,
        };
        Self {
            buf: vec![0; config.initial_words],
            offset: 0,
            op_count: 0,
            grew: false,
            config,
        }
    }

    /// Current buffer size in words.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Words written in the open batch.
    pub fn len(&self) -> usize {
        self.offset
    }

    /// Whether the open batch had to grow the buffer.
    pub fn grew(&self) -> bool {
        self.grew
    }

    fn grow(&mut self) {
        let old = self.buf.len();
        let mut next = vec![0u16; (old * 2).max(ABSOLUTE_MIN_WORDS)];
        next[..self.offset].copy_from_slice(&self.buf[..self.offset]);
        self.buf = next;
        self.grew = true;
        log::debug!(target: "dom.binary", "grow operation buffer {} -> {} words", old, self.buf.len());
    }

    fn write_with(&mut self, mut encode: impl FnMut(&mut [u16], usize) -> usize) {
        loop {
            let next = encode(&mut self.buf, self.offset);
            if next != 0 {
                self.offset = next;
                return;
            }
            self.grow();
        }
    }
}

impl Default for BinaryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationSink for BinaryLog {
    type Batch = BinaryBatch;

    fn record(&mut self, op: OperationRef<'_>) {
        self.write_with(|buf, offset| encode_operation(buf, offset, op));
        self.op_count += 1;
    }

    fn commit(&mut self) -> BinaryBatch {
        self.write_with(encode_end);
        let next_words = if self.grew {
            self.buf.len()
        } else {
            (self.buf.len() / 2).max(self.config.min_words)
        };
        let words = std::mem::replace(&mut self.buf, vec![0; next_words]);
        let batch = BinaryBatch {
            words,
            len: self.offset,
            op_count: self.op_count,
        };
        log::debug!(
            target: "dom.binary",
            "commit {} operations in {} words (buffer {}, next {})",
            batch.op_count,
            batch.len,
            batch.capacity(),
            next_words
        );
        self.offset = 0;
        self.op_count = 0;
        self.grew = false;
        batch
    }

    fn is_empty(&self) -> bool {
        self.offset == 0
    }
}
