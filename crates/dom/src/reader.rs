use crate::binary::WIDE_ESCAPE;
use crate::operation::{OpCode, Operation};
use core_types::UniqueId;
use tools::utf16::read_utf16_lossy;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("operation buffer ended at word {offset} before an End record")]
    UnexpectedEnd { offset: usize },
    #[error("unknown opcode {opcode} at word {offset}")]
    UnknownOpcode { opcode: u16, offset: usize },
}

/// Streaming decoder for a binary batch.
///
/// Yields operations in buffer order and stops at the `End` record; words after
/// `End` are ignored. After the first error the iterator is exhausted.
pub struct BinaryReader<'a> {
    words: &'a [u16],
    at: usize,
    done: bool,
}

impl<'a> BinaryReader<'a> {
    pub fn new(words: &'a [u16]) -> Self {
        Self {
            words,
            at: 0,
            done: false,
        }
    }

    /// Word offset of the next record.
    pub fn offset(&self) -> usize {
        self.at
    }

    fn word(&mut self) -> Result<u16, DecodeError> {
        let word = *self
            .words
            .get(self.at)
            .ok_or(DecodeError::UnexpectedEnd { offset: self.at })?;
        self.at += 1;
        Ok(word)
    }

    fn int(&mut self) -> Result<u32, DecodeError> {
        let word = self.word()?;
        if word != WIDE_ESCAPE {
            return Ok(word as u32);
        }
        let high = self.word()? as u32;
        let low = self.word()? as u32;
        Ok((high << 16) | low)
    }

    fn uid(&mut self) -> Result<UniqueId, DecodeError> {
        Ok(UniqueId(self.int()?))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.int()? as usize;
        let end = self
            .at
            .checked_add(len)
            .filter(|end| *end <= self.words.len())
            .ok_or(DecodeError::UnexpectedEnd {
                offset: self.words.len(),
            })?;
        let text = read_utf16_lossy(&self.words[self.at..end]);
        self.at = end;
        Ok(text)
    }

    fn ids(&mut self) -> Result<Vec<UniqueId>, DecodeError> {
        let count = self.int()? as usize;
        // Each id takes at least one word; cap the allocation by what is left.
        let mut ids = Vec::with_capacity(count.min(self.words.len() - self.at));
        for _ in 0..count {
            ids.push(self.uid()?);
        }
        Ok(ids)
    }

    /// Decode one record. `Ok(None)` means `End` was reached.
    fn next_operation(&mut self) -> Result<Option<Operation>, DecodeError> {
        let offset = self.at;
        let word = self.word()?;
        let opcode = OpCode::from_word(word).ok_or(DecodeError::UnknownOpcode {
            opcode: word,
            offset,
        })?;
        if opcode == OpCode::End {
            return Ok(None);
        }
        let uid = self.uid()?;
        let op = match opcode {
            OpCode::CreateElement => Operation::CreateElement {
                uid,
                tag: self.string()?,
            },
            OpCode::SetAttribute => {
                let key = self.string()?;
                let value = self.string()?;
                Operation::SetAttribute { uid, key, value }
            }
            OpCode::RemoveAttribute => Operation::RemoveAttribute {
                uid,
                key: self.string()?,
            },
            OpCode::Append => Operation::Append {
                uid,
                children: self.ids()?,
            },
            OpCode::Remove => Operation::Remove { uid },
            OpCode::ReplaceWith => Operation::ReplaceWith {
                uid,
                nodes: self.ids()?,
            },
            OpCode::InsertBefore => {
                let child = self.uid()?;
                let reference = self.uid()?.non_null();
                Operation::InsertBefore {
                    uid,
                    child,
                    reference,
                }
            }
            OpCode::EnableEvent => Operation::EnableEvent {
                uid,
                event_type: self.string()?,
            },
            OpCode::RemoveChild => Operation::RemoveChild {
                uid,
                child: self.uid()?,
            },
            OpCode::StyleDeclarationSetProperty => {
                let property = self.string()?;
                let value = self.string()?;
                let important = self.word()? != 0;
                Operation::SetStyleProperty {
                    uid,
                    property,
                    value,
                    important,
                }
            }
            OpCode::StyleDeclarationRemoveProperty => Operation::RemoveStyleProperty {
                uid,
                property: self.string()?,
            },
            OpCode::SetInnerHtml => Operation::SetInnerHtml {
                uid,
                text: self.string()?,
            },
            OpCode::End => return Ok(None),
        };
        Ok(Some(op))
    }
}

impl Iterator for BinaryReader<'_> {
    type Item = Result<Operation, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_operation() {
            Ok(Some(op)) => Some(Ok(op)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Decode a whole batch up to its `End` record.
pub fn decode_batch(words: &[u16]) -> Result<Vec<Operation>, DecodeError> {
    BinaryReader::new(words).collect()
}
