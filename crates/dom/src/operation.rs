//! Element operation vocabulary.
//!
//! Every mutation of an offscreen document is described by exactly one
//! operation record. The same vocabulary is carried by both encodings: the
//! object log keeps owned [`Operation`] values, the binary log flattens
//! [`OperationRef`] values into 16-bit words.
//!
//! Invariants:
//! - Operations are applied in record order; there is no coalescing.
//! - `uid` always names a previously created element, except in
//!   `CreateElement`, which introduces it.
//! - A uid is introduced by `CreateElement` at most once per session.
//! - `UniqueId::INVALID` never appears as a target; on the wire it encodes the
//!   null reference of `InsertBefore`.
//! - `End` exists only on the wire. It terminates a binary batch and is never
//!   materialized as an `Operation`.

use core_types::UniqueId;
use serde::{Deserialize, Serialize};

/// Wire opcode. The numbering is part of the binary format.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    CreateElement = 1,
    SetAttribute = 2,
    RemoveAttribute = 3,
    Append = 4,
    Remove = 5,
    ReplaceWith = 6,
    InsertBefore = 7,
    EnableEvent = 8,
    RemoveChild = 9,
    StyleDeclarationSetProperty = 10,
    StyleDeclarationRemoveProperty = 11,
    SetInnerHtml = 12,
    End = 13,
}

impl OpCode {
    #[inline]
    pub const fn as_word(self) -> u16 {
        self as u16
    }

    pub fn from_word(word: u16) -> Option<OpCode> {
        let op = match word {
            1 => OpCode::CreateElement,
            2 => OpCode::SetAttribute,
            3 => OpCode::RemoveAttribute,
            4 => OpCode::Append,
            5 => OpCode::Remove,
            6 => OpCode::ReplaceWith,
            7 => OpCode::InsertBefore,
            8 => OpCode::EnableEvent,
            9 => OpCode::RemoveChild,
            10 => OpCode::StyleDeclarationSetProperty,
            11 => OpCode::StyleDeclarationRemoveProperty,
            12 => OpCode::SetInnerHtml,
            13 => OpCode::End,
            _ => return None,
        };
        Some(op)
    }
}

/// Owned operation record, as carried by the object log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    CreateElement {
        uid: UniqueId,
        tag: String,
    },
    SetAttribute {
        uid: UniqueId,
        key: String,
        value: String,
    },
    RemoveAttribute {
        uid: UniqueId,
        key: String,
    },
    /// Append `children` to `uid` in order, detaching each from its old parent.
    Append {
        uid: UniqueId,
        children: Vec<UniqueId>,
    },
    /// Detach `uid` from its parent.
    Remove {
        uid: UniqueId,
    },
    /// Splice `nodes` into the position of `uid`, then detach `uid`.
    ReplaceWith {
        uid: UniqueId,
        nodes: Vec<UniqueId>,
    },
    /// Insert `child` under `uid` before `reference`; `None` appends.
    InsertBefore {
        uid: UniqueId,
        child: UniqueId,
        reference: Option<UniqueId>,
    },
    EnableEvent {
        uid: UniqueId,
        event_type: String,
    },
    RemoveChild {
        uid: UniqueId,
        child: UniqueId,
    },
    SetStyleProperty {
        uid: UniqueId,
        property: String,
        value: String,
        important: bool,
    },
    RemoveStyleProperty {
        uid: UniqueId,
        property: String,
    },
    /// Replace the element's content with raw markup text.
    SetInnerHtml {
        uid: UniqueId,
        text: String,
    },
}

/// Borrowed view of an operation, so recording never allocates on the
/// binary path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationRef<'a> {
    CreateElement {
        uid: UniqueId,
        tag: &'a str,
    },
    SetAttribute {
        uid: UniqueId,
        key: &'a str,
        value: &'a str,
    },
    RemoveAttribute {
        uid: UniqueId,
        key: &'a str,
    },
    Append {
        uid: UniqueId,
        children: &'a [UniqueId],
    },
    Remove {
        uid: UniqueId,
    },
    ReplaceWith {
        uid: UniqueId,
        nodes: &'a [UniqueId],
    },
    InsertBefore {
        uid: UniqueId,
        child: UniqueId,
        reference: Option<UniqueId>,
    },
    EnableEvent {
        uid: UniqueId,
        event_type: &'a str,
    },
    RemoveChild {
        uid: UniqueId,
        child: UniqueId,
    },
    SetStyleProperty {
        uid: UniqueId,
        property: &'a str,
        value: &'a str,
        important: bool,
    },
    RemoveStyleProperty {
        uid: UniqueId,
        property: &'a str,
    },
    SetInnerHtml {
        uid: UniqueId,
        text: &'a str,
    },
}

impl Operation {
    pub fn borrowed(&self) -> OperationRef<'_> {
        match self {
            Operation::CreateElement { uid, tag } => OperationRef::CreateElement { uid: *uid, tag },
            Operation::SetAttribute { uid, key, value } => OperationRef::SetAttribute {
                uid: *uid,
                key,
                value,
            },
            Operation::RemoveAttribute { uid, key } => {
                OperationRef::RemoveAttribute { uid: *uid, key }
            }
            Operation::Append { uid, children } => OperationRef::Append {
                uid: *uid,
                children,
            },
            Operation::Remove { uid } => OperationRef::Remove { uid: *uid },
            Operation::ReplaceWith { uid, nodes } => OperationRef::ReplaceWith { uid: *uid, nodes },
            Operation::InsertBefore {
                uid,
                child,
                reference,
            } => OperationRef::InsertBefore {
                uid: *uid,
                child: *child,
                reference: *reference,
            },
            Operation::EnableEvent { uid, event_type } => OperationRef::EnableEvent {
                uid: *uid,
                event_type,
            },
            Operation::RemoveChild { uid, child } => OperationRef::RemoveChild {
                uid: *uid,
                child: *child,
            },
            Operation::SetStyleProperty {
                uid,
                property,
                value,
                important,
            } => OperationRef::SetStyleProperty {
                uid: *uid,
                property,
                value,
                important: *important,
            },
            Operation::RemoveStyleProperty { uid, property } => {
                OperationRef::RemoveStyleProperty { uid: *uid, property }
            }
            Operation::SetInnerHtml { uid, text } => OperationRef::SetInnerHtml { uid: *uid, text },
        }
    }

    pub fn opcode(&self) -> OpCode {
        self.borrowed().opcode()
    }

    pub fn uid(&self) -> UniqueId {
        self.borrowed().uid()
    }
}

impl OperationRef<'_> {
    pub fn opcode(&self) -> OpCode {
        match self {
            OperationRef::CreateElement { .. } => OpCode::CreateElement,
            OperationRef::SetAttribute { .. } => OpCode::SetAttribute,
            OperationRef::RemoveAttribute { .. } => OpCode::RemoveAttribute,
            OperationRef::Append { .. } => OpCode::Append,
            OperationRef::Remove { .. } => OpCode::Remove,
            OperationRef::ReplaceWith { .. } => OpCode::ReplaceWith,
            OperationRef::InsertBefore { .. } => OpCode::InsertBefore,
            OperationRef::EnableEvent { .. } => OpCode::EnableEvent,
            OperationRef::RemoveChild { .. } => OpCode::RemoveChild,
            OperationRef::SetStyleProperty { .. } => OpCode::StyleDeclarationSetProperty,
            OperationRef::RemoveStyleProperty { .. } => OpCode::StyleDeclarationRemoveProperty,
            OperationRef::SetInnerHtml { .. } => OpCode::SetInnerHtml,
        }
    }

    /// The element the operation targets.
    pub fn uid(&self) -> UniqueId {
        match *self {
            OperationRef::CreateElement { uid, .. }
            | OperationRef::SetAttribute { uid, .. }
            | OperationRef::RemoveAttribute { uid, .. }
            | OperationRef::Append { uid, .. }
            | OperationRef::Remove { uid }
            | OperationRef::ReplaceWith { uid, .. }
            | OperationRef::InsertBefore { uid, .. }
            | OperationRef::EnableEvent { uid, .. }
            | OperationRef::RemoveChild { uid, .. }
            | OperationRef::SetStyleProperty { uid, .. }
            | OperationRef::RemoveStyleProperty { uid, .. }
            | OperationRef::SetInnerHtml { uid, .. } => uid,
        }
    }

    pub fn into_owned(self) -> Operation {
        match self {
            OperationRef::CreateElement { uid, tag } => Operation::CreateElement {
                uid,
                tag: tag.to_owned(),
            },
            OperationRef::SetAttribute { uid, key, value } => Operation::SetAttribute {
                uid,
                key: key.to_owned(),
                value: value.to_owned(),
            },
            OperationRef::RemoveAttribute { uid, key } => Operation::RemoveAttribute {
                uid,
                key: key.to_owned(),
            },
            OperationRef::Append { uid, children } => Operation::Append {
                uid,
                children: children.to_vec(),
            },
            OperationRef::Remove { uid } => Operation::Remove { uid },
            OperationRef::ReplaceWith { uid, nodes } => Operation::ReplaceWith {
                uid,
                nodes: nodes.to_vec(),
            },
            OperationRef::InsertBefore {
                uid,
                child,
                reference,
            } => Operation::InsertBefore {
                uid,
                child,
                reference,
            },
            OperationRef::EnableEvent { uid, event_type } => Operation::EnableEvent {
                uid,
                event_type: event_type.to_owned(),
            },
            OperationRef::RemoveChild { uid, child } => Operation::RemoveChild { uid, child },
            OperationRef::SetStyleProperty {
                uid,
                property,
                value,
                important,
            } => Operation::SetStyleProperty {
                uid,
                property: property.to_owned(),
                value: value.to_owned(),
                important,
            },
            OperationRef::RemoveStyleProperty { uid, property } => {
                Operation::RemoveStyleProperty {
                    uid,
                    property: property.to_owned(),
                }
            }
            OperationRef::SetInnerHtml { uid, text } => Operation::SetInnerHtml {
                uid,
                text: text.to_owned(),
            },
        }
    }
}

/// Node list with repeats removed, each id kept at its last position.
///
/// `append` and `replace_with` place a node once even when it is named twice.
pub fn keep_last_occurrence<T: Copy + PartialEq>(ids: &[T]) -> Vec<T> {
    let mut kept = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if !ids[i + 1..].contains(id) {
            kept.push(*id);
        }
    }
    kept
}
