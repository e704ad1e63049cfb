use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an element within one offscreen document.
///
/// Ids are handed out by a per-document monotonic counter and never reused
/// within a session. `0` means "no element" and `1` is the document root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(pub u32);

impl UniqueId {
    /// Reserved sentinel, used on the wire as a null reference.
    pub const INVALID: UniqueId = UniqueId(0);
    /// The document's own root node.
    pub const ROOT: UniqueId = UniqueId(1);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// The following id, or `None` once the id space is used up.
    #[inline]
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(UniqueId)
    }

    /// Map the wire null (`0`) to `None`.
    #[inline]
    pub fn non_null(self) -> Option<Self> {
        if self.is_valid() { Some(self) } else { None }
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UniqueId {
    #[inline]
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

/// Sequence number of a committed operation batch.
///
/// Batches must be applied in send order; a receiver expects `last.next()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchSeq(pub u64);

impl BatchSeq {
    pub const INITIAL: BatchSeq = BatchSeq(0);

    pub fn next(self) -> Self {
        BatchSeq(self.0 + 1)
    }
}

impl fmt::Display for BatchSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Which operation encoding a session uses between the main and UI threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    #[default]
    Binary,
    ObjectLog,
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Encoding::Binary),
            "object-log" | "object_log" | "objectlog" => Ok(Encoding::ObjectLog),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ids() {
        assert!(!UniqueId::INVALID.is_valid());
        assert_eq!(UniqueId::INVALID.non_null(), None);
        assert_eq!(UniqueId::ROOT.non_null(), Some(UniqueId(1)));
        assert_eq!(UniqueId::ROOT.checked_next(), Some(UniqueId(2)));
    }

    #[test]
    fn the_last_id_has_no_successor() {
        assert_eq!(UniqueId(u32::MAX - 1).checked_next(), Some(UniqueId(u32::MAX)));
        assert_eq!(UniqueId(u32::MAX).checked_next(), None);
    }

    #[test]
    fn encoding_parses_aliases() {
        assert_eq!("Binary".parse::<Encoding>(), Ok(Encoding::Binary));
        assert_eq!("object_log".parse::<Encoding>(), Ok(Encoding::ObjectLog));
        assert!("xml".parse::<Encoding>().is_err());
    }
}
