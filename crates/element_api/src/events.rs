use core_types::UniqueId;
use dom::CrossThreadEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a handler is bound. Capture kinds listen in the capture phase, catch
/// kinds stop propagation once their handler ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "bindEvent")]
    Bind,
    #[serde(rename = "catchEvent")]
    Catch,
    #[serde(rename = "capture-bind")]
    CaptureBind,
    #[serde(rename = "capture-catch")]
    CaptureCatch,
}

impl EventKind {
    pub fn is_capture(self) -> bool {
        matches!(self, EventKind::CaptureBind | EventKind::CaptureCatch)
    }

    pub fn is_catch(self) -> bool {
        matches!(self, EventKind::Catch | EventKind::CaptureCatch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Bind => "bindEvent",
            EventKind::Catch => "catchEvent",
            EventKind::CaptureBind => "capture-bind",
            EventKind::CaptureCatch => "capture-catch",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind {0:?}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bindEvent" => Ok(EventKind::Bind),
            "catchEvent" => Ok(EventKind::Catch),
            "capture-bind" => Ok(EventKind::CaptureBind),
            "capture-catch" => Ok(EventKind::CaptureCatch),
            other => Err(UnknownEventKind(other.to_string())),
        }
    }
}

/// A registered handler, as reported by `get_events`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub kind: EventKind,
    pub name: String,
    pub handler: String,
}

/// A handler invocation for the background side.
///
/// `component_id` is set when the element belongs to a component other than
/// the page; the background routes the call to that component instead of the
/// page's handlers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub handler: String,
    pub component_id: Option<String>,
    pub current_target: UniqueId,
    pub event: CrossThreadEvent,
}

/// Listener output collected during one dispatch, before component ids are
/// resolved.
#[derive(Debug)]
pub(crate) struct Invocation {
    pub handler: String,
    pub current_target: UniqueId,
    pub event: CrossThreadEvent,
}

#[derive(Debug)]
pub(crate) struct HandlerSlot {
    pub kind: EventKind,
    pub handler: String,
    pub listener: dom::ListenerId,
}

/// Bind and capture handler for one event name.
#[derive(Debug, Default)]
pub(crate) struct HandlerPair {
    pub bind: Option<HandlerSlot>,
    pub capture: Option<HandlerSlot>,
}

impl HandlerPair {
    pub fn slot(&self, capture: bool) -> Option<&HandlerSlot> {
        if capture { self.capture.as_ref() } else { self.bind.as_ref() }
    }

    pub fn slot_mut(&mut self, capture: bool) -> &mut Option<HandlerSlot> {
        if capture { &mut self.capture } else { &mut self.bind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_wire_names() {
        for kind in [
            EventKind::Bind,
            EventKind::Catch,
            EventKind::CaptureBind,
            EventKind::CaptureCatch,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("bind".parse::<EventKind>().is_err());
        assert!(EventKind::CaptureCatch.is_capture() && EventKind::CaptureCatch.is_catch());
        assert!(!EventKind::Bind.is_capture() && !EventKind::Bind.is_catch());
    }
}
