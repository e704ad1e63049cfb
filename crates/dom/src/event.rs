//! Offscreen event dispatch types.
//!
//! A native event fired on the UI thread arrives as a [`CrossThreadEvent`],
//! addressed by the target's uid. The document rebuilds the propagation path
//! from its own parent links and replays capture, target and bubble phases
//! against listeners registered on the main thread.

use core_types::{EventPhase, UniqueId};
use serde::{Deserialize, Serialize};

/// Serialized event as it crosses from the UI thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossThreadEvent {
    pub event_type: String,
    pub target: UniqueId,
    pub bubbles: bool,
    /// Sanitized, allow-listed event properties.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl CrossThreadEvent {
    pub fn new(event_type: impl Into<String>, target: UniqueId, bubbles: bool) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            bubbles,
            properties: serde_json::Map::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
}

impl ListenerOptions {
    pub const CAPTURE: ListenerOptions = ListenerOptions { capture: true };
    pub const BUBBLE: ListenerOptions = ListenerOptions { capture: false };
}

pub type ListenerFn = Box<dyn FnMut(&mut OffscreenEvent)>;

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) event_type: String,
    pub(crate) options: ListenerOptions,
    pub(crate) callback: ListenerFn,
}

/// Synthetic event handed to offscreen listeners.
#[derive(Debug)]
pub struct OffscreenEvent {
    event_type: String,
    target: UniqueId,
    current_target: UniqueId,
    phase: EventPhase,
    bubbles: bool,
    properties: serde_json::Map<String, serde_json::Value>,
    stop_propagation: bool,
    stop_immediate: bool,
}

impl OffscreenEvent {
    pub(crate) fn from_cross_thread(event: &CrossThreadEvent) -> Self {
        Self {
            event_type: event.event_type.clone(),
            target: event.target,
            current_target: event.target,
            phase: EventPhase::None,
            bubbles: event.bubbles,
            properties: event.properties.clone(),
            stop_propagation: false,
            stop_immediate: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> UniqueId {
        self.target
    }

    pub fn current_target(&self) -> UniqueId {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn properties(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Stop after the listeners of the current node have run.
    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    /// Stop immediately, skipping the remaining listeners of the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.stop_propagation = true;
        self.stop_immediate = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stop_propagation
    }

    pub(crate) fn immediate_stopped(&self) -> bool {
        self.stop_immediate
    }

    pub(crate) fn enter(&mut self, node: UniqueId, phase: EventPhase) {
        self.current_target = node;
        self.phase = phase;
    }
}

/// Result of replaying one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listener invocations.
    pub delivered: usize,
    pub propagation_stopped: bool,
}
