//! Native event sanitizing for the trip back to the main thread.
//!
//! Only allow-listed top level properties survive. Nested objects drop keys
//! that point back into the native tree or its globals, node references are
//! dropped outright, and anything nested deeper than [`MAX_DEPTH`] becomes
//! `null`.

use serde_json::{Map, Number, Value};

pub const MAX_DEPTH: usize = 32;

const FORWARDED: &[&str] = &[
    "detail",
    "keyCode",
    "charCode",
    "elapsedTime",
    "propertyName",
    "pseudoElement",
    "animationName",
    "touches",
    "targetTouches",
    "changedTouches",
    "x",
    "y",
    "clientX",
    "clientY",
    "pageX",
    "pageY",
    "timeStamp",
];

const BLOCKED: &[&str] = &[
    "isTrusted",
    "target",
    "currentTarget",
    "type",
    "bubbles",
    "window",
    "self",
    "view",
    "srcElement",
    "eventPhase",
];

/// Property value of a native event, before sanitizing.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<RawValue>),
    Object(Vec<(String, RawValue)>),
    /// Reference to a native node, identified by its raw handle.
    Node(u64),
}

/// A native event as fired on a real node.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub bubbles: bool,
    pub properties: Vec<(String, RawValue)>,
}

impl RawEvent {
    pub fn new(event_type: impl Into<String>, bubbles: bool) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.properties.push((key.into(), value));
        self
    }
}

pub fn is_forwarded(key: &str) -> bool {
    FORWARDED.contains(&key)
}

pub fn sanitize_properties(properties: &[(String, RawValue)]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in properties {
        if !is_forwarded(key) {
            continue;
        }
        if let Some(value) = sanitize_value(value, 1) {
            out.insert(key.clone(), value);
        }
    }
    out
}

/// `None` means the value is dropped from its container.
fn sanitize_value(value: &RawValue, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return Some(Value::Null);
    }
    let value = match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        RawValue::String(s) => Value::String(s.clone()),
        RawValue::List(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| sanitize_value(item, depth + 1))
                .collect(),
        ),
        RawValue::Object(entries) => {
            let mut map = Map::new();
            for (key, entry) in entries {
                if BLOCKED.contains(&key.as_str()) {
                    continue;
                }
                if let Some(entry) = sanitize_value(entry, depth + 1) {
                    map.insert(key.clone(), entry);
                }
            }
            Value::Object(map)
        }
        RawValue::Node(_) => return None,
    };
    Some(value)
}
