//! Element storage behind an offscreen document.
//!
//! Stores are dumb containers: they never emit operations and never validate
//! tree shape. The document checks liveness and structure first, so store
//! methods on a missing uid are silent no-ops returning empty values.
//!
//! Contract:
//! - `insert` is called once per uid, with uids in increasing order.
//! - `free` turns a live uid into a dead one; dead uids are never inserted
//!   again.
//! - Children lists hold uids; `parent` is the single back edge.

use crate::style::{StyleDeclaration, StyleProperty};
use core_types::UniqueId;

pub trait ElementStore {
    fn insert(&mut self, uid: UniqueId, tag: &str);
    fn contains(&self, uid: UniqueId) -> bool;
    /// Release the element's storage. Returns false if it was not live.
    fn free(&mut self, uid: UniqueId) -> bool;
    fn live_count(&self) -> usize;

    fn tag(&self, uid: UniqueId) -> Option<&str>;

    fn attribute(&self, uid: UniqueId, key: &str) -> Option<&str>;
    fn attributes(&self, uid: UniqueId) -> Vec<(&str, &str)>;
    fn set_attribute(&mut self, uid: UniqueId, key: &str, value: &str);
    fn remove_attribute(&mut self, uid: UniqueId, key: &str) -> bool;

    fn style_property(&self, uid: UniqueId, name: &str) -> Option<StyleProperty<'_>>;
    fn style_properties(&self, uid: UniqueId) -> Vec<StyleProperty<'_>>;
    fn set_style_property(&mut self, uid: UniqueId, name: &str, value: &str, important: bool);
    fn remove_style_property(&mut self, uid: UniqueId, name: &str) -> bool;

    fn inner_html(&self, uid: UniqueId) -> Option<&str>;
    fn set_inner_html(&mut self, uid: UniqueId, text: Option<String>);

    fn parent(&self, uid: UniqueId) -> Option<UniqueId>;
    fn set_parent(&mut self, uid: UniqueId, parent: Option<UniqueId>);
    fn children(&self, uid: UniqueId) -> &[UniqueId];
    fn children_mut(&mut self, uid: UniqueId) -> Option<&mut Vec<UniqueId>>;

    /// Whether the host still holds a handle to the element.
    fn held_by_host(&self, uid: UniqueId) -> bool;
    fn set_held_by_host(&mut self, uid: UniqueId, held: bool);
}

#[derive(Debug)]
struct ElementRecord {
    tag: String,
    attributes: Vec<(String, String)>,
    style: StyleDeclaration,
    inner_html: Option<String>,
    parent: Option<UniqueId>,
    children: Vec<UniqueId>,
    held_by_host: bool,
}

#[derive(Debug)]
enum Slot {
    Vacant,
    Live(Box<ElementRecord>),
    Dead,
}

/// Primary store: one slot per uid, indexed directly.
#[derive(Debug, Default)]
pub struct ArenaStore {
    slots: Vec<Slot>,
    live: usize,
}

impl ArenaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for a uid that was live and has been freed.
    pub fn is_dead(&self, uid: UniqueId) -> bool {
        matches!(self.slots.get(uid.0 as usize), Some(Slot::Dead))
    }

    fn record(&self, uid: UniqueId) -> Option<&ElementRecord> {
        match self.slots.get(uid.0 as usize) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    fn record_mut(&mut self, uid: UniqueId) -> Option<&mut ElementRecord> {
        match self.slots.get_mut(uid.0 as usize) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }
}

impl ElementStore for ArenaStore {
    fn insert(&mut self, uid: UniqueId, tag: &str) {
        let index = uid.0 as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || Slot::Vacant);
        }
        debug_assert!(matches!(self.slots[index], Slot::Vacant), "uid inserted twice");
        self.slots[index] = Slot::Live(Box::new(ElementRecord {
            tag: tag.to_owned(),
            attributes: Vec::new(),
            style: StyleDeclaration::default(),
            inner_html: None,
            parent: None,
            children: Vec::new(),
            held_by_host: false,
        }));
        self.live += 1;
    }

    fn contains(&self, uid: UniqueId) -> bool {
        self.record(uid).is_some()
    }

    fn free(&mut self, uid: UniqueId) -> bool {
        let Some(slot) = self.slots.get_mut(uid.0 as usize) else {
            return false;
        };
        if !matches!(slot, Slot::Live(_)) {
            return false;
        }
        *slot = Slot::Dead;
        self.live -= 1;
        true
    }

    fn live_count(&self) -> usize {
        self.live
    }

    fn tag(&self, uid: UniqueId) -> Option<&str> {
        self.record(uid).map(|r| r.tag.as_str())
    }

    fn attribute(&self, uid: UniqueId, key: &str) -> Option<&str> {
        self.record(uid)?
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self, uid: UniqueId) -> Vec<(&str, &str)> {
        self.record(uid)
            .map(|r| {
                r.attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_attribute(&mut self, uid: UniqueId, key: &str, value: &str) {
        let Some(record) = self.record_mut(uid) else {
            return;
        };
        match record.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => record.attributes.push((key.to_owned(), value.to_owned())),
        }
    }

    fn remove_attribute(&mut self, uid: UniqueId, key: &str) -> bool {
        let Some(record) = self.record_mut(uid) else {
            return false;
        };
        let before = record.attributes.len();
        record.attributes.retain(|(k, _)| k != key);
        before != record.attributes.len()
    }

    fn style_property(&self, uid: UniqueId, name: &str) -> Option<StyleProperty<'_>> {
        self.record(uid)?.style.get(name)
    }

    fn style_properties(&self, uid: UniqueId) -> Vec<StyleProperty<'_>> {
        self.record(uid)
            .map(|r| r.style.iter().collect())
            .unwrap_or_default()
    }

    fn set_style_property(&mut self, uid: UniqueId, name: &str, value: &str, important: bool) {
        if let Some(record) = self.record_mut(uid) {
            record.style.set(name, value, important);
        }
    }

    fn remove_style_property(&mut self, uid: UniqueId, name: &str) -> bool {
        self.record_mut(uid)
            .is_some_and(|record| record.style.remove(name))
    }

    fn inner_html(&self, uid: UniqueId) -> Option<&str> {
        self.record(uid)?.inner_html.as_deref()
    }

    fn set_inner_html(&mut self, uid: UniqueId, text: Option<String>) {
        if let Some(record) = self.record_mut(uid) {
            record.inner_html = text;
        }
    }

    fn parent(&self, uid: UniqueId) -> Option<UniqueId> {
        self.record(uid)?.parent
    }

    fn set_parent(&mut self, uid: UniqueId, parent: Option<UniqueId>) {
        if let Some(record) = self.record_mut(uid) {
            record.parent = parent;
        }
    }

    fn children(&self, uid: UniqueId) -> &[UniqueId] {
        match self.record(uid) {
            Some(record) => &record.children,
            None => &[],
        }
    }

    fn children_mut(&mut self, uid: UniqueId) -> Option<&mut Vec<UniqueId>> {
        self.record_mut(uid).map(|r| &mut r.children)
    }

    fn held_by_host(&self, uid: UniqueId) -> bool {
        self.record(uid).is_some_and(|r| r.held_by_host)
    }

    fn set_held_by_host(&mut self, uid: UniqueId, held: bool) {
        if let Some(record) = self.record_mut(uid) {
            record.held_by_host = held;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_become_dead_not_vacant() {
        let mut store = ArenaStore::new();
        store.insert(UniqueId(1), "");
        store.insert(UniqueId(3), "view");
        assert!(!store.contains(UniqueId(2)));
        assert!(!store.is_dead(UniqueId(2)));
        assert_eq!(store.live_count(), 2);

        assert!(store.free(UniqueId(3)));
        assert!(!store.free(UniqueId(3)));
        assert!(store.is_dead(UniqueId(3)));
        assert_eq!(store.tag(UniqueId(3)), None);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn attributes_update_in_place() {
        let mut store = ArenaStore::new();
        store.insert(UniqueId(2), "view");
        store.set_attribute(UniqueId(2), "a", "1");
        store.set_attribute(UniqueId(2), "b", "2");
        store.set_attribute(UniqueId(2), "a", "3");
        assert_eq!(store.attributes(UniqueId(2)), vec![("a", "3"), ("b", "2")]);
        assert!(store.remove_attribute(UniqueId(2), "a"));
        assert_eq!(store.attribute(UniqueId(2), "a"), None);
    }
}
