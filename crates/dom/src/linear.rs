//! Compact element store modelled on a linear-memory heap.
//!
//! Records live in a flat table addressed by [`Ptr`]. Freed pointers go on a
//! free list and are handed out again, while uids are never reissued, so the
//! `uid -> ptr` index is the only way in. Tag, attribute and style property
//! names are interned once per store and stay interned for its lifetime;
//! values are owned by their record and released with it.

use crate::store::ElementStore;
use crate::style::StyleProperty;
use core_types::UniqueId;
use std::collections::HashMap;

/// Address of a record in the store's memory table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ptr(u32);

impl Ptr {
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NameId(u32);

/// Permanent name table. Names are never removed.
#[derive(Debug, Default)]
struct NameTable {
    names: Vec<Box<str>>,
    map: HashMap<Box<str>, NameId>,
}

impl NameTable {
    fn intern(&mut self, name: &str) -> NameId {
        if let Some(id) = self.map.get(name) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.into());
        self.map.insert(name.into(), id);
        id
    }

    fn lookup(&self, name: &str) -> Option<NameId> {
        self.map.get(name).copied()
    }

    fn resolve(&self, id: NameId) -> &str {
        &self.names[id.0 as usize]
    }
}

#[derive(Debug)]
struct LinearRecord {
    tag: NameId,
    attributes: Vec<(NameId, String)>,
    style: Vec<(NameId, String, bool)>,
    inner_html: Option<Box<str>>,
    parent: Option<UniqueId>,
    children: Vec<UniqueId>,
    held_by_host: bool,
}

#[derive(Debug, Default)]
pub struct LinearStore {
    memory: Vec<Option<LinearRecord>>,
    free_list: Vec<Ptr>,
    index: HashMap<UniqueId, Ptr>,
    names: NameTable,
}

impl LinearStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer currently backing `uid`, if it is live.
    pub fn ptr_of(&self, uid: UniqueId) -> Option<Ptr> {
        self.index.get(&uid).copied()
    }

    /// Number of record cells ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    pub fn interned_names(&self) -> usize {
        self.names.names.len()
    }

    fn alloc(&mut self, record: LinearRecord) -> Ptr {
        if let Some(ptr) = self.free_list.pop() {
            self.memory[ptr.0 as usize] = Some(record);
            return ptr;
        }
        let ptr = Ptr(self.memory.len() as u32);
        self.memory.push(Some(record));
        ptr
    }

    fn record(&self, uid: UniqueId) -> Option<&LinearRecord> {
        let ptr = self.index.get(&uid)?;
        self.memory[ptr.0 as usize].as_ref()
    }

    fn record_mut(&mut self, uid: UniqueId) -> Option<&mut LinearRecord> {
        let ptr = self.index.get(&uid)?;
        self.memory[ptr.0 as usize].as_mut()
    }
}

impl ElementStore for LinearStore {
    fn insert(&mut self, uid: UniqueId, tag: &str) {
        debug_assert!(!self.index.contains_key(&uid), "uid inserted twice");
        let tag = self.names.intern(tag);
        let ptr = self.alloc(LinearRecord {
            tag,
            attributes: Vec::new(),
            style: Vec::new(),
            inner_html: None,
            parent: None,
            children: Vec::new(),
            held_by_host: false,
        });
        self.index.insert(uid, ptr);
    }

    fn contains(&self, uid: UniqueId) -> bool {
        self.index.contains_key(&uid)
    }

    fn free(&mut self, uid: UniqueId) -> bool {
        let Some(ptr) = self.index.remove(&uid) else {
            return false;
        };
        self.memory[ptr.0 as usize] = None;
        self.free_list.push(ptr);
        log::trace!(target: "dom.linear", "free uid {} at ptr {}", uid, ptr.0);
        true
    }

    fn live_count(&self) -> usize {
        self.index.len()
    }

    fn tag(&self, uid: UniqueId) -> Option<&str> {
        let record = self.record(uid)?;
        Some(self.names.resolve(record.tag))
    }

    fn attribute(&self, uid: UniqueId, key: &str) -> Option<&str> {
        let name = self.names.lookup(key)?;
        self.record(uid)?
            .attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self, uid: UniqueId) -> Vec<(&str, &str)> {
        let Some(record) = self.record(uid) else {
            return Vec::new();
        };
        record
            .attributes
            .iter()
            .map(|(n, v)| (self.names.resolve(*n), v.as_str()))
            .collect()
    }

    fn set_attribute(&mut self, uid: UniqueId, key: &str, value: &str) {
        let Some(&ptr) = self.index.get(&uid) else {
            return;
        };
        let name = self.names.intern(key);
        let Some(record) = self.memory[ptr.0 as usize].as_mut() else {
            return;
        };
        match record.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => record.attributes.push((name, value.to_owned())),
        }
    }

    fn remove_attribute(&mut self, uid: UniqueId, key: &str) -> bool {
        let Some(name) = self.names.lookup(key) else {
            return false;
        };
        let Some(record) = self.record_mut(uid) else {
            return false;
        };
        let before = record.attributes.len();
        record.attributes.retain(|(n, _)| *n != name);
        before != record.attributes.len()
    }

    fn style_property(&self, uid: UniqueId, name: &str) -> Option<StyleProperty<'_>> {
        let id = self.names.lookup(name)?;
        self.record(uid)?
            .style
            .iter()
            .find(|(n, _, _)| *n == id)
            .map(|(n, value, important)| StyleProperty {
                name: self.names.resolve(*n),
                value,
                important: *important,
            })
    }

    fn style_properties(&self, uid: UniqueId) -> Vec<StyleProperty<'_>> {
        let Some(record) = self.record(uid) else {
            return Vec::new();
        };
        record
            .style
            .iter()
            .map(|(n, value, important)| StyleProperty {
                name: self.names.resolve(*n),
                value,
                important: *important,
            })
            .collect()
    }

    fn set_style_property(&mut self, uid: UniqueId, name: &str, value: &str, important: bool) {
        let Some(&ptr) = self.index.get(&uid) else {
            return;
        };
        let id = self.names.intern(name);
        let Some(record) = self.memory[ptr.0 as usize].as_mut() else {
            return;
        };
        match record.style.iter_mut().find(|(n, _, _)| *n == id) {
            Some(entry) => {
                entry.1.clear();
                entry.1.push_str(value);
                entry.2 = important;
            }
            None => record.style.push((id, value.to_owned(), important)),
        }
    }

    fn remove_style_property(&mut self, uid: UniqueId, name: &str) -> bool {
        let Some(id) = self.names.lookup(name) else {
            return false;
        };
        let Some(record) = self.record_mut(uid) else {
            return false;
        };
        let before = record.style.len();
        record.style.retain(|(n, _, _)| *n != id);
        before != record.style.len()
    }

    fn inner_html(&self, uid: UniqueId) -> Option<&str> {
        self.record(uid)?.inner_html.as_deref()
    }

    fn set_inner_html(&mut self, uid: UniqueId, text: Option<String>) {
        if let Some(record) = self.record_mut(uid) {
            record.inner_html = text.map(String::into_boxed_str);
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
