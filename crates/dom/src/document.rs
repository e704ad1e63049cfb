//! Offscreen element graph.
//!
//! The document owns every element created on the main thread and records
//! each mutation into its [`OperationSink`], in call order, so the UI thread
//! can rebuild the same tree.
//!
//! Contract:
//! - uid `0` is never assigned; uid `1` is the root, created implicitly with
//!   an empty tag and never announced with `CreateElement`.
//! - Every mutation emits exactly one operation, except `remove` on a
//!   detached element, which is a silent no-op.
//! - Structural misuse is rejected before anything is recorded.
//! - Getters never record.
//! - An element is freed only when the host released its handle and it has no
//!   parent. Its uid is then dead and never reissued.

use crate::event::{
    CrossThreadEvent, DispatchOutcome, ListenerEntry, ListenerId, ListenerOptions, OffscreenEvent,
};
use crate::html::{write_inner_html, write_outer_html};
use crate::operation::{OperationRef, keep_last_occurrence};
use crate::sink::OperationSink;
use crate::store::{ArenaStore, ElementStore};
use crate::style::StyleProperty;
use core_types::{EventPhase, UniqueId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("element {0} does not exist")]
    UnknownElement(UniqueId),
    #[error("element {child} is not a child of {parent}")]
    NotAChild { parent: UniqueId, child: UniqueId },
    #[error("reference element {reference} is not a child of {parent}")]
    ReferenceNotAChild {
        parent: UniqueId,
        reference: UniqueId,
    },
    #[error("inserting {child} into {parent} would break the hierarchy")]
    HierarchyRequest { parent: UniqueId, child: UniqueId },
    #[error("no element ids are left in this document")]
    IdsExhausted,
}

#[derive(Default)]
struct NodeEvents {
    enabled: HashSet<String>,
    listeners: Vec<ListenerEntry>,
}

pub struct OffscreenDocument<S, E = ArenaStore> {
    store: E,
    sink: S,
    /// `None` once `u32::MAX` has been handed out.
    next_id: Option<UniqueId>,
    events: HashMap<UniqueId, NodeEvents>,
    enabled_types: HashSet<String>,
    next_listener: u64,
}

impl<S: OperationSink> OffscreenDocument<S, ArenaStore> {
    pub fn new(sink: S) -> Self {
        Self::with_store(sink, ArenaStore::new())
    }
}

impl<S: OperationSink, E: ElementStore> OffscreenDocument<S, E> {
    pub fn with_store(sink: S, mut store: E) -> Self {
        store.insert(UniqueId::ROOT, "");
        store.set_held_by_host(UniqueId::ROOT, true);
        Self {
            store,
            sink,
            next_id: UniqueId::ROOT.checked_next(),
            events: HashMap::new(),
            enabled_types: HashSet::new(),
            next_listener: 1,
        }
    }

    pub fn root(&self) -> UniqueId {
        UniqueId::ROOT
    }

    pub fn store(&self) -> &E {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Close the current batch.
    pub fn commit(&mut self) -> S::Batch {
        self.sink.commit()
    }

    pub fn has_pending(&self) -> bool {
        !self.sink.is_empty()
    }

    pub fn contains(&self, uid: UniqueId) -> bool {
        self.store.contains(uid)
    }

    /// True for a uid that was created in this document and later freed.
    pub fn is_dead(&self, uid: UniqueId) -> bool {
        uid.is_valid()
            && self.next_id.is_none_or(|next| uid < next)
            && !self.store.contains(uid)
    }

    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    /// Event types enabled anywhere in the document.
    pub fn enabled_event_types(&self) -> impl Iterator<Item = &str> {
        self.enabled_types.iter().map(String::as_str)
    }

    fn emit(&mut self, op: OperationRef<'_>) {
        log::trace!(target: "dom.graph", "record {:?}", op);
        self.sink.record(op);
    }

    fn ensure_live(&self, uid: UniqueId) -> Result<(), DomError> {
        if !self.store.contains(uid) {
            return Err(DomError::UnknownElement(uid));
        }
        Ok(())
    }

    // Creation and attributes

    /// Create an element, returning [`UniqueId::INVALID`] and recording
    /// nothing once the id space is exhausted.
    pub fn create_element(&mut self, tag: &str) -> UniqueId {
        self.try_create_element(tag).unwrap_or_else(|err| {
            log::error!(target: "dom.graph", "cannot create <{tag}>: {err}");
            UniqueId::INVALID
        })
    }

    pub fn try_create_element(&mut self, tag: &str) -> Result<UniqueId, DomError> {
        let uid = self.next_id.ok_or(DomError::IdsExhausted)?;
        self.next_id = uid.checked_next();
        self.store.insert(uid, tag);
        self.store.set_held_by_host(uid, true);
        self.emit(OperationRef::CreateElement { uid, tag });
        Ok(uid)
    }

    pub fn set_attribute(&mut self, uid: UniqueId, key: &str, value: &str) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        self.store.set_attribute(uid, key, value);
        self.emit(OperationRef::SetAttribute { uid, key, value });
        Ok(())
    }

    pub fn remove_attribute(&mut self, uid: UniqueId, key: &str) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        self.store.remove_attribute(uid, key);
        self.emit(OperationRef::RemoveAttribute { uid, key });
        Ok(())
    }

    pub fn set_style_property(
        &mut self,
        uid: UniqueId,
        property: &str,
        value: &str,
        important: bool,
    ) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        self.store.set_style_property(uid, property, value, important);
        self.emit(OperationRef::SetStyleProperty {
            uid,
            property,
            value,
            important,
        });
        Ok(())
    }

    pub fn remove_style_property(&mut self, uid: UniqueId, property: &str) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        self.store.remove_style_property(uid, property);
        self.emit(OperationRef::RemoveStyleProperty { uid, property });
        Ok(())
    }

    /// Replace the element's content with raw markup text; existing children
    /// are orphaned.
    pub fn set_inner_html(&mut self, uid: UniqueId, text: &str) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        let children = self
            .store
            .children_mut(uid)
            .map(std::mem::take)
            .unwrap_or_default();
        self.store.set_inner_html(uid, Some(text.to_owned()));
        self.emit(OperationRef::SetInnerHtml { uid, text });
        for child in children {
            self.store.set_parent(child, None);
            self.maybe_free(child);
        }
        Ok(())
    }

    // Structure

    /// Append `children` in order, detaching each from its current parent.
    /// A child named more than once lands at its last position.
    pub fn append(&mut self, parent: UniqueId, children: &[UniqueId]) -> Result<(), DomError> {
        self.ensure_live(parent)?;
        let children = &keep_last_occurrence(children)[..];
        for &child in children {
            self.ensure_insertable(parent, child)?;
        }
        for &child in children {
            self.detach(child);
            if let Some(list) = self.store.children_mut(parent) {
                list.push(child);
            }
            self.store.set_parent(child, Some(parent));
        }
        self.emit(OperationRef::Append {
            uid: parent,
            children,
        });
        Ok(())
    }

    /// Insert `child` before `reference`; `None` appends.
    pub fn insert_before(
        &mut self,
        parent: UniqueId,
        child: UniqueId,
        reference: Option<UniqueId>,
    ) -> Result<(), DomError> {
        self.ensure_live(parent)?;
        self.ensure_insertable(parent, child)?;
        if let Some(reference) = reference {
            self.ensure_live(reference)?;
            if self.store.parent(reference) != Some(parent) {
                return Err(DomError::ReferenceNotAChild { parent, reference });
            }
        }
        // Inserting a node before itself keeps its position.
        let anchor = match reference {
            Some(r) if r == child => self.next_sibling(child)?,
            other => other,
        };
        self.detach(child);
        if let Some(list) = self.store.children_mut(parent) {
            let at = anchor
                .and_then(|a| list.iter().position(|c| *c == a))
                .unwrap_or(list.len());
            list.insert(at, child);
        }
        self.store.set_parent(child, Some(parent));
        self.emit(OperationRef::InsertBefore {
            uid: parent,
            child,
            reference,
        });
        Ok(())
    }

    pub fn remove_child(&mut self, parent: UniqueId, child: UniqueId) -> Result<(), DomError> {
        self.ensure_live(parent)?;
        self.ensure_live(child)?;
        if self.store.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        self.emit(OperationRef::RemoveChild { uid: parent, child });
        self.maybe_free(child);
        Ok(())
    }

    /// Detach `uid` from its parent; nothing happens when it has none.
    pub fn remove(&mut self, uid: UniqueId) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        if self.store.parent(uid).is_none() {
            return Ok(());
        }
        self.detach(uid);
        self.emit(OperationRef::Remove { uid });
        self.maybe_free(uid);
        Ok(())
    }

    /// Put `nodes` where `old` is and detach `old`.
    ///
    /// On a parentless `old` the tree is left as is, but the operation is
    /// still recorded.
    pub fn replace_with(&mut self, old: UniqueId, nodes: &[UniqueId]) -> Result<(), DomError> {
        self.ensure_live(old)?;
        let nodes = &keep_last_occurrence(nodes)[..];
        for &node in nodes {
            self.ensure_live(node)?;
        }
        let Some(parent) = self.store.parent(old) else {
            self.emit(OperationRef::ReplaceWith { uid: old, nodes });
            return Ok(());
        };
        for &node in nodes {
            if node != old {
                self.ensure_insertable(parent, node)?;
            }
        }
        // First following sibling that is not itself being moved.
        let anchor = self
            .store
            .children(parent)
            .iter()
            .skip_while(|c| **c != old)
            .skip(1)
            .find(|c| !nodes.contains(*c))
            .copied();
        for &node in nodes {
            self.detach(node);
        }
        let old_stays = !nodes.contains(&old);
        if let Some(list) = self.store.children_mut(parent) {
            let at = if old_stays {
                list.iter().position(|c| *c == old)
            } else {
                anchor.and_then(|a| list.iter().position(|c| *c == a))
            }
            .unwrap_or(list.len());
            if old_stays {
                list.remove(at);
            }
            for (i, node) in nodes.iter().enumerate() {
                list.insert(at + i, *node);
            }
        }
        for &node in nodes {
            self.store.set_parent(node, Some(parent));
        }
        if old_stays {
            self.store.set_parent(old, None);
        }
        self.emit(OperationRef::ReplaceWith { uid: old, nodes });
        if old_stays {
            self.maybe_free(old);
        }
        Ok(())
    }

    /// Copy an element, recording the operations that build the copy.
    ///
    /// Copies get fresh uids. Listeners are not copied.
    pub fn clone_node(&mut self, uid: UniqueId, deep: bool) -> Result<UniqueId, DomError> {
        self.ensure_live(uid)?;
        let tag = self.store.tag(uid).unwrap_or_default().to_owned();
        let attributes: Vec<(String, String)> = self
            .store
            .attributes(uid)
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        let style: Vec<(String, String, bool)> = self
            .store
            .style_properties(uid)
            .into_iter()
            .map(|p| (p.name.to_owned(), p.value.to_owned(), p.important))
            .collect();
        let inner_html = self.store.inner_html(uid).map(str::to_owned);
        let children = self.store.children(uid).to_vec();

        let copy = self.try_create_element(&tag)?;
        for (key, value) in &attributes {
            self.set_attribute(copy, key, value)?;
        }
        for (name, value, important) in &style {
            self.set_style_property(copy, name, value, *important)?;
        }
        if !deep {
            return Ok(copy);
        }
        if let Some(text) = inner_html {
            self.set_inner_html(copy, &text)?;
            return Ok(copy);
        }
        let mut copies = Vec::with_capacity(children.len());
        for child in children {
            copies.push(self.clone_node(child, true)?);
        }
        if !copies.is_empty() {
            self.append(copy, &copies)?;
            for child in copies {
                self.store.set_held_by_host(child, false);
            }
        }
        Ok(copy)
    }

    fn ensure_insertable(&self, parent: UniqueId, child: UniqueId) -> Result<(), DomError> {
        self.ensure_live(child)?;
        if child == UniqueId::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    fn is_inclusive_ancestor(&self, ancestor: UniqueId, node: UniqueId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.store.parent(id);
        }
        false
    }

    fn detach(&mut self, uid: UniqueId) {
        let Some(parent) = self.store.parent(uid) else {
            return;
        };
        if let Some(list) = self.store.children_mut(parent)
            && let Some(at) = list.iter().position(|c| *c == uid)
        {
            list.remove(at);
        }
        self.store.set_parent(uid, None);
    }

    // Reads

    pub fn tag(&self, uid: UniqueId) -> Result<&str, DomError> {
        self.store.tag(uid).ok_or(DomError::UnknownElement(uid))
    }

    pub fn attribute(&self, uid: UniqueId, key: &str) -> Result<Option<&str>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.attribute(uid, key))
    }

    pub fn attributes(&self, uid: UniqueId) -> Result<Vec<(&str, &str)>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.attributes(uid))
    }

    pub fn attribute_names(&self, uid: UniqueId) -> Result<Vec<&str>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.attributes(uid).into_iter().map(|(k, _)| k).collect())
    }

    pub fn style_property(
        &self,
        uid: UniqueId,
        property: &str,
    ) -> Result<Option<StyleProperty<'_>>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.style_property(uid, property))
    }

    pub fn style_properties(&self, uid: UniqueId) -> Result<Vec<StyleProperty<'_>>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.style_properties(uid))
    }

    pub fn parent(&self, uid: UniqueId) -> Result<Option<UniqueId>, DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.parent(uid))
    }

    pub fn children(&self, uid: UniqueId) -> Result<&[UniqueId], DomError> {
        self.ensure_live(uid)?;
        Ok(self.store.children(uid))
    }

    pub fn first_child(&self, uid: UniqueId) -> Result<Option<UniqueId>, DomError> {
        Ok(self.children(uid)?.first().copied())
    }

    pub fn last_child(&self, uid: UniqueId) -> Result<Option<UniqueId>, DomError> {
        Ok(self.children(uid)?.last().copied())
    }

    pub fn next_sibling(&self, uid: UniqueId) -> Result<Option<UniqueId>, DomError> {
        let Some(parent) = self.parent(uid)? else {
            return Ok(None);
        };
        let siblings = self.store.children(parent);
        Ok(siblings
            .iter()
            .position(|c| *c == uid)
            .and_then(|at| siblings.get(at + 1))
            .copied())
    }

    pub fn previous_sibling(&self, uid: UniqueId) -> Result<Option<UniqueId>, DomError> {
        let Some(parent) = self.parent(uid)? else {
            return Ok(None);
        };
        let siblings = self.store.children(parent);
        Ok(siblings
            .iter()
            .position(|c| *c == uid)
            .and_then(|at| at.checked_sub(1))
            .map(|at| siblings[at]))
    }

    /// Whether the element is reachable from the root.
    pub fn is_connected(&self, uid: UniqueId) -> bool {
        self.store.contains(uid) && self.is_inclusive_ancestor(UniqueId::ROOT, uid)
    }

    /// Markup of the element's content.
    pub fn inner_html(&self, uid: UniqueId) -> Result<String, DomError> {
        self.ensure_live(uid)?;
        let mut out = String::new();
        write_inner_html(&self.store, uid, &mut out);
        Ok(out)
    }

    /// Markup of the element itself and its content.
    pub fn outer_html(&self, uid: UniqueId) -> Result<String, DomError> {
        self.ensure_live(uid)?;
        let mut out = String::new();
        write_outer_html(&self.store, uid, &mut out);
        Ok(out)
    }

    // Host handles

    /// Mark the element as referenced by the host again.
    pub fn hold(&mut self, uid: UniqueId) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        self.store.set_held_by_host(uid, true);
        Ok(())
    }

    /// Drop the host's handle. A parentless element is freed right away,
    /// together with descendants the host does not hold.
    pub fn release(&mut self, uid: UniqueId) -> Result<(), DomError> {
        self.ensure_live(uid)?;
        if uid == UniqueId::ROOT {
            return Ok(());
        }
        self.store.set_held_by_host(uid, false);
        self.maybe_free(uid);
        Ok(())
    }

    fn maybe_free(&mut self, uid: UniqueId) {
        if uid == UniqueId::ROOT
            || !self.store.contains(uid)
            || self.store.held_by_host(uid)
            || self.store.parent(uid).is_some()
        {
            return;
        }
        let mut freed = 0usize;
        let mut stack = vec![uid];
        while let Some(node) = stack.pop() {
            let children = self
                .store
                .children_mut(node)
                .map(std::mem::take)
                .unwrap_or_default();
            self.store.free(node);
            self.events.remove(&node);
            freed += 1;
            for child in children {
                self.store.set_parent(child, None);
                if !self.store.held_by_host(child) {
                    stack.push(child);
                }
            }
        }
        log::debug!(target: "dom.graph", "freed {} elements under {}", freed, uid);
    }

    // Events

    /// Enable delivery of `event_type` on `uid`. Records `EnableEvent` the
    /// first time per element and type; returns whether it did.
    pub fn enable_event(&mut self, uid: UniqueId, event_type: &str) -> Result<bool, DomError> {
        self.ensure_live(uid)?;
        let events = self.events.entry(uid).or_default();
        if events.enabled.contains(event_type) {
            return Ok(false);
        }
        events.enabled.insert(event_type.to_owned());
        if !self.enabled_types.contains(event_type) {
            self.enabled_types.insert(event_type.to_owned());
        }
        self.emit(OperationRef::EnableEvent { uid, event_type });
        Ok(true)
    }

    pub fn add_event_listener(
        &mut self,
        uid: UniqueId,
        event_type: &str,
        options: ListenerOptions,
        callback: impl FnMut(&mut OffscreenEvent) + 'static,
    ) -> Result<ListenerId, DomError> {
        self.enable_event(uid, event_type)?;
        let id = ListenerId::new(self.next_listener);
        self.next_listener += 1;
        self.events.entry(uid).or_default().listeners.push(ListenerEntry {
            id,
            event_type: event_type.to_owned(),
            options,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    pub fn remove_event_listener(&mut self, uid: UniqueId, id: ListenerId) -> bool {
        let Some(events) = self.events.get_mut(&uid) else {
            return false;
        };
        let before = events.listeners.len();
        events.listeners.retain(|entry| entry.id != id);
        before != events.listeners.len()
    }

    pub fn listener_count(&self, uid: UniqueId) -> usize {
        self.events.get(&uid).map_or(0, |e| e.listeners.len())
    }

    /// Replay an event received from the UI thread.
    ///
    /// Capture runs root-most first and reaches capture listeners only; the
    /// target runs every listener; bubbling (when the event bubbles) reaches
    /// non-capture listeners only. Unknown targets are dropped.
    ///
    /// `stop_propagation` at the target lets the target's other listeners run
    /// and cancels bubbling entirely; no ancestor sees the event.
    pub fn dispatch_event(&mut self, event: &CrossThreadEvent) -> DispatchOutcome {
        let target = event.target;
        let mut outcome = DispatchOutcome::default();
        if !self.store.contains(target) {
            log::warn!(
                target: "dom.event",
                "dropping {} event for unknown element {}",
                event.event_type,
                target
            );
            return outcome;
        }
        let mut path = Vec::new();
        let mut current = self.store.parent(target);
        while let Some(node) = current {
            path.push(node);
            current = self.store.parent(node);
        }

        let mut ev = OffscreenEvent::from_cross_thread(event);
        for &node in path.iter().rev() {
            ev.enter(node, EventPhase::Capturing);
            outcome.delivered += self.invoke(node, &mut ev, Some(true));
            if ev.propagation_stopped() {
                outcome.propagation_stopped = true;
                return outcome;
            }
        }

        ev.enter(target, EventPhase::AtTarget);
        outcome.delivered += self.invoke(target, &mut ev, None);
        if ev.propagation_stopped() {
            outcome.propagation_stopped = true;
            return outcome;
        }

        if ev.bubbles() {
            for &node in &path {
                ev.enter(node, EventPhase::Bubbling);
                outcome.delivered += self.invoke(node, &mut ev, Some(false));
                if ev.propagation_stopped() {
                    outcome.propagation_stopped = true;
                    break;
                }
            }
        }
        outcome
    }

    fn invoke(&mut self, node: UniqueId, ev: &mut OffscreenEvent, capture: Option<bool>) -> usize {
        let Some(events) = self.events.get_mut(&node) else {
            return 0;
        };
        let mut delivered = 0;
        for entry in events.listeners.iter_mut() {
            if entry.event_type != ev.event_type() {
                continue;
            }
            if let Some(capture) = capture
                && entry.options.capture != capture
            {
                continue;
            }
            (entry.callback)(ev);
            delivered += 1;
            if ev.immediate_stopped() {
                break;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ObjectLog;
    use crate::operation::Operation;

    fn doc() -> OffscreenDocument<ObjectLog> {
        OffscreenDocument::new(ObjectLog::new())
    }

    #[test]
    fn root_is_implicit_and_ids_start_at_two() {
        let mut doc = doc();
        assert_eq!(doc.tag(UniqueId::ROOT), Ok(""));
        assert!(!doc.has_pending());
        assert_eq!(doc.create_element("view"), UniqueId(2));
        assert_eq!(doc.create_element("text"), UniqueId(3));
    }

    #[test]
    fn exhausted_ids_are_never_reissued() {
        let mut doc = doc();
        doc.next_id = Some(UniqueId(u32::MAX));
        assert_eq!(doc.try_create_element("view"), Ok(UniqueId(u32::MAX)));
        let _ = doc.commit();
        assert_eq!(doc.try_create_element("view"), Err(DomError::IdsExhausted));
        assert_eq!(doc.create_element("view"), UniqueId::INVALID);
        assert!(!doc.has_pending());
        assert!(doc.contains(UniqueId(u32::MAX)));
        assert!(!doc.is_dead(UniqueId(u32::MAX)));
    }

    #[test]
    fn append_moves_children_between_parents() {
        let mut doc = doc();
        let a = doc.create_element("view");
        let b = doc.create_element("view");
        let c = doc.create_element("text");
        doc.append(a, &[c]).unwrap();
        doc.append(b, &[c]).unwrap();
        assert_eq!(doc.children(a).unwrap(), &[] as &[UniqueId]);
        assert_eq!(doc.children(b).unwrap(), &[c]);
        assert_eq!(doc.parent(c).unwrap(), Some(b));
    }

    #[test]
    fn insert_before_validates_reference() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let a = doc.create_element("view");
        let b = doc.create_element("view");
        let stranger = doc.create_element("view");
        doc.append(p, &[a]).unwrap();
        doc.insert_before(p, b, Some(a)).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[b, a]);

        let pending = doc.sink().pending().len();
        assert_eq!(
            doc.insert_before(p, stranger, Some(stranger)),
            Err(DomError::ReferenceNotAChild {
                parent: p,
                reference: stranger,
            })
        );
        assert_eq!(doc.sink().pending().len(), pending);

        doc.insert_before(p, stranger, None).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[b, a, stranger]);
    }

    #[test]
    fn insert_before_itself_keeps_position() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let a = doc.create_element("view");
        let b = doc.create_element("view");
        doc.append(p, &[a, b]).unwrap();
        doc.insert_before(p, a, Some(a)).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[a, b]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut doc = doc();
        let a = doc.create_element("view");
        let b = doc.create_element("view");
        doc.append(a, &[b]).unwrap();
        assert_eq!(
            doc.append(b, &[a]),
            Err(DomError::HierarchyRequest {
                parent: b,
                child: a
            })
        );
        assert!(matches!(
            doc.append(a, &[a]),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            doc.append(a, &[UniqueId::ROOT]),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn remove_on_detached_records_nothing() {
        let mut doc = doc();
        let a = doc.create_element("view");
        let _ = doc.commit();
        doc.remove(a).unwrap();
        assert!(!doc.has_pending());
    }

    #[test]
    fn replace_with_on_detached_is_recorded_but_inert() {
        let mut doc = doc();
        let a = doc.create_element("view");
        let b = doc.create_element("view");
        let _ = doc.commit();
        doc.replace_with(a, &[b]).unwrap();
        assert_eq!(doc.parent(b).unwrap(), None);
        assert_eq!(
            doc.commit(),
            vec![Operation::ReplaceWith {
                uid: a,
                nodes: vec![b],
            }]
        );
    }

    #[test]
    fn replace_with_including_old_keeps_it() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let [a, b, c] = [0; 3].map(|_| doc.create_element("view"));
        doc.append(p, &[a, b]).unwrap();
        doc.replace_with(a, &[c, a]).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[c, a, b]);
    }

    #[test]
    fn repeated_nodes_are_placed_once() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let [a, b, c] = [0; 3].map(|_| doc.create_element("view"));
        doc.append(p, &[a]).unwrap();
        doc.replace_with(a, &[b, b]).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[b]);
        doc.append(p, &[c, a, c]).unwrap();
        assert_eq!(doc.children(p).unwrap(), &[b, a, c]);
        let ops = doc.commit();
        assert_eq!(
            ops.last(),
            Some(&Operation::Append {
                uid: p,
                children: vec![a, c],
            })
        );
    }

    #[test]
    fn getters_do_not_record() {
        let mut doc = doc();
        let a = doc.create_element("view");
        doc.set_attribute(a, "id", "x").unwrap();
        let _ = doc.commit();
        let _ = doc.attribute(a, "id");
        let _ = doc.attributes(a);
        let _ = doc.inner_html(UniqueId::ROOT);
        let _ = doc.next_sibling(a);
        assert!(!doc.has_pending());
    }

    #[test]
    fn inner_html_orphans_children() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let c = doc.create_element("text");
        doc.append(p, &[c]).unwrap();
        doc.set_inner_html(p, "<i>x</i>").unwrap();
        assert_eq!(doc.children(p).unwrap(), &[] as &[UniqueId]);
        assert_eq!(doc.parent(c).unwrap(), None);
        assert_eq!(doc.outer_html(p).unwrap(), "<view><i>x</i></view>");
    }

    #[test]
    fn deep_clone_records_a_mirror_of_the_subtree() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let c = doc.create_element("text");
        doc.set_attribute(p, "class", "box").unwrap();
        doc.set_style_property(c, "color", "red", false).unwrap();
        doc.append(p, &[c]).unwrap();
        let _ = doc.commit();

        let copy = doc.clone_node(p, true).unwrap();
        assert_ne!(copy, p);
        assert_eq!(doc.outer_html(copy).unwrap(), doc.outer_html(p).unwrap());
        let ops = doc.commit();
        assert!(matches!(ops[0], Operation::CreateElement { uid, .. } if uid == copy));
        assert!(matches!(ops.last(), Some(Operation::Append { uid, .. }) if *uid == copy));
    }

    #[test]
    fn release_frees_detached_subtrees_only() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let c = doc.create_element("text");
        let held = doc.create_element("text");
        doc.append(p, &[c, held]).unwrap();
        doc.release(c).unwrap();
        // Still attached, so still alive.
        assert!(doc.contains(c));

        doc.release(p).unwrap();
        assert!(!doc.contains(p));
        assert!(!doc.contains(c));
        assert!(doc.is_dead(p));
        assert!(doc.contains(held));
        assert_eq!(doc.parent(held).unwrap(), None);
        assert_eq!(doc.set_attribute(p, "a", "b"), Err(DomError::UnknownElement(p)));
        assert!(!doc.is_dead(UniqueId(99)));
    }

    #[test]
    fn detaching_a_released_element_frees_it() {
        let mut doc = doc();
        let p = doc.create_element("view");
        let c = doc.create_element("text");
        doc.append(p, &[c]).unwrap();
        doc.release(c).unwrap();
        doc.remove_child(p, c).unwrap();
        assert!(doc.is_dead(c));
    }

    #[test]
    fn enable_event_is_recorded_once_per_element_and_type() {
        let mut doc = doc();
        let a = doc.create_element("view");
        let _ = doc.commit();
        doc.add_event_listener(a, "tap", ListenerOptions::BUBBLE, |_| {})
            .unwrap();
        doc.add_event_listener(a, "tap", ListenerOptions::CAPTURE, |_| {})
            .unwrap();
        assert_eq!(
            doc.commit(),
            vec![Operation::EnableEvent {
                uid: a,
                event_type: "tap".into(),
            }]
        );
        assert_eq!(doc.listener_count(a), 2);
        assert_eq!(doc.enabled_event_types().collect::<Vec<_>>(), vec!["tap"]);
    }
}
