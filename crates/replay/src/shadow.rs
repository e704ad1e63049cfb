//! In-memory stand-in for a platform tree.
//!
//! `ShadowTree` behaves like the DOM the UI thread would own: nodes are
//! addressed by generational handles, structural primitives follow DOM
//! semantics, and listener registration is recorded so wiring can be checked.
//!
//! Reclamation: with [`ReclaimPolicy::DetachedAfterBatch`], nodes created or
//! detached during a batch that are not connected to the root when the batch
//! ends are dropped with their subtrees, and their handles go stale. A node
//! must then be attached by the end of the batch that creates or detaches it.

use crate::tree::{TargetTree, TreeError};
use dom::keep_last_occurrence;
use dom::snapshot::{SnapshotNode, SnapshotTree};
use dom::style::{StyleDeclaration, css_text};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShadowNode {
    index: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReclaimPolicy {
    /// Keep every node until the session ends.
    #[default]
    Retain,
    /// Drop subtrees left disconnected at the end of a batch.
    DetachedAfterBatch,
}

#[derive(Debug)]
struct ShadowRecord {
    tag: String,
    attributes: Vec<(String, String)>,
    style: StyleDeclaration,
    inner_html: Option<String>,
    parent: Option<ShadowNode>,
    children: Vec<ShadowNode>,
    listeners: Vec<String>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<ShadowRecord>,
}

#[derive(Debug)]
pub struct ShadowTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ShadowNode,
    root_listeners: Vec<String>,
    touched: Vec<ShadowNode>,
    policy: ReclaimPolicy,
}

impl ShadowTree {
    pub fn new() -> Self {
        Self::with_policy(ReclaimPolicy::default())
    }

    pub fn with_policy(policy: ReclaimPolicy) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ShadowNode {
                index: 0,
                generation: 0,
            },
            root_listeners: Vec::new(),
            touched: Vec::new(),
            policy,
        };
        tree.root = tree.alloc("");
        tree
    }

    fn alloc(&mut self, tag: &str) -> ShadowNode {
        let record = ShadowRecord {
            tag: tag.to_owned(),
            attributes: Vec::new(),
            style: StyleDeclaration::default(),
            inner_html: None,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.record = Some(record);
            return ShadowNode {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        ShadowNode {
            index,
            generation: 0,
        }
    }

    fn record(&self, node: ShadowNode) -> Result<&ShadowRecord, TreeError> {
        self.slots
            .get(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.record.as_ref())
            .ok_or(TreeError::StaleNode)
    }

    fn record_mut(&mut self, node: ShadowNode) -> Result<&mut ShadowRecord, TreeError> {
        self.slots
            .get_mut(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.record.as_mut())
            .ok_or(TreeError::StaleNode)
    }

    pub fn contains(&self, node: ShadowNode) -> bool {
        self.record(node).is_ok()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    pub fn tag(&self, node: ShadowNode) -> Option<&str> {
        self.record(node).ok().map(|r| r.tag.as_str())
    }

    pub fn attribute(&self, node: ShadowNode, key: &str) -> Option<&str> {
        self.record(node)
            .ok()?
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn style_text(&self, node: ShadowNode) -> Option<String> {
        self.record(node).ok().map(|r| css_text(r.style.iter()))
    }

    pub fn children(&self, node: ShadowNode) -> &[ShadowNode] {
        match self.record(node) {
            Ok(record) => &record.children,
            Err(_) => &[],
        }
    }

    /// Passive listeners registered on `node`, in registration order.
    pub fn listeners(&self, node: ShadowNode) -> &[String] {
        match self.record(node) {
            Ok(record) => &record.listeners,
            Err(_) => &[],
        }
    }

    pub fn root_listeners(&self) -> &[String] {
        &self.root_listeners
    }

    pub fn has_root_listener(&self, event_type: &str) -> bool {
        self.root_listeners.iter().any(|t| t == event_type)
    }

    pub fn is_connected(&self, node: ShadowNode) -> bool {
        self.contains(node) && self.is_inclusive_ancestor(self.root, node)
    }

    fn is_inclusive_ancestor(&self, ancestor: ShadowNode, node: ShadowNode) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.record(n).ok().and_then(|r| r.parent);
        }
        false
    }

    fn check_insert(&self, parent: ShadowNode, child: ShadowNode) -> Result<(), TreeError> {
        self.record(parent)?;
        self.record(child)?;
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(TreeError::HierarchyRequest);
        }
        Ok(())
    }

    fn detach(&mut self, node: ShadowNode) {
        let Some(parent) = self.record(node).ok().and_then(|r| r.parent) else {
            return;
        };
        if let Ok(record) = self.record_mut(parent)
            && let Some(at) = record.children.iter().position(|c| *c == node)
        {
            record.children.remove(at);
        }
        if let Ok(record) = self.record_mut(node) {
            record.parent = None;
        }
        self.touched.push(node);
    }

    fn attach_at(&mut self, parent: ShadowNode, child: ShadowNode, at: Option<usize>) {
        if let Ok(record) = self.record_mut(parent) {
            let at = at.unwrap_or(record.children.len()).min(record.children.len());
            record.children.insert(at, child);
        }
        if let Ok(record) = self.record_mut(child) {
            record.parent = Some(parent);
        }
    }

    fn position_of(&self, parent: ShadowNode, child: ShadowNode) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    fn reclaim(&mut self, node: ShadowNode, dropped: &mut Vec<ShadowNode>) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            let Some(record) = slot.record.take() else {
                continue;
            };
            self.free.push(current.index);
            dropped.push(current);
            stack.extend(record.children);
        }
    }
}

impl Default for ShadowTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetTree for ShadowTree {
    type Node = ShadowNode;

    fn root(&self) -> ShadowNode {
        self.root
    }

    fn parent(&self, node: ShadowNode) -> Option<ShadowNode> {
        self.record(node).ok()?.parent
    }

    fn create_element(&mut self, tag: &str) -> ShadowNode {
        let node = self.alloc(tag);
        self.touched.push(node);
        node
    }

    fn set_attribute(&mut self, node: ShadowNode, key: &str, value: &str) -> Result<(), TreeError> {
        let record = self.record_mut(node)?;
        match record.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => record.attributes.push((key.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: ShadowNode, key: &str) -> Result<(), TreeError> {
        self.record_mut(node)?.attributes.retain(|(k, _)| k != key);
        Ok(())
    }

    fn set_style_property(
        &mut self,
        node: ShadowNode,
        property: &str,
        value: &str,
        important: bool,
    ) -> Result<(), TreeError> {
        self.record_mut(node)?.style.set(property, value, important);
        Ok(())
    }

    fn remove_style_property(&mut self, node: ShadowNode, property: &str) -> Result<(), TreeError> {
        self.record_mut(node)?.style.remove(property);
        Ok(())
    }

    fn set_inner_html(&mut self, node: ShadowNode, text: &str) -> Result<(), TreeError> {
        let record = self.record_mut(node)?;
        record.inner_html = Some(text.to_owned());
        let children = std::mem::take(&mut record.children);
        for child in children {
            if let Ok(record) = self.record_mut(child) {
                record.parent = None;
            }
            self.touched.push(child);
        }
        Ok(())
    }

    fn append(&mut self, parent: ShadowNode, child: ShadowNode) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.attach_at(parent, child, None);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: ShadowNode,
        child: ShadowNode,
        reference: Option<ShadowNode>,
    ) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        let anchor = match reference {
            None => None,
            Some(r) => {
                if self.record(r)?.parent != Some(parent) {
                    return Err(TreeError::ReferenceNotAChild);
                }
                if r == child {
                    let at = self.position_of(parent, child);
                    at.and_then(|at| self.children(parent).get(at + 1).copied())
                } else {
                    Some(r)
                }
            }
        };
        self.detach(child);
        let at = anchor.and_then(|a| self.position_of(parent, a));
        self.attach_at(parent, child, at);
        Ok(())
    }

    fn remove(&mut self, node: ShadowNode) -> Result<(), TreeError> {
        self.record(node)?;
        self.detach(node);
        Ok(())
    }

    fn remove_child(&mut self, parent: ShadowNode, child: ShadowNode) -> Result<(), TreeError> {
        self.record(parent)?;
        if self.record(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild);
        }
        self.detach(child);
        Ok(())
    }

    fn replace_with(&mut self, old: ShadowNode, nodes: &[ShadowNode]) -> Result<(), TreeError> {
        let nodes = &keep_last_occurrence(nodes)[..];
        let Some(parent) = self.record(old)?.parent else {
            for node in nodes {
                self.record(*node)?;
            }
            return Ok(());
        };
        for node in nodes {
            if *node != old {
                self.check_insert(parent, *node)?;
            }
        }
        let anchor = self
            .children(parent)
            .iter()
            .skip_while(|c| **c != old)
            .skip(1)
            .find(|c| !nodes.contains(*c))
            .copied();
        for node in nodes {
            self.detach(*node);
        }
        let old_stays = !nodes.contains(&old);
        let at = if old_stays {
            self.position_of(parent, old)
        } else {
            anchor.and_then(|a| self.position_of(parent, a))
        };
        if old_stays {
            self.detach(old);
        }
        let mut at = at.unwrap_or(self.children(parent).len());
        for node in nodes {
            self.attach_at(parent, *node, Some(at));
            at += 1;
        }
        Ok(())
    }

    fn add_passive_listener(&mut self, node: ShadowNode, event_type: &str) -> Result<(), TreeError> {
        self.record_mut(node)?.listeners.push(event_type.to_owned());
        Ok(())
    }

    fn add_root_listener(&mut self, event_type: &str) {
        self.root_listeners.push(event_type.to_owned());
    }

    fn end_batch(&mut self) -> Vec<ShadowNode> {
        let touched = std::mem::take(&mut self.touched);
        let mut dropped = Vec::new();
        if self.policy == ReclaimPolicy::Retain {
            return dropped;
        }
        for node in touched {
            if node != self.root && self.contains(node) && self.parent(node).is_none() {
                self.reclaim(node, &mut dropped);
            }
        }
        if !dropped.is_empty() {
            log::debug!(target: "replay.shadow", "reclaimed {} detached nodes", dropped.len());
        }
        dropped
    }
}

impl SnapshotTree for ShadowTree {
    type Node = ShadowNode;

    fn snapshot_root(&self) -> ShadowNode {
        self.root
    }

    fn snapshot_node(&self, node: ShadowNode) -> SnapshotNode<ShadowNode> {
        let Ok(record) = self.record(node) else {
            return SnapshotNode {
                tag: String::new(),
                attributes: Vec::new(),
                css_text: String::new(),
                inner_html: None,
                children: Vec::new(),
            };
        };
        SnapshotNode {
            tag: record.tag.clone(),
            attributes: record.attributes.clone(),
            css_text: css_text(record.style.iter()),
            inner_html: record.inner_html.clone(),
            children: record.children.clone(),
        }
    }
}
