use crate::forward::{RawEvent, sanitize_properties};
use crate::table::UniqueIdTable;
use crate::tree::{TargetTree, TreeError};
use core_types::{BatchSeq, UniqueId};
use dom::{
    BinaryReader, CrossThreadEvent, DecodeError, EncodedBatch, OpCode, Operation,
    keep_last_occurrence,
};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot find element with uniqueId: {0}")]
    MissingElement(UniqueId),
    #[error("element with uniqueId {0} already exists")]
    DuplicateElement(UniqueId),
    #[error("invalid uniqueId: {0}")]
    InvalidUniqueId(UniqueId),
    #[error("batch {got} arrived out of order (expected {expected})")]
    OutOfOrderBatch { expected: BatchSeq, got: BatchSeq },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{op:?} on element {uid} failed")]
    Tree {
        uid: UniqueId,
        op: OpCode,
        #[source]
        source: TreeError,
    },
    #[error("replay stopped after batch {since} diverged")]
    Poisoned { since: BatchSeq },
}

impl ReplayError {
    /// Errors after which the target tree no longer mirrors the document.
    pub fn is_divergence(&self) -> bool {
        !matches!(
            self,
            ReplayError::OutOfOrderBatch { .. } | ReplayError::Poisoned { .. }
        )
    }
}

/// Applies operation batches to a real tree, in record order.
///
/// The replayer owns the `uid -> node` table for one session. The root uid is
/// bound to the tree's root at construction; every other uid must arrive in a
/// `CreateElement` before it is referenced.
///
/// A batch that fails part way leaves the tree out of step with the
/// document. From then on every apply is refused with
/// [`ReplayError::Poisoned`] and the tree is left untouched.
pub struct Replayer<T: TargetTree> {
    tree: T,
    table: UniqueIdTable<T::Node>,
    root_types: HashSet<String>,
    next_seq: BatchSeq,
    diverged: Option<BatchSeq>,
    applied_ops: u64,
}

impl<T: TargetTree> Replayer<T> {
    pub fn new(tree: T) -> Self {
        let mut table = UniqueIdTable::new();
        table.bind(UniqueId::ROOT, tree.root());
        Self {
            tree,
            table,
            root_types: HashSet::new(),
            next_seq: BatchSeq::INITIAL,
            diverged: None,
            applied_ops: 0,
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    pub fn node(&self, uid: UniqueId) -> Option<T::Node> {
        self.table.get(uid)
    }

    pub fn uid_of(&self, node: T::Node) -> Option<UniqueId> {
        self.table.uid_of(node)
    }

    pub fn is_dead(&self, uid: UniqueId) -> bool {
        self.table.is_dead(uid)
    }

    pub fn live_count(&self) -> usize {
        self.table.live_len()
    }

    pub fn applied_ops(&self) -> u64 {
        self.applied_ops
    }

    /// Batch whose failure stopped the replay, if any.
    pub fn diverged(&self) -> Option<BatchSeq> {
        self.diverged
    }

    /// Event types with a forwarding listener on the root.
    pub fn forwarded_types(&self) -> impl Iterator<Item = &str> {
        self.root_types.iter().map(String::as_str)
    }

    /// Apply a sequenced batch.
    ///
    /// An out-of-order batch is rejected without consuming the sequence.
    pub fn apply_batch(&mut self, seq: BatchSeq, batch: &EncodedBatch) -> Result<(), ReplayError> {
        self.guarded(seq, |this| {
            let expected = this.next_seq;
            if seq != expected {
                return Err(ReplayError::OutOfOrderBatch { expected, got: seq });
            }
            this.next_seq = seq.next();
            match batch {
                EncodedBatch::Binary(binary) => this.replay_binary(binary.words()),
                EncodedBatch::Log(ops) => this.replay_log(ops),
            }
        })
    }

    /// Apply an unsequenced batch; failures are charged to the next sequence.
    pub fn apply_log(&mut self, ops: &[Operation]) -> Result<(), ReplayError> {
        self.guarded(self.next_seq, |this| this.replay_log(ops))
    }

    /// Walk a binary buffer up to its End marker.
    pub fn apply_binary(&mut self, words: &[u16]) -> Result<(), ReplayError> {
        self.guarded(self.next_seq, |this| this.replay_binary(words))
    }

    pub fn apply(&mut self, op: &Operation) -> Result<(), ReplayError> {
        self.guarded(self.next_seq, |this| this.apply_op(op))
    }

    fn guarded(
        &mut self,
        seq: BatchSeq,
        run: impl FnOnce(&mut Self) -> Result<(), ReplayError>,
    ) -> Result<(), ReplayError> {
        if let Some(since) = self.diverged {
            return Err(ReplayError::Poisoned { since });
        }
        let result = run(self);
        if let Err(err) = &result
            && err.is_divergence()
        {
            log::error!(target: "replay", "batch {seq} diverged, refusing later batches: {err}");
            self.diverged = Some(seq);
        }
        result
    }

    fn replay_log(&mut self, ops: &[Operation]) -> Result<(), ReplayError> {
        for op in ops {
            self.apply_op(op)?;
        }
        self.end_batch();
        Ok(())
    }

    fn replay_binary(&mut self, words: &[u16]) -> Result<(), ReplayError> {
        for op in BinaryReader::new(words) {
            self.apply_op(&op?)?;
        }
        self.end_batch();
        Ok(())
    }

    fn end_batch(&mut self) {
        for node in self.tree.end_batch() {
            if let Some(uid) = self.table.kill_node(node) {
                log::trace!(target: "replay", "uid {uid} reclaimed");
            }
        }
    }

    fn lookup(&self, uid: UniqueId) -> Result<T::Node, ReplayError> {
        self.table.get(uid).ok_or(ReplayError::MissingElement(uid))
    }

    fn lookup_all(&self, uids: &[UniqueId]) -> Result<Vec<T::Node>, ReplayError> {
        uids.iter().map(|uid| self.lookup(*uid)).collect()
    }

    fn apply_op(&mut self, op: &Operation) -> Result<(), ReplayError> {
        let uid = op.uid();
        let opcode = op.opcode();
        log::trace!(target: "replay", "{opcode:?} uid={uid}");
        let tree_err = |source| ReplayError::Tree {
            uid,
            op: opcode,
            source,
        };
        match op {
            Operation::CreateElement { uid, tag } => {
                if !uid.is_valid() {
                    return Err(ReplayError::InvalidUniqueId(*uid));
                }
                if !self.table.is_vacant(*uid) {
                    return Err(ReplayError::DuplicateElement(*uid));
                }
                let node = self.tree.create_element(tag);
                self.table.bind(*uid, node);
            }
            Operation::SetAttribute { uid, key, value } => {
                let node = self.lookup(*uid)?;
                self.tree.set_attribute(node, key, value).map_err(tree_err)?;
            }
            Operation::RemoveAttribute { uid, key } => {
                let node = self.lookup(*uid)?;
                self.tree.remove_attribute(node, key).map_err(tree_err)?;
            }
            Operation::Append { uid, children } => {
                let parent = self.lookup(*uid)?;
                for child in self.lookup_all(&keep_last_occurrence(children))? {
                    self.tree.append(parent, child).map_err(tree_err)?;
                }
            }
            Operation::Remove { uid } => {
                let node = self.lookup(*uid)?;
                self.tree.remove(node).map_err(tree_err)?;
            }
            Operation::ReplaceWith { uid, nodes } => {
                let old = self.lookup(*uid)?;
                let nodes = self.lookup_all(&keep_last_occurrence(nodes))?;
                self.tree.replace_with(old, &nodes).map_err(tree_err)?;
            }
            Operation::InsertBefore {
                uid,
                child,
                reference,
            } => {
                let parent = self.lookup(*uid)?;
                let child = self.lookup(*child)?;
                let reference = match reference {
                    Some(r) => Some(self.lookup(*r)?),
                    None => None,
                };
                self.tree
                    .insert_before(parent, child, reference)
                    .map_err(tree_err)?;
            }
            Operation::EnableEvent { uid, event_type } => {
                let node = self.lookup(*uid)?;
                self.tree
                    .add_passive_listener(node, event_type)
                    .map_err(tree_err)?;
                if self.root_types.insert(event_type.clone()) {
                    log::debug!(target: "replay", "forwarding {event_type:?} events");
                    self.tree.add_root_listener(event_type);
                }
            }
            Operation::RemoveChild { uid, child } => {
                let parent = self.lookup(*uid)?;
                let child = self.lookup(*child)?;
                self.tree.remove_child(parent, child).map_err(tree_err)?;
            }
            Operation::SetStyleProperty {
                uid,
                property,
                value,
                important,
            } => {
                let node = self.lookup(*uid)?;
                self.tree
                    .set_style_property(node, property, value, *important)
                    .map_err(tree_err)?;
            }
            Operation::RemoveStyleProperty { uid, property } => {
                let node = self.lookup(*uid)?;
                self.tree
                    .remove_style_property(node, property)
                    .map_err(tree_err)?;
            }
            Operation::SetInnerHtml { uid, text } => {
                let node = self.lookup(*uid)?;
                self.tree.set_inner_html(node, text).map_err(tree_err)?;
            }
        }
        self.applied_ops += 1;
        Ok(())
    }

    /// Run the root listener for a native event fired on `node`.
    ///
    /// Returns `None` when no root listener exists for the type or when no
    /// ancestor of `node` was created through the offscreen document.
    pub fn fire_native(&self, node: T::Node, event: &RawEvent) -> Option<CrossThreadEvent> {
        if !self.root_types.contains(&event.event_type) {
            return None;
        }
        let mut current = Some(node);
        let target = loop {
            let n = current?;
            if let Some(uid) = self.table.uid_of(n) {
                break uid;
            }
            current = self.tree.parent(n);
        };
        Some(CrossThreadEvent {
            event_type: event.event_type.clone(),
            target,
            bubbles: event.bubbles,
            properties: sanitize_properties(&event.properties),
        })
    }
}
