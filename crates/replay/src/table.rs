use core_types::UniqueId;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entry<N> {
    Vacant,
    Live(N),
    Dead,
}

/// Decode-side `uid -> node` table.
///
/// Invariants:
/// - A slot goes `Vacant -> Live -> Dead` and never back.
/// - `reverse` holds exactly the live entries, so a node resolves to the uid
///   it was created for.
/// - Storage grows with the number of bound uids, not with their values, so
///   an arbitrary uid from a batch costs one entry.
#[derive(Debug)]
pub struct UniqueIdTable<N> {
    slots: HashMap<UniqueId, Entry<N>>,
    reverse: HashMap<N, UniqueId>,
}

impl<N: Copy + Eq + Hash> UniqueIdTable<N> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    fn slot(&self, uid: UniqueId) -> Entry<N> {
        self.slots.get(&uid).copied().unwrap_or(Entry::Vacant)
    }

    /// True if the uid was never bound.
    pub fn is_vacant(&self, uid: UniqueId) -> bool {
        matches!(self.slot(uid), Entry::Vacant)
    }

    pub fn is_dead(&self, uid: UniqueId) -> bool {
        matches!(self.slot(uid), Entry::Dead)
    }

    pub fn get(&self, uid: UniqueId) -> Option<N> {
        match self.slot(uid) {
            Entry::Live(node) => Some(node),
            _ => None,
        }
    }

    pub fn uid_of(&self, node: N) -> Option<UniqueId> {
        self.reverse.get(&node).copied()
    }

    /// Bind a vacant uid. Returns false (and changes nothing) otherwise.
    pub fn bind(&mut self, uid: UniqueId, node: N) -> bool {
        if !self.is_vacant(uid) {
            return false;
        }
        self.slots.insert(uid, Entry::Live(node));
        self.reverse.insert(node, uid);
        true
    }

    /// Mark the uid bound to `node` as dead.
    pub fn kill_node(&mut self, node: N) -> Option<UniqueId> {
        let uid = self.reverse.remove(&node)?;
        self.slots.insert(uid, Entry::Dead);
        Some(uid)
    }

    pub fn live_len(&self) -> usize {
        self.reverse.len()
    }
}

impl<N: Copy + Eq + Hash> Default for UniqueIdTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_never_come_back_to_life() {
        let mut table = UniqueIdTable::new();
        assert!(table.bind(UniqueId(2), 'a'));
        assert!(!table.bind(UniqueId(2), 'b'));
        assert_eq!(table.get(UniqueId(2)), Some('a'));
        assert_eq!(table.uid_of('a'), Some(UniqueId(2)));

        assert_eq!(table.kill_node('a'), Some(UniqueId(2)));
        assert!(table.is_dead(UniqueId(2)));
        assert_eq!(table.get(UniqueId(2)), None);
        assert_eq!(table.uid_of('a'), None);
        assert!(!table.bind(UniqueId(2), 'c'));
        assert_eq!(table.live_len(), 0);
    }

    #[test]
    fn large_uids_bind_without_dense_storage() {
        let mut table = UniqueIdTable::new();
        let far = UniqueId(u32::MAX);
        assert!(table.bind(far, 'z'));
        assert_eq!(table.get(far), Some('z'));
        assert!(table.is_vacant(UniqueId(u32::MAX - 1)));
        assert_eq!(table.slots.len(), 1);
    }
}
