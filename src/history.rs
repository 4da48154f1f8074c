//! Branching undo/redo history (component 4.G): a tree of revisions
//! rather than a linear stack, so that undoing and then editing again
//! doesn't discard the abandoned branch.
//!
//! Grounded on zee's `EditTree`/`Revision`
//! (`examples/other_examples/21322271_zee-editor-zee__src-undo.rs.rs`),
//! generalized from zee's flat redo-index-into-children scheme to an
//! explicit `last_child` pointer per node so `goto_revision` can jump to
//! an arbitrary revision instead of only the most recent child.

use std::collections::HashSet;

use smallvec::SmallVec;
use thiserror::Error;

use crate::transaction::Transaction;

/// An error raised by [`History`] navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// `goto_revision` was given an index past the end of the tree.
    #[error("no such revision: {0}")]
    UnknownRevision(usize),
}

struct RevisionNode {
    parent: Option<usize>,
    children: SmallVec<[usize; 2]>,
    /// Which child `redo`/`later` should step into.
    last_child: Option<usize>,
    /// The transaction that produced this revision from its parent.
    /// `None` only for the root.
    forward: Option<Transaction>,
    /// The transaction that undoes this revision back to its parent.
    inverse: Option<Transaction>,
    timestamp: u64,
}

/// A snapshot of a history tree's shape, returned by [`History::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryStats {
    /// Total number of revisions currently kept, including the root.
    pub revision_count: usize,
    /// Number of undoable steps back to the root from the current
    /// revision.
    pub current_depth: usize,
    /// `true` if `undo` would succeed.
    pub can_undo: bool,
    /// `true` if `redo` would succeed.
    pub can_redo: bool,
}

/// A branching tree of revisions, with one revision marked current.
pub struct History {
    revisions: Vec<RevisionNode>,
    current: usize,
    max_size: usize,
}

impl History {
    /// Starts a fresh history whose root is revision `0`, keeping at most
    /// `max_size` revisions before pruning the oldest branch not on the
    /// path to the current revision.
    pub fn new(root_timestamp: u64, max_size: usize) -> Self {
        History {
            revisions: vec![RevisionNode {
                parent: None,
                children: SmallVec::new(),
                last_child: None,
                forward: None,
                inverse: None,
                timestamp: root_timestamp,
            }],
            current: 0,
            max_size: max_size.max(1),
        }
    }

    /// Index of the current revision.
    pub fn current(&self) -> usize {
        self.current
    }

    /// `true` if the current revision has a parent.
    pub fn can_undo(&self) -> bool {
        self.revisions[self.current].parent.is_some()
    }

    /// `true` if the current revision has a preferred child to redo into.
    pub fn can_redo(&self) -> bool {
        self.revisions[self.current].last_child.is_some()
    }

    /// Records a new revision as a child of the current one and makes it
    /// current, pruning the oldest off-path branch if this exceeds
    /// `max_size`. No-op (returns the current revision unchanged) if
    /// `forward` is an identity transaction. Returns the new revision's
    /// index, or the unchanged current index on a no-op.
    pub fn commit(&mut self, forward: Transaction, inverse: Transaction, timestamp: u64) -> usize {
        if forward.is_empty() {
            return self.current;
        }
        let idx = self.revisions.len();
        self.revisions.push(RevisionNode {
            parent: Some(self.current),
            children: SmallVec::new(),
            last_child: None,
            forward: Some(forward),
            inverse: Some(inverse),
            timestamp,
        });
        self.revisions[self.current].children.push(idx);
        self.revisions[self.current].last_child = Some(idx);
        self.current = idx;
        if self.revisions.len() > self.max_size {
            self.prune();
        }
        idx
    }

    /// Moves to the parent revision, returning the transaction that
    /// undoes the current one.
    pub fn undo(&mut self) -> Option<Transaction> {
        let parent = self.revisions[self.current].parent?;
        let inverse = self.revisions[self.current].inverse.clone()?;
        self.current = parent;
        Some(inverse)
    }

    /// Moves to the preferred child revision, returning the transaction
    /// that produced it.
    pub fn redo(&mut self) -> Option<Transaction> {
        let target = self.revisions[self.current].last_child?;
        let forward = self.revisions[target].forward.clone()?;
        self.current = target;
        Some(forward)
    }

    /// Applies up to `steps` consecutive undos, stopping early at the
    /// root, and returns the single transaction composed from every step
    /// walked (`None` if no step was taken).
    pub fn earlier(&mut self, steps: usize) -> Option<Transaction> {
        let mut ops = Vec::new();
        for _ in 0..steps {
            match self.undo() {
                Some(t) => ops.push(t),
                None => break,
            }
        }
        self.compose_walk(ops)
    }

    /// Applies up to `steps` consecutive redos, stopping early at a leaf,
    /// and returns the single composed transaction (`None` if no step was
    /// taken).
    pub fn later(&mut self, steps: usize) -> Option<Transaction> {
        let mut ops = Vec::new();
        for _ in 0..steps {
            match self.redo() {
                Some(t) => ops.push(t),
                None => break,
            }
        }
        self.compose_walk(ops)
    }

    /// Undoes repeatedly while the current revision's timestamp is within
    /// `duration_millis` of where the walk started, returning the single
    /// composed transaction. Assumes revision timestamps are
    /// non-decreasing along every root-to-leaf path.
    pub fn earlier_by_duration(&mut self, duration_millis: u64) -> Option<Transaction> {
        let cutoff = self.revisions[self.current].timestamp.saturating_sub(duration_millis);
        let mut ops = Vec::new();
        while self.revisions[self.current].timestamp > cutoff {
            match self.undo() {
                Some(t) => ops.push(t),
                None => break,
            }
        }
        self.compose_walk(ops)
    }

    /// Redoes repeatedly while the next revision's timestamp is within
    /// `duration_millis` of where the walk started, returning the single
    /// composed transaction.
    pub fn later_by_duration(&mut self, duration_millis: u64) -> Option<Transaction> {
        let start = self.revisions[self.current].timestamp;
        let cutoff = start.saturating_add(duration_millis);
        let mut ops = Vec::new();
        loop {
            let Some(&target) = self.revisions[self.current].last_child.as_ref() else { break };
            if self.revisions[target].timestamp > cutoff {
                break;
            }
            ops.push(self.redo().expect("last_child points at a real revision"));
        }
        self.compose_walk(ops)
    }

    /// Folds a sequence of consecutively-applied transactions into the
    /// single transaction equivalent to applying them in order, stamped
    /// with the revision now current. `None` if `ops` is empty.
    fn compose_walk(&self, ops: Vec<Transaction>) -> Option<Transaction> {
        let timestamp = self.revisions[self.current].timestamp;
        let mut iter = ops.into_iter();
        let first = iter.next()?;
        let composed = iter.fold(first, |acc, op| {
            acc.compose(&op, timestamp).expect("consecutive history transactions always compose")
        });
        Some(composed)
    }

    fn ancestors(&self, mut idx: usize) -> Vec<usize> {
        let mut path = vec![idx];
        while let Some(p) = self.revisions[idx].parent {
            path.push(p);
            idx = p;
        }
        path
    }

    /// Navigates to an arbitrary revision via its lowest common ancestor
    /// with the current one, returning the single transaction composed
    /// from the inverse transactions walked back through the LCA followed
    /// by the forward transactions walked into `target` (`None` if
    /// `target` is already current).
    pub fn goto_revision(&mut self, target: usize) -> Result<Option<Transaction>, HistoryError> {
        if target >= self.revisions.len() {
            return Err(HistoryError::UnknownRevision(target));
        }
        let from_path = self.ancestors(self.current);
        let to_path = self.ancestors(target);
        let to_index: std::collections::HashMap<usize, usize> =
            to_path.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut from_cut = from_path.len();
        let mut to_cut = 0;
        for (i, &node) in from_path.iter().enumerate() {
            if let Some(&j) = to_index.get(&node) {
                from_cut = i;
                to_cut = j;
                break;
            }
        }

        let mut ops = Vec::new();
        for &node in &from_path[..from_cut] {
            if let Some(inv) = &self.revisions[node].inverse {
                ops.push(inv.clone());
            }
        }
        for &node in to_path[..to_cut].iter().rev() {
            if let Some(fwd) = &self.revisions[node].forward {
                ops.push(fwd.clone());
            }
            if let Some(p) = self.revisions[node].parent {
                self.revisions[p].last_child = Some(node);
            }
        }
        self.current = target;
        Ok(self.compose_walk(ops))
    }

    /// The root-to-`target` path, oldest revision first.
    pub fn get_path(&self, target: usize) -> Result<Vec<usize>, HistoryError> {
        if target >= self.revisions.len() {
            return Err(HistoryError::UnknownRevision(target));
        }
        let mut path = self.ancestors(target);
        path.reverse();
        Ok(path)
    }

    /// Undoes all the way back to the root, returning the single composed
    /// transaction (`None` if already at the root).
    pub fn to_root(&mut self) -> Option<Transaction> {
        self.goto_revision(0).expect("root always exists")
    }

    /// Redoes along preferred children until a leaf is reached, returning
    /// the single composed transaction (`None` if already at a leaf).
    pub fn to_tip(&mut self) -> Option<Transaction> {
        let mut ops = Vec::new();
        while let Some(t) = self.redo() {
            ops.push(t);
        }
        self.compose_walk(ops)
    }

    /// Discards every revision but the root.
    pub fn clear(&mut self, root_timestamp: u64) {
        self.revisions.truncate(1);
        self.revisions[0] = RevisionNode {
            parent: None,
            children: SmallVec::new(),
            last_child: None,
            forward: None,
            inverse: None,
            timestamp: root_timestamp,
        };
        self.current = 0;
    }

    /// A snapshot of the tree's shape.
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            revision_count: self.revisions.len(),
            current_depth: self.ancestors(self.current).len() - 1,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    fn leaves_off_current_path(&self) -> Vec<usize> {
        let path: HashSet<usize> = self.ancestors(self.current).into_iter().collect();
        (0..self.revisions.len())
            .filter(|&i| self.revisions[i].children.is_empty() && !path.contains(&i))
            .collect()
    }

    /// Drops the oldest leaf revision not on the path to `current`,
    /// rebasing every index above it down by one. A tree where every leaf
    /// sits on the current path is left alone even above `max_size`,
    /// which can orphan the size bound rather than ever prune `current`'s
    /// own ancestry.
    fn prune(&mut self) {
        while self.revisions.len() > self.max_size {
            let candidates = self.leaves_off_current_path();
            let Some(&victim) = candidates.iter().min_by_key(|&&i| self.revisions[i].timestamp) else {
                break;
            };
            self.remove_and_rebase(victim);
        }
    }

    fn remove_and_rebase(&mut self, victim: usize) {
        if let Some(parent) = self.revisions[victim].parent {
            self.revisions[parent].children.retain(|c| *c != victim);
            if self.revisions[parent].last_child == Some(victim) {
                self.revisions[parent].last_child = None;
            }
        }
        self.revisions.remove(victim);
        for node in &mut self.revisions {
            if let Some(p) = node.parent {
                if p > victim {
                    node.parent = Some(p - 1);
                }
            }
            for c in node.children.iter_mut() {
                if *c > victim {
                    *c -= 1;
                }
            }
            if let Some(lc) = node.last_child {
                if lc > victim {
                    node.last_child = Some(lc - 1);
                }
            }
        }
        if self.current > victim {
            self.current -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rope::Rope;
    use crate::transaction::Transaction;

    fn insert_tx(rope: &Rope, text: &str, ts: u64) -> (Transaction, Rope) {
        let tx = Transaction::insert_at_eof(rope, text, ts);
        let next = tx.apply(rope).unwrap();
        (tx, next)
    }

    #[test]
    fn commit_then_undo_redo_roundtrips() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("");
        let (fwd, rope1) = insert_tx(&rope0, "a", 1);
        let inv = fwd.invert(&rope0, None, 1).unwrap();
        history.commit(fwd, inv, 1);

        assert!(history.can_undo());
        let undo_tx = history.undo().unwrap();
        let back = undo_tx.apply(&rope1).unwrap();
        assert!(back.equals(&rope0));

        assert!(history.can_redo());
        let redo_tx = history.redo().unwrap();
        let forward = redo_tx.apply(&back).unwrap();
        assert!(forward.equals(&rope1));
    }

    #[test]
    fn branching_keeps_abandoned_branch_reachable() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("");
        let (fwd_a, rope_a) = insert_tx(&rope0, "a", 1);
        let inv_a = fwd_a.invert(&rope0, None, 1).unwrap();
        let a = history.commit(fwd_a, inv_a, 1);

        history.undo();

        let (fwd_b, rope_b) = insert_tx(&rope0, "b", 2);
        let inv_b = fwd_b.invert(&rope0, None, 2).unwrap();
        let b = history.commit(fwd_b, inv_b, 2);

        assert_eq!(history.current(), b);
        let op = history.goto_revision(a).unwrap().expect("a and b are different revisions");
        let rope = op.apply(&rope_b).unwrap();
        assert!(rope.equals(&rope_a));
    }

    #[test]
    fn prune_drops_oldest_off_path_branch() {
        let mut history = History::new(0, 2);
        let rope0 = Rope::from("");
        let (fwd_a, _rope_a) = insert_tx(&rope0, "a", 1);
        let inv_a = fwd_a.invert(&rope0, None, 1).unwrap();
        history.commit(fwd_a, inv_a, 1);
        history.undo();

        let (fwd_b, _rope_b) = insert_tx(&rope0, "b", 2);
        let inv_b = fwd_b.invert(&rope0, None, 2).unwrap();
        history.commit(fwd_b, inv_b, 2);

        let stats = history.stats();
        assert!(stats.revision_count <= 2);
    }

    #[test]
    fn commit_is_a_no_op_for_an_identity_transaction() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("hello");
        let noop = Transaction::change(&rope0, &[], 1);
        let inv = noop.invert(&rope0, None, 1).unwrap();

        let before = history.current();
        let after = history.commit(noop, inv, 1);
        assert_eq!(before, after);
        assert_eq!(history.stats().revision_count, 1);
    }

    #[test]
    fn earlier_and_later_compose_multiple_steps_into_one_transaction() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("");
        let (fwd_a, rope_a) = insert_tx(&rope0, "a", 1);
        let inv_a = fwd_a.invert(&rope0, None, 1).unwrap();
        history.commit(fwd_a, inv_a, 1);

        let (fwd_b, rope_b) = insert_tx(&rope_a, "b", 2);
        let inv_b = fwd_b.invert(&rope_a, None, 2).unwrap();
        history.commit(fwd_b, inv_b, 2);

        let undo_both = history.earlier(2).expect("two commits were made");
        let back = undo_both.apply(&rope_b).unwrap();
        assert!(back.equals(&rope0));

        let redo_both = history.later(2).expect("two undos were made");
        let forward = redo_both.apply(&back).unwrap();
        assert!(forward.equals(&rope_b));

        assert!(history.earlier(0).is_none());
    }

    #[test]
    fn goto_revision_to_current_is_a_no_op() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("");
        let (fwd, _rope1) = insert_tx(&rope0, "a", 1);
        let inv = fwd.invert(&rope0, None, 1).unwrap();
        let a = history.commit(fwd, inv, 1);

        assert!(history.goto_revision(a).unwrap().is_none());
    }
}
