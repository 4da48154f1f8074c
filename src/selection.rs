//! Selections: one or more cursor ranges over a rope (component 4.F).
//!
//! Grounded on the selection-and-transaction split in
//! `examples/other_examples/1427569d_helix-editor-helix__helix-core-src-transaction.rs.rs`,
//! which pairs every `ChangeSet` with a post-edit selection rather than
//! leaving the caller to recompute cursor positions by hand.

use smallvec::{smallvec, SmallVec};

use crate::changeset::{Assoc, ChangeSet};
use crate::error::RopeError;

/// A single cursor range. `anchor` is where the selection started,
/// `head` is the end the cursor currently sits at; `anchor == head` is a
/// plain cursor with no selected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    /// The end of the range that doesn't move when extending a selection.
    pub anchor: usize,
    /// The end of the range the cursor is at.
    pub head: usize,
}

impl Range {
    /// A zero-width range (plain cursor) at `pos`.
    pub fn point(pos: usize) -> Self {
        Range { anchor: pos, head: pos }
    }

    /// A range spanning `anchor..head` or `head..anchor`, whichever order
    /// they were given in.
    pub fn new(anchor: usize, head: usize) -> Self {
        Range { anchor, head }
    }

    /// The smaller of `anchor`/`head`.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// The larger of `anchor`/`head`.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// `true` if `anchor == head`.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    fn map(&self, changes: &ChangeSet) -> Range {
        Range {
            anchor: changes.map_position(self.anchor, Assoc::Before),
            head: changes.map_position(self.head, Assoc::After),
        }
    }
}

/// One or more [`Range`]s, one of which is the primary range new typing
/// affects first in a multi-cursor edit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    ranges: SmallVec<[Range; 1]>,
    primary_index: usize,
}

impl Selection {
    /// A selection with a single zero-width range at `pos`.
    pub fn point(pos: usize) -> Self {
        Selection { ranges: smallvec![Range::point(pos)], primary_index: 0 }
    }

    /// A selection with a single range.
    pub fn single(range: Range) -> Self {
        Selection { ranges: smallvec![range], primary_index: 0 }
    }

    /// Builds a selection from an explicit, non-empty list of ranges.
    pub fn new(ranges: impl IntoIterator<Item = Range>, primary_index: usize) -> Result<Self, RopeError> {
        let ranges: SmallVec<[Range; 1]> = ranges.into_iter().collect();
        if ranges.is_empty() {
            return Err(RopeError::InvalidRange { start: 0, end: 0 });
        }
        let primary_index = primary_index.min(ranges.len() - 1);
        Ok(Selection { ranges, primary_index })
    }

    /// The selection's ranges, in the order they were added.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// The range new edits should be anchored on.
    pub fn primary(&self) -> Range {
        self.ranges[self.primary_index]
    }

    /// The index of the primary range within [`Selection::ranges`].
    pub fn primary_index(&self) -> usize {
        self.primary_index
    }

    /// Replaces the primary range, keeping the others untouched.
    pub fn set_primary(&mut self, range: Range) {
        self.ranges[self.primary_index] = range;
    }

    /// Appends `range`, making it primary.
    pub fn push(&mut self, range: Range) {
        self.ranges.push(range);
        self.primary_index = self.ranges.len() - 1;
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// `true` if there are no ranges (never true for a constructed
    /// `Selection`, but useful after filtering).
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Maps every range through `changes`, keeping each range's anchor
    /// glued to text before it and its head glued to text after it, which
    /// is what keeps selections stable across an edit applied elsewhere
    /// in the document.
    pub fn map(&self, changes: &ChangeSet) -> Selection {
        let ranges = self.ranges.iter().map(|r| r.map(changes)).collect();
        Selection { ranges, primary_index: self.primary_index.min(self.ranges.len().saturating_sub(1)) }
    }
}

impl IntoIterator for Selection {
    type Item = Range;
    type IntoIter = smallvec::IntoIter<[Range; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::ChangeSetBuilder;

    #[test]
    fn point_selection_survives_unrelated_insert() {
        let mut builder = ChangeSetBuilder::new(10);
        builder.retain(8).insert("xy");
        let cs = builder.finish();
        let sel = Selection::point(2).map(&cs);
        assert_eq!(sel.primary(), Range::point(2));
    }

    #[test]
    fn selection_shifts_after_earlier_insert() {
        let mut builder = ChangeSetBuilder::new(10);
        builder.retain(2).insert("xy");
        let cs = builder.finish();
        let sel = Selection::point(5).map(&cs);
        assert_eq!(sel.primary(), Range::point(7));
    }

    #[test]
    fn multi_range_selection_keeps_primary_index() {
        let mut sel = Selection::single(Range::point(0));
        sel.push(Range::new(3, 5));
        assert_eq!(sel.primary(), Range::new(3, 5));
        assert_eq!(sel.len(), 2);
    }
}
