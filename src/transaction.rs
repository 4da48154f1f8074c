//! Transactions: a change set bundled with the selection it produces and
//! the time it was recorded (component 4.F), plus the selection-aware
//! builders that spare a caller from hand-assembling a `ChangeSet` for
//! every cursor in a multi-cursor edit.
//!
//! The `(changes, selection)` pairing is grounded on helix's `Transaction`
//! (`examples/other_examples/1427569d_helix-editor-helix__helix-core-src-transaction.rs.rs`);
//! the builders are this crate's own, since the teacher pack's editors
//! build selections inline rather than exposing reusable constructors.

use crate::changeset::{ChangeSet, ChangeSetBuilder};
use crate::error::RopeError;
use crate::rope::Rope;
use crate::selection::{Range, Selection};

/// A recorded edit: the change set that produced it, the selection it
/// leaves the cursor(s) in, and when it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    pub(crate) changes: ChangeSet,
    pub(crate) selection: Option<Selection>,
    pub(crate) timestamp: u64,
}

impl Transaction {
    /// Wraps an already-built change set, checking it actually applies to
    /// `rope`.
    pub fn new(rope: &Rope, changes: ChangeSet, selection: Option<Selection>, timestamp: u64) -> Result<Self, RopeError> {
        if changes.len_before() != rope.len_chars() {
            return Err(RopeError::LengthMismatch {
                expected: changes.len_before(),
                actual: rope.len_chars(),
            });
        }
        Ok(Transaction { changes, selection, timestamp })
    }

    /// The change set this transaction applies.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// The selection this transaction leaves the cursor(s) in, if any.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// When this transaction was recorded.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Applies the transaction's change set, returning the edited rope.
    pub fn apply(&self, rope: &Rope) -> Result<Rope, RopeError> {
        self.changes.apply(rope)
    }

    /// Builds the transaction that undoes this one against `original`,
    /// the rope this transaction was built from.
    pub fn invert(&self, original: &Rope, inverse_selection: Option<Selection>, timestamp: u64) -> Result<Transaction, RopeError> {
        let changes = self.changes.invert(original)?;
        Ok(Transaction { changes, selection: inverse_selection, timestamp })
    }

    /// Composes this transaction with `other`, so applying the result is
    /// equivalent to applying `self` then `other`. `other`'s selection
    /// wins when present; falls back to `self`'s otherwise.
    pub fn compose(&self, other: &Transaction, timestamp: u64) -> Result<Transaction, RopeError> {
        let changes = self.changes.compose(&other.changes)?;
        let selection = other.selection.clone().or_else(|| self.selection.clone());
        Ok(Transaction { changes, selection, timestamp })
    }

    /// A copy of this transaction with its selection replaced by `sel`.
    pub fn with_selection(&self, sel: Selection) -> Self {
        Self { selection: Some(sel), ..self.clone() }
    }

    /// `true` if this transaction's change set is the identity — applying
    /// it leaves the rope unchanged.
    pub fn is_empty(&self) -> bool {
        self.changes.is_identity()
    }

    /// Deletes `[start, end)`, leaving a point selection at `start`.
    pub fn delete_range(rope: &Rope, start: usize, end: usize, timestamp: u64) -> Result<Self, RopeError> {
        if start > end {
            return Err(RopeError::InvalidRange { start, end });
        }
        let mut builder = ChangeSetBuilder::new(rope.len_chars());
        builder.retain(start);
        builder.delete(end - start);
        let changes = builder.finish();
        Ok(Transaction { changes, selection: Some(Selection::point(start)), timestamp })
    }

    /// Replaces each `(from, to, replacement)` edit in `edits`, silently
    /// dropping any edit whose range is inverted (`from > to`) or that
    /// overlaps an edit already kept (earlier `from`, after sorting).
    /// Infallible, matching the spec's raw `change(doc, edits)` op.
    pub fn change(rope: &Rope, edits: &[(usize, usize, String)], timestamp: u64) -> Self {
        let mut sorted: Vec<RangeEdit> = edits
            .iter()
            .filter(|(start, end, _)| start <= end)
            .map(|(start, end, text)| RangeEdit { start: *start, end: *end, insert: text.clone() })
            .collect();
        sorted.sort_by_key(|e| e.start);

        let mut kept = Vec::new();
        let mut pos = 0;
        for edit in sorted {
            if edit.start < pos {
                continue;
            }
            pos = edit.end;
            kept.push(edit);
        }

        let changes = changeset_from_edits_lenient(rope.len_chars(), kept);
        Transaction { changes, selection: None, timestamp }
    }

    /// Deletes every range in `deletions`, merging ranges that overlap or
    /// touch into a single run first. Ranges may be given in any order
    /// and may overlap; infallible, matching the spec's raw
    /// `delete(doc, deletions)` op. Leaves a point selection at the first
    /// merged deletion's start, if any survive filtering.
    pub fn delete(rope: &Rope, deletions: &[(usize, usize)], timestamp: u64) -> Self {
        let mut sorted: Vec<(usize, usize)> =
            deletions.iter().copied().filter(|&(start, end)| start <= end).collect();
        sorted.sort_by_key(|&(start, _)| start);

        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (start, end) in sorted {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let first_start = merged.first().map(|&(start, _)| start);
        let edits: Vec<RangeEdit> = merged
            .into_iter()
            .map(|(start, end)| RangeEdit { start, end, insert: String::new() })
            .collect();
        let changes = changeset_from_edits_lenient(rope.len_chars(), edits);
        let selection = first_start.map(Selection::point);
        Transaction { changes, selection, timestamp }
    }

    /// Inserts `text` at the end of the document, leaving a point
    /// selection just past the inserted text.
    pub fn insert_at_eof(rope: &Rope, text: &str, timestamp: u64) -> Self {
        let len = rope.len_chars();
        let mut builder = ChangeSetBuilder::new(len);
        builder.retain(len);
        builder.insert(text);
        let changes = builder.finish();
        let new_pos = len + text.chars().count();
        Transaction { changes, selection: Some(Selection::point(new_pos)), timestamp }
    }

    /// Replaces each selected range's text as decided by `edit`, which is
    /// given the current rope and a range and returns the replacement
    /// text for it. Ranges must not overlap; overlapping ranges raise
    /// `RopeError::InvalidRange` rather than being silently dropped, since
    /// the caller asked for every one of its ranges to take effect (see
    /// `change_by_selection_ignore_overlapping` for the lenient form).
    pub fn change_by_selection(
        rope: &Rope,
        selection: &Selection,
        edit: impl Fn(&Rope, Range) -> String,
        timestamp: u64,
    ) -> Result<Self, RopeError> {
        let mut edits: Vec<RangeEdit> = selection
            .ranges()
            .iter()
            .map(|r| RangeEdit { start: r.start(), end: r.end(), insert: edit(rope, *r) })
            .collect();
        edits.sort_by_key(|e| e.start);
        let changes = changeset_from_edits_strict(rope.len_chars(), edits)?;
        let new_selection = selection.map(&changes);
        Ok(Transaction { changes, selection: Some(new_selection), timestamp })
    }

    /// Like [`Transaction::change_by_selection`], but ranges that overlap
    /// an earlier (lower-`start`) range are silently dropped instead of
    /// raising an error. Infallible. Returns a selection reduced to just
    /// the ranges that survived, with the primary index remapped to
    /// follow the same original range (or the last surviving range, if
    /// the original primary was itself dropped).
    pub fn change_by_selection_ignore_overlapping(
        rope: &Rope,
        selection: &Selection,
        edit: impl Fn(&Rope, Range) -> String,
        timestamp: u64,
    ) -> Self {
        let mut indexed: Vec<(usize, RangeEdit)> = selection
            .ranges()
            .iter()
            .enumerate()
            .map(|(i, r)| (i, RangeEdit { start: r.start(), end: r.end(), insert: edit(rope, *r) }))
            .collect();
        indexed.sort_by_key(|(_, e)| e.start);

        let mut kept_indices = Vec::new();
        let mut edits = Vec::new();
        let mut pos = 0;
        for (i, edit) in indexed {
            if edit.start < pos {
                continue;
            }
            pos = edit.end;
            kept_indices.push(i);
            edits.push(edit);
        }

        let changes = changeset_from_edits_lenient(rope.len_chars(), edits);

        let kept_ranges: Vec<Range> = kept_indices.iter().map(|&i| selection.ranges()[i]).collect();
        let new_primary = kept_indices
            .iter()
            .position(|&i| i == selection.primary_index())
            .unwrap_or(kept_indices.len() - 1);
        let reduced = Selection::new(kept_ranges, new_primary)
            .expect("at least the first sorted range is always kept");
        let new_selection = reduced.map(&changes);
        Transaction { changes, selection: Some(new_selection), timestamp }
    }

    /// Deletes the text under every range in `selection`.
    pub fn delete_by_selection(rope: &Rope, selection: &Selection, timestamp: u64) -> Result<Self, RopeError> {
        Self::change_by_selection(rope, selection, |_, _| String::new(), timestamp)
    }

    /// Inserts `text` at every range's head, collapsing each range to a
    /// point first.
    pub fn insert_at_selection(rope: &Rope, selection: &Selection, text: &str, timestamp: u64) -> Result<Self, RopeError> {
        let edits: Vec<RangeEdit> = selection
            .ranges()
            .iter()
            .map(|r| RangeEdit { start: r.head, end: r.head, insert: text.to_string() })
            .collect();
        let mut sorted = edits;
        sorted.sort_by_key(|e| e.start);
        let changes = changeset_from_edits_strict(rope.len_chars(), sorted)?;
        let new_selection = selection.map(&changes);
        Ok(Transaction { changes, selection: Some(new_selection), timestamp })
    }
}

struct RangeEdit {
    start: usize,
    end: usize,
    insert: String,
}

/// Builds a change set from edits already sorted by `start`, raising
/// `RopeError::InvalidRange` if any overlaps the one before it.
fn changeset_from_edits_strict(len_before: usize, edits: Vec<RangeEdit>) -> Result<ChangeSet, RopeError> {
    let mut builder = ChangeSetBuilder::new(len_before);
    let mut pos = 0;
    for edit in edits {
        if edit.start < pos {
            return Err(RopeError::InvalidRange { start: edit.start, end: edit.end });
        }
        builder.retain(edit.start - pos);
        builder.delete(edit.end - edit.start);
        builder.insert(edit.insert);
        pos = edit.end;
    }
    Ok(builder.finish())
}

/// Builds a change set from edits already sorted by `start` and already
/// filtered down to a non-overlapping run; never fails.
fn changeset_from_edits_lenient(len_before: usize, edits: Vec<RangeEdit>) -> ChangeSet {
    let mut builder = ChangeSetBuilder::new(len_before);
    let mut pos = 0;
    for edit in edits {
        builder.retain(edit.start - pos);
        builder.delete(edit.end - edit.start);
        builder.insert(edit.insert);
        pos = edit.end;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_transaction_roundtrips_via_invert() {
        let rope = Rope::from("hello world");
        let tx = Transaction::delete_range(&rope, 5, 11, 1).unwrap();
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "hello");
        let inverse = tx.invert(&rope, Some(Selection::point(5)), 2).unwrap();
        let restored = inverse.apply(&edited).unwrap();
        assert!(restored.equals(&rope));
    }

    #[test]
    fn change_drops_overlapping_and_inverted_edits() {
        let rope = Rope::from("abcdefghij");
        let tx = Transaction::change(
            &rope,
            &[
                (2, 4, "XX".to_string()),
                (3, 5, "YY".to_string()), // overlaps the kept [2,4) edit
                (9, 1, "ZZ".to_string()), // inverted, dropped
                (7, 8, "W".to_string()),
            ],
            1,
        );
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "abXXefgWij");
    }

    #[test]
    fn delete_list_merges_overlapping_ranges() {
        let rope = Rope::from("0123456789");
        let tx = Transaction::delete(&rope, &[(2, 5), (4, 7), (8, 9)], 1);
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "0179");
        assert_eq!(tx.selection().unwrap().primary(), Range::point(2));
    }

    #[test]
    fn insert_at_eof_appends_and_moves_cursor() {
        let rope = Rope::from("hello");
        let tx = Transaction::insert_at_eof(&rope, " world", 1);
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "hello world");
        assert_eq!(tx.selection().unwrap().primary(), Range::point(11));
    }

    #[test]
    fn change_by_selection_upper_cases_each_range() {
        let rope = Rope::from("foo bar baz");
        let selection = Selection::new(
            vec![Range::new(0, 3), Range::new(4, 7), Range::new(8, 11)],
            0,
        )
        .unwrap();
        let tx = Transaction::change_by_selection(
            &rope,
            &selection,
            |rope, range| {
                rope.slice(range.start(), range.end())
                    .unwrap()
                    .to_string_lossy()
                    .to_uppercase()
            },
            1,
        )
        .unwrap();
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "FOO BAR BAZ");
    }

    #[test]
    fn overlapping_ranges_error_unless_ignored() {
        let rope = Rope::from("abcdef");
        let selection = Selection::new(vec![Range::new(0, 3), Range::new(2, 5)], 0).unwrap();
        let err = Transaction::change_by_selection(&rope, &selection, |_, _| "x".to_string(), 1);
        assert!(err.is_err());

        let tx = Transaction::change_by_selection_ignore_overlapping(
            &rope,
            &selection,
            |_, _| "x".to_string(),
            1,
        );
        // only the first (lower-start) range survives; the second overlaps it.
        let selection_after = tx.selection().unwrap();
        assert_eq!(selection_after.len(), 1);
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "xdef");
    }

    #[test]
    fn ignore_overlapping_remaps_primary_index_when_primary_is_dropped() {
        let rope = Rope::from("abcdef");
        // primary is range 1 (2..5), which overlaps range 0 (0..3) and gets dropped.
        let selection = Selection::new(vec![Range::new(0, 3), Range::new(2, 5)], 1).unwrap();
        let tx = Transaction::change_by_selection_ignore_overlapping(
            &rope,
            &selection,
            |_, _| "x".to_string(),
            1,
        );
        let selection_after = tx.selection().unwrap();
        assert_eq!(selection_after.len(), 1);
        assert_eq!(selection_after.primary_index(), 0);
    }

    #[test]
    fn delete_by_selection_removes_every_range() {
        let rope = Rope::from("foo bar baz");
        let selection = Selection::new(vec![Range::new(0, 4), Range::new(4, 8)], 0).unwrap();
        let tx = Transaction::delete_by_selection(&rope, &selection, 1).unwrap();
        let edited = tx.apply(&rope).unwrap();
        assert_eq!(edited.to_string_lossy(), "baz");
    }

    #[test]
    fn compose_matches_applying_each_transaction_in_turn() {
        let rope = Rope::from("hello world");
        let tx1 = Transaction::insert_at_eof(&rope, "!", 1);
        let after1 = tx1.apply(&rope).unwrap();
        let tx2 = Transaction::delete_range(&after1, 0, 6, 2).unwrap();

        let composed = tx1.compose(&tx2, 3).unwrap();
        let direct = composed.apply(&rope).unwrap();
        let sequential = tx2.apply(&after1).unwrap();
        assert!(direct.equals(&sequential));
        assert_eq!(composed.timestamp(), 3);
        // other's selection wins
        assert_eq!(composed.selection(), tx2.selection());
    }

    #[test]
    fn with_selection_replaces_selection_and_keeps_changes() {
        let rope = Rope::from("hello");
        let tx = Transaction::insert_at_eof(&rope, "!", 1);
        let replaced = tx.with_selection(Selection::point(0));
        assert_eq!(replaced.selection(), Some(&Selection::point(0)));
        assert_eq!(replaced.apply(&rope).unwrap().to_string_lossy(), "hello!");
    }

    #[test]
    fn is_empty_reflects_identity_change_sets() {
        let rope = Rope::from("hello");
        let noop = Transaction::change(&rope, &[], 1);
        assert!(noop.is_empty());

        let edit = Transaction::insert_at_eof(&rope, "!", 1);
        assert!(!edit.is_empty());
    }
}
