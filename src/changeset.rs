//! Change-set algebra (component 4.E): a sequence of retain/delete/insert
//! operations that describes an edit independently of any one `Rope`
//! instance, so it can be applied, inverted, composed, and (in the two
//! trivial cases this crate implements) transformed.
//!
//! Grounded on `helix-core`'s `transaction.rs`
//! (`examples/other_examples/1427569d_helix-editor-helix__helix-core-src-transaction.rs.rs`),
//! adapted from its rope-crate `Tendril` insert payloads to plain `String`s
//! and from panicking `debug_assert!`s to `Result`-returning checks.

use std::cmp::Ordering;

use crate::error::RopeError;
use crate::rope::Rope;

/// A single change-set operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Change {
    /// Keep the next `n` characters unchanged.
    Retain(usize),
    /// Remove the next `n` characters.
    Delete(usize),
    /// Insert this text before the current position.
    Insert(String),
}

/// An ordered sequence of [`Change`]s describing one edit (spec §4.E).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeSet {
    pub(crate) changes: Vec<Change>,
    pub(crate) len_before: usize,
    pub(crate) len_after: usize,
}

/// How [`ChangeSet::map_position`] should resolve a position that falls
/// exactly at an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Assoc {
    /// Stay before text inserted at this position.
    Before,
    /// Move after text inserted at this position.
    After,
}

impl ChangeSet {
    /// A change set that leaves a rope of length `len` untouched.
    pub fn identity(len: usize) -> Self {
        let mut builder = ChangeSetBuilder::new(len);
        if len > 0 {
            builder.retain(len);
        }
        builder.finish()
    }

    /// `true` if applying this change set would not alter the rope's
    /// content (every op is a `Retain`).
    pub fn is_identity(&self) -> bool {
        self.changes.iter().all(|c| matches!(c, Change::Retain(_)))
    }

    /// The character length this change set expects to be applied to.
    pub fn len_before(&self) -> usize {
        self.len_before
    }

    /// The character length of the rope that results from applying this
    /// change set.
    pub fn len_after(&self) -> usize {
        self.len_after
    }

    /// Applies this change set to `rope`, returning the edited result. If
    /// `rope`'s length doesn't match `len_before`, `rope` is returned
    /// unchanged rather than raising an error (this is the one
    /// intentional no-op/sentinel case in the crate; see the crate root
    /// docs on the error-handling policy).
    pub fn apply(&self, rope: &Rope) -> Result<Rope, RopeError> {
        if self.len_before != rope.len_chars() {
            return Ok(rope.clone());
        }
        let mut result = Rope::new();
        let mut pos = 0;
        for change in &self.changes {
            match change {
                Change::Retain(n) => {
                    let slice = rope.slice(pos, pos + n)?;
                    result = result.append_rope(&slice);
                    pos += n;
                }
                Change::Delete(n) => {
                    pos += n;
                }
                Change::Insert(text) => {
                    result = result.append_rope(&Rope::from(text.as_str()));
                }
            }
        }
        Ok(result)
    }

    /// Builds the change set that undoes this one, given the rope this
    /// change set was originally built against (spec §4.E `invert`).
    pub fn invert(&self, original: &Rope) -> Result<ChangeSet, RopeError> {
        if self.len_before != original.len_chars() {
            return Err(RopeError::LengthMismatch {
                expected: self.len_before,
                actual: original.len_chars(),
            });
        }
        let mut builder = ChangeSetBuilder::new(self.len_after);
        let mut pos = 0;
        for change in &self.changes {
            match change {
                Change::Retain(n) => {
                    builder.retain(*n);
                    pos += n;
                }
                Change::Delete(n) => {
                    let removed = original.slice(pos, pos + n)?.to_string_lossy();
                    builder.insert(removed);
                    pos += n;
                }
                Change::Insert(text) => {
                    builder.delete(text.chars().count());
                }
            }
        }
        Ok(builder.finish())
    }

    /// Composes `self` followed by `other` into a single change set
    /// equivalent to applying both in sequence (spec §4.E `compose`).
    /// Requires `self.len_after() == other.len_before()`.
    pub fn compose(&self, other: &ChangeSet) -> Result<ChangeSet, RopeError> {
        if self.len_after != other.len_before {
            return Err(RopeError::LengthMismatch {
                expected: self.len_after,
                actual: other.len_before,
            });
        }
        let mut changes = Vec::with_capacity(self.changes.len() + other.changes.len());
        let mut a = self.changes.iter().cloned();
        let mut b = other.changes.iter().cloned();
        let mut head_a = a.next();
        let mut head_b = b.next();

        loop {
            match (head_a.take(), head_b.take()) {
                (None, None) => break,
                (Some(Change::Delete(n)), rest_b) => {
                    changes.push(Change::Delete(n));
                    head_a = a.next();
                    head_b = rest_b;
                }
                (rest_a, Some(Change::Insert(s))) => {
                    changes.push(Change::Insert(s));
                    head_a = rest_a;
                    head_b = b.next();
                }
                (Some(Change::Retain(i)), Some(Change::Retain(j))) => match i.cmp(&j) {
                    Ordering::Less => {
                        changes.push(Change::Retain(i));
                        head_a = a.next();
                        head_b = Some(Change::Retain(j - i));
                    }
                    Ordering::Greater => {
                        changes.push(Change::Retain(j));
                        head_a = Some(Change::Retain(i - j));
                        head_b = b.next();
                    }
                    Ordering::Equal => {
                        changes.push(Change::Retain(i));
                        head_a = a.next();
                        head_b = b.next();
                    }
                },
                (Some(Change::Insert(s)), Some(Change::Retain(j))) => {
                    let len = s.chars().count();
                    match len.cmp(&j) {
                        Ordering::Less => {
                            changes.push(Change::Insert(s));
                            head_a = a.next();
                            head_b = Some(Change::Retain(j - len));
                        }
                        Ordering::Greater => {
                            let (head, tail) = split_str(&s, j);
                            changes.push(Change::Insert(head));
                            head_a = Some(Change::Insert(tail));
                            head_b = b.next();
                        }
                        Ordering::Equal => {
                            changes.push(Change::Insert(s));
                            head_a = a.next();
                            head_b = b.next();
                        }
                    }
                }
                (Some(Change::Insert(s)), Some(Change::Delete(j))) => {
                    // `other` deletes text `self` just inserted: cancels.
                    let len = s.chars().count();
                    match len.cmp(&j) {
                        Ordering::Less => {
                            head_a = a.next();
                            head_b = Some(Change::Delete(j - len));
                        }
                        Ordering::Greater => {
                            let (_, tail) = split_str(&s, j);
                            head_a = Some(Change::Insert(tail));
                            head_b = b.next();
                        }
                        Ordering::Equal => {
                            head_a = a.next();
                            head_b = b.next();
                        }
                    }
                }
                (Some(Change::Retain(i)), Some(Change::Delete(j))) => match i.cmp(&j) {
                    Ordering::Less => {
                        changes.push(Change::Delete(i));
                        head_a = a.next();
                        head_b = Some(Change::Delete(j - i));
                    }
                    Ordering::Greater => {
                        changes.push(Change::Delete(j));
                        head_a = Some(Change::Retain(i - j));
                        head_b = b.next();
                    }
                    Ordering::Equal => {
                        changes.push(Change::Delete(i));
                        head_a = a.next();
                        head_b = b.next();
                    }
                },
                (None, Some(_)) | (Some(_), None) => {
                    unreachable!("change sets with matching lengths stay in lockstep")
                }
            }
        }

        Ok(ChangeSet {
            changes,
            len_before: self.len_before,
            len_after: other.len_after,
        }
        .fused())
    }

    /// Maps a character position in "before" coordinates to its position
    /// in "after" coordinates (spec §4.E `mapPosition`). `assoc` decides
    /// which side of an insertion landing exactly on `pos` to resolve to.
    pub fn map_position(&self, pos: usize, assoc: Assoc) -> usize {
        let mut old_pos = 0;
        let mut new_pos = 0;
        for change in &self.changes {
            match change {
                Change::Retain(n) => {
                    if old_pos + n > pos {
                        return new_pos + (pos - old_pos);
                    }
                    old_pos += n;
                    new_pos += n;
                }
                Change::Delete(n) => {
                    if old_pos + n > pos {
                        return new_pos;
                    }
                    old_pos += n;
                }
                Change::Insert(s) => {
                    let ins_len = s.chars().count();
                    if old_pos == pos {
                        return match assoc {
                            Assoc::Before => new_pos,
                            Assoc::After => new_pos + ins_len,
                        };
                    }
                    new_pos += ins_len;
                }
            }
        }
        new_pos + pos.saturating_sub(old_pos)
    }

    /// Maps several positions at once (spec §4.E `mapPositions`). Each
    /// position may carry its own association in `assocs`; a position
    /// with no corresponding entry defaults to `Assoc::Before`. Positions
    /// are visited in ascending order in one pass over the change list,
    /// rather than re-walking it once per position.
    pub fn map_positions(&self, positions: &[usize], assocs: &[Assoc]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..positions.len()).collect();
        order.sort_by_key(|&i| positions[i]);

        let mut results = vec![0usize; positions.len()];
        let mut old_pos = 0usize;
        let mut new_pos = 0usize;
        let mut changes = self.changes.iter();
        let mut current: Option<(Change, usize)> = None;
        let mut exhausted = false;

        for idx in order {
            let pos = positions[idx];
            let assoc = assocs.get(idx).copied().unwrap_or(Assoc::Before);

            if !exhausted {
                loop {
                    if current.is_none() {
                        match changes.next() {
                            Some(c) => current = Some((c.clone(), 0)),
                            None => {
                                exhausted = true;
                                break;
                            }
                        }
                    }
                    let (change, consumed) = current.as_mut().unwrap();
                    match change {
                        Change::Retain(n) => {
                            let remaining = *n - *consumed;
                            if old_pos + remaining > pos {
                                let delta = pos - old_pos;
                                *consumed += delta;
                                old_pos += delta;
                                new_pos += delta;
                                break;
                            } else {
                                old_pos += remaining;
                                new_pos += remaining;
                                current = None;
                            }
                        }
                        Change::Delete(n) => {
                            let remaining = *n - *consumed;
                            if old_pos + remaining > pos {
                                break;
                            } else {
                                old_pos += remaining;
                                current = None;
                            }
                        }
                        Change::Insert(s) => {
                            if old_pos == pos {
                                break;
                            } else {
                                new_pos += s.chars().count();
                                current = None;
                            }
                        }
                    }
                }
            }

            results[idx] = if exhausted {
                new_pos + pos.saturating_sub(old_pos)
            } else {
                match current.as_ref().unwrap() {
                    (Change::Retain(_), _) => new_pos,
                    (Change::Delete(_), _) => new_pos,
                    (Change::Insert(s), _) => match assoc {
                        Assoc::Before => new_pos,
                        Assoc::After => new_pos + s.chars().count(),
                    },
                }
            };
        }

        results
    }

    /// Rebases `other` (built against the same `len_before` as `self`) so
    /// it applies after `self`, for the two cases this crate resolves
    /// without full operational-transform convergence: either side being
    /// an identity change set (spec §4.E `transform`, a scaffold per the
    /// Non-goals).
    pub fn transform(&self, other: &ChangeSet) -> Result<ChangeSet, RopeError> {
        if self.len_before != other.len_before {
            return Err(RopeError::LengthMismatch {
                expected: self.len_before,
                actual: other.len_before,
            });
        }
        if self.is_identity() {
            return Ok(other.clone());
        }
        if other.is_identity() {
            return Ok(ChangeSet::identity(self.len_after));
        }
        Err(RopeError::TransformUnsupported)
    }

    fn fused(mut self) -> Self {
        let mut out: Vec<Change> = Vec::with_capacity(self.changes.len());
        for change in self.changes.drain(..) {
            match (out.last_mut(), change) {
                (Some(Change::Retain(a)), Change::Retain(b)) => *a += b,
                (Some(Change::Delete(a)), Change::Delete(b)) => *a += b,
                (Some(Change::Insert(a)), Change::Insert(b)) => a.push_str(&b),
                (_, Change::Retain(0)) | (_, Change::Delete(0)) => {}
                (_, Change::Insert(s)) if s.is_empty() => {}
                (_, change) => out.push(change),
            }
        }
        self.changes = out;
        self
    }
}

fn split_str(s: &str, char_idx: usize) -> (String, String) {
    let byte_idx = s
        .char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len());
    (s[..byte_idx].to_string(), s[byte_idx..].to_string())
}

/// Incrementally builds a [`ChangeSet`], fusing adjacent same-kind
/// operations and dropping no-ops as they're pushed.
#[derive(Debug, Clone)]
pub struct ChangeSetBuilder {
    changes: Vec<Change>,
    len_before: usize,
    consumed: usize,
    len_after: usize,
}

impl ChangeSetBuilder {
    /// Starts building a change set meant to apply to a rope of length
    /// `len_before` characters.
    pub fn new(len_before: usize) -> Self {
        ChangeSetBuilder { changes: Vec::new(), len_before, consumed: 0, len_after: 0 }
    }

    fn push(&mut self, change: Change) -> &mut Self {
        match (self.changes.last_mut(), &change) {
            (Some(Change::Retain(a)), Change::Retain(b)) => *a += b,
            (Some(Change::Delete(a)), Change::Delete(b)) => *a += b,
            (Some(Change::Insert(a)), Change::Insert(b)) => a.push_str(b),
            _ => self.changes.push(change),
        }
        self
    }

    /// Keeps the next `n` characters unchanged.
    pub fn retain(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.consumed += n;
        self.len_after += n;
        self.push(Change::Retain(n))
    }

    /// Deletes the next `n` characters.
    pub fn delete(&mut self, n: usize) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.consumed += n;
        self.push(Change::Delete(n))
    }

    /// Inserts `text` at the current position.
    pub fn insert(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        self.len_after += text.chars().count();
        self.push(Change::Insert(text))
    }

    /// Finalizes the builder. Implicitly retains any untouched suffix of
    /// the original rope.
    pub fn finish(mut self) -> ChangeSet {
        if self.consumed < self.len_before {
            let remaining = self.len_before - self.consumed;
            self.len_after += remaining;
            self.push(Change::Retain(remaining));
        }
        ChangeSet { changes: self.changes, len_before: self.len_before, len_after: self.len_after }
    }
}
