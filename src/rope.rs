//! The public [`Rope`] type and its operations (component 4.B).

use std::fmt;
use std::iter::FromIterator;

use crate::config::LeafSizeConfig;
use crate::error::{RopeError, ValidationError};
use crate::hash;
use crate::iter::{Bytes, Chars, Chunks, Lines, Reverse};
use crate::node::{Node, Repr};
use crate::surgery;

/// A persistent, structurally-shared rope over UTF-8 text (spec §4.A/§4.B).
///
/// Every mutator is non-destructive: it returns a new `Rope` sharing all
/// untouched subtrees with `self`. Cloning a `Rope` is `O(1)`.
#[derive(Debug, Clone)]
pub struct Rope {
    pub(crate) root: Node,
}

/// A point-in-time snapshot of a rope's shape, returned by [`Rope::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RopeStats {
    /// Number of Unicode scalar values.
    pub char_len: usize,
    /// Number of UTF-8 bytes.
    pub byte_len: usize,
    /// Number of `\n` bytes.
    pub line_count: usize,
    /// Height of the tree; `0` for a single leaf.
    pub height: u32,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Whether the tree currently satisfies the balance invariant.
    pub is_balanced: bool,
}

impl Rope {
    /// An empty rope.
    pub fn new() -> Self {
        Rope { root: Node::empty() }
    }

    pub(crate) fn from_node(root: Node) -> Self {
        Rope { root }
    }

    /// Number of Unicode scalar values (spec §4.B `length`).
    pub fn len_chars(&self) -> usize {
        self.root.char_len()
    }

    /// Number of UTF-8 bytes (spec §4.B `size`).
    pub fn len_bytes(&self) -> usize {
        self.root.byte_len()
    }

    /// Number of `\n` bytes, i.e. one less than the number of lines unless
    /// the rope is empty (spec §4.B `lineCount`).
    pub fn line_count(&self) -> usize {
        self.root.line_count()
    }

    /// `true` if the rope holds no characters.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), RopeError> {
        if index >= self.len_chars() {
            Err(RopeError::IndexOutOfBounds { index, len: self.len_chars() })
        } else {
            Ok(())
        }
    }

    fn check_bound(&self, index: usize) -> Result<(), RopeError> {
        if index > self.len_chars() {
            Err(RopeError::IndexOutOfBounds { index, len: self.len_chars() })
        } else {
            Ok(())
        }
    }

    /// The character at `index` (spec §4.B `charAt`).
    pub fn char_at(&self, index: usize) -> Result<char, RopeError> {
        self.check_index(index)?;
        Ok(char_at_node(&self.root, index))
    }

    /// The byte at `index` (spec §4.B `byteAt`).
    pub fn byte_at(&self, index: usize) -> Result<u8, RopeError> {
        if index >= self.len_bytes() {
            return Err(RopeError::IndexOutOfBounds { index, len: self.len_bytes() });
        }
        Ok(byte_at_node(&self.root, index))
    }

    /// Returns a new rope over `[start, end)`, character-indexed (spec
    /// §4.B `slice`). Shares structure with `self`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Rope, RopeError> {
        if start > end {
            return Err(RopeError::InvalidRange { start, end });
        }
        self.check_bound(end)?;
        let (_, rest) = surgery::split(&self.root, start)?;
        let (middle, _) = surgery::split(&rest, end - start)?;
        Ok(Rope::from_node(middle))
    }

    /// Splits the rope into two at character index `i` (spec §4.B `split`).
    pub fn split(&self, i: usize) -> Result<(Rope, Rope), RopeError> {
        self.check_bound(i)?;
        let (l, r) = surgery::split(&self.root, i)?;
        Ok((Rope::from_node(l), Rope::from_node(r)))
    }

    /// Inserts `text` at character index `i`, returning a new rope (spec
    /// §4.B `insert`).
    pub fn insert(&self, i: usize, text: &str) -> Result<Rope, RopeError> {
        self.check_bound(i)?;
        if text.is_empty() {
            return Ok(self.clone());
        }
        let (left, right) = surgery::split(&self.root, i)?;
        let middle = Node::new_leaf(text);
        let joined = surgery::concat(surgery::concat(left, middle), right);
        Ok(Rope::from_node(joined))
    }

    /// Removes `[start, end)`, returning a new rope (spec §4.B `delete`).
    pub fn delete(&self, start: usize, end: usize) -> Result<Rope, RopeError> {
        if start > end {
            return Err(RopeError::InvalidRange { start, end });
        }
        self.check_bound(end)?;
        if start == end {
            return Ok(self.clone());
        }
        let (left, rest) = surgery::split(&self.root, start)?;
        let (_, right) = surgery::split(&rest, end - start)?;
        Ok(Rope::from_node(surgery::concat(left, right)))
    }

    /// Replaces `[start, end)` with `text`, returning a new rope (spec
    /// §4.B `replace`).
    pub fn replace(&self, start: usize, end: usize, text: &str) -> Result<Rope, RopeError> {
        if start > end {
            return Err(RopeError::InvalidRange { start, end });
        }
        self.check_bound(end)?;
        let (left, rest) = surgery::split(&self.root, start)?;
        let (_, right) = surgery::split(&rest, end - start)?;
        let joined = if text.is_empty() {
            surgery::concat(left, right)
        } else {
            surgery::concat(surgery::concat(left, Node::new_leaf(text)), right)
        };
        Ok(Rope::from_node(joined))
    }

    /// Concatenates `self` then `other`, sharing both trees' structure
    /// (spec §4.B `appendRope`/`concat`).
    pub fn append_rope(&self, other: &Rope) -> Rope {
        Rope::from_node(surgery::concat(self.root.clone(), other.root.clone()))
    }

    /// Rebalances the tree under the default leaf-size config (spec §4.B
    /// `balance`).
    pub fn balance(&self) -> Rope {
        Rope::from_node(surgery::balance(&self.root))
    }

    /// Rebalances the tree under a caller-supplied leaf-size config, also
    /// coalescing undersized leaves and splitting oversized ones (spec
    /// §4.B `balanceWith`).
    pub fn balance_with(&self, config: &LeafSizeConfig) -> Rope {
        Rope::from_node(surgery::balance_with(&self.root, config))
    }

    /// Alias for [`Rope::balance_with`] under the config [`LeafSizeConfig::suggested`]
    /// picks for the rope's current length (spec §4.B `compact`).
    pub fn compact(&self) -> Rope {
        let config = LeafSizeConfig::suggested(self.len_chars());
        self.balance_with(&config)
    }

    /// `true` if the tree's height is within the "loosely balanced"
    /// ceiling (spec §4.B `isBalanced`).
    pub fn is_balanced(&self) -> bool {
        surgery::is_balanced(&self.root)
    }

    /// Checks every cached-metric and balance invariant, returning the
    /// first violation found (spec §4.B `validate`).
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_node(&self.root)?;
        if !self.is_balanced() {
            return Err(ValidationError::Unbalanced {
                height: self.root.height(),
                ceiling: surgery::height_ceiling(self.len_chars()).max(1),
            });
        }
        Ok(())
    }

    /// A snapshot of the tree's shape (spec §4.B `stats`).
    pub fn stats(&self) -> RopeStats {
        let mut leaves = Vec::new();
        surgery::collect_leaves(&self.root, &mut leaves);
        RopeStats {
            char_len: self.len_chars(),
            byte_len: self.len_bytes(),
            line_count: self.line_count(),
            height: self.root.height(),
            leaf_count: leaves.len().max(1),
            is_balanced: self.is_balanced(),
        }
    }

    /// Content equality: two ropes are equal if they contain the same
    /// bytes, regardless of tree shape (spec §4.B `equals`).
    pub fn equals(&self, other: &Rope) -> bool {
        if self.len_bytes() != other.len_bytes() {
            return false;
        }
        self.chunks_str().eq(other.chunks_str())
    }

    fn chunks_str(&self) -> impl Iterator<Item = char> + '_ {
        self.chars()
    }

    /// A 32-bit content hash, deterministic over the rope's Unicode scalar
    /// values (spec §6 `hashCode32`: "deterministic over Unicode scalars").
    /// Two ropes with the same characters hash equal even if their trees
    /// differ in shape or chunking.
    pub fn hash_code32(&self) -> u32 {
        hash::hash_code32(self.chars().flat_map(|c| (c as u32).to_le_bytes()))
    }

    /// A 64-bit content hash, deterministic over the rope's Unicode scalar
    /// values (spec §6 `hashCode64`).
    pub fn hash_code64(&self) -> u64 {
        hash::hash_code64(self.chars().flat_map(|c| (c as u32).to_le_bytes()))
    }

    /// `hash_code64`, rendered as lowercase hex (spec §6 `hashToString`).
    pub fn hash_to_string(&self) -> String {
        hash::hash_to_string(self.hash_code64())
    }

    /// Reads `r` to exhaustion and builds a rope from its bytes (spec §6
    /// `FromReader`). Fails if `r` itself errors, or at the end if the
    /// accumulated bytes weren't valid UTF-8.
    pub fn from_reader<R: std::io::Read>(mut r: R) -> std::io::Result<Rope> {
        let mut writer = crate::io::Writer::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = std::io::Read::read(&mut r, &mut buf)?;
            if n == 0 {
                break;
            }
            std::io::Write::write_all(&mut writer, &buf[..n])?;
        }
        writer
            .finish()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// Writes this rope's content as bytes to `w` (spec §6 `WriteTo`).
    pub fn write_to<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        let mut reader = crate::io::Reader::new(self);
        std::io::copy(&mut reader, &mut w)?;
        Ok(())
    }

    /// An iterator over non-empty leaf contents, in document order (spec
    /// §4.D `Chunks`).
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(&self.root)
    }

    /// An iterator over bytes, in document order (spec §4.D `Bytes`).
    pub fn bytes(&self) -> Bytes<'_> {
        Bytes::new(&self.root)
    }

    /// An iterator over Unicode scalar values, in document order (spec
    /// §4.D `Characters`).
    pub fn chars(&self) -> Chars<'_> {
        Chars::new(&self.root)
    }

    /// An iterator over Unicode scalar values, from the end of the
    /// document to the start (spec §4.D `Reverse`).
    pub fn reverse(&self) -> Reverse<'_> {
        Reverse::new(&self.root)
    }

    /// An iterator over lines; every element but possibly the last keeps
    /// its trailing `\n` (spec §4.D `Lines`).
    pub fn lines(&self) -> Lines<'_> {
        Lines::new(&self.root)
    }

    /// The char offset where (0-indexed) line `line` starts, found in
    /// O(log n) via the cached per-node newline count.
    pub fn line_to_char(&self, line: usize) -> Result<usize, RopeError> {
        if line > self.line_count() {
            return Err(RopeError::IndexOutOfBounds { index: line, len: self.line_count() });
        }
        Ok(crate::iter::line_to_char(&self.root, line))
    }

    /// An iterator over lines starting at (0-indexed) line `line`, seeking
    /// to it in O(log n) rather than walking every preceding line (spec
    /// §4.D `Lines`, "seeded by newline count...for O(log n) seek").
    pub fn lines_at(&self, line: usize) -> Result<Lines<'_>, RopeError> {
        if line > self.line_count() {
            return Err(RopeError::IndexOutOfBounds { index: line, len: self.line_count() });
        }
        Ok(Lines::seeked(&self.root, line))
    }

    /// Materializes the rope's content as an owned `String`.
    pub fn to_string_lossy(&self) -> String {
        self.chunks().collect()
    }
}

impl Default for Rope {
    fn default() -> Self {
        Rope::new()
    }
}

fn char_at_node(node: &Node, i: usize) -> char {
    match &*node.0 {
        Repr::Leaf(leaf) => leaf.text.chars().nth(i).expect("index checked by caller"),
        Repr::Internal(internal) => {
            let l = internal.left.char_len();
            if i < l {
                char_at_node(&internal.left, i)
            } else {
                char_at_node(&internal.right, i - l)
            }
        }
    }
}

fn byte_at_node(node: &Node, i: usize) -> u8 {
    match &*node.0 {
        Repr::Leaf(leaf) => leaf.text.as_bytes()[i],
        Repr::Internal(internal) => {
            let l = internal.left.byte_len();
            if i < l {
                byte_at_node(&internal.left, i)
            } else {
                byte_at_node(&internal.right, i - l)
            }
        }
    }
}

fn validate_node(node: &Node) -> Result<(), ValidationError> {
    match &*node.0 {
        Repr::Leaf(leaf) => {
            if std::str::from_utf8(leaf.text.as_bytes()).is_err() {
                return Err(ValidationError::InvalidUtf8);
            }
            if leaf.char_len != leaf.text.chars().count() {
                return Err(ValidationError::LeafCountMismatch);
            }
            if leaf.line_count != crate::node::count_newlines(&leaf.text) {
                return Err(ValidationError::LeafCountMismatch);
            }
            Ok(())
        }
        Repr::Internal(internal) => {
            validate_node(&internal.left)?;
            validate_node(&internal.right)?;
            if internal.byte_len != internal.left.byte_len() + internal.right.byte_len()
                || internal.char_len != internal.left.char_len() + internal.right.char_len()
                || internal.line_count != internal.left.line_count() + internal.right.line_count()
            {
                return Err(ValidationError::InternalCountMismatch);
            }
            if internal.height != 1 + internal.left.height().max(internal.right.height()) {
                return Err(ValidationError::HeightMismatch);
            }
            Ok(())
        }
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Rope {}

impl std::hash::Hash for Rope {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for byte in self.bytes() {
            state.write_u8(byte);
        }
    }
}

impl From<&str> for Rope {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Rope::new();
        }
        let config = LeafSizeConfig::default();
        let leaves = surgery::split_oversized_leaf(s, &config);
        Rope::from_node(surgery::rebuild_from_leaves(&leaves))
    }
}

impl From<String> for Rope {
    fn from(s: String) -> Self {
        Rope::from(s.as_str())
    }
}

impl FromIterator<char> for Rope {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        let s: String = iter.into_iter().collect();
        Rope::from(s)
    }
}

impl<'a> FromIterator<&'a str> for Rope {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut rope = Rope::new();
        for piece in iter {
            rope = Rope::from_node(surgery::concat(rope.root, Node::new_leaf(piece)));
        }
        rope
    }
}

impl FromIterator<String> for Rope {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut rope = Rope::new();
        for piece in iter {
            rope = Rope::from_node(surgery::concat(rope.root, Node::new_leaf(&piece)));
        }
        rope
    }
}
