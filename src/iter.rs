//! Lazy, forward (and one reverse) cursors over a [`crate::Rope`]
//! (component 4.D).
//!
//! All iterators are restartable by re-construction and non-invalidating,
//! because the underlying tree is immutable (spec §4.D). They share the
//! "explicit stack of node references" cursor shape called for in spec §9
//! rather than parent back-pointers, so independent iterators over the
//! same rope never interfere.

use smallvec::SmallVec;

use crate::node::{Node, Repr};

type Stack<'a> = SmallVec<[&'a Node; 8]>;

/// Descends to the leaf holding char offset `target`, in O(log n) using the
/// cached per-node `char_len`, and returns the stack that resumes document
/// order from there plus the number of chars to skip inside the first leaf
/// it yields. Used to seed iterators at a mid-document starting point
/// without a linear scan from the root.
fn seek_to_char<'a>(root: &'a Node, mut target: usize) -> (Stack<'a>, usize) {
    let mut stack: Stack<'a> = Stack::new();
    let mut node = root;
    loop {
        match &*node.0 {
            Repr::Leaf(_) => {
                stack.push(node);
                return (stack, target);
            }
            Repr::Internal(internal) => {
                let l = internal.left.char_len();
                if target < l {
                    stack.push(&internal.right);
                    node = &internal.left;
                } else {
                    target -= l;
                    node = &internal.right;
                }
            }
        }
    }
}

/// One element per non-empty leaf, in document order.
pub struct Chunks<'a> {
    stack: Stack<'a>,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        let mut stack = Stack::new();
        stack.push(root);
        Chunks { stack }
    }

    fn seeded(stack: Stack<'a>) -> Self {
        Chunks { stack }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(node) = self.stack.pop() {
            match &*node.0 {
                Repr::Leaf(leaf) => {
                    if leaf.byte_len() > 0 {
                        return Some(&leaf.text);
                    }
                }
                Repr::Internal(internal) => {
                    self.stack.push(&internal.right);
                    self.stack.push(&internal.left);
                }
            }
        }
        None
    }
}

/// Octets plus the current byte index, backed by [`Chunks`].
pub struct Bytes<'a> {
    chunks: Chunks<'a>,
    current: Option<&'a str>,
    in_chunk: usize,
    pos: usize,
}

impl<'a> Bytes<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Bytes {
            chunks: Chunks::new(root),
            current: None,
            in_chunk: 0,
            pos: 0,
        }
    }

    /// The byte index one past the last element returned by `next()`.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Bytes<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            if let Some(s) = self.current {
                if self.in_chunk < s.len() {
                    let b = s.as_bytes()[self.in_chunk];
                    self.in_chunk += 1;
                    self.pos += 1;
                    return Some(b);
                }
            }
            self.current = self.chunks.next();
            self.in_chunk = 0;
            self.current?;
        }
    }
}

/// Unicode scalar values plus the current character index, decoded from
/// chunks on demand.
pub struct Chars<'a> {
    chunks: Chunks<'a>,
    current: std::str::Chars<'a>,
    pos: usize,
}

impl<'a> Chars<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Chars {
            chunks: Chunks::new(root),
            current: "".chars(),
            pos: 0,
        }
    }

    /// Starts iteration at char offset `at`, descending in O(log n) via
    /// `seek_to_char` instead of walking every char before it.
    pub(crate) fn seeked(root: &'a Node, at: usize) -> Self {
        let (stack, skip) = seek_to_char(root, at);
        let mut chunks = Chunks::seeded(stack);
        let mut current = "".chars();
        if let Some(s) = chunks.next() {
            current = s.chars();
            for _ in 0..skip {
                current.next();
            }
        }
        Chars { chunks, current, pos: at }
    }

    /// The character index one past the last element returned by `next()`.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Chars<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.current.next() {
                self.pos += 1;
                return Some(c);
            }
            match self.chunks.next() {
                Some(s) => self.current = s.chars(),
                None => return None,
            }
        }
    }
}

/// Scalar values from the end of the rope to the start.
pub struct Reverse<'a> {
    stack: Stack<'a>,
    current: std::iter::Rev<std::str::Chars<'a>>,
    pos: usize,
}

impl<'a> Reverse<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        let mut stack = Stack::new();
        stack.push(root);
        Reverse {
            stack,
            current: "".chars().rev(),
            pos: 0,
        }
    }

    fn next_leaf(&mut self) -> Option<&'a str> {
        while let Some(node) = self.stack.pop() {
            match &*node.0 {
                Repr::Leaf(leaf) => {
                    if leaf.byte_len() > 0 {
                        return Some(&leaf.text);
                    }
                }
                Repr::Internal(internal) => {
                    // push left then right so popping yields right first:
                    // document order is left-then-right, so reverse order
                    // is right-then-left.
                    self.stack.push(&internal.left);
                    self.stack.push(&internal.right);
                }
            }
        }
        None
    }

    /// The number of elements returned so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Reverse<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.current.next() {
                self.pos += 1;
                return Some(c);
            }
            match self.next_leaf() {
                Some(s) => self.current = s.chars().rev(),
                None => return None,
            }
        }
    }
}

/// Descends to the start of (0-indexed) line `line` in O(log n) using the
/// cached per-node `line_count`, returning its char offset. `line ==
/// line_count()` lands one past the final newline, the start of the
/// trailing unterminated line.
pub(crate) fn line_to_char(root: &Node, line: usize) -> usize {
    line_to_char_node(root, line)
}

fn line_to_char_node(node: &Node, line: usize) -> usize {
    match &*node.0 {
        Repr::Leaf(leaf) => {
            if line == 0 {
                return 0;
            }
            let mut chars_seen = 0;
            let mut newlines_seen = 0;
            for c in leaf.text.chars() {
                chars_seen += 1;
                if c == '\n' {
                    newlines_seen += 1;
                    if newlines_seen == line {
                        return chars_seen;
                    }
                }
            }
            chars_seen
        }
        Repr::Internal(internal) => {
            let left_lines = internal.left.line_count();
            if line <= left_lines {
                line_to_char_node(&internal.left, line)
            } else {
                internal.left.char_len() + line_to_char_node(&internal.right, line - left_lines)
            }
        }
    }
}

/// One line per element. The trailing line (if the rope doesn't end in a
/// newline) lacks a terminator; every other element keeps its `\n`.
pub struct Lines<'a> {
    chars: Chars<'a>,
    done: bool,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Lines {
            chars: Chars::new(root),
            done: false,
        }
    }

    /// Starts iteration at (0-indexed) line `line`, seeking to it in O(log
    /// n) via the internal-node newline-count cache rather than scanning
    /// every line before it.
    pub(crate) fn seeked(root: &'a Node, line: usize) -> Self {
        let at = line_to_char(root, line);
        Lines {
            chars: Chars::seeked(root, at),
            done: false,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let mut buf = String::new();
        let mut saw_any = false;
        loop {
            match self.chars.next() {
                Some(c) => {
                    saw_any = true;
                    buf.push(c);
                    if c == '\n' {
                        return Some(buf);
                    }
                }
                None => {
                    self.done = true;
                    return if saw_any { Some(buf) } else { None };
                }
            }
        }
    }
}
