//! Leaf and internal node types (component 4.A).
//!
//! Nodes are immutable once published and reference-counted so that
//! sibling ropes can share subtrees without copying (spec §9, "Immutable
//! persistent tree with sharing"). `Arc` rather than `Rc` because readers
//! of independent `Rope`s may run on different threads (spec §5: "multiple
//! independent readers may traverse the same Rope in parallel without
//! synchronization").

use std::sync::Arc;

/// Suggested leaf-size band, in bytes. See spec §9's "Default `MaxLeafSize`"
/// open question.
pub const DEFAULT_MAX_LEAF_SIZE: usize = 1024;
/// Suggested lower bound. Leaves smaller than this are legal but get
/// healed by balancing.
pub const DEFAULT_MIN_LEAF_SIZE: usize = DEFAULT_MAX_LEAF_SIZE / 4;

/// A leaf holding a contiguous UTF-8 byte buffer, plus cached metrics.
#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub(crate) text: Box<str>,
    pub(crate) char_len: usize,
    pub(crate) line_count: usize,
}

impl Leaf {
    pub(crate) fn new(text: &str) -> Self {
        Leaf {
            text: Box::from(text),
            char_len: text.chars().count(),
            line_count: count_newlines(text),
        }
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.text.len()
    }
}

#[inline]
pub(crate) fn count_newlines(s: &str) -> usize {
    s.as_bytes().iter().filter(|&&b| b == b'\n').count()
}

/// An internal node: owns two non-null children and caches the sums of
/// their metrics plus the subtree height.
#[derive(Debug, Clone)]
pub(crate) struct Internal {
    pub(crate) left: Node,
    pub(crate) right: Node,
    pub(crate) byte_len: usize,
    pub(crate) char_len: usize,
    pub(crate) line_count: usize,
    pub(crate) height: u32,
}

/// The tagged node representation. Never mutated after construction;
/// mutators build new `Repr`s and wrap them in fresh `Node`s.
#[derive(Debug, Clone)]
pub(crate) enum Repr {
    Leaf(Leaf),
    Internal(Internal),
}

/// A cheaply-clonable handle to a node. Cloning a `Node` bumps a reference
/// count; it never copies text.
#[derive(Debug, Clone)]
pub(crate) struct Node(pub(crate) Arc<Repr>);

impl Node {
    /// Constructs a new leaf node from a UTF-8 string slice.
    pub(crate) fn new_leaf(text: &str) -> Self {
        Node(Arc::new(Repr::Leaf(Leaf::new(text))))
    }

    /// Constructs a new internal node over `left` and `right`. Neither
    /// child may be replaced afterward; build a new internal node instead.
    pub(crate) fn new_internal(left: Node, right: Node) -> Self {
        let byte_len = left.byte_len() + right.byte_len();
        let char_len = left.char_len() + right.char_len();
        let line_count = left.line_count() + right.line_count();
        let height = 1 + left.height().max(right.height());
        Node(Arc::new(Repr::Internal(Internal {
            left,
            right,
            byte_len,
            char_len,
            line_count,
            height,
        })))
    }

    /// The empty leaf, used as the root of an empty rope and as the
    /// sentinel produced by splitting at an end.
    pub(crate) fn empty() -> Self {
        Node::new_leaf("")
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(&*self.0, Repr::Leaf(_))
    }

    #[inline]
    pub(crate) fn char_len(&self) -> usize {
        match &*self.0 {
            Repr::Leaf(l) => l.char_len,
            Repr::Internal(i) => i.char_len,
        }
    }

    #[inline]
    pub(crate) fn byte_len(&self) -> usize {
        match &*self.0 {
            Repr::Leaf(l) => l.byte_len(),
            Repr::Internal(i) => i.byte_len,
        }
    }

    #[inline]
    pub(crate) fn line_count(&self) -> usize {
        match &*self.0 {
            Repr::Leaf(l) => l.line_count,
            Repr::Internal(i) => i.line_count,
        }
    }

    #[inline]
    pub(crate) fn height(&self) -> u32 {
        match &*self.0 {
            Repr::Leaf(_) => 0,
            Repr::Internal(i) => i.height,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Pointer identity, used by `Rope::clone`/sharing tests: two `Node`s
    /// produced by sharing point at the same allocation.
    #[inline]
    #[allow(dead_code)]
    pub(crate) fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
