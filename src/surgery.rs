//! Tree surgery: split, concat, balance, compaction (component 4.C).
//!
//! Not part of the public API; consumed by [`crate::Rope`]'s mutators.
//! Grounded on the teacher's `BranchNode::split`/`Node::rebalance`
//! (`examples/an-cabal-an-rope/src/internals.rs`), generalized from the
//! teacher's pluggable `Metric` trait to the concrete character-index
//! walk the spec actually calls for (see `DESIGN.md`).

use crate::config::LeafSizeConfig;
use crate::error::RopeError;
use crate::node::{Leaf, Node, Repr};

/// Height ceiling for the "loosely balanced" invariant: spec §4.B
/// `isBalanced`, `2·⌈log₂(length+1)⌉`.
pub(crate) fn height_ceiling(char_len: usize) -> u32 {
    let n = (char_len + 1) as f64;
    (2.0 * n.log2().ceil()) as u32
}

pub(crate) fn is_balanced(node: &Node) -> bool {
    node.height() <= height_ceiling(node.char_len()).max(1)
}

/// Converts a character index within a leaf's text into a byte index.
/// `idx == leaf.char_len` is valid and yields the leaf's byte length.
fn leaf_char_to_byte(leaf: &Leaf, idx: usize) -> Result<usize, RopeError> {
    if idx == leaf.char_len {
        return Ok(leaf.byte_len());
    }
    leaf.text
        .char_indices()
        .nth(idx)
        .map(|(b, _)| b)
        .ok_or(RopeError::NotACharBoundary { index: idx })
}

/// Splits `node` into a `(left, right)` pair at character index `i`,
/// sharing all untouched subtrees with `node` (spec §4.B "Split
/// algorithm").
pub(crate) fn split(node: &Node, i: usize) -> Result<(Node, Node), RopeError> {
    debug_assert!(i <= node.char_len());
    match &*node.0 {
        Repr::Leaf(leaf) => {
            let byte_idx = leaf_char_to_byte(leaf, i)?;
            let left = Node::new_leaf(&leaf.text[..byte_idx]);
            let right = Node::new_leaf(&leaf.text[byte_idx..]);
            Ok((left, right))
        }
        Repr::Internal(internal) => {
            let l = internal.left.char_len();
            if i == 0 {
                Ok((Node::empty(), node.clone()))
            } else if i == l + internal.right.char_len() {
                Ok((node.clone(), Node::empty()))
            } else if i <= l {
                let (ll, lr) = split(&internal.left, i)?;
                let right = if lr.is_empty() {
                    internal.right.clone()
                } else {
                    concat(lr, internal.right.clone())
                };
                Ok((ll, right))
            } else {
                let (rl, rr) = split(&internal.right, i - l)?;
                let left = if rl.is_empty() {
                    internal.left.clone()
                } else {
                    concat(internal.left.clone(), rl)
                };
                Ok((left, rr))
            }
        }
    }
}

const ROTATION_SLACK: u32 = 4;

/// Concatenates `a` then `b`, fusing adjacent small leaves and triggering
/// a local rebalance if the naive concatenation would be extremely
/// unbalanced (spec §4.B "Concat").
pub(crate) fn concat(a: Node, b: Node) -> Node {
    concat_with(a, b, &LeafSizeConfig::default())
}

pub(crate) fn concat_with(a: Node, b: Node, config: &LeafSizeConfig) -> Node {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    if let (Repr::Leaf(la), Repr::Leaf(lb)) = (&*a.0, &*b.0) {
        if la.byte_len() + lb.byte_len() <= config.max {
            let mut fused = String::with_capacity(la.byte_len() + lb.byte_len());
            fused.push_str(&la.text);
            fused.push_str(&lb.text);
            return Node::new_leaf(&fused);
        }
    }
    let joined = Node::new_internal(a, b);
    let ceiling = height_ceiling(joined.char_len()).max(1) + ROTATION_SLACK;
    if joined.height() > ceiling {
        balance_with(&joined, config)
    } else {
        joined
    }
}

/// In-order collection of leaf nodes (spec §4.C `rebuildFromLeaves` takes
/// the byte-range list this produces).
pub(crate) fn collect_leaves(node: &Node, out: &mut Vec<Node>) {
    match &*node.0 {
        Repr::Leaf(leaf) => {
            if leaf.byte_len() > 0 {
                out.push(node.clone());
            }
        }
        Repr::Internal(internal) => {
            collect_leaves(&internal.left, out);
            collect_leaves(&internal.right, out);
        }
    }
}

/// Bottom-up balanced rebuild from a flat list of leaves (spec §4.C).
pub(crate) fn rebuild_from_leaves(leaves: &[Node]) -> Node {
    if leaves.is_empty() {
        return Node::empty();
    }
    fn reduce(leaves: &[Node]) -> Node {
        match leaves.len() {
            1 => leaves[0].clone(),
            n => {
                let mid = n / 2;
                let left = reduce(&leaves[..mid]);
                let right = reduce(&leaves[mid..]);
                Node::new_internal(left, right)
            }
        }
    }
    reduce(leaves)
}

/// Merges adjacent leaves smaller than `config.min` with neighbours while
/// the merged size stays within `config.max` (spec §4.C
/// `coalesceSmallLeaves`).
pub(crate) fn coalesce_small_leaves(leaves: Vec<Node>, config: &LeafSizeConfig) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        let leaf_is_small = leaf.byte_len() < config.min;
        match out.last() {
            Some(prev)
                if (leaf_is_small || prev.byte_len() < config.min)
                    && prev.byte_len() + leaf.byte_len() <= config.max =>
            {
                let merged = concat_strings(prev, &leaf);
                *out.last_mut().unwrap() = merged;
            }
            _ => out.push(leaf),
        }
    }
    out
}

fn concat_strings(a: &Node, b: &Node) -> Node {
    let (Repr::Leaf(la), Repr::Leaf(lb)) = (&*a.0, &*b.0) else {
        unreachable!("coalesce_small_leaves only ever sees leaves")
    };
    let mut s = String::with_capacity(la.byte_len() + lb.byte_len());
    s.push_str(&la.text);
    s.push_str(&lb.text);
    Node::new_leaf(&s)
}

/// Splits an oversized leaf's text into chunks no larger than
/// `config.max` bytes, cutting only on character boundaries (spec §4.C
/// `splitOversizedLeaf`).
pub(crate) fn split_oversized_leaf(text: &str, config: &LeafSizeConfig) -> Vec<Node> {
    if text.len() <= config.max {
        return vec![Node::new_leaf(text)];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + config.max).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single character exceeds config.max bytes (degenerate
            // config); take it whole rather than split mid-codepoint.
            let mut next = start + 1;
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            end = next;
        }
        chunks.push(Node::new_leaf(&text[start..end]));
        start = end;
    }
    chunks
}

/// Full rebalance: flattens to leaves and rebuilds bottom-up, honoring the
/// default leaf-size config (spec §4.B `balance`).
pub(crate) fn balance(node: &Node) -> Node {
    balance_with(node, &LeafSizeConfig::default())
}

/// Rebalance that additionally coalesces undersized leaves and splits
/// oversized ones (spec §4.B `balanceWith(config)`).
pub(crate) fn balance_with(node: &Node, config: &LeafSizeConfig) -> Node {
    let mut leaves = Vec::new();
    collect_leaves(node, &mut leaves);
    let mut resized = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        if let Repr::Leaf(l) = &*leaf.0 {
            if l.byte_len() > config.max {
                resized.extend(split_oversized_leaf(&l.text, config));
                continue;
            }
        }
        resized.push(leaf);
    }
    let coalesced = coalesce_small_leaves(resized, config);
    rebuild_from_leaves(&coalesced)
}
