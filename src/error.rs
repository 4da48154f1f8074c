//! Error types returned by the core.
//!
//! Per the error-handling policy: every fallible operation *returns* an
//! error value rather than panicking or logging. The core never writes to
//! any log (see `lib.rs` module docs).

use thiserror::Error;

/// An error produced by a fallible [`crate::Rope`] operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RopeError {
    /// A character or byte index was greater than the rope's length.
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The rope's length at the time of the call.
        len: usize,
    },

    /// A range's start was greater than its end.
    #[error("invalid range: start {start} > end {end}")]
    InvalidRange {
        /// The range's start.
        start: usize,
        /// The range's end.
        end: usize,
    },

    /// A caller supplied a byte index into an API that expects a character
    /// index (or vice versa), landing the split point inside a multi-byte
    /// UTF-8 code point.
    #[error("index {index} does not fall on a character boundary")]
    NotACharBoundary {
        /// The offending index.
        index: usize,
    },

    /// A change set's `len_before`/`len_after` didn't match the rope (or
    /// other change set) it was applied, inverted, or composed against.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// The length the operation required.
        expected: usize,
        /// The length actually supplied.
        actual: usize,
    },

    /// [`crate::changeset::ChangeSet::transform`] only handles the two
    /// trivial cases where one side is an identity change set; anything
    /// else is genuine operational-transform territory this crate does
    /// not implement.
    #[error("transform is only implemented for identity change sets")]
    TransformUnsupported,
}

/// The specific invariant that [`crate::Rope::validate`] found broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A leaf's cached counts didn't match the true counts of its bytes.
    #[error("leaf cached counts do not match its content")]
    LeafCountMismatch,

    /// An internal node's cached counts weren't the sum of its children's.
    #[error("internal node cached counts do not match left + right sums")]
    InternalCountMismatch,

    /// An internal node's cached height wasn't `1 + max(child heights)`.
    #[error("internal node cached height does not match its children")]
    HeightMismatch,

    /// A leaf's byte content was not valid UTF-8.
    #[error("leaf contains invalid UTF-8")]
    InvalidUtf8,

    /// The tree exceeded the bounded-height balance invariant.
    #[error("tree is not loosely balanced: height {height} exceeds ceiling {ceiling}")]
    Unbalanced {
        /// The tree's actual height.
        height: u32,
        /// The maximum permitted height.
        ceiling: u32,
    },
}
