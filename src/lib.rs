//! A persistent rope for large text documents, with a transactional
//! editing model and a branching revision history.
//!
//! The core (this crate minus [`hooks`] and [`savepoint`]) never writes
//! to any log and never panics on bad input; every fallible operation
//! returns a [`error::RopeError`] or [`error::ValidationError`]. Logging
//! is strictly an opt-in, external concern: wire up a [`hooks::Hook`] if
//! you want commits observed.
//!
//! # Layout
//!
//! - [`node`]/[`surgery`] — the immutable, `Arc`-shared tree and the
//!   split/concat/balance operations over it.
//! - [`rope`] — the public [`Rope`] handle and its operations.
//! - [`iter`] — chunk/byte/character/line cursors over a `Rope`.
//! - [`changeset`] — `ChangeSet` algebra: apply, invert, compose, map
//!   positions.
//! - [`transaction`]/[`selection`] — a change set paired with the
//!   selection it leaves behind, plus selection-aware builders.
//! - [`history`] — branching undo/redo over committed transactions.
//! - [`builder`]/[`io`] — incremental construction and `std::io`
//!   adapters.
//! - [`hooks`]/[`savepoint`] — external-facing observability and
//!   snapshotting; the only modules allowed to log.

pub mod builder;
pub mod changeset;
pub mod config;
pub mod error;
pub mod history;
pub mod hooks;
pub mod io;
pub mod iter;
mod node;
pub mod rope;
pub mod savepoint;
pub mod selection;
mod surgery;
pub mod transaction;

mod hash;

pub use changeset::{Assoc, Change, ChangeSet, ChangeSetBuilder};
pub use config::LeafSizeConfig;
pub use error::{RopeError, ValidationError};
pub use history::{History, HistoryError, HistoryStats};
pub use hooks::{Hook, HookContext, HookKind, HookManager, LoggingHook};
pub use io::{Reader, Writer};
pub use rope::{Rope, RopeStats};
pub use savepoint::{DuplicateMode, Savepoint, SavepointManager, SavepointMetadata};
pub use selection::{Range, Selection};
pub use transaction::Transaction;

#[cfg(test)]
mod tests {
    use super::*;

    /// An end-to-end scenario exercising rope mutation, transactions, and
    /// branching history together.
    #[test]
    fn insert_then_undo_via_history() {
        let mut history = History::new(0, 100);
        let rope0 = Rope::from("hello");

        let tx = Transaction::insert_at_eof(&rope0, " world", 1);
        let rope1 = tx.apply(&rope0).unwrap();
        let inverse = tx.invert(&rope0, None, 1).unwrap();
        history.commit(tx, inverse, 1);

        assert_eq!(rope1.to_string_lossy(), "hello world");

        let undo = history.undo().unwrap();
        let restored = undo.apply(&rope1).unwrap();
        assert!(restored.equals(&rope0));
    }

    #[test]
    fn balance_after_many_appends_stays_within_height_ceiling() {
        let mut rope = Rope::new();
        for i in 0..1000 {
            rope = rope.insert(rope.len_chars(), &format!("{i} ")).unwrap();
        }
        let balanced = rope.balance();
        assert!(balanced.is_balanced());
        assert!(balanced.equals(&rope));
    }
}
