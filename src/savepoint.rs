//! Named snapshots (spec §6 "Savepoint manager"): a way to stash a rope
//! under its content hash, tagged with who made it and why, and come back
//! to exactly that state later without walking the undo history tree.

use std::collections::HashMap;

use crate::rope::Rope;

/// Caller-supplied context stored alongside a [`Savepoint`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavepointMetadata {
    pub user_id: Option<String>,
    pub view_id: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

/// A captured rope, keyed by its content hash.
#[derive(Debug, Clone)]
pub struct Savepoint {
    pub rope: Rope,
    /// The history revision index this savepoint corresponds to.
    pub revision_index: usize,
    pub metadata: SavepointMetadata,
    /// Number of outstanding holders; the entry is removed once this
    /// reaches zero via [`SavepointManager::release`].
    pub ref_count: u32,
    pub timestamp: u64,
}

/// How [`SavepointManager::save`] should behave when the content hash it
/// was asked to save already has an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateMode {
    /// Keep the existing entry, but bump its `ref_count`.
    Allow,
    /// Leave the existing entry untouched and don't increment anything.
    Skip,
    /// Discard the existing entry and store the new one with `ref_count`
    /// reset to 1.
    Replace,
}

/// A content-hash-keyed collection of [`Savepoint`]s.
#[derive(Debug, Default, Clone)]
pub struct SavepointManager {
    saved: HashMap<String, Savepoint>,
}

impl SavepointManager {
    /// An empty savepoint manager.
    pub fn new() -> Self {
        SavepointManager { saved: HashMap::new() }
    }

    /// Stores `rope` under its content hash, applying `mode` if an entry
    /// for that hash already exists. Returns the id the savepoint is
    /// stored under.
    pub fn save(
        &mut self,
        rope: Rope,
        revision_index: usize,
        metadata: SavepointMetadata,
        timestamp: u64,
        mode: DuplicateMode,
    ) -> String {
        let id = rope.hash_to_string();
        match self.saved.get_mut(&id) {
            Some(existing) => match mode {
                DuplicateMode::Allow => existing.ref_count += 1,
                DuplicateMode::Skip => {}
                DuplicateMode::Replace => {
                    self.saved.insert(
                        id.clone(),
                        Savepoint { rope, revision_index, metadata, ref_count: 1, timestamp },
                    );
                }
            },
            None => {
                self.saved.insert(
                    id.clone(),
                    Savepoint { rope, revision_index, metadata, ref_count: 1, timestamp },
                );
            }
        }
        id
    }

    /// Looks up a savepoint by id without affecting its `ref_count`.
    pub fn get(&self, id: &str) -> Option<&Savepoint> {
        self.saved.get(id)
    }

    /// Returns the stored rope for `id`, if any.
    pub fn restore(&self, id: &str) -> Option<Rope> {
        self.saved.get(id).map(|sp| sp.rope.clone())
    }

    /// Decrements `id`'s `ref_count`, removing the entry once it reaches
    /// zero. Returns `true` if the entry was removed.
    pub fn release(&mut self, id: &str) -> bool {
        let Some(sp) = self.saved.get_mut(id) else { return false };
        if sp.ref_count <= 1 {
            self.saved.remove(id);
            true
        } else {
            sp.ref_count -= 1;
            false
        }
    }

    /// Savepoints whose metadata names `user_id` as the user.
    pub fn by_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = (&'a str, &'a Savepoint)> {
        self.saved
            .iter()
            .filter(move |(_, sp)| sp.metadata.user_id.as_deref() == Some(user_id))
            .map(|(id, sp)| (id.as_str(), sp))
    }

    /// Savepoints whose metadata includes `tag`.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (&'a str, &'a Savepoint)> {
        self.saved
            .iter()
            .filter(move |(_, sp)| sp.metadata.tags.iter().any(|t| t == tag))
            .map(|(id, sp)| (id.as_str(), sp))
    }

    /// Savepoints taken within `[start, end]` (inclusive) timestamps.
    pub fn by_time_range(&self, start: u64, end: u64) -> impl Iterator<Item = (&str, &Savepoint)> {
        self.saved
            .iter()
            .filter(move |(_, sp)| sp.timestamp >= start && sp.timestamp <= end)
            .map(|(id, sp)| (id.as_str(), sp))
    }

    /// The `limit` most recently taken savepoints, newest first.
    pub fn recent(&self, limit: usize) -> Vec<(&str, &Savepoint)> {
        let mut all: Vec<(&str, &Savepoint)> = self.saved.iter().map(|(id, sp)| (id.as_str(), sp)).collect();
        all.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        all.truncate(limit);
        all
    }

    /// Number of stored savepoints.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// `true` if no savepoints are stored.
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}
