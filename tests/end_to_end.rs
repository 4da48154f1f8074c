//! End-to-end scenarios (spec §8): the public API exercised the way an
//! editor built on top of this crate actually would, rather than one
//! operation at a time.

use std::sync::{Arc, Mutex};

use ropebuf::{
    Assoc, ChangeSetBuilder, DuplicateMode, History, Hook, HookContext, HookKind, HookManager, Range, Rope,
    SavepointManager, SavepointMetadata, Selection, Transaction,
};

#[test]
fn insert_then_undo_restores_original_content() {
    let rope0 = Rope::from("the quick fox");
    let mut history = History::new(0, 50);

    let tx = Transaction::insert_at_eof(&rope0, " jumps", 1);
    let rope1 = tx.apply(&rope0).unwrap();
    let inverse = tx.invert(&rope0, None, 1).unwrap();
    history.commit(tx, inverse, 1);

    assert_eq!(rope1.to_string_lossy(), "the quick fox jumps");
    let undo = history.undo().expect("one commit was made");
    let restored = undo.apply(&rope1).unwrap();
    assert!(restored.equals(&rope0));
    assert!(!history.can_undo());
}

#[test]
fn multibyte_replace_keeps_char_boundaries_intact() {
    // "caf\u{e9} hi \u{4e16}\u{754c}" is "café hi 世界"; char index 8 lands
    // right before the two-byte-per-char "世界", well inside the string's
    // multi-byte prefix in byte terms.
    let rope = Rope::from("caf\u{e9} hi \u{4e16}\u{754c}");
    assert_eq!(rope.len_chars(), 10);
    let replaced = rope.replace(8, 10, "world").unwrap();
    assert_eq!(replaced.to_string_lossy(), "caf\u{e9} hi world");
    assert!(replaced.validate().is_ok());
}

#[test]
fn split_then_concat_round_trips_through_many_cuts() {
    let original = Rope::from("abcdefghijklmnopqrstuvwxyz");
    let mut pieces = Vec::new();
    let mut rest = original.clone();
    for cut in [5, 3, 10, 2] {
        let (left, right) = rest.split(cut.min(rest.len_chars())).unwrap();
        pieces.push(left);
        rest = right;
    }
    pieces.push(rest);

    let mut rejoined = Rope::new();
    for piece in &pieces {
        rejoined = rejoined.append_rope(piece);
    }
    assert!(rejoined.equals(&original));
}

#[test]
fn composed_changesets_match_applying_each_in_turn() {
    let rope = Rope::from("hello world");

    let mut b1 = ChangeSetBuilder::new(rope.len_chars());
    b1.retain(5).insert(",").retain(6);
    let cs1 = b1.finish();
    let after1 = cs1.apply(&rope).unwrap();

    let mut b2 = ChangeSetBuilder::new(after1.len_chars());
    b2.retain(6).delete(6).insert("there");
    let cs2 = b2.finish();
    let after2 = cs2.apply(&after1).unwrap();

    let composed = cs1.compose(&cs2).unwrap();
    let direct = composed.apply(&rope).unwrap();
    assert!(direct.equals(&after2));
}

#[test]
fn selection_tracks_an_edit_made_before_it() {
    let rope = Rope::from("foo = 1; bar = 2;");
    let selection = Selection::point(12); // inside "bar"
    let mut builder = ChangeSetBuilder::new(rope.len_chars());
    builder.retain(6).insert("_value");
    let cs = builder.finish();
    let mapped = selection.map(&cs);
    assert_eq!(mapped.primary(), Range::point(18));
    assert_eq!(cs.map_position(12, Assoc::Before), 18);
}

#[test]
fn branching_history_lets_an_abandoned_branch_be_revisited() {
    let mut history = History::new(0, 50);
    let rope0 = Rope::from("v0");

    let tx_a = Transaction::insert_at_eof(&rope0, "-a", 1);
    let rope_a = tx_a.apply(&rope0).unwrap();
    let inv_a = tx_a.invert(&rope0, None, 1).unwrap();
    let rev_a = history.commit(tx_a, inv_a, 1);

    history.undo();

    let tx_b = Transaction::insert_at_eof(&rope0, "-b", 2);
    let rope_b = tx_b.apply(&rope0).unwrap();
    let inv_b = tx_b.invert(&rope0, None, 2).unwrap();
    history.commit(tx_b, inv_b, 2);

    let op = history.goto_revision(rev_a).unwrap().expect("rev_a and the current revision differ");
    let rope = op.apply(&rope_b).unwrap();
    assert!(rope.equals(&rope_a));
}

#[test]
fn balance_after_a_thousand_small_appends_stays_balanced() {
    let mut rope = Rope::new();
    for i in 0..1000 {
        rope = rope.insert(rope.len_chars(), &format!("w{i} ")).unwrap();
    }
    let balanced = rope.compact();
    assert!(balanced.is_balanced());
    assert!(balanced.equals(&rope));
    assert!(balanced.validate().is_ok());
}

#[test]
fn list_based_change_and_delete_drop_and_merge_overlaps() {
    let rope = Rope::from("the quick brown fox");

    let changed = Transaction::change(
        &rope,
        &[
            (4, 9, "slow".to_string()),
            (6, 11, "lazy".to_string()), // overlaps the kept [4,9) edit, dropped
            (16, 19, "cat".to_string()),
        ],
        1,
    );
    let edited = changed.apply(&rope).unwrap();
    assert_eq!(edited.to_string_lossy(), "the slow brown cat");

    let deleted = Transaction::delete(&edited, &[(4, 9), (6, 14)], 2);
    let result = deleted.apply(&edited).unwrap();
    assert_eq!(result.to_string_lossy(), "the  cat");
}

struct RecordingHook(Arc<Mutex<Vec<String>>>);

impl Hook for RecordingHook {
    fn call(&self, ctx: &HookContext) {
        self.0.lock().unwrap().push(ctx.after.to_string_lossy());
    }
}

#[test]
fn hooks_and_savepoints_observe_and_recall_committed_state() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookManager::new();
    hooks.register(HookKind::AfterEdit, "recorder", 0, Arc::new(RecordingHook(log.clone())));

    let mut savepoints = SavepointManager::new();
    let mut history = History::new(0, 50);

    let rope0 = Rope::from("draft");
    let start_meta = SavepointMetadata { description: Some("start".to_string()), ..Default::default() };
    let start_id = savepoints.save(rope0.clone(), history.current(), start_meta, 0, DuplicateMode::Allow);

    let tx = Transaction::insert_at_eof(&rope0, " v2", 1);
    let rope1 = tx.apply(&rope0).unwrap();
    let inverse = tx.invert(&rope0, None, 1).unwrap();
    let rev = history.commit(tx.clone(), inverse, 1);
    hooks.notify_commit(&rope0, &rope1, &tx);
    let after_meta = SavepointMetadata { description: Some("after-v2".to_string()), ..Default::default() };
    savepoints.save(rope1.clone(), rev, after_meta, 1, DuplicateMode::Allow);

    assert_eq!(log.lock().unwrap().as_slice(), ["draft v2"]);
    let restored = savepoints.get(&start_id).unwrap();
    assert!(restored.rope.equals(&rope0));
    assert_eq!(restored.revision_index, 0);
}
