//! Property tests for the rope's structural invariants (spec §8
//! "Quantified invariants"): every mutator should leave the tree
//! balanced-invariant-respecting and round-trip content correctly no
//! matter what string quickcheck throws at it.

use quickcheck_macros::quickcheck;
use ropebuf::Rope;

#[quickcheck]
fn from_str_preserves_content(s: String) -> bool {
    Rope::from(s.as_str()).to_string_lossy() == s
}

#[quickcheck]
fn insert_then_delete_is_identity(s: String, pos: usize, text: String) -> bool {
    let rope = Rope::from(s.as_str());
    let len = rope.len_chars();
    let pos = if len == 0 { 0 } else { pos % (len + 1) };
    let inserted = match rope.insert(pos, &text) {
        Ok(r) => r,
        Err(_) => return false,
    };
    let text_len = text.chars().count();
    let restored = match inserted.delete(pos, pos + text_len) {
        Ok(r) => r,
        Err(_) => return false,
    };
    restored.equals(&rope)
}

#[quickcheck]
fn split_then_append_rope_preserves_content(s: String, at: usize) -> bool {
    let rope = Rope::from(s.as_str());
    let len = rope.len_chars();
    let at = if len == 0 { 0 } else { at % (len + 1) };
    let (left, right) = rope.split(at).expect("at is in bounds by construction");
    left.append_rope(&right).equals(&rope)
}

#[quickcheck]
fn balance_is_content_preserving_and_idempotent(s: String) -> bool {
    let rope = Rope::from(s.as_str());
    let once = rope.balance();
    let twice = once.balance();
    once.equals(&rope) && twice.equals(&once) && once.is_balanced() && twice.is_balanced()
}

#[quickcheck]
fn hash_is_consistent_with_equals(a: String, b: String) -> bool {
    let ra = Rope::from(a.as_str());
    let rb = Rope::from(b.as_str());
    if ra.equals(&rb) {
        ra.hash_code64() == rb.hash_code64() && ra.hash_code32() == rb.hash_code32()
    } else {
        true
    }
}

#[quickcheck]
fn chars_iterator_reassembles_the_string(s: String) -> bool {
    let rope = Rope::from(s.as_str());
    let collected: String = rope.chars().collect();
    collected == s
}

#[quickcheck]
fn reverse_iterator_is_chars_reversed(s: String) -> bool {
    let rope = Rope::from(s.as_str());
    let forward: Vec<char> = rope.chars().collect();
    let backward: Vec<char> = rope.reverse().collect();
    let mut expected = forward;
    expected.reverse();
    backward == expected
}

#[quickcheck]
fn validate_accepts_every_built_rope(s: String) -> bool {
    let rope = Rope::from(s.as_str());
    rope.validate().is_ok() && rope.balance().validate().is_ok()
}
