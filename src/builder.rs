//! Deferred-error rope construction (spec §6 "Builder").
//!
//! Every mutator on [`Rope`] itself returns a `Result` immediately. A
//! `RopeBuilder` instead queues a long chain of `insert`/`delete`/
//! `replace` calls against a running rope and defers the first error any
//! of them hit until [`RopeBuilder::build`], so a caller assembling a
//! document from many small edits doesn't have to check each one.

use crate::error::RopeError;
use crate::rope::Rope;

/// A bounded pool of reusable `String` scratch buffers, so builder calls
/// that assemble one character or line at a time (`append_rune`,
/// `append_line`) don't allocate a fresh buffer on every call.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Vec<String>,
    capacity: usize,
}

impl BufferPool {
    /// A pool that holds on to at most `capacity` returned buffers.
    pub fn new(capacity: usize) -> Self {
        BufferPool { buffers: Vec::new(), capacity }
    }

    /// Takes a buffer from the pool, or allocates a fresh empty one.
    pub fn take(&mut self) -> String {
        self.buffers.pop().unwrap_or_default()
    }

    /// Returns `buf` to the pool for reuse, clearing it first. Dropped
    /// instead if the pool is already at capacity.
    pub fn give_back(&mut self, mut buf: String) {
        if self.buffers.len() < self.capacity {
            buf.clear();
            self.buffers.push(buf);
        }
    }

    /// Number of buffers currently held.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// `true` if the pool is holding no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(16)
    }
}

/// Accumulates edits against a base [`Rope`]. `insert`/`delete`/`replace`
/// calls that land out of range record the first such error instead of
/// failing immediately; [`RopeBuilder::build`] surfaces it.
pub struct RopeBuilder {
    current: Rope,
    first_error: Option<RopeError>,
    pending_bytes: Vec<u8>,
    pool: BufferPool,
}

impl RopeBuilder {
    /// A builder starting from an empty rope.
    pub fn new() -> Self {
        RopeBuilder::from_rope(Rope::new())
    }

    /// A builder starting from `rope` instead of an empty one.
    pub fn from_rope(rope: Rope) -> Self {
        RopeBuilder { current: rope, first_error: None, pending_bytes: Vec::new(), pool: BufferPool::default() }
    }

    /// Appends `text` at the end.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.try_mutate(|r| r.insert(r.len_chars(), text))
    }

    /// Appends raw bytes, recording an error if they aren't valid UTF-8.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                let owned = text.to_string();
                self.append(&owned)
            }
            Err(_) => {
                self.record_error(RopeError::NotACharBoundary { index: 0 });
                self
            }
        }
    }

    /// Inserts `text` at character index `pos`. An out-of-range `pos` is
    /// deferred to `build`.
    pub fn insert(&mut self, pos: usize, text: &str) -> &mut Self {
        self.try_mutate(|r| r.insert(pos, text))
    }

    /// Deletes `[start, end)`. An invalid range is deferred to `build`.
    pub fn delete(&mut self, start: usize, end: usize) -> &mut Self {
        self.try_mutate(|r| r.delete(start, end))
    }

    /// Replaces `[start, end)` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> &mut Self {
        self.try_mutate(|r| r.replace(start, end, text))
    }

    /// Appends a single character.
    pub fn append_rune(&mut self, c: char) -> &mut Self {
        let mut buf = self.pool.take();
        buf.push(c);
        self.append(&buf);
        self.pool.give_back(buf);
        self
    }

    /// Appends a single byte, buffering it alongside any previously
    /// buffered bytes until they decode to a complete UTF-8 character. A
    /// byte sequence that can never complete (4 bytes buffered with none
    /// resolving to a character, or a byte that makes the buffer
    /// definitely invalid) records a deferred error and discards the
    /// buffered bytes.
    pub fn append_byte(&mut self, byte: u8) -> &mut Self {
        self.pending_bytes.push(byte);
        match std::str::from_utf8(&self.pending_bytes) {
            Ok(text) => {
                let owned = text.to_string();
                self.pending_bytes.clear();
                self.append(&owned);
            }
            Err(e) if e.error_len().is_some() => {
                self.pending_bytes.clear();
                self.record_error(RopeError::NotACharBoundary { index: 0 });
            }
            Err(_) if self.pending_bytes.len() >= 4 => {
                self.pending_bytes.clear();
                self.record_error(RopeError::NotACharBoundary { index: 0 });
            }
            Err(_) => {} // incomplete sequence so far; wait for more bytes
        }
        self
    }

    /// Appends `text` followed by a newline.
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        let mut buf = self.pool.take();
        buf.push_str(text);
        buf.push('\n');
        self.append(&buf);
        self.pool.give_back(buf);
        self
    }

    /// Appends raw bytes. Alias for [`RopeBuilder::append_bytes`], named
    /// to match the spec's `write` operation.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.append_bytes(bytes)
    }

    /// Appends `text`. Alias for [`RopeBuilder::append`], named to match
    /// the spec's `writeString` operation.
    pub fn write_string(&mut self, text: &str) -> &mut Self {
        self.append(text)
    }

    /// The number of characters accumulated so far.
    pub fn length(&self) -> usize {
        self.current.len_chars()
    }

    /// The number of bytes accumulated so far.
    pub fn size(&self) -> usize {
        self.current.len_bytes()
    }

    /// Discards all accumulated text and any deferred error, starting
    /// back over from an empty rope.
    pub fn reset(&mut self) {
        self.reset_from_rope(Rope::new());
    }

    /// Like [`RopeBuilder::reset`], but starts back over from `rope`.
    pub fn reset_from_rope(&mut self, rope: Rope) {
        self.current = rope;
        self.first_error = None;
        self.pending_bytes.clear();
    }

    /// The pool backing this builder's scratch-buffer reuse.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Consumes the builder. Returns the first error recorded by any
    /// call since the last `reset`/`reset_from_rope`, or the finished
    /// rope if none occurred.
    pub fn build(self) -> Result<Rope, RopeError> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self.current),
        }
    }

    fn try_mutate(&mut self, f: impl FnOnce(&Rope) -> Result<Rope, RopeError>) -> &mut Self {
        match f(&self.current) {
            Ok(rope) => self.current = rope,
            Err(err) => self.record_error(err),
        }
        self
    }

    fn record_error(&mut self, err: RopeError) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }
}

impl Default for RopeBuilder {
    fn default() -> Self {
        RopeBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_concatenates_pushed_pieces() {
        let mut builder = RopeBuilder::new();
        builder.append("hello, ");
        builder.append("world");
        builder.append_rune('!');
        let rope = builder.build().unwrap();
        assert_eq!(rope.to_string_lossy(), "hello, world!");
    }

    #[test]
    fn builder_assembles_one_character_at_a_time() {
        let mut builder = RopeBuilder::new();
        for ch in "the quick brown fox".chars() {
            builder.append_rune(ch);
        }
        let rope = builder.build().unwrap();
        assert_eq!(rope.to_string_lossy(), "the quick brown fox");
    }

    #[test]
    fn append_byte_reassembles_split_multibyte_sequence() {
        let mut builder = RopeBuilder::new();
        for &byte in "caf\u{e9}".as_bytes() {
            builder.append_byte(byte);
        }
        let rope = builder.build().unwrap();
        assert_eq!(rope.to_string_lossy(), "caf\u{e9}");
    }

    #[test]
    fn out_of_range_insert_is_deferred_to_build() {
        let mut builder = RopeBuilder::new();
        builder.append("hello");
        builder.insert(100, "!"); // out of range; recorded, not returned here
        builder.append(" world"); // still applied against the unmodified rope
        let result = builder.build();
        assert!(matches!(result, Err(RopeError::IndexOutOfBounds { index: 100, len: 5 })));
    }

    #[test]
    fn only_the_first_error_is_surfaced() {
        let mut builder = RopeBuilder::new();
        builder.delete(0, 5); // empty rope, out of range: first error
        builder.delete(0, 9); // also out of range, but not the one reported
        assert!(matches!(
            builder.build(),
            Err(RopeError::IndexOutOfBounds { index: 5, len: 0 })
        ));
    }

    #[test]
    fn reset_clears_content_and_deferred_errors() {
        let mut builder = RopeBuilder::new();
        builder.append("scratch");
        builder.delete(0, 100); // deferred error
        builder.reset();
        builder.append("fresh start");
        let rope = builder.build().unwrap();
        assert_eq!(rope.to_string_lossy(), "fresh start");
    }

    #[test]
    fn reset_from_rope_keeps_the_given_base() {
        let base = Rope::from("base ");
        let mut builder = RopeBuilder::new();
        builder.append("discarded");
        builder.reset_from_rope(base.clone());
        builder.append("text");
        let rope = builder.build().unwrap();
        assert_eq!(rope.to_string_lossy(), "base text");
    }

    #[test]
    fn length_and_size_track_accumulated_content() {
        let mut builder = RopeBuilder::new();
        builder.append("caf\u{e9}");
        assert_eq!(builder.length(), 4);
        assert_eq!(builder.size(), 5); // é is two bytes
    }

    #[test]
    fn buffer_pool_reuses_returned_buffers() {
        let mut pool = BufferPool::new(2);
        let a = pool.take();
        pool.give_back(a);
        assert_eq!(pool.len(), 1);
        let b = pool.take();
        assert!(b.is_empty());
        assert_eq!(pool.len(), 0);
    }
}
