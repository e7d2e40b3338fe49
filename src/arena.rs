//! Pipeline arena and string interner
//!
//! The arena owns every byte the compiler produces that must outlive
//! compilation: string literals, identifier names and static names the
//! builtins hand out. It is a blocked bump allocator — a new block doubles
//! the previous block's size, so handing out a new block never moves bytes
//! that were already placed. The region is dropped wholesale with the VM.

use crate::consts::{ARENA_MAX_BLOCKS, ARENA_MIN_BLOCK};
use crate::value::fnv1a;

use std::collections::HashMap;

/// Usage counters of an allocator, surfaced by `gc.stats` and the CLI's
/// `--memory-usage` report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Bytes currently in use.
    pub current: usize,
    /// Bytes handed out over the allocator's lifetime.
    pub allocated: usize,
}

/// Blocked bump allocator for raw bytes.
#[derive(Debug)]
pub struct Bump {
    blocks: Vec<Vec<u8>>,
    total_used: usize,
    total_allocated: usize,
}

/// Location of a byte run inside a [`Bump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    block: u32,
    offset: u32,
    len: u32,
}

impl Bump {
    /// Arena with a single block of at least `min_size` bytes.
    pub fn new(min_size: usize) -> Self {
        let size = min_size.max(ARENA_MIN_BLOCK);
        Self {
            blocks: vec![Vec::with_capacity(size)],
            total_used: 0,
            total_allocated: size,
        }
    }

    /// Copies `bytes` into the arena and returns its location.
    fn push(&mut self, bytes: &[u8]) -> Span {
        let cur = self.blocks.len() - 1;
        let block = &self.blocks[cur];
        if block.len() + bytes.len() > block.capacity() {
            assert!(
                self.blocks.len() < ARENA_MAX_BLOCKS,
                "pipeline arena exhausted its block budget"
            );
            let grown = (block.capacity() * 2).max(bytes.len());
            self.blocks.push(Vec::with_capacity(grown));
            self.total_allocated += grown;
        }
        let cur = self.blocks.len() - 1;
        let block = &mut self.blocks[cur];
        let offset = block.len();
        block.extend_from_slice(bytes);
        self.total_used += bytes.len();
        Span {
            block: cur as u32,
            offset: offset as u32,
            len: bytes.len() as u32,
        }
    }

    fn get(&self, span: Span) -> &[u8] {
        let block = &self.blocks[span.block as usize];
        &block[span.offset as usize..(span.offset + span.len) as usize]
    }

    /// Abandons every byte placed into the arena. Only safe for an owner
    /// that holds no spans across the reset.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
        self.total_used = 0;
    }

    /// Current usage counters.
    pub fn stats(&self) -> Stats {
        Stats {
            current: self.total_used,
            allocated: self.total_allocated,
        }
    }
}

/// Stable handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternId(u32);

impl InternId {
    /// Raw table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct InternEntry {
    span: Span,
    hash: u64,
}

/// Deduplicating string pool on top of [`Bump`].
///
/// Identical byte strings share one [`InternId`]; the hash is computed once
/// at interning and reused by the compiler's global pool and the runtime's
/// map keys.
#[derive(Debug)]
pub struct Interner {
    arena: Bump,
    entries: Vec<InternEntry>,
    by_hash: HashMap<u64, Vec<InternId>>,
}

impl Interner {
    /// Empty interner over a fresh arena.
    pub fn new() -> Self {
        Self {
            arena: Bump::new(ARENA_MIN_BLOCK),
            entries: Vec::new(),
            by_hash: HashMap::new(),
        }
    }

    /// Interns `s`, returning the existing handle when the exact bytes were
    /// seen before.
    pub fn intern(&mut self, s: &str) -> InternId {
        let hash = fnv1a(s.as_bytes());
        if let Some(candidates) = self.by_hash.get(&hash) {
            for id in candidates {
                if self.bytes(*id) == s.as_bytes() {
                    return *id;
                }
            }
        }
        let span = self.arena.push(s.as_bytes());
        let id = InternId(self.entries.len() as u32);
        self.entries.push(InternEntry { span, hash });
        self.by_hash.entry(hash).or_default().push(id);
        id
    }

    /// The interned bytes behind `id`.
    pub fn bytes(&self, id: InternId) -> &[u8] {
        self.arena.get(self.entries[id.index()].span)
    }

    /// The interned bytes behind `id` as UTF-8.
    pub fn str(&self, id: InternId) -> &str {
        // interned from &str, so always valid UTF-8
        std::str::from_utf8(self.bytes(id)).expect("interner holds UTF-8")
    }

    /// Hash computed when `id` was interned.
    pub fn hash(&self, id: InternId) -> u64 {
        self.entries[id.index()].hash
    }

    /// Usage counters of the backing arena.
    pub fn stats(&self) -> Stats {
        self.arena.stats()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedupes() {
        let mut i = Interner::new();
        let a = i.intern("hello");
        let b = i.intern("hello");
        let c = i.intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(i.str(a), "hello");
        assert_eq!(i.str(c), "world");
    }

    #[test]
    fn spans_survive_block_growth() {
        let mut bump = Bump::new(16);
        let first = bump.push(b"0123456789");
        let mut spans = vec![first];
        for _ in 0..200 {
            spans.push(bump.push(&[0xAB; 64]));
        }
        assert_eq!(bump.get(first), b"0123456789");
        for span in &spans[1..] {
            assert_eq!(bump.get(*span), &[0xAB; 64]);
        }
    }

    #[test]
    fn stats_track_usage() {
        let mut i = Interner::new();
        let before = i.stats();
        i.intern("some string content");
        let after = i.stats();
        assert!(after.current > before.current);
        assert!(after.allocated >= after.current);
    }

    #[test]
    fn reset_abandons_contents() {
        let mut bump = Bump::new(16);
        bump.push(b"abc");
        assert_eq!(bump.stats().current, 3);
        bump.reset();
        assert_eq!(bump.stats().current, 0);
    }
}
