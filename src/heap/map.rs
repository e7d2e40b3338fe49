//! Open-addressed hash map
//!
//! Keys are string views identified by their precomputed hash; a slot with
//! `hash == 0` is empty. Capacity is a power of two, collisions are resolved
//! by linear probing and the table grows at 3/4 load. Insertion order is not
//! preserved.

use crate::value::{StrRef, Value};

/// Smallest non-empty table capacity.
const MAP_DEFAULT_SIZE: usize = 8;

/// One occupied or empty slot.
#[derive(Debug, Clone, Copy)]
pub struct MapEntry {
    /// Key hash; `0` marks the slot empty.
    pub hash: u64,
    /// Key storage, kept for iteration and for the collector.
    pub key: StrRef,
    /// The entry's value.
    pub value: Value,
}

impl MapEntry {
    const EMPTY: Self = Self {
        hash: 0,
        key: StrRef::Heap(crate::heap::HeapRef::new(0)),
        value: Value::NONE,
    };
}

/// Hashed `Str -> Value` map.
#[derive(Debug, Default)]
pub struct Map {
    entries: Vec<MapEntry>,
    len: usize,
    /// Object literals are built through pairwise appends; a key waits here
    /// until its value arrives.
    pub pending_key: Option<(StrRef, u64)>,
}

impl Map {
    /// Empty map; allocates on first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty map sized for `cap` entries without growing.
    pub fn with_capacity(cap: usize) -> Self {
        let mut m = Self::default();
        if cap > 0 {
            m.entries = vec![MapEntry::EMPTY; (cap * 2).next_power_of_two()];
        }
        m
    }

    /// Occupied entry count.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` when nothing was inserted yet.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts or overwrites the entry for `hash`.
    pub fn insert(&mut self, key: StrRef, hash: u64, value: Value) {
        debug_assert_ne!(hash, 0, "0 is the empty-slot sentinel");
        if self.entries.is_empty() || (self.len + 1) * 4 > self.entries.len() * 3 {
            self.grow();
        }
        let mask = self.entries.len() - 1;
        let mut at = hash as usize & mask;
        loop {
            let entry = &mut self.entries[at];
            if entry.hash == 0 || entry.hash == hash {
                if entry.hash == 0 {
                    self.len += 1;
                }
                *entry = MapEntry { hash, key, value };
                return;
            }
            at = (at + 1) & mask;
        }
    }

    /// Value stored under `hash`, if present.
    pub fn get(&self, hash: u64) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }
        let mask = self.entries.len() - 1;
        let mut at = hash as usize & mask;
        loop {
            let entry = &self.entries[at];
            if entry.hash == hash {
                return Some(entry.value);
            }
            if entry.hash == 0 {
                return None;
            }
            at = (at + 1) & mask;
        }
    }

    fn grow(&mut self) {
        let new_cap = (self.entries.len() * 2).max(MAP_DEFAULT_SIZE);
        let old = std::mem::replace(&mut self.entries, vec![MapEntry::EMPTY; new_cap]);
        self.len = 0;
        for entry in old {
            if entry.hash != 0 {
                self.insert(entry.key, entry.hash, entry.value);
            }
        }
    }

    /// Iterates the occupied entries.
    pub fn iter(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.iter().filter(|e| e.hash != 0)
    }

    /// Mutable iteration over occupied entries, used by the collector's
    /// rewrite stage.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MapEntry> {
        self.entries.iter_mut().filter(|e| e.hash != 0)
    }

    /// Rough payload size in bytes for heap accounting.
    pub fn size_estimate(&self) -> usize {
        self.entries
            .capacity()
            .max(MAP_DEFAULT_SIZE)
            .saturating_mul(std::mem::size_of::<MapEntry>())
    }
}
