//! A transposition table caching the results of game tree searches

use static_assertions::const_assert;

use crate::solver::{MAX_SCORE, MIN_SCORE};

// the offset encoding must fit the whole score range into a non-zero byte
const_assert!(MAX_SCORE - MIN_SCORE + 1 < 256);

#[derive(Copy, Clone)]
struct Entry {
    key: u64,
    value: u8,
}

impl Entry {
    fn new() -> Self {
        Self { key: 0, value: 0 }
    }
}

/// The capacity of the transposition table in entries
pub const TABLE_SIZE: usize = 1 << 23;

/// A fixed-capacity transposition table
///
/// # Notes
/// Scores are offset-encoded into a non-zero byte so that a zero byte marks
/// an empty slot. Slots are indexed by the low bits of the position key and
/// collisions always replace the previous entry; the full 64-bit key is kept
/// alongside the value so a hit is an exact state match.
///
/// **The table has a fixed capacity of ~128MB and is never cleared: results
/// cached while solving one position are reused for its siblings**
pub struct TranspositionTable {
    entries: Vec<Entry>,
}

impl TranspositionTable {
    /// Creates an empty transposition table
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::new(); TABLE_SIZE],
        }
    }

    /// Caches a score for a position key, evicting any previous entry
    pub fn set(&mut self, key: u64, score: i32) {
        let entry = Entry {
            key,
            // offset of one to avoid storing a 0, which marks an empty slot
            value: (score - MIN_SCORE + 1) as u8,
        };
        self.entries[key as usize & (TABLE_SIZE - 1)] = entry;
    }

    /// Retrieves the cached score for a position key
    pub fn get(&self, key: u64) -> Option<i32> {
        let entry = &self.entries[key as usize & (TABLE_SIZE - 1)];
        if entry.key == key && entry.value != 0 {
            Some(entry.value as i32 + MIN_SCORE - 1)
        } else {
            None
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
