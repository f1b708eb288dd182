//! The packed critical-position database and its on-disk format

use anyhow::{anyhow, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::generator::CriticalEntry;
use crate::{HEIGHT, MAX_PLY, MIN_PLY, WIDTH};

const KEY_BYTES: u8 = 4;
const VALUE_BYTES: u8 = 1;

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

pub(crate) fn next_prime(mut n: usize) -> usize {
    while !is_prime(n) {
        n += 1;
    }
    n
}

/// An open-addressed hash table mapping position keys to winning columns
///
/// # Notes
/// The table holds two parallel arrays sized to the first prime at least
/// twice the entry count. An entry is placed at `key % table_size`, probing
/// linearly past occupied slots, and stores only `(key >> 16) as u32` with
/// the winning column byte.
///
/// A stored key of 0 marks an empty slot, so a position whose truncated key
/// happens to be 0 is indistinguishable from one; and two positions agreeing
/// on bits 16..48 of their keys share a stored key, in which case a lookup
/// answers for whichever was inserted first. Both effects are rare at the
/// database sizes involved, but the format is lossy by design
pub struct CriticalDatabase {
    keys: Vec<u32>,
    values: Vec<u8>,
}

impl CriticalDatabase {
    /// Builds the hash table over a buffer of critical positions
    pub fn build(entries: &[CriticalEntry]) -> Self {
        let table_size = next_prime(2 * entries.len());
        let mut keys = vec![0u32; table_size];
        let mut values = vec![0u8; table_size];

        for entry in entries {
            let mut index = (entry.key % table_size as u64) as usize;
            while keys[index] != 0 {
                index = (index + 1) % table_size;
            }
            keys[index] = (entry.key >> 16) as u32;
            values[index] = entry.winning_col;
        }

        Self { keys, values }
    }

    /// The number of slots in the table
    pub fn table_size(&self) -> usize {
        self.keys.len()
    }

    /// Looks up the recommended column for a position key
    pub fn get(&self, key: u64) -> Option<usize> {
        let table_size = self.keys.len();
        let partial_key = (key >> 16) as u32;

        let mut index = (key % table_size as u64) as usize;
        // replay the insertion probe; an empty slot ends the run
        for _ in 0..table_size {
            match self.keys[index] {
                0 => return None,
                k if k == partial_key => return Some(self.values[index] as usize),
                _ => index = (index + 1) % table_size,
            }
        }
        None
    }

    /// Writes the database to disk
    ///
    /// # File format
    /// Little-endian throughout: an 8-byte header
    /// `[WIDTH, HEIGHT, MIN_PLY, MAX_PLY, key_bytes, value_bytes, 0, 0]`,
    /// the table size as a `u32`, then the key array and the value array
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );

        file.write_all(&[
            WIDTH as u8,
            HEIGHT as u8,
            MIN_PLY as u8,
            MAX_PLY as u8,
            KEY_BYTES,
            VALUE_BYTES,
            0,
            0,
        ])?;
        file.write_u32::<LittleEndian>(self.keys.len() as u32)?;
        for &key in &self.keys {
            file.write_u32::<LittleEndian>(key)?;
        }
        file.write_all(&self.values)?;
        file.flush()?;
        Ok(())
    }

    /// Reads a database written by [`CriticalDatabase::save`]
    ///
    /// Returns `Err` if the file cannot be read or its header describes a
    /// different board geometry. The ply window bytes are not checked, so
    /// databases generated with other windows remain readable
    ///
    /// [`CriticalDatabase::save`]: #method.save
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        );

        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        if header[0] as usize != WIDTH || header[1] as usize != HEIGHT {
            return Err(anyhow!(
                "database is for a {}x{} board, expected {}x{}",
                header[0],
                header[1],
                WIDTH,
                HEIGHT
            ));
        }
        if header[4] != KEY_BYTES || header[5] != VALUE_BYTES {
            return Err(anyhow!(
                "unsupported database entry layout ({} key bytes, {} value bytes)",
                header[4],
                header[5]
            ));
        }

        let table_size = file.read_u32::<LittleEndian>()? as usize;
        let mut keys = vec![0u32; table_size];
        for key in keys.iter_mut() {
            *key = file.read_u32::<LittleEndian>()?;
        }
        let mut values = vec![0u8; table_size];
        file.read_exact(&mut values)?;

        Ok(Self { keys, values })
    }

    /// The size in bytes of the file [`CriticalDatabase::save`] writes
    ///
    /// [`CriticalDatabase::save`]: #method.save
    pub fn file_size(&self) -> usize {
        8 + 4 + self.keys.len() * (KEY_BYTES as usize + VALUE_BYTES as usize)
    }
}
