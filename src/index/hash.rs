use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::types::{GisError, Result};

use super::entry::NameEntry;

/// Default number of slots in a freshly created table.
pub const DEFAULT_HASH_SLOTS: usize = 256;
/// Default `len / slots` ratio that triggers a doubling rehash.
pub const DEFAULT_LOAD_LIMIT: f64 = 0.7;

const FNV_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1 style hash over the UTF-8 bytes of `key`.
///
/// Each byte is XOR-ed in before the multiply. The accumulator is read back as
/// a signed integer and its magnitude returned; `i32::MIN` has no positive
/// counterpart, so the magnitude is taken unsigned and maps it to `2^31`.
pub fn fnv_hash(key: &str) -> u32 {
    let mut hash = FNV_BASIS;
    for byte in key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash as i32).unsigned_abs()
}

/// Point-in-time counters describing the table shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HashIndexStats {
    /// Distinct keys stored.
    pub elements: usize,
    /// Current slot count.
    pub slots: usize,
    /// Longest chain seen.
    pub max_chain_len: usize,
    /// Configured load limit.
    pub load_limit: f64,
    /// Number of times the table grew.
    pub rehashes: u64,
}

/// Chained hash table of [`NameEntry`] values that doubles its slot count once
/// the load factor passes the configured limit.
#[derive(Debug)]
pub struct HashIndex {
    buckets: Vec<Vec<NameEntry>>,
    len: usize,
    max_chain_len: usize,
    load_limit: f64,
    rehashes: u64,
}

impl Default for HashIndex {
    fn default() -> Self {
        Self {
            buckets: empty_buckets(DEFAULT_HASH_SLOTS),
            len: 0,
            max_chain_len: 0,
            load_limit: DEFAULT_LOAD_LIMIT,
            rehashes: 0,
        }
    }
}

impl HashIndex {
    /// Creates an empty table with `slots` chains.
    pub fn new(slots: usize, load_limit: f64) -> Result<Self> {
        if slots == 0 {
            return Err(GisError::InvalidArgument(
                "hash index needs at least one slot".into(),
            ));
        }
        if !load_limit.is_finite() || load_limit <= 0.0 {
            return Err(GisError::InvalidArgument(format!(
                "load limit must be a positive number, got {load_limit}"
            )));
        }
        Ok(Self {
            buckets: empty_buckets(slots),
            load_limit,
            ..Self::default()
        })
    }

    /// Inserts `entry`, or merges its locators into the entry already stored
    /// under the same key.
    ///
    /// Returns `true` when a new element was added and `false` on a merge.
    pub fn insert(&mut self, entry: NameEntry) -> bool {
        let home = self.home_slot(entry.key());
        let chain = &mut self.buckets[home];
        if let Some(idx) = chain.iter().position(|e| e.key() == entry.key()) {
            chain[idx].absorb(&entry);
            return false;
        }
        chain.push(entry);
        let chain_len = chain.len();
        self.len += 1;
        self.max_chain_len = self.max_chain_len.max(chain_len);

        if self.load_factor() > self.load_limit {
            let mut slots = self.buckets.len() * 2;
            while self.len as f64 / slots as f64 > self.load_limit {
                slots *= 2;
            }
            self.rehash(slots);
        }
        true
    }

    /// Looks up `key` by scanning only its home chain.
    pub fn find(&self, key: &str) -> Option<&NameEntry> {
        self.buckets[self.home_slot(key)]
            .iter()
            .find(|entry| entry.key() == key)
    }

    /// Returns `true` if `key` is indexed.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no key is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of slots.
    pub fn slot_count(&self) -> usize {
        self.buckets.len()
    }

    /// Load factor above which the table grows.
    pub fn load_limit(&self) -> f64 {
        self.load_limit
    }

    /// `len / slot_count`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Longest chain observed since construction, across rehashes.
    pub fn max_chain_len(&self) -> usize {
        self.max_chain_len
    }

    /// Snapshot of the table shape.
    pub fn stats(&self) -> HashIndexStats {
        HashIndexStats {
            elements: self.len,
            slots: self.buckets.len(),
            max_chain_len: self.max_chain_len,
            load_limit: self.load_limit,
            rehashes: self.rehashes,
        }
    }

    /// Iterates `(slot, chain)` pairs for every non-empty slot.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (usize, &[NameEntry])> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(slot, chain)| (slot, chain.as_slice()))
    }

    /// Every entry, slot by slot.
    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.buckets.iter().flatten()
    }

    fn home_slot(&self, key: &str) -> usize {
        fnv_hash(key) as usize % self.buckets.len()
    }

    fn rehash(&mut self, new_slots: usize) {
        let old = std::mem::replace(&mut self.buckets, empty_buckets(new_slots));
        for entry in old.into_iter().flatten() {
            let home = self.home_slot(entry.key());
            let chain = &mut self.buckets[home];
            chain.push(entry);
            self.max_chain_len = self.max_chain_len.max(chain.len());
        }
        self.rehashes += 1;
        debug!(
            slots = new_slots,
            elements = self.len,
            max_chain_len = self.max_chain_len,
            "index.hash.rehash"
        );
    }
}

fn empty_buckets(slots: usize) -> Vec<Vec<NameEntry>> {
    (0..slots).map(|_| Vec::new()).collect()
}

/// Multi-line summary followed by one line per occupied slot.
impl fmt::Display for HashIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of elements: {}", self.len)?;
        writeln!(f, "Number of slots: {}", self.buckets.len())?;
        writeln!(f, "Maximum elements in a slot: {}", self.max_chain_len)?;
        writeln!(f, "Load limit: {}", self.load_limit)?;
        writeln!(f)?;
        writeln!(f, "Slot Contents")?;
        for (slot, chain) in self.occupied_slots() {
            write!(f, "{slot:>5}: ")?;
            for (idx, entry) in chain.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{entry}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Locator;

    fn entry(key: &str, offset: u64) -> NameEntry {
        NameEntry::new(key, Locator(offset))
    }

    #[test]
    fn fnv_matches_reference_values() {
        // Basis with no input bytes; high bit set, so the magnitude is taken.
        assert_eq!(fnv_hash(""), (0x811c_9dc5u32 as i32).unsigned_abs());
        assert_eq!(fnv_hash("a"), (0xe40c_292cu32 as i32).unsigned_abs());
    }

    #[test]
    fn signed_minimum_maps_to_two_pow_31() {
        assert_eq!((i32::MIN).unsigned_abs(), 1u32 << 31);
    }

    #[test]
    fn duplicate_key_merges_locators() {
        let mut index = HashIndex::new(16, 0.7).unwrap();
        assert!(index.insert(entry("Bluff Spring:VA", 0)));
        assert!(!index.insert(entry("Bluff Spring:VA", 200)));
        assert!(!index.insert(entry("Bluff Spring:VA", 200)));
        assert_eq!(index.len(), 1);
        let found = index.find("Bluff Spring:VA").unwrap();
        assert_eq!(found.locators().as_slice(), &[Locator(0), Locator(200)]);
    }

    #[test]
    fn third_key_doubles_four_slot_table() {
        let mut index = HashIndex::new(4, 0.7).unwrap();
        index.insert(entry("Alpha:VA", 1));
        index.insert(entry("Bravo:VA", 2));
        assert_eq!(index.slot_count(), 4);
        index.insert(entry("Charlie:VA", 3));
        assert_eq!(index.slot_count(), 8);
        assert_eq!(index.stats().rehashes, 1);
        for key in ["Alpha:VA", "Bravo:VA", "Charlie:VA"] {
            assert!(index.contains_key(key), "{key} lost after rehash");
        }
        assert!(index.load_factor() <= index.load_limit());
    }

    #[test]
    fn small_load_limit_grows_until_within_limit() {
        let mut index = HashIndex::new(4, 0.1).unwrap();
        index.insert(entry("Alpha:VA", 1));
        assert_eq!(index.slot_count(), 16);
        assert_eq!(index.stats().rehashes, 1);
        assert!(index.load_factor() <= index.load_limit());
        for (offset, key) in ["Bravo:VA", "Charlie:VA", "Delta:VA"].iter().enumerate() {
            index.insert(entry(key, offset as u64 + 2));
            assert!(index.load_factor() <= index.load_limit());
        }
        assert_eq!(index.slot_count(), 64);
        assert!(index.contains_key("Alpha:VA"));
    }

    #[test]
    fn entries_live_in_their_home_slot_after_growth() {
        let mut index = HashIndex::new(2, 0.7).unwrap();
        for i in 0..200u64 {
            index.insert(entry(&format!("Feature {i}:VA"), i * 10));
        }
        assert_eq!(index.len(), 200);
        let slots = index.slot_count();
        for (slot, chain) in index.occupied_slots() {
            for e in chain {
                assert_eq!(fnv_hash(e.key()) as usize % slots, slot);
            }
        }
        assert!(index.max_chain_len() >= 1);
    }

    #[test]
    fn non_matching_chain_entries_are_untouched() {
        let mut index = HashIndex::new(1, 100.0).unwrap();
        index.insert(entry("North Fork:VA", 1));
        index.insert(entry("South Fork:VA", 2));
        index.insert(entry("South Fork:VA", 3));
        assert_eq!(index.find("North Fork:VA").unwrap().locators().len(), 1);
        assert_eq!(index.find("South Fork:VA").unwrap().locators().len(), 2);
        assert_eq!(index.max_chain_len(), 2);
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(HashIndex::new(0, 0.7).is_err());
        assert!(HashIndex::new(4, 0.0).is_err());
        assert!(HashIndex::new(4, f64::NAN).is_err());
    }

    #[test]
    fn display_lists_only_occupied_slots() {
        let mut index = HashIndex::new(8, 0.7).unwrap();
        index.insert(entry("Dry Run:VA", 42));
        let text = index.to_string();
        assert!(text.contains("Number of elements: 1"));
        assert!(text.contains("[Dry Run:VA, [42]]"));
        assert_eq!(text.lines().filter(|l| l.contains(": [")).count(), 1);
    }
}
