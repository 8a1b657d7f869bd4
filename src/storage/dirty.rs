//! Dirty-page bitmap
//!
//! One bit per page number, backed by atomic words so that marking a page
//! dirty never needs the page-table lock.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;

/// Fixed-capacity set of dirty page numbers
#[derive(Debug)]
pub struct DirtyBitmap {
    words: Box<[AtomicU64]>,
    capacity: u32,
}

impl DirtyBitmap {
    /// Create an empty bitmap for page numbers `0..capacity`
    pub fn new(capacity: u32) -> Self {
        let word_count = (capacity as usize).div_ceil(WORD_BITS);
        let words = (0..word_count).map(|_| AtomicU64::new(0)).collect();
        Self { words, capacity }
    }

    /// Number of page numbers this bitmap can track
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Set the bit for `page_num`; out-of-range numbers are ignored
    pub fn set(&self, page_num: u32) {
        if let Some((word, mask)) = self.locate(page_num) {
            self.words[word].fetch_or(mask, Ordering::AcqRel);
        }
    }

    /// Clear the bit for `page_num`; out-of-range numbers are ignored
    pub fn clear(&self, page_num: u32) {
        if let Some((word, mask)) = self.locate(page_num) {
            self.words[word].fetch_and(!mask, Ordering::AcqRel);
        }
    }

    /// True if `page_num` is in range and its bit is set
    pub fn get(&self, page_num: u32) -> bool {
        match self.locate(page_num) {
            Some((word, mask)) => self.words[word].load(Ordering::Acquire) & mask != 0,
            None => false,
        }
    }

    /// Clear every bit
    pub fn clear_all(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Release);
        }
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Snapshot of the set page numbers, in ascending order
    pub fn dirty_pages(&self) -> Vec<u32> {
        let mut pages = Vec::new();
        for (index, word) in self.words.iter().enumerate() {
            let mut bits = word.load(Ordering::Acquire);
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                pages.push((index * WORD_BITS + bit) as u32);
                bits &= bits - 1;
            }
        }
        pages
    }

    fn locate(&self, page_num: u32) -> Option<(usize, u64)> {
        if page_num >= self.capacity {
            return None;
        }
        let bit = page_num as usize;
        Some((bit / WORD_BITS, 1u64 << (bit % WORD_BITS)))
    }
}
