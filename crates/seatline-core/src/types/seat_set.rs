//! Fixed-size seat bitset.
//!
//! A [`SeatSet`] covers the seat range `1..=capacity` of one vehicle. Set
//! algebra between two sets is only meaningful for the same capacity; mixing
//! capacities is a programming error and operations clamp to the smaller
//! range.

use std::fmt;

use crate::error::AppError;

/// Seat number as stored in the ledger (1-based).
pub type SeatNumber = i32;

const WORD_BITS: usize = 64;

/// A set of seat numbers in `1..=capacity`, one bit per seat.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SeatSet {
    capacity: u32,
    words: Vec<u64>,
}

impl SeatSet {
    /// Create an empty set for a vehicle with `capacity` seats.
    pub fn empty(capacity: u32) -> Self {
        let words = (capacity as usize).div_ceil(WORD_BITS);
        Self {
            capacity,
            words: vec![0; words],
        }
    }

    /// Create the full range `1..=capacity`.
    pub fn full(capacity: u32) -> Self {
        let mut set = Self::empty(capacity);
        for seat in 1..=capacity as SeatNumber {
            set.set_bit(seat);
        }
        set
    }

    /// Build a set from seat numbers, rejecting anything outside `1..=capacity`.
    ///
    /// Duplicates collapse silently; use [`SeatSet::from_unique`] when the
    /// caller must supply distinct seats.
    pub fn from_seats<I>(capacity: u32, seats: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = SeatNumber>,
    {
        let mut set = Self::empty(capacity);
        for seat in seats {
            if !set.in_range(seat) {
                return Err(AppError::validation(format!(
                    "Seat {seat} is outside the range 1..={capacity}"
                )));
            }
            set.set_bit(seat);
        }
        Ok(set)
    }

    /// Like [`SeatSet::from_seats`] but fails on repeated seat numbers.
    pub fn from_unique(capacity: u32, seats: &[SeatNumber]) -> Result<Self, AppError> {
        let set = Self::from_seats(capacity, seats.iter().copied())?;
        if set.len() != seats.len() {
            return Err(AppError::validation("Seat numbers must be unique"));
        }
        Ok(set)
    }

    /// Build a set from seats already known to be valid, ignoring anything out of range.
    pub fn from_trusted<I>(capacity: u32, seats: I) -> Self
    where
        I: IntoIterator<Item = SeatNumber>,
    {
        let mut set = Self::empty(capacity);
        for seat in seats {
            if set.in_range(seat) {
                set.set_bit(seat);
            }
        }
        set
    }

    /// Vehicle capacity this set is keyed by.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Add a seat. Returns `false` when the seat is out of range or already present.
    pub fn insert(&mut self, seat: SeatNumber) -> bool {
        if !self.in_range(seat) || self.contains(seat) {
            return false;
        }
        self.set_bit(seat);
        true
    }

    /// Remove a seat. Returns `true` when it was present.
    pub fn remove(&mut self, seat: SeatNumber) -> bool {
        if !self.contains(seat) {
            return false;
        }
        let (word, bit) = Self::locate(seat);
        self.words[word] &= !(1u64 << bit);
        true
    }

    /// Whether `seat` is in the set.
    pub fn contains(&self, seat: SeatNumber) -> bool {
        if !self.in_range(seat) {
            return false;
        }
        let (word, bit) = Self::locate(seat);
        self.words[word] & (1u64 << bit) != 0
    }

    /// Number of seats in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set has no seats.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Seats present in either set.
    pub fn union(&self, other: &SeatSet) -> SeatSet {
        self.combine(other, |a, b| a | b)
    }

    /// Seats present in `self` but not in `other`.
    pub fn difference(&self, other: &SeatSet) -> SeatSet {
        self.combine(other, |a, b| a & !b)
    }

    /// Seats present in both sets.
    pub fn intersection(&self, other: &SeatSet) -> SeatSet {
        self.combine(other, |a, b| a & b)
    }

    /// In-place union.
    pub fn union_with(&mut self, other: &SeatSet) {
        for (word, theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *word |= theirs;
        }
    }

    /// Whether the two sets share no seat.
    pub fn is_disjoint(&self, other: &SeatSet) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    /// Seats in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = SeatNumber> + '_ {
        (1..=self.capacity as SeatNumber).filter(move |seat| self.contains(*seat))
    }

    /// Seats in ascending order, collected.
    pub fn to_vec(&self) -> Vec<SeatNumber> {
        self.iter().collect()
    }

    fn combine(&self, other: &SeatSet, op: impl Fn(u64, u64) -> u64) -> SeatSet {
        let mut out = self.clone();
        for (i, word) in out.words.iter_mut().enumerate() {
            let theirs = other.words.get(i).copied().unwrap_or(0);
            *word = op(*word, theirs);
        }
        out
    }

    fn in_range(&self, seat: SeatNumber) -> bool {
        seat >= 1 && (seat as i64) <= self.capacity as i64
    }

    fn set_bit(&mut self, seat: SeatNumber) {
        let (word, bit) = Self::locate(seat);
        self.words[word] |= 1u64 << bit;
    }

    fn locate(seat: SeatNumber) -> (usize, usize) {
        let index = (seat - 1) as usize;
        (index / WORD_BITS, index % WORD_BITS)
    }
}

impl fmt::Debug for SeatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatSet")
            .field("capacity", &self.capacity)
            .field("seats", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_covers_range() {
        let set = SeatSet::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(1));
        assert!(set.contains(70));
        assert!(!set.contains(0));
        assert!(!set.contains(71));
    }

    #[test]
    fn test_from_seats_rejects_out_of_range() {
        assert!(SeatSet::from_seats(10, [1, 11]).is_err());
        assert!(SeatSet::from_seats(10, [0]).is_err());
        assert!(SeatSet::from_seats(10, [-3]).is_err());
    }

    #[test]
    fn test_from_unique_rejects_duplicates() {
        let err = SeatSet::from_unique(10, &[2, 2]).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Validation);
        assert_eq!(SeatSet::from_unique(10, &[3, 2]).unwrap().to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_partition_algebra() {
        let all = SeatSet::full(50);
        let occupied = SeatSet::from_seats(50, [1, 2, 49]).unwrap();
        let held = SeatSet::from_seats(50, [2, 3, 50]).unwrap().difference(&occupied);
        let available = all.difference(&occupied).difference(&held);

        assert_eq!(held.to_vec(), vec![3, 50]);
        assert!(available.is_disjoint(&occupied));
        assert!(available.is_disjoint(&held));
        assert!(occupied.is_disjoint(&held));
        assert_eq!(available.union(&occupied).union(&held), all);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut set = SeatSet::empty(4);
        assert!(set.insert(4));
        assert!(!set.insert(4));
        assert!(!set.insert(5));
        assert!(set.remove(4));
        assert!(set.is_empty());
    }
}
