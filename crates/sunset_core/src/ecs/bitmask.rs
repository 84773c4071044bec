//! # Component Bitmask
//!
//! Fixed-width bit-set over component kinds. It is both the identity of an
//! archetype and the predicate of a query.
//!
//! ```text
//! limb 0 (bits 0..64)   limb 1 (bits 64..128)   ...
//! least significant  ->                      -> most significant
//! ```
//!
//! Every mask in a world has the same limb count, derived from the world's
//! component ceiling. Comparing masks of different widths is a programming
//! error and panics.

use std::fmt;
use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

/// Storage word of a [`Bitmask`].
pub type Limb = u64;

/// Number of bits in one [`Limb`].
pub const LIMB_BITS: usize = Limb::BITS as usize;

/// Number of limbs needed to hold `size_bits` bits.
#[inline]
#[must_use]
pub const fn limbs_for(size_bits: usize) -> usize {
    size_bits.div_ceil(LIMB_BITS)
}

/// A fixed-capacity set of component kind ids.
#[derive(Clone)]
pub struct Bitmask {
    limbs: Box<[Limb]>,
}

impl Bitmask {
    /// Creates a mask able to hold `size_bits` bits, all clear.
    #[must_use]
    pub fn empty(size_bits: usize) -> Self {
        Self {
            limbs: vec![0; limbs_for(size_bits)].into_boxed_slice(),
        }
    }

    /// Creates a mask able to hold `size_bits` bits, every limb filled.
    #[must_use]
    pub fn full(size_bits: usize) -> Self {
        Self {
            limbs: vec![Limb::MAX; limbs_for(size_bits)].into_boxed_slice(),
        }
    }

    /// Number of limbs.
    #[inline]
    #[must_use]
    pub fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// Capacity in bits (always a whole number of limbs).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.limbs.len() * LIMB_BITS
    }

    /// Raw limbs, least significant first.
    #[inline]
    #[must_use]
    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    #[inline]
    #[track_caller]
    fn locate(&self, index: usize) -> (usize, Limb) {
        assert!(
            index < self.capacity(),
            "IndexOutOfRange: bit {index} in a bitmask of {} bits",
            self.capacity()
        );
        (index / LIMB_BITS, 1 << (index % LIMB_BITS))
    }

    /// Tests bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()`.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn is_set(&self, index: usize) -> bool {
        let (limb, bit) = self.locate(index);
        self.limbs[limb] & bit != 0
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, index: usize) {
        let (limb, bit) = self.locate(index);
        self.limbs[limb] |= bit;
    }

    /// Clears bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()`.
    #[inline]
    #[track_caller]
    pub fn unset(&mut self, index: usize) {
        let (limb, bit) = self.locate(index);
        self.limbs[limb] &= !bit;
    }

    /// Index of the lowest set bit, or `capacity()` if the mask is empty.
    #[must_use]
    pub fn ctz(&self) -> usize {
        for (i, &limb) in self.limbs.iter().enumerate() {
            if limb != 0 {
                return i * LIMB_BITS + limb.trailing_zeros() as usize;
            }
        }
        self.capacity()
    }

    /// Index of the lowest set bit, if any.
    #[inline]
    #[must_use]
    pub fn lowest(&self) -> Option<usize> {
        let index = self.ctz();
        (index < self.capacity()).then_some(index)
    }

    /// Clears the lowest set bit. Scans limbs upward from limb 0.
    pub fn lsb_reset(&mut self) {
        if let Some(limb) = self.limbs.iter_mut().find(|limb| **limb != 0) {
            *limb &= *limb - 1;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn popcount(&self) -> usize {
        self.limbs.iter().map(|limb| limb.count_ones() as usize).sum()
    }

    /// True iff no bit is set.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().fold(0, |acc, limb| acc | limb) == 0
    }

    #[inline]
    #[track_caller]
    fn assert_same_width(&self, other: &Self) {
        assert_eq!(
            self.limbs.len(),
            other.limbs.len(),
            "bitmask width mismatch: {} limbs vs {} limbs",
            self.limbs.len(),
            other.limbs.len()
        );
    }

    /// Limb-wise equality.
    ///
    /// # Panics
    ///
    /// Panics if the masks have different widths.
    #[must_use]
    #[track_caller]
    pub fn is_eql(&self, other: &Self) -> bool {
        self.assert_same_width(other);
        self.limbs == other.limbs
    }

    /// True iff every bit set in `other` is also set in `self`.
    ///
    /// # Panics
    ///
    /// Panics if the masks have different widths.
    #[must_use]
    #[track_caller]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.assert_same_width(other);
        self.limbs
            .iter()
            .zip(other.limbs.iter())
            .all(|(mine, theirs)| mine & theirs == *theirs)
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.limbs.fill(0);
    }

    /// Changes the capacity to hold `size_bits` bits. Low limbs are kept,
    /// new limbs are zero.
    pub fn resize(&mut self, size_bits: usize) {
        let count = limbs_for(size_bits);
        if count != self.limbs.len() {
            let mut limbs = self.limbs.to_vec();
            limbs.resize(count, 0);
            self.limbs = limbs.into_boxed_slice();
        }
    }

    /// Copies `min(dest.num_limbs(), self.num_limbs())` limbs into `dest`.
    pub fn copy_into(&self, dest: &mut Self) {
        let count = dest.limbs.len().min(self.limbs.len());
        dest.limbs[..count].copy_from_slice(&self.limbs[..count]);
    }

    /// Stable 64-bit content hash (SipHash-1-3, zero keys, little-endian
    /// limbs). Identity comparisons must still use [`is_eql`](Self::is_eql).
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        for limb in self.limbs.iter() {
            hasher.write(&limb.to_le_bytes());
        }
        hasher.finish()
    }

    /// Iterates set bits in ascending order.
    #[must_use]
    pub fn iter_ones(&self) -> Ones {
        Ones { rest: self.clone() }
    }
}

impl PartialEq for Bitmask {
    fn eq(&self, other: &Self) -> bool {
        self.is_eql(other)
    }
}

impl Eq for Bitmask {}

impl Hash for Bitmask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.limbs.hash(state);
    }
}

impl fmt::Debug for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_ones()).finish()
    }
}

/// Ascending iterator over the set bits of a [`Bitmask`].
///
/// Drains a private copy with `ctz` + `lsb_reset`.
pub struct Ones {
    rest: Bitmask,
}

impl Iterator for Ones {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.rest.lowest()?;
        self.rest.lsb_reset();
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rest.popcount();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Ones {}
