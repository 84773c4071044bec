//! # Column Storage
//!
//! One component kind's packed bytes inside one archetype.
//!
//! ```text
//! slot:   0            1            2
//!         [elem bytes][elem bytes][elem bytes]...
//! ```
//!
//! - Element size is fixed when the column is created
//! - The buffer only grows; vacated slots are tracked by the archetype
//! - Backing words are `u64`, so every slot of a type whose size is a
//!   multiple of its alignment (all Rust types) is aligned up to 8 bytes

use bytemuck::PodCastError;

use super::component::{Component, ComponentKind};

/// Type-erased storage for a single component kind.
#[derive(Clone, Debug)]
pub struct Column {
    /// Which kind this column stores.
    kind: ComponentKind,
    /// Bytes per element.
    element_size: usize,
    /// Number of addressable slots.
    len: usize,
    /// Backing words; `len * element_size` bytes of it are in use.
    words: Vec<u64>,
}

#[inline]
const fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(8)
}

impl Column {
    /// Creates an empty column, reserving room for `reserve` elements.
    /// A reservation whose byte size overflows is skipped.
    #[must_use]
    pub fn new(kind: ComponentKind, element_size: usize, reserve: usize) -> Self {
        let reserved_words = element_size.checked_mul(reserve).map_or(0, words_for);
        Self {
            kind,
            element_size,
            len: 0,
            words: Vec::with_capacity(reserved_words),
        }
    }

    /// Kind stored in this column.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Bytes per element.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of addressable slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if no slot has been allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Logical buffer length, `len * element_size`.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.len * self.element_size
    }

    /// Grows the column to cover `len` slots. New bytes are zeroed.
    /// Never shrinks.
    pub fn resize(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        self.len = len;
        self.words.resize(words_for(self.byte_len()), 0);
    }

    /// The whole in-use byte range.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        let len = self.byte_len();
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..len]
    }

    #[inline]
    fn range(&self, slot: usize) -> Option<std::ops::Range<usize>> {
        (slot < self.len).then(|| {
            let start = slot * self.element_size;
            start..start + self.element_size
        })
    }

    /// Bytes of `slot`.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&[u8]> {
        let range = self.range(slot)?;
        Some(&bytemuck::cast_slice::<u64, u8>(&self.words)[range])
    }

    /// Mutable bytes of `slot`.
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut [u8]> {
        let range = self.range(slot)?;
        Some(&mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[range])
    }

    /// Overwrites `slot` with `data`.
    ///
    /// # Returns
    ///
    /// `false` if the slot is out of range or `data` has the wrong length.
    #[inline]
    #[must_use]
    pub fn write(&mut self, slot: usize, data: &[u8]) -> bool {
        if data.len() != self.element_size {
            return false;
        }
        match self.get_mut(slot) {
            Some(dest) => {
                dest.copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    /// Views `slot` as a `T`.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or alignment.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[inline]
    pub fn view<T: Component>(&self, slot: usize) -> Result<&T, PodCastError> {
        let bytes = self.get(slot).expect("column slot out of range");
        bytemuck::try_from_bytes(bytes)
    }

    /// Mutable view of `slot` as a `T`.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element size or alignment.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[inline]
    pub fn view_mut<T: Component>(&mut self, slot: usize) -> Result<&mut T, PodCastError> {
        let bytes = self.get_mut(slot).expect("column slot out of range");
        bytemuck::try_from_bytes_mut(bytes)
    }
}
