//! # Archetype Tables
//!
//! An archetype stores every entity whose component set equals its mask.
//! Storage is one [`Column`] per set bit, all indexed by the same slot:
//!
//! ```text
//! Archetype {Position, Velocity}:
//!   slot        0    1    2    3
//!   Position  [P0] [P1] [P2] [P3]
//!   Velocity  [V0] [V1] [V2] [V3]
//!   live       1    0    1    1      <- slot 1 is on the free list
//! ```
//!
//! Slots are never compacted. Removal pushes the slot onto a free list and
//! the next append pops it, so a live entity's slot is stable for its whole
//! life inside the archetype.

use super::bitmask::Bitmask;
use super::component::{ComponentKind, ComponentRegistry};
use super::entity::EntityId;
use super::storage::Column;
use crate::error::EcsResult;

/// Index of an archetype inside its [`World`](super::World).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchetypeId(pub(crate) u32);

impl ArchetypeId {
    /// Position in the world's archetype list.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// SLOT OCCUPANCY
// ============================================================================

/// Occupancy bitset: one bit per slot, 1 = live.
///
/// Lets iteration skip free-listed slots a word at a time with
/// `trailing_zeros` instead of consulting the free list.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlotBits {
    /// 64 slots per word.
    bits: Vec<u64>,
    /// Cached number of set bits.
    count: usize,
}

impl SlotBits {
    /// Ensures slots `0..len` are addressable. New slots start free.
    pub fn grow(&mut self, len: usize) {
        let words = len.div_ceil(64);
        if words > self.bits.len() {
            self.bits.resize(words, 0);
        }
    }

    /// Marks `slot` live. Returns whether it was free before.
    #[inline]
    pub fn insert(&mut self, slot: usize) -> bool {
        let (word, bit) = (slot / 64, 1u64 << (slot % 64));
        let was_free = self.bits[word] & bit == 0;
        self.bits[word] |= bit;
        if was_free {
            self.count += 1;
        }
        was_free
    }

    /// Marks `slot` free. Returns whether it was live before.
    #[inline]
    pub fn remove(&mut self, slot: usize) -> bool {
        let (word, bit) = (slot / 64, 1u64 << (slot % 64));
        let Some(w) = self.bits.get_mut(word) else {
            return false;
        };
        let was_live = *w & bit != 0;
        *w &= !bit;
        if was_live {
            self.count -= 1;
        }
        was_live
    }

    /// True if `slot` is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        (self.bits.get(slot / 64).copied().unwrap_or(0) >> (slot % 64)) & 1 == 1
    }

    /// Number of live slots.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// First live slot at or after `from`.
    #[must_use]
    pub fn next_from(&self, from: usize) -> Option<usize> {
        let mut word_idx = from / 64;
        let mut word = *self.bits.get(word_idx)? & (u64::MAX << (from % 64));
        loop {
            if word != 0 {
                return Some(word_idx * 64 + word.trailing_zeros() as usize);
            }
            word_idx += 1;
            word = *self.bits.get(word_idx)?;
        }
    }
}

// ============================================================================
// ARCHETYPE
// ============================================================================

/// Storage for all entities sharing one exact component set.
#[derive(Debug)]
pub struct Archetype {
    /// This archetype's index in the world.
    id: ArchetypeId,
    /// Component set stored here. Unique within a world.
    mask: Bitmask,
    /// One column per set bit, sorted by kind.
    columns: Vec<Column>,
    /// High-water mark of appended slots.
    num_elements: usize,
    /// Vacated slots awaiting reuse.
    free_slots: Vec<usize>,
    /// Live/free state per slot.
    live: SlotBits,
    /// Owner of each slot, `EntityId::NULL` when free.
    entities: Vec<EntityId>,
}

impl Archetype {
    /// Creates an empty archetype with a column for every kind in `mask`.
    ///
    /// # Arguments
    ///
    /// * `id` - Index this archetype will occupy in the world
    /// * `mask` - Component set
    /// * `registry` - Source of each column's element size
    /// * `reserve` - Slots to reserve up front in every column
    ///
    /// # Errors
    ///
    /// Fails if `mask` names a kind the registry does not know.
    pub(crate) fn new(
        id: ArchetypeId,
        mask: Bitmask,
        registry: &ComponentRegistry,
        reserve: usize,
    ) -> EcsResult<Self> {
        let mut columns = Vec::with_capacity(mask.popcount());
        let mut rest = mask.clone();
        while !rest.is_zero() {
            let kind = ComponentKind::from_index(rest.ctz());
            columns.push(Column::new(kind, registry.require(kind)?, reserve));
            rest.lsb_reset();
        }

        Ok(Self {
            id,
            mask,
            columns,
            num_elements: 0,
            free_slots: Vec::new(),
            live: SlotBits::default(),
            entities: Vec::with_capacity(reserve),
        })
    }

    /// Index of this archetype in the world.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArchetypeId {
        self.id
    }

    /// The component set.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &Bitmask {
        &self.mask
    }

    /// High-water mark of slots ever appended.
    #[inline]
    #[must_use]
    pub const fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live.count()
    }

    /// True if no entity lives here.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live.count() == 0
    }

    /// Slots waiting to be reused, in pop order reversed.
    #[inline]
    #[must_use]
    pub fn free_slots(&self) -> &[usize] {
        &self.free_slots
    }

    /// All columns, sorted by kind.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns (equals the mask's popcount).
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True if this archetype stores `kind`.
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.column_index(kind).is_some()
    }

    #[inline]
    fn column_index(&self, kind: ComponentKind) -> Option<usize> {
        self.columns.binary_search_by_key(&kind, Column::kind).ok()
    }

    /// Column storing `kind`, if present.
    #[inline]
    #[must_use]
    pub fn column_for(&self, kind: ComponentKind) -> Option<&Column> {
        self.column_index(kind).map(|i| &self.columns[i])
    }

    /// Mutable column storing `kind`, if present.
    #[inline]
    pub fn column_for_mut(&mut self, kind: ComponentKind) -> Option<&mut Column> {
        self.column_index(kind).map(|i| &mut self.columns[i])
    }

    /// Two distinct columns at once.
    ///
    /// Returns `None` if either kind is absent or `a == b`.
    pub fn columns_pair_mut(
        &mut self,
        a: ComponentKind,
        b: ComponentKind,
    ) -> Option<(&mut Column, &mut Column)> {
        let ia = self.column_index(a)?;
        let ib = self.column_index(b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.columns.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.columns.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// True if `slot` holds a live entity.
    #[inline]
    #[must_use]
    pub fn is_live(&self, slot: usize) -> bool {
        slot < self.num_elements && self.live.contains(slot)
    }

    /// First live slot at or after `from`.
    #[inline]
    #[must_use]
    pub fn next_live(&self, from: usize) -> Option<usize> {
        self.live.next_from(from).filter(|&slot| slot < self.num_elements)
    }

    /// Entity occupying `slot`, if live.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, slot: usize) -> Option<EntityId> {
        self.is_live(slot).then(|| self.entities[slot])
    }

    /// Takes a slot for `entity`: the most recently freed one, or a fresh
    /// slot at the high-water mark. Every column is grown to cover it.
    pub(crate) fn append_slot(&mut self, entity: EntityId) -> usize {
        let slot = if let Some(slot) = self.free_slots.pop() {
            slot
        } else {
            let slot = self.num_elements;
            self.num_elements += 1;
            for column in &mut self.columns {
                column.resize(self.num_elements);
            }
            self.live.grow(self.num_elements);
            self.entities.push(EntityId::NULL);
            slot
        };

        let was_free = self.live.insert(slot);
        assert!(was_free, "archetype {:?}: slot {slot} handed out twice", self.id);
        self.entities[slot] = entity;
        slot
    }

    /// Returns `slot` to the free list. Column bytes are left as they are.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not live.
    pub(crate) fn release_slot(&mut self, slot: usize) {
        assert!(
            slot < self.num_elements && self.live.remove(slot),
            "archetype {:?}: releasing slot {slot} which is not live",
            self.id
        );
        self.entities[slot] = EntityId::NULL;
        self.free_slots.push(slot);
    }
}
