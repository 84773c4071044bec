//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the entity directory
//! - A generation counter for safe reuse
//!
//! The directory maps each index to the archetype and slot currently holding
//! the entity's components. Removed indices go on a free list; reissuing one
//! bumps its generation so ids held from before the removal stop resolving.

use std::fmt;

use super::archetype::ArchetypeId;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the entity directory
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds an id from [`to_bits`](Self::to_bits).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("EntityId(NULL)")
        } else {
            write!(f, "EntityId({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Where an entity's components live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    /// Archetype holding the entity.
    pub archetype: ArchetypeId,
    /// Row inside that archetype.
    pub slot: usize,
}

/// State of one directory index.
#[derive(Clone, Copy, Debug)]
enum Entry {
    /// A live entity of this generation sits at `location`.
    Occupied {
        generation: u32,
        location: EntityLocation,
    },
    /// Free; the next entity placed here gets `next_generation`.
    Vacant { next_generation: u32 },
}

/// Index -> location table with free-list reuse.
#[derive(Debug, Default)]
pub(crate) struct EntityDirectory {
    entries: Vec<Entry>,
    /// Vacant indices, most recently freed last.
    free_indices: Vec<u32>,
    /// Number of occupied entries.
    alive_count: usize,
}

impl EntityDirectory {
    /// Creates a directory with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// The id the next [`insert`](Self::insert) will return.
    #[must_use]
    pub fn peek_next(&self) -> EntityId {
        match self.free_indices.last() {
            Some(&index) => match self.entries[index as usize] {
                Entry::Vacant { next_generation } => EntityId::new(index, next_generation),
                Entry::Occupied { .. } => {
                    unreachable!("free index {index} is occupied")
                }
            },
            None => EntityId::new(self.next_fresh_index(), 0),
        }
    }

    #[inline]
    fn next_fresh_index(&self) -> u32 {
        u32::try_from(self.entries.len()).expect("entity directory exceeds u32::MAX entries")
    }

    /// Places a new entity at `location`, reusing a freed index if any.
    pub fn insert(&mut self, location: EntityLocation) -> EntityId {
        let id = self.peek_next();
        let entry = Entry::Occupied {
            generation: id.generation(),
            location,
        };
        if self.free_indices.pop().is_some() {
            self.entries[id.index() as usize] = entry;
        } else {
            self.entries.push(entry);
        }
        self.alive_count += 1;
        id
    }

    /// Location of a live entity; `None` for null, removed or stale ids.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<EntityLocation> {
        if id.is_null() {
            return None;
        }
        match self.entries.get(id.index() as usize)? {
            Entry::Occupied {
                generation,
                location,
            } if *generation == id.generation() => Some(*location),
            _ => None,
        }
    }

    /// True if `id` names a live entity.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Moves a live entity to `location`. Returns `false` for dead ids.
    #[must_use]
    pub fn relocate(&mut self, id: EntityId, location: EntityLocation) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.entries[id.index() as usize] = Entry::Occupied {
            generation: id.generation(),
            location,
        };
        true
    }

    /// Frees a live entity's index. Returns where it lived.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityLocation> {
        let location = self.get(id)?;
        self.entries[id.index() as usize] = Entry::Vacant {
            next_generation: id.generation().wrapping_add(1),
        };
        self.free_indices.push(id.index());
        self.alive_count -= 1;
        Some(location)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(slot: usize) -> EntityLocation {
        EntityLocation {
            archetype: ArchetypeId(0),
            slot,
        }
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert_eq!(EntityId::from_bits(id.to_bits()), id);
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_insert_remove_reuse() {
        let mut directory = EntityDirectory::with_capacity(4);
        let a = directory.insert(at(0));
        let b = directory.insert(at(1));
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(directory.get(b), Some(at(1)));

        assert_eq!(directory.remove(a), Some(at(0)));
        assert_eq!(directory.get(a), None);
        assert_eq!(directory.remove(a), None);
        assert_eq!(directory.alive_count(), 1);

        assert_eq!(directory.peek_next(), EntityId::new(0, 1));
        let c = directory.insert(at(5));
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        // The stale id stays dead even though its index is live again.
        assert_eq!(directory.get(a), None);
        assert_eq!(directory.get(c), Some(at(5)));
    }

    #[test]
    fn test_relocate() {
        let mut directory = EntityDirectory::default();
        let a = directory.insert(at(0));
        assert!(directory.relocate(a, at(9)));
        assert_eq!(directory.get(a), Some(at(9)));
        directory.remove(a);
        assert!(!directory.relocate(a, at(1)));
    }

    #[test]
    fn test_out_of_range_and_null() {
        let directory = EntityDirectory::default();
        assert_eq!(directory.get(EntityId::new(42, 0)), None);
        assert_eq!(directory.get(EntityId::NULL), None);
    }
}
