//! # Queries
//!
//! Traversal of every live entity whose archetype mask is a superset of a
//! query mask.
//!
//! ```text
//! archetype 0 {A}     : skipped (not ⊇ {A, B})
//! archetype 1 {A,B}   : slot 0, slot 2        (slot 1 free, skipped)
//! archetype 2 {A,B,C} : slot 0
//! ```
//!
//! Order is archetype creation order, then ascending slot. Three surfaces
//! share it:
//!
//! - [`WorldIter`]: explicit cursor (`is_valid` / `advance`)
//! - [`Query`]: a standard [`Iterator`] of [`EntityRef`]
//! - [`RowMut`]: handed to [`World::for_each_mut`](super::World::for_each_mut)

use super::archetype::{Archetype, ArchetypeId};
use super::bitmask::Bitmask;
use super::component::{Component, ComponentKind};
use super::entity::EntityId;
use super::storage::Column;
use super::world::{check_size, layout_error, World};
use crate::error::{EcsError, EcsResult};

fn column_of(archetype: &Archetype, entity: EntityId, kind: ComponentKind) -> EcsResult<&Column> {
    archetype
        .column_for(kind)
        .ok_or(EcsError::ComponentNotFound { entity, kind })
}

fn bytes_at(column: &Column, slot: usize) -> &[u8] {
    column.get(slot).expect("live slot outside its column")
}

// ============================================================================
// CURSOR
// ============================================================================

/// Cursor over matching entities.
///
/// # Example
///
/// ```rust,ignore
/// let mut it = world.iter(&world.mask_of(&[position, velocity]));
/// while it.is_valid() {
///     let pos = it.get_component(position)?;
///     it.advance();
/// }
/// ```
#[derive(Debug)]
pub struct WorldIter<'w> {
    archetypes: &'w [Archetype],
    query: Bitmask,
    /// Current archetype; `archetypes.len()` once exhausted.
    archetype: usize,
    /// Current slot inside that archetype.
    slot: usize,
}

impl<'w> WorldIter<'w> {
    pub(crate) fn new(world: &'w World, query: Bitmask) -> Self {
        let mut iter = Self {
            archetypes: world.archetype_slice(),
            query,
            archetype: 0,
            slot: 0,
        };
        iter.seek();
        iter
    }

    /// Moves forward from the current position to the first live matching
    /// slot, or past the last archetype.
    fn seek(&mut self) {
        while let Some(archetype) = self.archetypes.get(self.archetype) {
            if archetype.mask().is_superset(&self.query) {
                if let Some(slot) = archetype.next_live(self.slot) {
                    self.slot = slot;
                    return;
                }
            }
            self.archetype += 1;
            self.slot = 0;
        }
    }

    /// True while the cursor rests on an entity.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.archetype < self.archetypes.len()
    }

    /// Steps to the next matching entity. No-op once exhausted.
    pub fn advance(&mut self) {
        if !self.is_valid() {
            return;
        }
        self.slot += 1;
        self.seek();
    }

    /// The query mask.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &Bitmask {
        &self.query
    }

    fn current_archetype(&self) -> &'w Archetype {
        let archetypes = self.archetypes;
        archetypes
            .get(self.archetype)
            .expect("iterator used after it was exhausted")
    }

    /// Archetype of the current entity.
    #[must_use]
    pub fn archetype_id(&self) -> Option<ArchetypeId> {
        self.is_valid().then(|| self.current_archetype().id())
    }

    /// Slot of the current entity inside its archetype.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.is_valid().then_some(self.slot)
    }

    /// Id of the current entity.
    #[must_use]
    pub fn entity_id(&self) -> Option<EntityId> {
        self.current().map(|entity| entity.id())
    }

    /// View of the current entity.
    #[must_use]
    pub fn current(&self) -> Option<EntityRef<'w>> {
        self.is_valid()
            .then(|| EntityRef::new(self.current_archetype(), self.slot))
    }

    /// Bytes of component `kind` on the current entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the current archetype lacks
    /// `kind`. Any kind in the query mask is always present.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is exhausted.
    pub fn get_component(&self, kind: ComponentKind) -> EcsResult<&'w [u8]> {
        EntityRef::new(self.current_archetype(), self.slot).get_component(kind)
    }

    /// Typed view of component `kind` on the current entity.
    ///
    /// # Errors
    ///
    /// As [`get_component`](Self::get_component), plus
    /// [`EcsError::SizeMismatch`] and [`EcsError::Layout`].
    ///
    /// # Panics
    ///
    /// Panics if the iterator is exhausted.
    pub fn get<T: Component>(&self, kind: ComponentKind) -> EcsResult<&'w T> {
        EntityRef::new(self.current_archetype(), self.slot).get(kind)
    }
}

// ============================================================================
// ITERATOR ADAPTER
// ============================================================================

/// Read-only view of one live entity.
#[derive(Clone, Copy, Debug)]
pub struct EntityRef<'w> {
    archetype: &'w Archetype,
    slot: usize,
    id: EntityId,
}

impl<'w> EntityRef<'w> {
    fn new(archetype: &'w Archetype, slot: usize) -> Self {
        let id = archetype
            .entity_at(slot)
            .expect("entity view over a free slot");
        Self {
            archetype,
            slot,
            id,
        }
    }

    /// The entity's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// The entity's component set.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &'w Bitmask {
        self.archetype.mask()
    }

    /// True if the entity has `kind`.
    #[inline]
    #[must_use]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.archetype.contains(kind)
    }

    /// Bytes of component `kind`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the entity lacks `kind`.
    pub fn get_component(&self, kind: ComponentKind) -> EcsResult<&'w [u8]> {
        let column = column_of(self.archetype, self.id, kind)?;
        Ok(bytes_at(column, self.slot))
    }

    /// Typed view of component `kind`.
    ///
    /// # Errors
    ///
    /// As [`get_component`](Self::get_component), plus
    /// [`EcsError::SizeMismatch`] and [`EcsError::Layout`].
    pub fn get<T: Component>(&self, kind: ComponentKind) -> EcsResult<&'w T> {
        let column = column_of(self.archetype, self.id, kind)?;
        check_size::<T>(kind, column.element_size())?;
        column.view::<T>(self.slot).map_err(|e| layout_error(kind, e))
    }
}

/// Standard-iterator form of [`WorldIter`].
#[derive(Debug)]
pub struct Query<'w> {
    cursor: WorldIter<'w>,
}

impl<'w> Query<'w> {
    pub(crate) fn new(cursor: WorldIter<'w>) -> Self {
        Self { cursor }
    }
}

impl<'w> Iterator for Query<'w> {
    type Item = EntityRef<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.current()?;
        self.cursor.advance();
        Some(item)
    }
}

impl std::iter::FusedIterator for Query<'_> {}

// ============================================================================
// MUTABLE ROWS
// ============================================================================

/// Mutable access to one live row during
/// [`World::for_each_mut`](super::World::for_each_mut).
#[derive(Debug)]
pub struct RowMut<'a> {
    archetype: &'a mut Archetype,
    slot: usize,
    id: EntityId,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(archetype: &'a mut Archetype, slot: usize) -> Self {
        let id = archetype.entity_at(slot).expect("row over a free slot");
        Self {
            archetype,
            slot,
            id,
        }
    }

    /// Id of the entity in this row.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.id
    }

    /// The row's component set.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &Bitmask {
        self.archetype.mask()
    }

    fn column_mut(&mut self, kind: ComponentKind) -> EcsResult<&mut Column> {
        let entity = self.id;
        self.archetype
            .column_for_mut(kind)
            .ok_or(EcsError::ComponentNotFound { entity, kind })
    }

    /// Bytes of component `kind`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the row lacks `kind`.
    pub fn get(&self, kind: ComponentKind) -> EcsResult<&[u8]> {
        let column = column_of(self.archetype, self.id, kind)?;
        Ok(bytes_at(column, self.slot))
    }

    /// Mutable bytes of component `kind`.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the row lacks `kind`.
    pub fn get_mut(&mut self, kind: ComponentKind) -> EcsResult<&mut [u8]> {
        let slot = self.slot;
        let column = self.column_mut(kind)?;
        Ok(column.get_mut(slot).expect("live slot outside its column"))
    }

    /// Typed view of component `kind`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`EcsError::SizeMismatch`] and
    /// [`EcsError::Layout`].
    pub fn view<T: Component>(&self, kind: ComponentKind) -> EcsResult<&T> {
        let column = column_of(self.archetype, self.id, kind)?;
        check_size::<T>(kind, column.element_size())?;
        column.view::<T>(self.slot).map_err(|e| layout_error(kind, e))
    }

    /// Mutable typed view of component `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`view`](Self::view).
    pub fn view_mut<T: Component>(&mut self, kind: ComponentKind) -> EcsResult<&mut T> {
        let slot = self.slot;
        let column = self.column_mut(kind)?;
        check_size::<T>(kind, column.element_size())?;
        column.view_mut::<T>(slot).map_err(|e| layout_error(kind, e))
    }

    /// Mutable typed views of two distinct kinds at once.
    ///
    /// # Errors
    ///
    /// Same as [`view`](Self::view) for either kind.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn pair_mut<A: Component, B: Component>(
        &mut self,
        a: ComponentKind,
        b: ComponentKind,
    ) -> EcsResult<(&mut A, &mut B)> {
        assert_ne!(a, b, "pair_mut needs two distinct component kinds");
        let entity = self.id;
        for kind in [a, b] {
            if !self.archetype.contains(kind) {
                return Err(EcsError::ComponentNotFound { entity, kind });
            }
        }

        let slot = self.slot;
        let (ca, cb) = self
            .archetype
            .columns_pair_mut(a, b)
            .expect("both kinds present and distinct");
        check_size::<A>(a, ca.element_size())?;
        check_size::<B>(b, cb.element_size())?;
        let va = ca.view_mut::<A>(slot).map_err(|e| layout_error(a, e))?;
        let vb = cb.view_mut::<B>(slot).map_err(|e| layout_error(b, e))?;
        Ok((va, vb))
    }
}
