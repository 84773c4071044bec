//! # ECS World
//!
//! The central container for all entities and components. Owns the
//! component registry, every archetype, and the entity directory.
//!
//! ## Data flow
//!
//! ```text
//! register_component(size) -> ComponentKind        (startup)
//! create_entity(mask)      -> archetype.append_slot -> directory.insert
//! remove_entity(id)        -> archetype.release_slot -> directory.remove
//! get_component(id, kind)  -> directory -> archetype -> column -> bytes
//! iter(mask)               -> every archetype whose mask ⊇ query
//! ```
//!
//! Component references borrow the world, so no entity can be created,
//! removed, or migrated while one is alive.

use std::collections::HashMap;

use super::archetype::{Archetype, ArchetypeId};
use super::bitmask::{limbs_for, Bitmask};
use super::builder::EntityBuilder;
use super::component::{Component, ComponentKind, ComponentRegistry};
use super::entity::{EntityDirectory, EntityId, EntityLocation};
use super::query::{Query, RowMut, WorldIter};
use super::storage::Column;
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS World - container for all entity state.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let position = world.register_component(12)?;
///
/// let mut builder = world.builder();
/// builder.add_component(position, &[0; 12])?;
/// let entity = builder.finish();
///
/// assert_eq!(world.get_component(entity, position)?, &[0; 12]);
/// ```
#[derive(Debug)]
pub struct World {
    /// Sizing the world was built with.
    config: WorldConfig,
    /// Kind -> size table.
    registry: ComponentRegistry,
    /// Every archetype ever created, indexed by `ArchetypeId`.
    archetypes: Vec<Archetype>,
    /// Mask content hash -> candidate archetypes.
    archetype_index: HashMap<u64, Vec<ArchetypeId>>,
    /// Entity id -> (archetype, slot).
    directory: EntityDirectory,
    /// Limb count every mask of this world must have.
    mask_limbs: usize,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Creates a world from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `config` is out of range.
    pub fn with_config(config: WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        Self {
            registry: ComponentRegistry::new(config.max_components),
            archetypes: Vec::new(),
            archetype_index: HashMap::new(),
            directory: EntityDirectory::with_capacity(config.entity_capacity),
            mask_limbs: limbs_for(config.max_components),
            config,
        }
    }

    /// The configuration this world was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ========================================================================
    // COMPONENT REGISTRATION
    // ========================================================================

    /// Registers a component kind of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`] once `max_components` kinds
    /// exist. This is a startup configuration error.
    pub fn register_component(&mut self, size: usize) -> EcsResult<ComponentKind> {
        self.registry.register(size)
    }

    /// Registers a kind sized for `T`.
    ///
    /// # Errors
    ///
    /// Same as [`register_component`](Self::register_component).
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentKind> {
        self.registry.register(std::mem::size_of::<T>())
    }

    /// Registered size of `kind`.
    #[inline]
    #[must_use]
    pub fn component_size(&self, kind: ComponentKind) -> Option<usize> {
        self.registry.size_of(kind)
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.registry.len()
    }

    /// The component registry.
    #[inline]
    #[must_use]
    pub(crate) fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // ========================================================================
    // MASKS
    // ========================================================================

    /// An empty mask of this world's width.
    #[inline]
    #[must_use]
    pub fn empty_mask(&self) -> Bitmask {
        Bitmask::empty(self.config.max_components)
    }

    /// A mask of this world's width with `kinds` set.
    ///
    /// # Panics
    ///
    /// Panics if a kind is beyond the mask capacity.
    #[must_use]
    pub fn mask_of(&self, kinds: &[ComponentKind]) -> Bitmask {
        let mut mask = self.empty_mask();
        for kind in kinds {
            mask.set(kind.index());
        }
        mask
    }

    #[track_caller]
    fn check_width(&self, mask: &Bitmask) {
        assert_eq!(
            mask.num_limbs(),
            self.mask_limbs,
            "bitmask width mismatch: world uses {} limbs, mask has {}",
            self.mask_limbs,
            mask.num_limbs()
        );
    }

    fn check_registered(&self, mask: &Bitmask) -> EcsResult<()> {
        match mask.iter_ones().find(|&bit| bit >= self.registry.len()) {
            Some(bit) => Err(EcsError::UnregisteredComponent(ComponentKind::from_index(bit))),
            None => Ok(()),
        }
    }

    // ========================================================================
    // ARCHETYPES
    // ========================================================================

    /// Existing archetype with exactly `mask`.
    #[must_use]
    pub fn find_archetype(&self, mask: &Bitmask) -> Option<ArchetypeId> {
        self.archetype_index
            .get(&mask.content_hash())?
            .iter()
            .copied()
            .find(|id| self.archetypes[id.index()].mask().is_eql(mask))
    }

    fn find_or_create_archetype(&mut self, mask: &Bitmask) -> EcsResult<ArchetypeId> {
        if let Some(id) = self.find_archetype(mask) {
            return Ok(id);
        }

        let raw = u32::try_from(self.archetypes.len()).expect("archetype count exceeds u32::MAX");
        let id = ArchetypeId(raw);
        let archetype = Archetype::new(
            id,
            mask.clone(),
            &self.registry,
            self.config.archetype_capacity,
        )?;
        tracing::debug!(
            "created archetype {} with {} columns: {:?}",
            raw,
            archetype.column_count(),
            mask
        );

        self.archetypes.push(archetype);
        self.archetype_index
            .entry(mask.content_hash())
            .or_default()
            .push(id);
        Ok(id)
    }

    /// Archetype by id.
    #[inline]
    #[must_use]
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    /// All archetypes, in creation order.
    pub fn archetypes(&self) -> impl ExactSizeIterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Number of archetypes.
    #[inline]
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub(crate) fn archetype_slice(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub(crate) fn archetype_mut(&mut self, id: ArchetypeId) -> &mut Archetype {
        &mut self.archetypes[id.index()]
    }

    // ========================================================================
    // ENTITY LIFECYCLE
    // ========================================================================

    /// Creates an entity with the component set `mask`. Component bytes
    /// start zeroed for fresh slots and hold stale data for reused slots;
    /// use [`builder`](Self::builder) to create and fill in one step.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `mask` names an
    /// unknown kind.
    ///
    /// # Panics
    ///
    /// Panics if `mask` has a different width than this world's masks.
    pub fn create_entity(&mut self, mask: &Bitmask) -> EcsResult<EntityId> {
        self.check_width(mask);
        self.check_registered(mask)?;

        let archetype = self.find_or_create_archetype(mask)?;
        let id = self.directory.peek_next();
        let slot = self.archetypes[archetype.index()].append_slot(id);
        let placed = self.directory.insert(EntityLocation { archetype, slot });
        debug_assert_eq!(placed, id);

        tracing::trace!("created entity {id} in archetype {} slot {slot}", archetype.index());
        Ok(id)
    }

    /// Starts staging a new entity.
    #[must_use]
    pub fn builder(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(self)
    }

    /// Removes an entity. Its slot and id become reusable; ids held from
    /// before the removal never resolve again.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `id` is not live.
    pub fn remove_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let Some(location) = self.directory.remove(id) else {
            tracing::warn!("remove_entity: {id} is not a live entity");
            return Err(EcsError::EntityNotFound(id));
        };
        self.archetypes[location.archetype.index()].release_slot(location.slot);
        tracing::trace!(
            "removed entity {id} from archetype {} slot {}",
            location.archetype.index(),
            location.slot
        );
        Ok(())
    }

    /// True if `id` names a live entity.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.directory.contains(id)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.directory.alive_count()
    }

    /// Where a live entity is stored.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `id` is not live.
    #[inline]
    pub fn locate(&self, id: EntityId) -> EcsResult<EntityLocation> {
        self.directory.get(id).ok_or(EcsError::EntityNotFound(id))
    }

    /// Component set of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if `id` is not live.
    pub fn entity_mask(&self, id: EntityId) -> EcsResult<&Bitmask> {
        let location = self.locate(id)?;
        Ok(self.archetypes[location.archetype.index()].mask())
    }

    // ========================================================================
    // COMPONENT ACCESS
    // ========================================================================

    fn column(&self, id: EntityId, kind: ComponentKind) -> EcsResult<(&Column, usize)> {
        let location = self.locate(id)?;
        let column = self.archetypes[location.archetype.index()]
            .column_for(kind)
            .ok_or(EcsError::ComponentNotFound { entity: id, kind })?;
        Ok((column, location.slot))
    }

    fn column_mut(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
    ) -> EcsResult<(&mut Column, usize)> {
        let location = self.locate(id)?;
        let column = self.archetypes[location.archetype.index()]
            .column_for_mut(kind)
            .ok_or(EcsError::ComponentNotFound { entity: id, kind })?;
        Ok((column, location.slot))
    }

    /// Bytes of component `kind` on entity `id`.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] for dead ids,
    /// [`EcsError::ComponentNotFound`] if the entity lacks `kind`.
    ///
    /// # Examples
    ///
    /// The returned bytes borrow the world. Copy them out before changing
    /// which entities exist.
    ///
    /// ```
    /// use sunset_core::World;
    ///
    /// let mut world = World::new();
    /// let health = world.register_component(4).unwrap();
    /// let id = world.create_entity(&world.mask_of(&[health])).unwrap();
    ///
    /// let bytes = world.get_component(id, health).unwrap().to_vec();
    /// world.remove_entity(id).unwrap();
    /// assert_eq!(bytes, [0; 4]);
    /// ```
    ///
    /// Holding the borrow across a removal does not compile:
    ///
    /// ```compile_fail
    /// use sunset_core::World;
    ///
    /// let mut world = World::new();
    /// let health = world.register_component(4).unwrap();
    /// let id = world.create_entity(&world.mask_of(&[health])).unwrap();
    ///
    /// let bytes = world.get_component(id, health).unwrap();
    /// world.remove_entity(id).unwrap();
    /// assert_eq!(bytes.len(), 4);
    /// ```
    pub fn get_component(&self, id: EntityId, kind: ComponentKind) -> EcsResult<&[u8]> {
        let (column, slot) = self.column(id, kind)?;
        Ok(column.get(slot).expect("live slot outside its column"))
    }

    /// Mutable bytes of component `kind` on entity `id`.
    ///
    /// # Errors
    ///
    /// Same as [`get_component`](Self::get_component).
    pub fn get_component_mut(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
    ) -> EcsResult<&mut [u8]> {
        let (column, slot) = self.column_mut(id, kind)?;
        Ok(column.get_mut(slot).expect("live slot outside its column"))
    }

    /// Overwrites component `kind` on entity `id`.
    ///
    /// # Errors
    ///
    /// Same as [`get_component`](Self::get_component), plus
    /// [`EcsError::SizeMismatch`] if `data` is not the registered size.
    pub fn set_component(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        data: &[u8],
    ) -> EcsResult<()> {
        let dest = self.get_component_mut(id, kind)?;
        if dest.len() != data.len() {
            return Err(EcsError::SizeMismatch {
                kind,
                expected: dest.len(),
                actual: data.len(),
            });
        }
        dest.copy_from_slice(data);
        Ok(())
    }

    /// Typed view of component `kind` on entity `id`.
    ///
    /// # Errors
    ///
    /// Same as [`get_component`](Self::get_component), plus
    /// [`EcsError::SizeMismatch`] if `T` is not the registered size and
    /// [`EcsError::Layout`] if the slot is not aligned for `T`.
    pub fn get<T: Component>(&self, id: EntityId, kind: ComponentKind) -> EcsResult<&T> {
        let (column, slot) = self.column(id, kind)?;
        check_size::<T>(kind, column.element_size())?;
        column.view::<T>(slot).map_err(|e| layout_error(kind, e))
    }

    /// Mutable typed view of component `kind` on entity `id`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<T: Component>(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
    ) -> EcsResult<&mut T> {
        let (column, slot) = self.column_mut(id, kind)?;
        check_size::<T>(kind, column.element_size())?;
        column.view_mut::<T>(slot).map_err(|e| layout_error(kind, e))
    }

    // ========================================================================
    // ITERATION
    // ========================================================================

    /// Cursor over every live entity whose archetype is a superset of
    /// `query`.
    ///
    /// # Panics
    ///
    /// Panics if `query` has a different width than this world's masks.
    ///
    /// # Examples
    ///
    /// A live cursor keeps the world borrowed, so entities cannot be
    /// created or removed while it is in use:
    ///
    /// ```compile_fail
    /// use sunset_core::World;
    ///
    /// let mut world = World::new();
    /// let health = world.register_component(4).unwrap();
    /// let mask = world.mask_of(&[health]);
    /// world.create_entity(&mask).unwrap();
    ///
    /// let cursor = world.iter(&mask);
    /// world.create_entity(&mask).unwrap();
    /// assert!(cursor.is_valid());
    /// ```
    #[must_use]
    pub fn iter(&self, query: &Bitmask) -> WorldIter<'_> {
        self.check_width(query);
        WorldIter::new(self, query.clone())
    }

    /// Same traversal as [`iter`](Self::iter) as a standard iterator of
    /// entity views.
    ///
    /// # Panics
    ///
    /// Panics if `query` has a different width than this world's masks.
    #[must_use]
    pub fn query(&self, query: &Bitmask) -> Query<'_> {
        Query::new(self.iter(query))
    }

    /// Calls `f` on every live row matching `query` with mutable access to
    /// its components. Returns the number of rows visited.
    ///
    /// # Panics
    ///
    /// Panics if `query` has a different width than this world's masks.
    pub fn for_each_mut<F>(&mut self, query: &Bitmask, mut f: F) -> usize
    where
        F: FnMut(RowMut<'_>),
    {
        self.check_width(query);
        let mut visited = 0;
        for archetype in &mut self.archetypes {
            if !archetype.mask().is_superset(query) {
                continue;
            }
            let mut next = archetype.next_live(0);
            while let Some(slot) = next {
                f(RowMut::new(archetype, slot));
                visited += 1;
                next = archetype.next_live(slot + 1);
            }
        }
        visited
    }

    // ========================================================================
    // ARCHETYPE MIGRATION
    // ========================================================================

    /// Adds component `kind` to a live entity, moving it to the archetype
    /// for its current set plus `kind`. If the entity already has `kind`
    /// the bytes are overwritten in place. The id does not change.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`], [`EcsError::UnregisteredComponent`],
    /// or [`EcsError::SizeMismatch`].
    pub fn insert_component(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        data: &[u8],
    ) -> EcsResult<()> {
        let size = self.registry.require(kind)?;
        if data.len() != size {
            return Err(EcsError::SizeMismatch {
                kind,
                expected: size,
                actual: data.len(),
            });
        }
        let Some(location) = self.directory.get(id) else {
            tracing::warn!("insert_component: {id} is not a live entity");
            return Err(EcsError::EntityNotFound(id));
        };

        let source = &self.archetypes[location.archetype.index()];
        if source.contains(kind) {
            return self.set_component(id, kind, data);
        }

        let mut mask = source.mask().clone();
        mask.set(kind.index());
        let moved = self.migrate(id, location, &mask)?;
        let column = self.archetypes[moved.archetype.index()]
            .column_for_mut(kind)
            .expect("target archetype lacks the inserted kind");
        let written = column.write(moved.slot, data);
        debug_assert!(written, "inserted component did not fit its column");
        Ok(())
    }

    /// Removes component `kind` from a live entity, moving it to the
    /// archetype for its current set minus `kind`. The id does not change.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`].
    pub fn remove_component(&mut self, id: EntityId, kind: ComponentKind) -> EcsResult<()> {
        let Some(location) = self.directory.get(id) else {
            tracing::warn!("remove_component: {id} is not a live entity");
            return Err(EcsError::EntityNotFound(id));
        };

        let source = &self.archetypes[location.archetype.index()];
        if !source.contains(kind) {
            return Err(EcsError::ComponentNotFound { entity: id, kind });
        }

        let mut mask = source.mask().clone();
        mask.unset(kind.index());
        self.migrate(id, location, &mask)?;
        Ok(())
    }

    /// Moves a live entity into the archetype for `mask`, carrying over the
    /// bytes of every kind both archetypes store.
    fn migrate(
        &mut self,
        id: EntityId,
        from: EntityLocation,
        mask: &Bitmask,
    ) -> EcsResult<EntityLocation> {
        let target = self.find_or_create_archetype(mask)?;

        let source = &self.archetypes[from.archetype.index()];
        let carried: Vec<(ComponentKind, Vec<u8>)> = source
            .columns()
            .iter()
            .filter(|column| mask.is_set(column.kind().index()))
            .map(|column| {
                let bytes = column.get(from.slot).expect("live slot outside its column");
                (column.kind(), bytes.to_vec())
            })
            .collect();

        self.archetypes[from.archetype.index()].release_slot(from.slot);
        let destination = &mut self.archetypes[target.index()];
        let slot = destination.append_slot(id);
        for (kind, bytes) in &carried {
            let column = destination
                .column_for_mut(*kind)
                .expect("target archetype lacks a carried kind");
            let written = column.write(slot, bytes);
            debug_assert!(written, "carried component did not fit its column");
        }

        let to = EntityLocation {
            archetype: target,
            slot,
        };
        let relocated = self.directory.relocate(id, to);
        debug_assert!(relocated, "migrated entity missing from the directory");
        tracing::trace!(
            "moved entity {id} from archetype {} slot {} to archetype {} slot {slot}",
            from.archetype.index(),
            from.slot,
            target.index()
        );
        Ok(to)
    }
}

pub(crate) fn check_size<T: Component>(kind: ComponentKind, registered: usize) -> EcsResult<()> {
    let actual = std::mem::size_of::<T>();
    if actual == registered {
        Ok(())
    } else {
        Err(EcsError::SizeMismatch {
            kind,
            expected: registered,
            actual,
        })
    }
}

pub(crate) fn layout_error(kind: ComponentKind, error: bytemuck::PodCastError) -> EcsError {
    EcsError::Layout {
        kind,
        reason: format!("{error:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_kinds() -> (World, ComponentKind, ComponentKind) {
        let mut world = World::new();
        let position = world.register_component(12).unwrap();
        let velocity = world.register_component(12).unwrap();
        (world, position, velocity)
    }

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.archetype_count(), 0);
        assert_eq!(world.empty_mask().capacity(), 64);
    }

    #[test]
    fn test_create_and_remove() {
        let (mut world, position, velocity) = world_with_kinds();
        let mask = world.mask_of(&[position, velocity]);

        let a = world.create_entity(&mask).unwrap();
        let b = world.create_entity(&mask).unwrap();
        assert_eq!(world.archetype_count(), 1);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.locate(b).unwrap().slot, 1);

        world.remove_entity(a).unwrap();
        assert!(!world.contains(a));
        assert_eq!(world.remove_entity(a), Err(EcsError::EntityNotFound(a)));
        assert_eq!(
            world.get_component(a, position),
            Err(EcsError::EntityNotFound(a))
        );

        // Same slot and index come back, under a new generation.
        let c = world.create_entity(&mask).unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(world.locate(c).unwrap().slot, 0);
        assert!(world.get_component(a, position).is_err());
    }

    #[test]
    fn test_unregistered_kind_rejected() {
        let (mut world, _, _) = world_with_kinds();
        let mut mask = world.empty_mask();
        mask.set(10);
        assert_eq!(
            world.create_entity(&mask),
            Err(EcsError::UnregisteredComponent(ComponentKind::from_index(10)))
        );
        assert_eq!(world.archetype_count(), 0);
    }

    #[test]
    #[should_panic(expected = "width mismatch")]
    fn test_foreign_width_mask_panics() {
        let (mut world, _, _) = world_with_kinds();
        let _ = world.create_entity(&Bitmask::empty(256));
    }

    #[test]
    fn test_component_not_found() {
        let (mut world, position, velocity) = world_with_kinds();
        let id = world.create_entity(&world.mask_of(&[position])).unwrap();
        assert_eq!(
            world.get_component(id, velocity),
            Err(EcsError::ComponentNotFound {
                entity: id,
                kind: velocity
            })
        );
    }

    #[test]
    fn test_set_and_typed_get() {
        let (mut world, position, _) = world_with_kinds();
        let id = world.create_entity(&world.mask_of(&[position])).unwrap();

        let bytes: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        world.set_component(id, position, &bytes).unwrap();
        assert_eq!(*world.get::<[f32; 3]>(id, position).unwrap(), [1.0, 2.0, 3.0]);

        world.get_mut::<[f32; 3]>(id, position).unwrap()[1] = 9.0;
        assert_eq!(world.get::<[f32; 3]>(id, position).unwrap()[1], 9.0);

        assert!(matches!(
            world.get::<u64>(id, position),
            Err(EcsError::SizeMismatch { expected: 12, actual: 8, .. })
        ));
        assert!(matches!(
            world.set_component(id, position, &[0; 4]),
            Err(EcsError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_capacity_from_config() {
        let config = WorldConfig {
            max_components: 2,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        world.register_component(1).unwrap();
        world.register_component(1).unwrap();
        assert_eq!(
            world.register_component(1),
            Err(EcsError::CapacityExceeded { max: 2 })
        );
    }

    #[test]
    fn test_wide_world() {
        let config = WorldConfig {
            max_components: 130,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        let kinds: Vec<_> = (0..130).map(|_| world.register_component(1).unwrap()).collect();
        let mask = world.mask_of(&[kinds[0], kinds[129]]);
        assert_eq!(mask.num_limbs(), 3);
        let id = world.create_entity(&mask).unwrap();
        world.set_component(id, kinds[129], &[42]).unwrap();
        assert_eq!(world.get_component(id, kinds[129]).unwrap(), &[42]);
    }

    fn wide_world() -> (World, ComponentKind) {
        let config = WorldConfig {
            max_components: 130,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        let kind = world.register_component(2).unwrap();
        (world, kind)
    }

    #[test]
    fn test_masks_built_outside_the_world_match_its_width() {
        let (mut world, kind) = wide_world();
        let mut mask = Bitmask::empty(192);
        mask.set(kind.index());
        let id = world.create_entity(&mask).unwrap();
        assert_eq!(world.query(&Bitmask::empty(130)).count(), 1);
        assert!(world.contains(id));
    }

    #[test]
    #[should_panic(expected = "world uses 3 limbs, mask has 1")]
    fn test_wide_world_rejects_narrow_query() {
        let (mut world, _) = wide_world();
        world.for_each_mut(&Bitmask::empty(64), |_| {});
    }

    #[test]
    fn test_insert_and_remove_component() {
        let (mut world, position, velocity) = world_with_kinds();
        let id = world.create_entity(&world.mask_of(&[position])).unwrap();
        world.set_component(id, position, &[1; 12]).unwrap();

        world.insert_component(id, velocity, &[2; 12]).unwrap();
        assert_eq!(world.archetype_count(), 2);
        assert!(world.entity_mask(id).unwrap().is_set(velocity.index()));
        assert_eq!(world.get_component(id, position).unwrap(), &[1; 12]);
        assert_eq!(world.get_component(id, velocity).unwrap(), &[2; 12]);

        // Old archetype slot went back to its free list.
        let old = world.archetype(ArchetypeId(0)).unwrap();
        assert_eq!(old.free_slots(), &[0]);
        assert!(old.is_empty());

        // Present kind: overwrite in place, no move.
        let before = world.locate(id).unwrap();
        world.insert_component(id, velocity, &[3; 12]).unwrap();
        assert_eq!(world.locate(id).unwrap(), before);
        assert_eq!(world.get_component(id, velocity).unwrap(), &[3; 12]);

        world.remove_component(id, position).unwrap();
        assert_eq!(world.archetype_count(), 3);
        assert!(world.get_component(id, position).is_err());
        assert_eq!(world.get_component(id, velocity).unwrap(), &[3; 12]);
        assert_eq!(
            world.remove_component(id, position),
            Err(EcsError::ComponentNotFound {
                entity: id,
                kind: position
            })
        );
    }

    #[test]
    fn test_for_each_mut_updates_rows() {
        let (mut world, position, velocity) = world_with_kinds();
        let both = world.mask_of(&[position, velocity]);
        let a = world.create_entity(&both).unwrap();
        let b = world.create_entity(&world.mask_of(&[position])).unwrap();

        let visited = world.for_each_mut(&world.mask_of(&[position]), |mut row| {
            row.get_mut(position).unwrap()[0] = 5;
        });
        assert_eq!(visited, 2);
        assert_eq!(world.get_component(a, position).unwrap()[0], 5);
        assert_eq!(world.get_component(b, position).unwrap()[0], 5);

        let visited = world.for_each_mut(&both, |_| {});
        assert_eq!(visited, 1);
    }
}
