//! # Entity Builder
//!
//! Stages `(kind, bytes)` pairs and materializes them as one entity.
//!
//! The builder holds the world mutably for its whole life and
//! [`finish`](EntityBuilder::finish) consumes it, so a finished builder
//! cannot be touched again. Dropping a builder without finishing discards
//! the staged data and leaves the world unchanged.

use super::bitmask::Bitmask;
use super::component::{Component, ComponentKind};
use super::entity::EntityId;
use super::world::World;
use crate::error::{EcsError, EcsResult};

/// Staging area for a new entity.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = world.builder();
/// builder
///     .with(position, &Position::new(1.0, 2.0, 3.0))?
///     .with(velocity, &Velocity::new(0.1, 0.0, 0.0))?;
/// let entity = builder.finish();
/// ```
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    /// Kinds staged so far.
    mask: Bitmask,
    /// Staged payloads in insertion order. A kind may appear twice; the
    /// later entry wins.
    staged: Vec<(ComponentKind, Vec<u8>)>,
}

impl<'w> EntityBuilder<'w> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        let mask = world.empty_mask();
        Self {
            world,
            mask,
            staged: Vec::new(),
        }
    }

    /// Stages a copy of `data` for component `kind`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponent`] for unknown kinds and
    /// [`EcsError::SizeMismatch`] if `data` is not the registered size.
    pub fn add_component(&mut self, kind: ComponentKind, data: &[u8]) -> EcsResult<&mut Self> {
        let size = self.world.registry().require(kind)?;
        if data.len() != size {
            return Err(EcsError::SizeMismatch {
                kind,
                expected: size,
                actual: data.len(),
            });
        }
        self.mask.set(kind.index());
        self.staged.push((kind, data.to_vec()));
        Ok(self)
    }

    /// Stages a typed value for component `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn with<T: Component>(&mut self, kind: ComponentKind, value: &T) -> EcsResult<&mut Self> {
        self.add_component(kind, bytemuck::bytes_of(value))
    }

    /// Component set staged so far.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &Bitmask {
        &self.mask
    }

    /// Creates the entity and writes every staged payload, in order.
    ///
    /// # Panics
    ///
    /// Panics only on an internal invariant violation: every staged kind
    /// was validated when it was added.
    #[must_use = "the returned id is the only handle to the new entity"]
    pub fn finish(self) -> EntityId {
        let Self {
            world,
            mask,
            staged,
        } = self;

        let id = world
            .create_entity(&mask)
            .expect("staged kinds were validated on add");
        let location = world.locate(id).expect("freshly created entity is live");
        let archetype = world.archetype_mut(location.archetype);
        for (kind, bytes) in &staged {
            let written = archetype
                .column_for_mut(*kind)
                .is_some_and(|column| column.write(location.slot, bytes));
            assert!(written, "staged component {kind} has no column in its archetype");
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_writes_all_components() {
        let mut world = World::new();
        let a = world.register_component(4).unwrap();
        let b = world.register_component(2).unwrap();

        let mut builder = world.builder();
        builder.add_component(b, &[9, 9]).unwrap();
        builder.add_component(a, &[1, 2, 3, 4]).unwrap();
        assert_eq!(builder.mask().popcount(), 2);
        let id = builder.finish();

        assert_eq!(world.get_component(id, a).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(world.get_component(id, b).unwrap(), &[9, 9]);
    }

    #[test]
    fn test_duplicate_kind_last_write_wins() {
        let mut world = World::new();
        let a = world.register_component(4).unwrap();

        let mut builder = world.builder();
        builder
            .add_component(a, &[1; 4])
            .unwrap()
            .add_component(a, &[2; 4])
            .unwrap();
        let id = builder.finish();

        assert_eq!(world.get_component(id, a).unwrap(), &[2; 4]);
        assert_eq!(world.entity_mask(id).unwrap().popcount(), 1);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        let mut world = World::new();
        let a = world.register_component(4).unwrap();

        let mut builder = world.builder();
        assert!(matches!(
            builder.add_component(a, &[0; 3]),
            Err(EcsError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
        let unknown = ComponentKind::from_index(7);
        assert!(matches!(
            builder.add_component(unknown, &[]),
            Err(EcsError::UnregisteredComponent(k)) if k == unknown
        ));
        assert!(builder.mask().is_zero());
    }

    #[test]
    fn test_dropped_builder_leaves_world_untouched() {
        let mut world = World::new();
        let a = world.register_component(4).unwrap();
        {
            let mut builder = world.builder();
            builder.add_component(a, &[0; 4]).unwrap();
        }
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.archetype_count(), 0);
    }

    #[test]
    fn test_typed_with() {
        let mut world = World::new();
        let pair = world.register::<[u32; 2]>().unwrap();
        let mut builder = world.builder();
        builder.with(pair, &[7u32, 8]).unwrap();
        let id = builder.finish();
        assert_eq!(*world.get::<[u32; 2]>(id, pair).unwrap(), [7, 8]);
    }

    #[test]
    fn test_empty_builder_creates_bare_entity() {
        let mut world = World::new();
        let id = world.builder().finish();
        assert!(world.contains(id));
        assert!(world.entity_mask(id).unwrap().is_zero());
    }
}
