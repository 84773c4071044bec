//! # Sunset Core
//!
//! Archetype-based Entity Component System (ECS) store:
//! - Component kinds registered by byte size at startup
//! - Entities grouped by exact component set into archetype tables
//! - Iteration over every entity holding at least a given set of kinds
//!
//! ## Architecture Rules
//!
//! 1. **Opaque payloads** - The store moves bytes; typed views are a
//!    `bytemuck` cast over the same storage
//! 2. **Stable slots** - An entity never moves inside its archetype
//! 3. **Stale ids fail** - Generation counters reject ids of removed entities
//!
//! ## Example
//!
//! ```rust,ignore
//! use sunset_core::World;
//!
//! let mut world = World::new();
//! let position = world.register::<[f32; 3]>()?;
//! let velocity = world.register::<[f32; 3]>()?;
//!
//! let mut builder = world.builder();
//! builder.with(position, &[0.0f32; 3])?.with(velocity, &[1.0f32, 0.0, 0.0])?;
//! let entity = builder.finish();
//!
//! world.for_each_mut(&world.mask_of(&[position, velocity]), |mut row| {
//!     let (p, v) = row.pair_mut::<[f32; 3], [f32; 3]>(position, velocity).unwrap();
//!     p[0] += v[0];
//! });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    Archetype, ArchetypeId, Bitmask, Column, Component, ComponentKind, EntityBuilder, EntityId,
    EntityRef, Query, RowMut, World, WorldIter,
};
pub use error::{EcsError, EcsResult};
