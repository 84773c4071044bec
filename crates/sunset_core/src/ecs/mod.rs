//! # Entity Component System
//!
//! An archetype ECS over opaque, fixed-size component payloads.
//!
//! ## Design
//!
//! - A component kind is a dense integer naming a registered byte size
//! - An entity's component set is a [`Bitmask`]; entities with equal masks
//!   share one [`Archetype`]
//! - Each archetype stores one packed [`Column`] per kind
//! - Removed slots are reused, never compacted, so slots are stable
//! - Entity ids carry a generation counter and go stale on removal
//!
//! The entity directory, the size registry and slot occupancy bits are
//! internal to the world and cannot be reached from outside:
//!
//! ```compile_fail
//! use sunset_core::ecs::EntityDirectory;
//! ```
//!
//! ```compile_fail
//! use sunset_core::ecs::archetype::SlotBits;
//! ```

pub mod archetype;
pub mod bitmask;
mod builder;
mod component;
mod entity;
mod query;
mod storage;
mod world;

pub use archetype::{Archetype, ArchetypeId};
pub use bitmask::{Bitmask, Limb, Ones, LIMB_BITS};
pub use builder::EntityBuilder;
pub use component::{Component, ComponentKind};
pub use entity::{EntityId, EntityLocation};
pub use query::{EntityRef, Query, RowMut, WorldIter};
pub use storage::Column;
pub use world::World;
