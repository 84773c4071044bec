//! # Component Kinds
//!
//! Components are opaque, fixed-size byte blobs. The store only knows the
//! size of each kind; the layout of the bytes belongs to whoever registered
//! it.
//!
//! Kinds are handed out densely from zero, in registration order, and never
//! change size afterwards.

use std::fmt;

use bytemuck::Pod;

use crate::error::{EcsError, EcsResult};

/// Marker trait for components accessed through the typed API.
///
/// Components must be:
/// - `Pod`: plain old data, any bit pattern is valid and they can be viewed
///   directly over column bytes
/// - `Send + Sync + 'static`: no borrowed or thread-bound state
///
/// Column storage is 8-byte aligned, so in-place views require
/// `align_of::<T>() <= 8`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Position {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// let position = world.register::<Position>()?;
/// ```
pub trait Component: Pod + Send + Sync + 'static {}

impl<T: Pod + Send + Sync + 'static> Component for T {}

/// Dense identifier of a registered component kind.
///
/// Doubles as the bit index of the kind in a [`Bitmask`](super::Bitmask).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentKind(u16);

impl ComponentKind {
    /// Wraps a raw kind index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in 16 bits.
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        let raw = u16::try_from(index).expect("component kind index exceeds u16::MAX");
        Self(raw)
    }

    /// Bit index of this kind.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only table of component sizes.
#[derive(Debug, Clone)]
pub(crate) struct ComponentRegistry {
    sizes: Vec<usize>,
    max: usize,
}

impl ComponentRegistry {
    /// Creates an empty registry that accepts at most `max` kinds.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            sizes: Vec::with_capacity(max),
            max,
        }
    }

    /// Assigns the next kind id to a component of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExceeded`] once `max` kinds exist.
    pub fn register(&mut self, size: usize) -> EcsResult<ComponentKind> {
        if self.sizes.len() >= self.max {
            tracing::error!(
                "component registry full ({} kinds), rejecting {size}-byte kind",
                self.max
            );
            return Err(EcsError::CapacityExceeded { max: self.max });
        }

        let kind = ComponentKind::from_index(self.sizes.len());
        self.sizes.push(size);
        tracing::debug!("registered component {kind}: {size} bytes");
        Ok(kind)
    }

    /// Size of `kind` in bytes, if registered.
    #[inline]
    #[must_use]
    pub fn size_of(&self, kind: ComponentKind) -> Option<usize> {
        self.sizes.get(kind.index()).copied()
    }

    /// Size of `kind`, or [`EcsError::UnregisteredComponent`].
    ///
    /// # Errors
    ///
    /// Fails if `kind` was not issued by this registry.
    #[inline]
    pub fn require(&self, kind: ComponentKind) -> EcsResult<usize> {
        self.size_of(kind)
            .ok_or(EcsError::UnregisteredComponent(kind))
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }
}
