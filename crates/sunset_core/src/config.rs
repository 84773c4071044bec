//! # World Configuration
//!
//! Sizing knobs for a [`World`](crate::World). Loaded once at startup, either
//! built in code or parsed from a TOML document:
//!
//! ```toml
//! max_components = 128
//! entity_capacity = 100000
//! archetype_capacity = 256
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Largest component ceiling a world accepts.
pub const MAX_COMPONENTS_LIMIT: usize = 4096;

/// Largest up-front entity directory reservation.
pub const MAX_ENTITY_CAPACITY: usize = 1 << 24;

/// Largest up-front slot reservation per archetype.
pub const MAX_ARCHETYPE_CAPACITY: usize = 1 << 20;

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of component kinds. Fixes the bitmask width of the
    /// world, rounded up to a whole limb.
    pub max_components: usize,
    /// Initial reservation for the entity directory.
    pub entity_capacity: usize,
    /// Initial slot reservation for each newly created archetype.
    pub archetype_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_components: 64,
            entity_capacity: 1024,
            archetype_capacity: 64,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document does not parse or
    /// fails [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to parse world config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_components == 0 {
            return Err(EcsError::InvalidConfig(
                "max_components must be at least 1".to_string(),
            ));
        }
        if self.max_components > MAX_COMPONENTS_LIMIT {
            return Err(EcsError::InvalidConfig(format!(
                "max_components {} exceeds the limit of {MAX_COMPONENTS_LIMIT}",
                self.max_components
            )));
        }
        if self.entity_capacity > MAX_ENTITY_CAPACITY {
            return Err(EcsError::InvalidConfig(format!(
                "entity_capacity {} exceeds the limit of {MAX_ENTITY_CAPACITY}",
                self.entity_capacity
            )));
        }
        if self.archetype_capacity > MAX_ARCHETYPE_CAPACITY {
            return Err(EcsError::InvalidConfig(format!(
                "archetype_capacity {} exceeds the limit of {MAX_ARCHETYPE_CAPACITY}",
                self.archetype_capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WorldConfig::from_toml_str("max_components = 128").unwrap();
        assert_eq!(config.max_components, 128);
        assert_eq!(config.entity_capacity, WorldConfig::default().entity_capacity);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            WorldConfig::from_toml_str("max_components = 0"),
            Err(EcsError::InvalidConfig(_))
        ));
        assert!(matches!(
            WorldConfig::from_toml_str("max_components = 5000"),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_reservations() {
        for source in [
            "archetype_capacity = 4611686018427387903",
            "entity_capacity = 4611686018427387903",
        ] {
            assert!(matches!(
                WorldConfig::from_toml_str(source),
                Err(EcsError::InvalidConfig(_))
            ));
        }
        let at_limit = WorldConfig {
            entity_capacity: MAX_ENTITY_CAPACITY,
            archetype_capacity: MAX_ARCHETYPE_CAPACITY,
            ..WorldConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(WorldConfig::from_toml_str("max_components = \"lots\"").is_err());
    }
}
