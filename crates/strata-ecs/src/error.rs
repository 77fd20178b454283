use crate::entity::Entity;
use crate::pool::PoolSlot;

/// Errors raised by the storage layer, command commits and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    #[error("entity {entity} has no component `{component}`")]
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },

    #[error("resource `{0}` is not set")]
    ResourceNotFound(&'static str),

    #[error("resource `{0}` is already set")]
    ResourceAlreadyExists(&'static str),

    #[error("pool for `{component}` does not track slot {slot}")]
    PoolIntegrityViolation {
        component: &'static str,
        slot: PoolSlot,
    },

    #[error("entity {0} does not exist")]
    InvalidEntity(Entity),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl EcsError {
    /// Whether the error means storage state can no longer be trusted.
    ///
    /// Only pool integrity violations are fatal; everything else is local to
    /// the operation that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PoolIntegrityViolation { .. })
    }
}

pub type Result<T, E = EcsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pool_violations_are_fatal() {
        let violation = EcsError::PoolIntegrityViolation {
            component: "Position",
            slot: PoolSlot::from_raw(3, 1),
        };
        assert!(violation.is_fatal());
        assert!(!EcsError::ResourceNotFound("Timer").is_fatal());
        assert!(!EcsError::InvalidEntity(Entity::from_raw(7)).is_fatal());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = EcsError::ComponentNotFound {
            entity: Entity::from_raw(4),
            component: "Velocity",
        };
        assert_eq!(err.to_string(), "entity 4 has no component `Velocity`");
        assert_eq!(
            EcsError::ResourceAlreadyExists("Timer").to_string(),
            "resource `Timer` is already set"
        );
    }
}
