use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An opaque entity identifier. Ids come from a monotonic counter and are never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

impl Entity {
    /// Create an entity from a raw id (mainly for testing).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id of this entity.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out entity ids for one world.
///
/// Clones share the same counter, so every command buffer created by a world
/// draws from the world's id space at call time, before the spawn is committed.
#[derive(Debug, Clone, Default)]
pub struct EntityAllocator {
    next: Arc<AtomicU64>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next entity id.
    pub fn allocate(&self) -> Entity {
        Entity(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
