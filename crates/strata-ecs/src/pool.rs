use std::any::type_name;
use std::fmt;

use crate::error::{EcsError, Result};

/// Handle to an instance owned by a [`Pool`].
///
/// The generation is bumped every time the slot is released, so a handle kept
/// past its `destroy` no longer matches and is rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolSlot {
    index: u32,
    generation: u32,
}

impl PoolSlot {
    /// Create a slot handle from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for PoolSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolSlot({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for PoolSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Reusable instance storage for one component type.
///
/// Slots released by [`Pool::destroy`] go to a reuse cache and are handed out
/// again by [`Pool::create`] before any new slot is allocated. Slot storage is
/// only freed when the pool itself is cleared or dropped.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    cache: Vec<u32>,
    live: usize,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            cache: Vec::new(),
            live: 0,
        }
    }

    /// Store `value`, reusing a cached slot when one is available.
    pub fn create(&mut self, value: T) -> PoolSlot {
        self.live += 1;
        if let Some(index) = self.cache.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return PoolSlot {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: Some(value),
            generation: 0,
        });
        PoolSlot {
            index,
            generation: 0,
        }
    }

    /// Release the instance behind `slot` and return its value.
    ///
    /// Fails with [`EcsError::PoolIntegrityViolation`] if `slot` is not a live
    /// handle of this pool.
    pub fn destroy(&mut self, slot: PoolSlot) -> Result<T> {
        let value = self
            .slots
            .get_mut(slot.index as usize)
            .filter(|s| s.generation == slot.generation)
            .and_then(|s| {
                let value = s.value.take()?;
                s.generation = s.generation.wrapping_add(1);
                Some(value)
            })
            .ok_or(EcsError::PoolIntegrityViolation {
                component: type_name::<T>(),
                slot,
            })?;
        self.cache.push(slot.index);
        self.live -= 1;
        Ok(value)
    }

    pub fn get(&self, slot: PoolSlot) -> Option<&T> {
        self.slots
            .get(slot.index as usize)
            .filter(|s| s.generation == slot.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, slot: PoolSlot) -> Option<&mut T> {
        self.slots
            .get_mut(slot.index as usize)
            .filter(|s| s.generation == slot.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Number of instances currently handed out.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever constructed.
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Number of released slots waiting for reuse.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every instance and free all slot storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cache.clear();
        self.live = 0;
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn create_and_get() {
        let mut pool = Pool::new();
        let a = pool.create(1i32);
        let b = pool.create(2i32);
        assert_eq!(pool.get(a), Some(&1));
        assert_eq!(pool.get(b), Some(&2));
        assert_eq!(pool.len(), 2);
        *pool.get_mut(a).unwrap() = 10;
        assert_eq!(pool.get(a), Some(&10));
    }

    #[test]
    fn destroy_returns_value_and_caches_slot() {
        let mut pool = Pool::new();
        let a = pool.create("a".to_string());
        assert_eq!(pool.destroy(a).unwrap(), "a");
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.cached(), 1);
        assert_eq!(pool.get(a), None);
    }

    #[test]
    fn create_destroy_cycles_construct_once() {
        let mut pool = Pool::new();
        for i in 0..50u32 {
            let slot = pool.create(i);
            pool.destroy(slot).unwrap();
        }
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.cached(), 1);
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut pool = Pool::new();
        let first = pool.create(1u8);
        pool.destroy(first).unwrap();
        let second = pool.create(2u8);
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert_eq!(pool.get(first), None);
        assert_eq!(pool.get(second), Some(&2));
    }

    #[test]
    fn stale_handle_is_integrity_violation() {
        let mut pool = Pool::new();
        let slot = pool.create(7u64);
        pool.destroy(slot).unwrap();
        let again = pool.create(8u64);

        let err = pool.destroy(slot).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, EcsError::PoolIntegrityViolation { slot: s, .. } if s == slot));
        assert_eq!(pool.get(again), Some(&8));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn untracked_handle_is_integrity_violation() {
        let mut pool: Pool<u64> = Pool::new();
        let err = pool.destroy(PoolSlot::from_raw(9, 0)).unwrap_err();
        assert!(matches!(err, EcsError::PoolIntegrityViolation { .. }));
    }

    #[test]
    fn destroy_drops_value() {
        struct Tracked(Arc<AtomicUsize>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let mut pool = Pool::new();
        let a = pool.create(Tracked(drops.clone()));
        pool.create(Tracked(drops.clone()));
        drop(pool.destroy(a).unwrap());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        pool.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert_eq!(pool.allocated(), 0);
    }
}
