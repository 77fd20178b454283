use std::collections::HashMap;

use crate::entity::Entity;
use crate::pool::PoolSlot;
use crate::registry::ComponentId;

/// Components owned by one entity, keyed by component id.
pub(crate) type ComponentSlots = HashMap<ComponentId, PoolSlot>;

/// Maps every live entity to the pool slots of the components it owns.
#[derive(Debug, Default)]
pub(crate) struct EntityDirectory {
    entities: HashMap<Entity, ComponentSlots>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` with no components. Returns `false` if it already exists.
    pub fn insert_entity(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity) {
            return false;
        }
        self.entities.insert(entity, ComponentSlots::new());
        true
    }

    /// Erase `entity`, handing back the slots it owned.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<ComponentSlots> {
        self.entities.remove(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn has(&self, entity: Entity, id: ComponentId) -> bool {
        self.slot(entity, id).is_some()
    }

    pub fn slot(&self, entity: Entity, id: ComponentId) -> Option<PoolSlot> {
        self.entities.get(&entity)?.get(&id).copied()
    }

    /// Record that `entity` owns `slot` for component `id`.
    ///
    /// Returns `false` and records nothing if the entity is not registered.
    pub fn attach(&mut self, entity: Entity, id: ComponentId, slot: PoolSlot) -> bool {
        match self.entities.get_mut(&entity) {
            Some(components) => {
                components.insert(id, slot);
                true
            }
            None => false,
        }
    }

    pub fn detach(&mut self, entity: Entity, id: ComponentId) -> Option<PoolSlot> {
        self.entities.get_mut(&entity)?.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeIndex;

    #[test]
    fn attach_requires_registered_entity() {
        let mut dir = EntityDirectory::new();
        let e = Entity::from_raw(1);
        let id = ComponentId::from_raw(0);
        assert!(!dir.attach(e, id, PoolSlot::from_raw(0, 0)));
        assert!(dir.insert_entity(e));
        assert!(dir.attach(e, id, PoolSlot::from_raw(0, 0)));
        assert!(dir.has(e, id));
    }

    #[test]
    fn detach_and_remove() {
        let mut dir = EntityDirectory::new();
        let e = Entity::from_raw(2);
        let a = ComponentId::from_raw(0);
        let b = ComponentId::from_raw(1);
        dir.insert_entity(e);
        dir.attach(e, a, PoolSlot::from_raw(0, 0));
        dir.attach(e, b, PoolSlot::from_raw(3, 1));

        assert_eq!(dir.detach(e, a), Some(PoolSlot::from_raw(0, 0)));
        assert!(!dir.has(e, a));
        assert_eq!(dir.detach(e, a), None);

        let owned = dir.remove_entity(e).unwrap();
        assert_eq!(owned.get(&b), Some(&PoolSlot::from_raw(3, 1)));
        assert!(!dir.contains(e));
        assert_eq!(dir.len(), 0);
    }

    #[test]
    fn duplicate_insert_keeps_components() {
        let mut dir = EntityDirectory::new();
        let e = Entity::from_raw(5);
        let id = ComponentId::from_raw(2);
        dir.insert_entity(e);
        dir.attach(e, id, PoolSlot::from_raw(1, 0));
        assert!(!dir.insert_entity(e));
        assert!(dir.has(e, id));
    }
}
