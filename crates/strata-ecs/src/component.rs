use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use tracing::trace;

use crate::config::EcsConfig;
use crate::directory::{ComponentSlots, EntityDirectory};
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::pool::{Pool, PoolSlot};
use crate::registry::{ComponentId, TypeRegistry};
use crate::sparse_set::SparseSet;

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

/// Blanket implementation: any `'static + Send + Sync` type is a valid component.
impl<T: 'static + Send + Sync> Component for T {}

/// Type-erased component storage interface.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn members(&self) -> &SparseSet;
    /// Return `slot` to the pool and drop `entity` from the membership set.
    fn release(&mut self, entity: Entity, slot: PoolSlot) -> Result<()>;
    fn clear(&mut self);
}

/// Pool plus membership set for a single component type.
pub(crate) struct ComponentColumn<T> {
    pool: Pool<T>,
    members: SparseSet,
}

impl<T: Component> ComponentColumn<T> {
    pub fn new(config: &EcsConfig) -> Self {
        Self {
            pool: Pool::with_capacity(config.pool_capacity),
            members: SparseSet::with_page_size(config.sparse_page_size),
        }
    }

    pub fn insert(&mut self, entity: Entity, value: T) -> PoolSlot {
        let slot = self.pool.create(value);
        self.members.add(entity);
        slot
    }

    pub fn get(&self, slot: PoolSlot) -> Option<&T> {
        self.pool.get(slot)
    }

    pub fn get_mut(&mut self, slot: PoolSlot) -> Option<&mut T> {
        self.pool.get_mut(slot)
    }

    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }
}

impl<T: Component> ComponentStorage for ComponentColumn<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn members(&self) -> &SparseSet {
        &self.members
    }

    fn release(&mut self, entity: Entity, slot: PoolSlot) -> Result<()> {
        self.members.remove(entity);
        self.pool.destroy(slot).map(drop)
    }

    fn clear(&mut self) {
        self.pool.clear();
        self.members.clear();
    }
}

/// Every component column of a world, keyed by the world's component ids.
///
/// Columns are registered lazily by the first insert of a type. Lookups never
/// register, so asking about a type that was never stored is cheap and
/// reports absence.
pub(crate) struct ComponentStore {
    registry: TypeRegistry<ComponentId>,
    columns: HashMap<ComponentId, Box<dyn ComponentStorage>>,
    config: EcsConfig,
}

impl ComponentStore {
    pub fn new(config: EcsConfig) -> Self {
        Self {
            registry: TypeRegistry::new(),
            columns: HashMap::new(),
            config,
        }
    }

    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.registry.get::<T>()
    }

    pub fn id_by_type_id(&self, type_id: TypeId) -> Option<ComponentId> {
        self.registry.get_by_type_id(type_id)
    }

    pub fn registry(&self) -> &TypeRegistry<ComponentId> {
        &self.registry
    }

    fn column_mut<T: Component>(&mut self) -> (ComponentId, &mut ComponentColumn<T>) {
        let id = self.registry.register::<T>();
        let config = &self.config;
        let column = self
            .columns
            .entry(id)
            .or_insert_with(|| {
                trace!(component = type_name::<T>(), %id, "registered component column");
                Box::new(ComponentColumn::<T>::new(config))
            })
            .as_any_mut()
            .downcast_mut::<ComponentColumn<T>>()
            .expect("component type mismatch");
        (id, column)
    }

    pub(crate) fn column<T: Component>(&self) -> Option<&ComponentColumn<T>> {
        let id = self.registry.get::<T>()?;
        self.columns
            .get(&id)
            .and_then(|c| c.as_any().downcast_ref::<ComponentColumn<T>>())
    }

    /// Attach `value` to `entity`, replacing the value in place if the entity
    /// already owns a `T`.
    pub fn insert<T: Component>(
        &mut self,
        directory: &mut EntityDirectory,
        entity: Entity,
        value: T,
    ) -> Result<()> {
        if !directory.contains(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }
        let (id, column) = self.column_mut::<T>();
        if let Some(slot) = directory.slot(entity, id) {
            let current = column
                .get_mut(slot)
                .ok_or(EcsError::PoolIntegrityViolation {
                    component: type_name::<T>(),
                    slot,
                })?;
            *current = value;
            return Ok(());
        }
        let slot = column.insert(entity, value);
        directory.attach(entity, id, slot);
        Ok(())
    }

    /// Detach `T` from `entity`. Returns `false` if the entity did not own one.
    pub fn remove<T: Component>(
        &mut self,
        directory: &mut EntityDirectory,
        entity: Entity,
    ) -> Result<bool> {
        let Some(id) = self.registry.get::<T>() else {
            return Ok(false);
        };
        let Some(slot) = directory.detach(entity, id) else {
            return Ok(false);
        };
        self.release(id, entity, slot)?;
        Ok(true)
    }

    /// Return every slot in `owned` to its pool. Used when an entity is destroyed.
    ///
    /// Every column drops `entity` from its membership set even if one of the
    /// pools rejects its slot; the first rejection is returned afterwards.
    pub fn release_all(&mut self, entity: Entity, owned: ComponentSlots) -> Result<()> {
        let mut first = None;
        for (id, slot) in owned {
            if let Err(err) = self.release(id, entity, slot) {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn release(&mut self, id: ComponentId, entity: Entity, slot: PoolSlot) -> Result<()> {
        match self.columns.get_mut(&id) {
            Some(column) => column.release(entity, slot),
            None => Err(EcsError::PoolIntegrityViolation {
                component: self.registry.name(id).unwrap_or("<unregistered>"),
                slot,
            }),
        }
    }

    pub fn get<T: Component>(&self, directory: &EntityDirectory, entity: Entity) -> Result<&T> {
        self.id_of::<T>()
            .and_then(|id| directory.slot(entity, id))
            .and_then(|slot| self.column::<T>()?.get(slot))
            .ok_or_else(|| not_found::<T>(entity))
    }

    pub fn get_mut<T: Component>(
        &mut self,
        directory: &EntityDirectory,
        entity: Entity,
    ) -> Result<&mut T> {
        let Some(slot) = self.id_of::<T>().and_then(|id| directory.slot(entity, id)) else {
            return Err(not_found::<T>(entity));
        };
        self.column_mut::<T>()
            .1
            .get_mut(slot)
            .ok_or_else(|| not_found::<T>(entity))
    }

    pub fn has<T: Component>(&self, directory: &EntityDirectory, entity: Entity) -> bool {
        self.id_of::<T>()
            .is_some_and(|id| directory.has(entity, id))
    }

    /// Membership set of component `id`, if the type has been registered.
    pub fn members(&self, id: ComponentId) -> Option<&SparseSet> {
        self.columns.get(&id).map(|c| c.members())
    }

    /// Drop every stored instance and forget every registration.
    pub fn clear(&mut self) {
        for column in self.columns.values_mut() {
            column.clear();
        }
        self.columns.clear();
        self.registry.clear();
    }
}

fn not_found<T>(entity: Entity) -> EcsError {
    EcsError::ComponentNotFound {
        entity,
        component: type_name::<T>(),
    }
}
