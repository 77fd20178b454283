use std::any::type_name;

use tracing::{debug, error, trace, warn};

use crate::component::{Component, ComponentStore};
use crate::directory::EntityDirectory;
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EcsError, Result};
use crate::resource::{Resource, Resources};

type ComponentOp = Box<dyn FnOnce(&mut ComponentStore, &mut EntityDirectory) -> Result<()> + Send>;
type ResourceOp = Box<dyn FnOnce(&mut Resources) -> Result<()> + Send>;

/// Component values queued for one entity.
pub struct ComponentBatch {
    entity: Entity,
    inserts: Vec<ComponentOp>,
}

impl ComponentBatch {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            inserts: Vec::new(),
        }
    }

    /// Queue `value` for the batch's entity.
    pub fn push<T: Component>(&mut self, value: T) {
        let entity = self.entity;
        self.inserts
            .push(Box::new(move |store: &mut ComponentStore, directory: &mut EntityDirectory| {
                store.insert(directory, entity, value)
            }));
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    fn apply(
        self,
        store: &mut ComponentStore,
        directory: &mut EntityDirectory,
        outcome: &mut CommitOutcome,
    ) -> Result<()> {
        for insert in self.inserts {
            outcome.record(insert(store, directory))?;
        }
        Ok(())
    }
}

/// A group of component values spawned or inserted together.
///
/// Implemented for `()` and tuples of up to eight components.
pub trait Bundle: Send + 'static {
    fn write(self, batch: &mut ComponentBatch);
}

impl Bundle for () {
    fn write(self, _batch: &mut ComponentBatch) {}
}

macro_rules! impl_bundle_tuple {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Component),+> Bundle for ($($name,)+) {
            fn write(self, batch: &mut ComponentBatch) {
                let ($($name,)+) = self;
                $(batch.push($name);)+
            }
        }
    };
}

impl_bundle_tuple!(A);
impl_bundle_tuple!(A, B);
impl_bundle_tuple!(A, B, C);
impl_bundle_tuple!(A, B, C, D);
impl_bundle_tuple!(A, B, C, D, E);
impl_bundle_tuple!(A, B, C, D, E, F);
impl_bundle_tuple!(A, B, C, D, E, F, G);
impl_bundle_tuple!(A, B, C, D, E, F, G, H);

/// Structural changes recorded during a read phase and applied by [`Commands::commit`].
///
/// Entity ids are allocated when `spawn` is called, so the caller can refer
/// to the new entity (for example in another command) before it exists.
pub struct Commands {
    entities: EntityAllocator,
    resources: Vec<ResourceOp>,
    destroyed: Vec<Entity>,
    spawned: Vec<ComponentBatch>,
    inserted: Vec<ComponentBatch>,
    removed: Vec<ComponentOp>,
}

impl Commands {
    pub(crate) fn new(entities: EntityAllocator) -> Self {
        Self {
            entities,
            resources: Vec::new(),
            destroyed: Vec::new(),
            spawned: Vec::new(),
            inserted: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Queue a new entity carrying `bundle` and return its id.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.entities.allocate();
        let mut batch = ComponentBatch::new(entity);
        bundle.write(&mut batch);
        self.spawned.push(batch);
        entity
    }

    /// Queue one new entity per bundle without handing the ids back, for chaining.
    ///
    /// ```ignore
    /// commands
    ///     .spawn_batch([(Position(0), Velocity(1))])
    ///     .spawn_batch((0..4).map(|i| (Position(i),)))
    ///     .set_resource(Timer(0));
    /// ```
    pub fn spawn_batch<B, I>(&mut self, bundles: I) -> &mut Self
    where
        B: Bundle,
        I: IntoIterator<Item = B>,
    {
        for bundle in bundles {
            self.spawn(bundle);
        }
        self
    }

    /// Queue destruction of `entity`. Destroying an unknown entity does nothing.
    pub fn destroy(&mut self, entity: Entity) -> &mut Self {
        self.destroyed.push(entity);
        self
    }

    /// Queue components for an existing entity (or one spawned by this buffer).
    pub fn insert<B: Bundle>(&mut self, entity: Entity, bundle: B) -> &mut Self {
        let mut batch = ComponentBatch::new(entity);
        bundle.write(&mut batch);
        self.inserted.push(batch);
        self
    }

    /// Queue removal of `T` from `entity`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> &mut Self {
        self.removed
            .push(Box::new(move |store: &mut ComponentStore, directory: &mut EntityDirectory| {
                store.remove::<T>(directory, entity).map(drop)
            }));
        self
    }

    /// Queue setting the resource `T`. Fails at commit if a `T` is already set.
    pub fn set_resource<T: Resource>(&mut self, value: T) -> &mut Self {
        self.resources
            .push(Box::new(move |resources: &mut Resources| resources.insert(value)));
        self
    }

    /// Queue removal of the resource `T`.
    pub fn remove_resource<T: Resource>(&mut self) -> &mut Self {
        self.resources.push(Box::new(|resources: &mut Resources| {
            if resources.remove::<T>().is_none() {
                trace!(resource = type_name::<T>(), "removed resource was not set");
            }
            Ok(())
        }));
        self
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.resources.len()
            + self.destroyed.len()
            + self.spawned.len()
            + self.inserted.len()
            + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every queued command.
    ///
    /// Order: resource operations (in record order), destructions, spawns,
    /// component insertions, component removals. A recoverable failure is
    /// logged and the remaining commands still apply; the first such failure
    /// is returned. A fatal failure stops the commit immediately: commands
    /// after the failing one are dropped unapplied and the world is left to the
    /// caller, which is expected to stop driving it.
    pub(crate) fn commit(
        self,
        store: &mut ComponentStore,
        directory: &mut EntityDirectory,
        resources: &mut Resources,
    ) -> Result<()> {
        let mut outcome = CommitOutcome::default();
        let resource_ops = self.resources.len();
        let destroyed = self.destroyed.len();
        let spawned = self.spawned.len();

        for op in self.resources {
            outcome.record(op(resources))?;
        }

        for entity in self.destroyed {
            match directory.remove_entity(entity) {
                Some(owned) => {
                    trace!(%entity, components = owned.len(), "destroying entity");
                    outcome.record(store.release_all(entity, owned))?;
                }
                None => trace!(%entity, "destroy of unknown entity ignored"),
            }
        }

        for batch in self.spawned {
            trace!(entity = %batch.entity, components = batch.len(), "spawning entity");
            directory.insert_entity(batch.entity);
            batch.apply(store, directory, &mut outcome)?;
        }

        for batch in self.inserted {
            if !directory.contains(batch.entity) {
                outcome.record(Err(EcsError::InvalidEntity(batch.entity)))?;
                continue;
            }
            batch.apply(store, directory, &mut outcome)?;
        }

        for op in self.removed {
            outcome.record(op(store, directory))?;
        }

        debug!(resource_ops, destroyed, spawned, failed = outcome.failed, "committed commands");
        outcome.finish()
    }
}

/// Error bookkeeping for one commit.
///
/// `PoolIntegrityViolation` is logged at error level and handed back to the
/// host in every build profile; the library never panics or aborts on it.
#[derive(Default)]
struct CommitOutcome {
    first: Option<EcsError>,
    failed: usize,
}

impl CommitOutcome {
    /// Keep going after recoverable errors; bail out on fatal ones.
    fn record(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => {
                error!(%err, "storage integrity violated during commit");
                Err(err)
            }
            Err(err) => {
                warn!(%err, "command failed during commit");
                self.failed += 1;
                self.first.get_or_insert(err);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<()> {
        match self.first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
