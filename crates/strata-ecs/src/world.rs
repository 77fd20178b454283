use tracing::{debug, info};

use crate::command::Commands;
use crate::component::{Component, ComponentStore};
use crate::config::EcsConfig;
use crate::directory::EntityDirectory;
use crate::entity::{Entity, EntityAllocator};
use crate::error::Result;
use crate::event::Events;
use crate::query::{self, ComponentSet, Queryer};
use crate::resource::{Resource, Resources};
use crate::system::SystemSchedule;

/// The central ECS container. Owns all entities, components, resources and events.
///
/// A driver calls [`World::startup`] once, [`World::update`] once per cycle and
/// [`World::shutdown`] at the end. Each update runs every system against a
/// stable view of storage, then commits the systems' command buffers in
/// registration order, then retires events.
pub struct World {
    config: EcsConfig,
    entities: EntityAllocator,
    components: ComponentStore,
    directory: EntityDirectory,
    resources: Resources,
    events: Events,
    cycle: u64,
}

impl World {
    pub fn new() -> Self {
        Self::build(EcsConfig::default())
    }

    /// Create a world with validated storage settings.
    pub fn with_config(config: EcsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EcsConfig) -> Self {
        Self {
            components: ComponentStore::new(config.clone()),
            config,
            entities: EntityAllocator::new(),
            directory: EntityDirectory::new(),
            resources: Resources::new(),
            events: Events::new(),
            cycle: 0,
        }
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Number of completed update cycles.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    // ---- Cycle driving ----

    /// Run every startup system, then commit their command buffers in order.
    pub fn startup(&mut self, schedule: &mut SystemSchedule) -> Result<()> {
        info!(systems = schedule.startup.len(), "starting world");
        let mut buffers = Vec::with_capacity(schedule.startup.len());
        for system in &mut schedule.startup {
            let mut commands = self.commands();
            system.run(&mut commands);
            buffers.push(commands);
        }
        self.commit_all(buffers)
    }

    /// Run one update cycle: systems, then commits, then event retirement.
    ///
    /// Every buffer is committed even if an earlier one reported a recoverable
    /// error; the first such error is returned after the cycle completes. A
    /// fatal error is returned immediately.
    pub fn update(&mut self, schedule: &mut SystemSchedule) -> Result<()> {
        let mut buffers = Vec::with_capacity(schedule.update.len());
        for system in &mut schedule.update {
            let mut commands = Commands::new(self.entities.clone());
            let mut queryer = Queryer::new(&mut self.components, &self.directory);
            system.run(&mut commands, &mut queryer, &mut self.resources, &mut self.events);
            buffers.push(commands);
        }

        let committed = self.commit_all(buffers);
        if matches!(&committed, Err(err) if err.is_fatal()) {
            return committed;
        }
        self.events.retire();
        self.cycle += 1;
        debug!(
            cycle = self.cycle,
            entities = self.directory.len(),
            "update cycle complete"
        );
        committed
    }

    /// Release every component instance, resource, event and internal table.
    pub fn shutdown(&mut self) {
        info!(
            entities = self.directory.len(),
            component_types = self.components.registry().len(),
            resources = self.resources.len(),
            "shutting down world"
        );
        self.directory.clear();
        self.components.clear();
        self.resources.clear();
        self.events.clear_all();
    }

    fn commit_all(&mut self, buffers: Vec<Commands>) -> Result<()> {
        let mut first = None;
        for commands in buffers {
            if let Err(err) =
                commands.commit(&mut self.components, &mut self.directory, &mut self.resources)
            {
                if err.is_fatal() {
                    return Err(err);
                }
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    // ---- Direct access for drivers ----

    /// A fresh command buffer drawing ids from this world.
    pub fn commands(&self) -> Commands {
        Commands::new(self.entities.clone())
    }

    /// Commit a buffer obtained from [`World::commands`] right away.
    pub fn apply(&mut self, commands: Commands) -> Result<()> {
        commands.commit(&mut self.components, &mut self.directory, &mut self.resources)
    }

    /// Query access outside of a system run.
    pub fn queryer(&mut self) -> Queryer<'_> {
        Queryer::new(&mut self.components, &self.directory)
    }

    pub fn query<Q: ComponentSet>(&self) -> Vec<Entity> {
        query::matching::<Q>(&self.components, &self.directory)
    }

    /// Whether `entity` has been spawned and not destroyed.
    pub fn contains(&self, entity: Entity) -> bool {
        self.directory.contains(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.directory.len()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(&self.directory, entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.components.get::<T>(&self.directory, entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.components.get_mut::<T>(&self.directory, entity)
    }

    /// Number of live `T` instances.
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.column::<T>().map_or(0, |c| c.pool().len())
    }

    // ---- Resources ----

    /// Set a resource immediately. Fails if one of the same type is set.
    pub fn insert_resource<T: Resource>(&mut self, value: T) -> Result<()> {
        self.resources.insert(value)
    }

    pub fn resource<T: Resource>(&self) -> Result<&T> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: Resource>(&mut self) -> Result<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn remove_resource<T: Resource>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    // ---- Events ----

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
