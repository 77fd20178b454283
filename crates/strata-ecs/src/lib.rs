//! Strata ECS - Entity Component System
//!
//! Components live in per-type object pools, indexed by paged sparse sets.
//! Systems read a stable view of the world and record structural changes into
//! command buffers that are committed after every system of a cycle has run.
//! Resources are per-type singletons; events are single-slot channels that
//! become visible one cycle after they are written.

mod command;
mod component;
mod config;
mod directory;
mod entity;
mod error;
mod event;
mod pool;
mod query;
mod registry;
mod resource;
mod sparse_set;
mod system;
mod world;

pub use command::{Bundle, ComponentBatch, Commands};
pub use component::Component;
pub use config::EcsConfig;
pub use entity::{Entity, EntityAllocator};
pub use error::{EcsError, Result};
pub use event::{Event, EventReader, EventWriter, Events};
pub use pool::{Pool, PoolSlot};
pub use query::{ComponentSet, Queryer};
pub use registry::{ComponentId, ResourceId, TypeIndex, TypeRegistry};
pub use resource::{Resource, Resources};
pub use sparse_set::{SparseSet, DEFAULT_PAGE_SIZE};
pub use system::{StartupSystem, System, SystemSchedule};
pub use world::World;
