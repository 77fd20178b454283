use std::any::TypeId;

use crate::component::{Component, ComponentStore};
use crate::directory::EntityDirectory;
use crate::entity::Entity;
use crate::error::Result;

/// An ordered list of required component types, written as a tuple.
pub trait ComponentSet {
    fn type_ids() -> Vec<TypeId>;
}

impl ComponentSet for () {
    fn type_ids() -> Vec<TypeId> {
        Vec::new()
    }
}

macro_rules! impl_component_set_tuple {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }
        }
    };
}

impl_component_set_tuple!(A);
impl_component_set_tuple!(A, B);
impl_component_set_tuple!(A, B, C);
impl_component_set_tuple!(A, B, C, D);
impl_component_set_tuple!(A, B, C, D, E);
impl_component_set_tuple!(A, B, C, D, E, F);
impl_component_set_tuple!(A, B, C, D, E, F, G);
impl_component_set_tuple!(A, B, C, D, E, F, G, H);

/// Entities owning every type in `Q`.
///
/// The smallest membership set drives the scan (ties go to the type listed
/// first) and every candidate is checked against the directory for the other
/// types. Results follow the driver's dense order, which is not spawn order
/// once removals have happened. An empty type list or a type that was never
/// stored yields nothing.
pub(crate) fn matching<Q: ComponentSet>(
    components: &ComponentStore,
    directory: &EntityDirectory,
) -> Vec<Entity> {
    let type_ids = Q::type_ids();
    let mut required = Vec::with_capacity(type_ids.len());
    for type_id in type_ids {
        let Some(id) = components.id_by_type_id(type_id) else {
            return Vec::new();
        };
        let Some(members) = components.members(id) else {
            return Vec::new();
        };
        required.push((id, members));
    }

    let Some(driver) = (0..required.len()).min_by_key(|&i| required[i].1.len()) else {
        return Vec::new();
    };
    required[driver]
        .1
        .iter()
        .filter(|&entity| {
            required
                .iter()
                .enumerate()
                .all(|(i, (id, _))| i == driver || directory.has(entity, *id))
        })
        .collect()
}

/// Query access handed to systems for the duration of one system run.
///
/// Structure (which entities exist, which components they own) is read-only
/// here; component values may be mutated in place through [`Queryer::get_mut`].
pub struct Queryer<'w> {
    components: &'w mut ComponentStore,
    directory: &'w EntityDirectory,
}

impl<'w> Queryer<'w> {
    pub(crate) fn new(components: &'w mut ComponentStore, directory: &'w EntityDirectory) -> Self {
        Self {
            components,
            directory,
        }
    }

    /// Entities owning every component in `Q`, e.g. `queryer.query::<(Position, Velocity)>()`.
    pub fn query<Q: ComponentSet>(&self) -> Vec<Entity> {
        matching::<Q>(self.components, self.directory)
    }

    /// Lazily walk the entities owning `T`, in dense order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = Entity> + '_ {
        self.components
            .id_of::<T>()
            .and_then(|id| self.components.members(id))
            .into_iter()
            .flat_map(|members| members.iter())
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(self.directory, entity)
    }

    /// Borrow `entity`'s `T`, failing with `ComponentNotFound` if it has none.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.components.get::<T>(self.directory, entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.components.get_mut::<T>(self.directory, entity)
    }

    /// Whether `entity` exists in the directory.
    pub fn contains(&self, entity: Entity) -> bool {
        self.directory.contains(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EcsConfig;
    use crate::error::EcsError;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    #[derive(Debug)]
    struct Frozen;

    struct Fixture {
        store: ComponentStore,
        directory: EntityDirectory,
        next: u64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: ComponentStore::new(EcsConfig::default()),
                directory: EntityDirectory::new(),
                next: 0,
            }
        }

        fn entity(&mut self) -> Entity {
            let e = Entity::from_raw(self.next);
            self.next += 1;
            self.directory.insert_entity(e);
            e
        }

        fn add<T: Component>(&mut self, e: Entity, value: T) {
            self.store.insert(&mut self.directory, e, value).unwrap();
        }

        fn queryer(&mut self) -> Queryer<'_> {
            Queryer::new(&mut self.store, &self.directory)
        }
    }

    #[test]
    fn intersection() {
        let mut fx = Fixture::new();
        let e1 = fx.entity();
        let e2 = fx.entity();
        let e3 = fx.entity();
        fx.add(e1, Position(1));
        fx.add(e1, Velocity(1));
        fx.add(e2, Position(2));
        fx.add(e3, Velocity(3));

        let q = fx.queryer();
        assert_eq!(q.query::<(Position, Velocity)>(), vec![e1]);
        assert_eq!(q.query::<(Velocity, Position)>(), vec![e1]);
        assert_eq!(q.query::<(Position,)>(), vec![e1, e2]);
    }

    #[test]
    fn empty_and_unknown_type_lists() {
        let mut fx = Fixture::new();
        let e = fx.entity();
        fx.add(e, Position(0));

        let q = fx.queryer();
        assert!(q.query::<()>().is_empty());
        assert!(q.query::<(Frozen,)>().is_empty());
        assert!(q.query::<(Position, Frozen)>().is_empty());
        assert_eq!(q.iter::<Frozen>().count(), 0);
    }

    #[test]
    fn smallest_set_drives_order() {
        let mut fx = Fixture::new();
        let many: Vec<_> = (0..4).map(|_| fx.entity()).collect();
        for &e in &many {
            fx.add(e, Position(0));
        }
        fx.add(many[3], Velocity(0));
        fx.add(many[1], Velocity(0));

        let q = fx.queryer();
        assert_eq!(q.query::<(Position, Velocity)>(), vec![many[3], many[1]]);
    }

    #[test]
    fn get_and_mutate() {
        let mut fx = Fixture::new();
        let e = fx.entity();
        fx.add(e, Position(1));

        let mut q = fx.queryer();
        assert!(q.has::<Position>(e));
        assert!(!q.has::<Velocity>(e));
        q.get_mut::<Position>(e).unwrap().0 += 4;
        assert_eq!(q.get::<Position>(e).unwrap(), &Position(5));
        assert!(matches!(
            q.get::<Velocity>(e),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn iter_follows_dense_order() {
        let mut fx = Fixture::new();
        let a = fx.entity();
        let b = fx.entity();
        fx.add(a, Position(0));
        fx.add(b, Position(1));

        let q = fx.queryer();
        assert_eq!(q.iter::<Position>().collect::<Vec<_>>(), vec![a, b]);
        assert!(q.contains(a));
    }
}
