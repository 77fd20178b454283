use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A dense integer id assigned to a Rust type by a [`TypeRegistry`].
pub trait TypeIndex: Copy + Eq + Hash + fmt::Debug {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

macro_rules! type_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl TypeIndex for $name {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

type_index!(
    /// Id of a component type within one world.
    ComponentId
);
type_index!(
    /// Id of a resource type within one world. Independent of [`ComponentId`].
    ResourceId
);

/// Assigns ids to types in first-seen order.
///
/// Each world owns one registry per namespace, so two worlds never share ids
/// and a component and a resource may carry the same raw number.
#[derive(Debug)]
pub struct TypeRegistry<I> {
    ids: HashMap<TypeId, I>,
    names: Vec<&'static str>,
}

impl<I: TypeIndex> TypeRegistry<I> {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Return the id of `T`, registering it if this is the first time it is seen.
    pub fn register<T: 'static>(&mut self) -> I {
        let names = &mut self.names;
        *self.ids.entry(TypeId::of::<T>()).or_insert_with(|| {
            let id = I::from_raw(names.len() as u32);
            names.push(type_name::<T>());
            tracing::trace!(ty = type_name::<T>(), ?id, "registered type");
            id
        })
    }

    /// Look up the id of `T` without registering it.
    pub fn get<T: 'static>(&self) -> Option<I> {
        self.get_by_type_id(TypeId::of::<T>())
    }

    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<I> {
        self.ids.get(&type_id).copied()
    }

    /// The Rust type name registered under `id`.
    pub fn name(&self, id: I) -> Option<&'static str> {
        self.names.get(id.raw() as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget every registration. Ids restart from zero.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.names.clear();
    }
}

impl<I: TypeIndex> Default for TypeRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
