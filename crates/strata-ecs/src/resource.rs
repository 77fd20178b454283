use std::any::{type_name, Any};
use std::collections::HashMap;

use crate::error::{EcsError, Result};
use crate::registry::{ResourceId, TypeRegistry};

/// Marker trait for singleton values stored outside any entity.
pub trait Resource: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Resource for T {}

/// Singleton-per-type storage. Values are owned directly, not pooled.
///
/// Every operation here applies immediately. Deferred resource changes go
/// through [`Commands`](crate::Commands) instead.
#[derive(Default)]
pub struct Resources {
    registry: TypeRegistry<ResourceId>,
    values: HashMap<ResourceId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource of type `T`.
    ///
    /// Fails with [`EcsError::ResourceAlreadyExists`] if a `T` is already set;
    /// remove it first to replace it.
    pub fn insert<T: Resource>(&mut self, value: T) -> Result<()> {
        let id = self.registry.register::<T>();
        if self.values.contains_key(&id) {
            return Err(EcsError::ResourceAlreadyExists(type_name::<T>()));
        }
        self.values.insert(id, Box::new(value));
        Ok(())
    }

    pub fn get<T: Resource>(&self) -> Result<&T> {
        self.registry
            .get::<T>()
            .and_then(|id| self.values.get(&id))
            .and_then(|b| b.downcast_ref())
            .ok_or(EcsError::ResourceNotFound(type_name::<T>()))
    }

    pub fn get_mut<T: Resource>(&mut self) -> Result<&mut T> {
        self.registry
            .get::<T>()
            .and_then(|id| self.values.get_mut(&id))
            .and_then(|b| b.downcast_mut())
            .ok_or(EcsError::ResourceNotFound(type_name::<T>()))
    }

    /// Remove the resource, returning it if it was set.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        let id = self.registry.get::<T>()?;
        self.values
            .remove(&id)
            .and_then(|b| b.downcast().ok())
            .map(|b| *b)
    }

    pub fn contains<T: Resource>(&self) -> bool {
        self.registry
            .get::<T>()
            .is_some_and(|id| self.values.contains_key(&id))
    }

    pub fn id_of<T: Resource>(&self) -> Option<ResourceId> {
        self.registry.get::<T>()
    }

    /// Number of resources currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every resource and forget every registration.
    pub fn clear(&mut self) {
        self.values.clear();
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Timer(u32);

    #[test]
    fn insert_and_get() {
        let mut res = Resources::new();
        res.insert(42u32).unwrap();
        res.insert("hello".to_string()).unwrap();
        assert_eq!(res.get::<u32>().unwrap(), &42);
        assert_eq!(res.get::<String>().unwrap(), "hello");
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn second_insert_is_rejected() {
        let mut res = Resources::new();
        res.insert(Timer(0)).unwrap();
        let err = res.insert(Timer(1)).unwrap_err();
        assert!(matches!(err, EcsError::ResourceAlreadyExists(_)));
        assert_eq!(res.get::<Timer>().unwrap(), &Timer(0));
    }

    #[test]
    fn remove_then_insert_succeeds() {
        let mut res = Resources::new();
        res.insert(Timer(0)).unwrap();
        assert_eq!(res.remove::<Timer>(), Some(Timer(0)));
        assert!(!res.contains::<Timer>());
        res.insert(Timer(1)).unwrap();
        assert_eq!(res.get::<Timer>().unwrap(), &Timer(1));
    }

    #[test]
    fn missing_resource() {
        let mut res = Resources::new();
        assert!(matches!(res.get::<Timer>(), Err(EcsError::ResourceNotFound(_))));
        assert!(matches!(res.get_mut::<Timer>(), Err(EcsError::ResourceNotFound(_))));
        assert_eq!(res.remove::<Timer>(), None);
    }

    #[test]
    fn mutate() {
        let mut res = Resources::new();
        res.insert(vec![1, 2, 3]).unwrap();
        res.get_mut::<Vec<i32>>().unwrap().push(4);
        assert_eq!(res.get::<Vec<i32>>().unwrap().len(), 4);
    }
}
