//! Component Storage
//!
//! Each component type lives in its own dense `SecondaryMap` keyed by
//! [`Entity`]. The world holds the maps behind the type-erased [`AnyStorage`]
//! trait so that destroying an entity can strip every component without
//! knowing their concrete types.

use std::any::Any;

use slotmap::SecondaryMap;

use crate::ecs::{Component, Entity};

/// Type-erased view over a single component storage
pub(crate) trait AnyStorage: Any + Send + Sync {
    /// Drop the component of `entity`, if any
    fn remove_entity(&mut self, entity: Entity);

    /// Number of stored components
    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Storage for one component type
pub(crate) struct ComponentStorage<T: Component> {
    components: SecondaryMap<Entity, T>,
}

impl<T: Component> ComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            components: SecondaryMap::new(),
        }
    }

    /// Insert a component, returning the one it replaced
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(entity)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.components.iter_mut()
    }
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.components.remove(entity);
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
