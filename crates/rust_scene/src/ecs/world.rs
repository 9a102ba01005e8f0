//! ECS World implementation

use std::any::TypeId;
use std::collections::HashMap;

use slotmap::SlotMap;
use thiserror::Error;

use super::components::{TransformComponent, VolumeComponent};
use super::storage::{AnyStorage, ComponentStorage};
use super::{Component, Entity};

/// Errors raised by structural world operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not refer to a live entity
    #[error("Entity {0:?} is not alive")]
    InvalidEntity(Entity),

    /// Entity has no transform and cannot take part in the hierarchy
    #[error("Entity {0:?} has no TransformComponent")]
    MissingTransform(Entity),

    /// Child is already attached somewhere else
    #[error("Entity {child:?} already has parent {parent:?}")]
    AlreadyHasParent {
        /// Entity being attached
        child: Entity,
        /// Its current parent
        parent: Entity,
    },

    /// Entity cannot be its own parent
    #[error("Entity {0:?} cannot be parented to itself")]
    SelfParent(Entity),

    /// Parent is a descendant of the child
    #[error("Parenting {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent
        parent: Entity,
        /// Requested child
        child: Entity,
    },

    /// Child is not attached to the given parent
    #[error("Entity {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Requested parent
        parent: Entity,
        /// Requested child
        child: Entity,
    },
}

/// ECS World containing all entities and components
///
/// The world is the single owner of entity data. Passes borrow it explicitly
/// (`&mut World` to write, `&World` to read), which keeps each pass the only
/// writer for its duration.
#[derive(Default)]
pub struct World {
    entities: SlotMap<Entity, ()>,
    component_storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Create an entity with spatial identity
    ///
    /// Transform and volume are always created together. The world sphere is
    /// seeded from the transform so the volume is meaningful before the first
    /// propagation pass.
    pub fn spawn_spatial(&mut self, transform: TransformComponent, mut volume: VolumeComponent) -> Entity {
        let entity = self.create_entity();
        volume.update_world(&transform.world_matrix());
        self.add_component(entity, transform);
        self.add_component(entity, volume);
        entity
    }

    /// Destroy an entity and drop all its components
    ///
    /// Hierarchy links pointing at the entity are not repaired here; use
    /// [`DestructionPropagator::sweep`](crate::ecs::systems::DestructionPropagator::sweep)
    /// for hierarchy-aware removal.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        for storage in self.component_storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    /// Whether the handle refers to a live entity
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Add a component to an entity, replacing any previous one of that type
    ///
    /// Returns `false` when the entity is not alive.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.is_valid(entity) {
            log::debug!("Ignoring component for dead entity {:?}", entity);
            return false;
        }
        self.storage_mut::<T>().insert(entity, component);
        true
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut_if_exists::<T>()?.remove(entity)
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut_if_exists::<T>()?.get_mut(entity)
    }

    /// Whether the entity has a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    /// All entities carrying `T`, with their component
    pub fn query<T: Component>(&self) -> Vec<(Entity, &T)> {
        self.storage::<T>()
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }

    /// Mutable access to every `T`
    pub fn query_mut<T: Component>(&mut self) -> Vec<(Entity, &mut T)> {
        self.storage_mut_if_exists::<T>()
            .map(|s| s.iter_mut().collect())
            .unwrap_or_default()
    }

    /// Handles of every entity carrying `T`
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>()
            .map(|s| s.iter().map(|(e, _)| e).collect())
            .unwrap_or_default()
    }

    /// Number of stored components of type `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.component_storages
            .get(&TypeId::of::<T>())
            .map_or(0, |s| s.len())
    }

    /// Get an iterator over all entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Attach `child` under `parent`
    ///
    /// Fails if the child already has a parent, if the two are the same
    /// entity, or if `parent` lies in the child's subtree. The tree stays a
    /// forest by construction. The child's local fields keep their values and
    /// are interpreted relative to the new parent from the next propagation.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        if parent == child {
            return Err(SceneError::SelfParent(child));
        }
        let parent_transform = self.transform(parent)?;
        let child_transform = self.transform(child)?;
        if let Some(existing) = child_transform.parent() {
            return Err(SceneError::AlreadyHasParent { child, parent: existing });
        }

        // Walk up from the parent; meeting the child means a cycle
        let mut cursor = parent_transform.parent();
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(SceneError::WouldCreateCycle { parent, child });
            }
            cursor = self
                .get_component::<TransformComponent>(ancestor)
                .and_then(TransformComponent::parent);
        }

        if let Some(t) = self.get_component_mut::<TransformComponent>(parent) {
            t.push_child(child);
        }
        if let Some(t) = self.get_component_mut::<TransformComponent>(child) {
            t.set_parent(Some(parent));
        }
        log::trace!("Attached {:?} under {:?}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`; the child becomes a root in place
    pub fn remove_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        let child_transform = self.transform(child)?;
        if child_transform.parent() != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }

        if let Some(t) = self.get_component_mut::<TransformComponent>(parent) {
            t.remove_child(child);
        }
        if let Some(t) = self.get_component_mut::<TransformComponent>(child) {
            t.set_parent(None);
        }
        log::trace!("Detached {:?} from {:?}", child, parent);
        Ok(())
    }

    fn transform(&self, entity: Entity) -> Result<&TransformComponent, SceneError> {
        if !self.is_valid(entity) {
            return Err(SceneError::InvalidEntity(entity));
        }
        self.get_component::<TransformComponent>(entity)
            .ok_or(SceneError::MissingTransform(entity))
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.component_storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut_if_exists<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.component_storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .component_storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("component storage registered under a foreign TypeId"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::MaterialComponent;
    use crate::foundation::math::Vec3;

    fn spatial(world: &mut World, position: Vec3) -> Entity {
        world.spawn_spatial(
            TransformComponent::from_position(position),
            VolumeComponent::from_radius(1.0),
        )
    }

    #[test]
    fn test_component_roundtrip() {
        let mut world = World::new();
        let entity = world.create_entity();

        assert!(world.add_component(entity, MaterialComponent::hidden()));
        assert_eq!(world.get_component::<MaterialComponent>(entity), Some(&MaterialComponent::hidden()));

        world.get_component_mut::<MaterialComponent>(entity).unwrap().visible = true;
        assert!(world.get_component::<MaterialComponent>(entity).unwrap().visible);

        assert!(world.remove_component::<MaterialComponent>(entity).is_some());
        assert!(!world.has_component::<MaterialComponent>(entity));
    }

    #[test]
    fn test_destroy_invalidates_handle_and_components() {
        let mut world = World::new();
        let entity = spatial(&mut world, Vec3::zeros());

        assert!(world.destroy_entity(entity));
        assert!(!world.is_valid(entity));
        assert!(world.get_component::<TransformComponent>(entity).is_none());
        assert_eq!(world.component_count::<VolumeComponent>(), 0);

        // A recycled slot must not resurrect the old handle
        let reused = world.create_entity();
        assert_ne!(reused, entity);
        assert!(!world.is_valid(entity));
        assert!(!world.destroy_entity(entity));
    }

    #[test]
    fn test_dead_entity_rejects_components() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.destroy_entity(entity);

        assert!(!world.add_component(entity, MaterialComponent::visible()));
        assert!(world.query::<MaterialComponent>().is_empty());
    }

    #[test]
    fn test_add_child_links_both_sides() {
        let mut world = World::new();
        let parent = spatial(&mut world, Vec3::zeros());
        let child = spatial(&mut world, Vec3::new(0.0, 1.0, 0.0));

        world.add_child(parent, child).unwrap();

        let parent_t = world.get_component::<TransformComponent>(parent).unwrap();
        let child_t = world.get_component::<TransformComponent>(child).unwrap();
        assert_eq!(parent_t.children(), &[child]);
        assert_eq!(child_t.parent(), Some(parent));
    }

    #[test]
    fn test_add_child_rejects_second_parent() {
        let mut world = World::new();
        let a = spatial(&mut world, Vec3::zeros());
        let b = spatial(&mut world, Vec3::zeros());
        let child = spatial(&mut world, Vec3::zeros());

        world.add_child(a, child).unwrap();

        assert_eq!(
            world.add_child(b, child),
            Err(SceneError::AlreadyHasParent { child, parent: a })
        );
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut world = World::new();
        let root = spatial(&mut world, Vec3::zeros());
        let middle = spatial(&mut world, Vec3::zeros());
        let leaf = spatial(&mut world, Vec3::zeros());
        world.add_child(root, middle).unwrap();
        world.add_child(middle, leaf).unwrap();

        assert_eq!(world.add_child(leaf, root), Err(SceneError::WouldCreateCycle { parent: leaf, child: root }));
        assert_eq!(world.add_child(root, root), Err(SceneError::SelfParent(root)));
    }

    #[test]
    fn test_add_child_requires_transform() {
        let mut world = World::new();
        let parent = spatial(&mut world, Vec3::zeros());
        let bare = world.create_entity();

        assert_eq!(world.add_child(parent, bare), Err(SceneError::MissingTransform(bare)));
    }

    #[test]
    fn test_remove_child() {
        let mut world = World::new();
        let parent = spatial(&mut world, Vec3::zeros());
        let child = spatial(&mut world, Vec3::zeros());
        let stranger = spatial(&mut world, Vec3::zeros());
        world.add_child(parent, child).unwrap();

        assert_eq!(
            world.remove_child(stranger, child),
            Err(SceneError::NotAChild { parent: stranger, child })
        );
        world.remove_child(parent, child).unwrap();

        assert!(world.get_component::<TransformComponent>(parent).unwrap().children().is_empty());
        assert!(world.get_component::<TransformComponent>(child).unwrap().is_root());
    }
}
