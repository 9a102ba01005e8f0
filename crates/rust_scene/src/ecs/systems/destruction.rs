//! Destruction propagation system
//!
//! Marking an entity for deletion is a request on its whole subtree. The
//! propagate step spreads the mark down the hierarchy, and the sweep step
//! actually removes the marked entities at a point where no other pass holds
//! their handles.

use std::collections::{HashSet, VecDeque};

use crate::ecs::components::TransformComponent;
use crate::ecs::{Entity, System, World};

/// Cascading delete over the transform hierarchy
#[derive(Debug, Default)]
pub struct DestructionPropagator;

impl DestructionPropagator {
    /// Create the propagator
    pub fn new() -> Self {
        Self
    }

    /// Mark the descendants of every marked entity
    ///
    /// An entity with `keep_children_alive` spares its direct children, and
    /// with them their subtrees. Returns how many entities were newly marked.
    pub fn propagate(world: &mut World) -> usize {
        let mut queue: VecDeque<Entity> = VecDeque::new();
        let mut visited: HashSet<Entity> = HashSet::new();

        for entity in Self::marked_entities(world) {
            visited.insert(entity);
            queue.push_back(entity);
        }

        let mut newly_marked = 0;
        while let Some(entity) = queue.pop_front() {
            let children = match world.get_component::<TransformComponent>(entity) {
                Some(transform) if !transform.keep_children_alive => transform.children().to_vec(),
                _ => continue,
            };

            for child in children {
                if !world.is_valid(child) || !visited.insert(child) {
                    continue;
                }
                let Some(transform) = world.get_component_mut::<TransformComponent>(child) else {
                    continue;
                };
                if transform.parent() != Some(entity) {
                    continue;
                }
                if !transform.is_marked_for_delete() {
                    transform.mark_for_delete();
                    newly_marked += 1;
                }
                queue.push_back(child);
            }
        }

        if newly_marked > 0 {
            log::debug!("DestructionPropagator: cascaded delete to {} entities", newly_marked);
        }
        newly_marked
    }

    /// Promote every child of `entity` to a root
    ///
    /// Children keep their current world transform. Stale handles in the
    /// child list are dropped. Returns the number of children detached.
    pub fn detach_children(world: &mut World, entity: Entity) -> usize {
        let children = match world.get_component::<TransformComponent>(entity) {
            Some(transform) => transform.children().to_vec(),
            None => return 0,
        };

        let mut detached = 0;
        for child in children {
            match world.remove_child(entity, child) {
                Ok(()) => detached += 1,
                Err(error) => {
                    log::trace!("Dropping stale child link: {}", error);
                    if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                        transform.remove_child(child);
                    }
                }
            }
        }
        detached
    }

    /// Remove every entity marked for deletion
    ///
    /// Outstanding marks are propagated first, so a mark placed after the last
    /// [`propagate`](Self::propagate) still takes its subtree along. Spared
    /// children of a marked entity are then detached, and a marked entity is
    /// unlinked from a parent that survives. Returns the number of destroyed
    /// entities.
    pub fn sweep(world: &mut World) -> usize {
        Self::propagate(world);
        let marked = Self::marked_entities(world);
        if marked.is_empty() {
            return 0;
        }

        for &entity in &marked {
            Self::detach_children(world, entity);

            let parent = world
                .get_component::<TransformComponent>(entity)
                .and_then(TransformComponent::parent);
            if let Some(parent) = parent {
                if let Some(transform) = world.get_component_mut::<TransformComponent>(parent) {
                    transform.remove_child(entity);
                }
            }
        }

        let destroyed = marked
            .into_iter()
            .filter(|&entity| world.destroy_entity(entity))
            .count();
        log::debug!("DestructionPropagator: destroyed {} entities", destroyed);
        destroyed
    }

    fn marked_entities(world: &World) -> Vec<Entity> {
        world
            .query::<TransformComponent>()
            .into_iter()
            .filter(|(_, transform)| transform.is_marked_for_delete())
            .map(|(entity, _)| entity)
            .collect()
    }
}

impl System for DestructionPropagator {
    fn run(&mut self, world: &mut World) {
        Self::propagate(world);
    }
}
