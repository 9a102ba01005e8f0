//! Bounding volume propagation system
//!
//! Grows parent spheres bottom-up so that every parent's world sphere
//! encloses the spheres of its whole subtree. Runs after transform
//! propagation, which resets each world sphere from its local sphere.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::ecs::components::{TransformComponent, VolumeComponent};
use crate::ecs::{Entity, System, World};

/// Child-to-parent bounding volume propagation
#[derive(Debug, Default)]
pub struct VolumePropagator;

impl VolumePropagator {
    /// Create the propagator
    pub fn new() -> Self {
        Self
    }

    /// Merge every child volume into its parent, leaves first
    ///
    /// A parent reports upward only after all of its children have merged into
    /// it, so containment holds transitively even for uneven subtrees.
    /// Returns the number of merges performed.
    pub fn propagate(world: &mut World) -> usize {
        let links = Self::collect_links(world);

        let mut pending: HashMap<Entity, usize> = HashMap::new();
        for parent in links.values() {
            *pending.entry(*parent).or_insert(0) += 1;
        }

        let mut queue: VecDeque<Entity> = links
            .keys()
            .copied()
            .filter(|child| !pending.contains_key(child))
            .collect();
        let mut visited: HashSet<Entity> = HashSet::new();

        let mut merges = 0;
        while let Some(child) = queue.pop_front() {
            let Some(&parent) = links.get(&child) else {
                continue;
            };
            let Some(child_sphere) = world.get_component::<VolumeComponent>(child).map(|v| v.world) else {
                continue;
            };
            if let Some(volume) = world.get_component_mut::<VolumeComponent>(parent) {
                volume.world.merge(&child_sphere);
                merges += 1;
            }

            let Some(remaining) = pending.get_mut(&parent) else {
                continue;
            };
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 && links.contains_key(&parent) && visited.insert(parent) {
                queue.push_back(parent);
            }
        }

        log::trace!("VolumePropagator: {} merges", merges);
        merges
    }

    /// Valid child-to-parent links between entities that both carry a volume
    ///
    /// A link counts only when the parent lists the child and the child points
    /// back at the parent. Broken links end the upward walk.
    fn collect_links(world: &World) -> HashMap<Entity, Entity> {
        let mut links = HashMap::new();
        for (parent, transform) in world.query::<TransformComponent>() {
            if !world.has_component::<VolumeComponent>(parent) {
                continue;
            }
            for &child in transform.children() {
                if !world.is_valid(child) || !world.has_component::<VolumeComponent>(child) {
                    continue;
                }
                let points_back = world
                    .get_component::<TransformComponent>(child)
                    .is_some_and(|t| t.parent() == Some(parent));
                if points_back {
                    links.insert(child, parent);
                }
            }
        }
        links
    }
}

impl System for VolumePropagator {
    fn run(&mut self, world: &mut World) {
        Self::propagate(world);
    }
}
