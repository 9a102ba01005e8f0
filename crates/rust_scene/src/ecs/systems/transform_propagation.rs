//! Transform propagation system
//!
//! Walks the hierarchy breadth-first from every root and derives each child's
//! world transform as `parent_world * child_local`. Every entity reached also
//! has its world bounding sphere re-derived from its local sphere, which is
//! the starting point for [`VolumePropagator`](super::VolumePropagator).

use std::collections::{HashSet, VecDeque};

use crate::ecs::components::{TransformComponent, VolumeComponent};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::{Mat4, Transform};

/// Parent-to-child world transform propagation
#[derive(Debug, Default)]
pub struct TransformPropagator;

impl TransformPropagator {
    /// Create the propagator
    pub fn new() -> Self {
        Self
    }

    /// Propagate world transforms through the whole hierarchy
    ///
    /// Returns the number of non-root entities whose world transform was
    /// recomputed. The pass is idempotent: running it twice without edits in
    /// between produces the same world state.
    pub fn propagate(world: &mut World) -> usize {
        let mut queue: VecDeque<(Entity, Mat4)> = VecDeque::new();
        let mut visited: HashSet<Entity> = HashSet::new();

        for root in world.entities_with::<TransformComponent>() {
            let Some(transform) = world.get_component_mut::<TransformComponent>(root) else {
                continue;
            };
            if !transform.is_root() {
                continue;
            }

            let matrix = transform.refresh_root_matrix();
            transform.settle();
            let has_children = !transform.children().is_empty();

            if let Some(volume) = world.get_component_mut::<VolumeComponent>(root) {
                volume.update_world(&matrix);
            }
            if has_children {
                visited.insert(root);
                queue.push_back((root, matrix));
            }
        }

        let mut updated = 0;
        while let Some((parent, parent_matrix)) = queue.pop_front() {
            let children = match world.get_component::<TransformComponent>(parent) {
                Some(transform) => transform.children().to_vec(),
                None => continue,
            };

            for child in children {
                if !world.is_valid(child) || visited.contains(&child) {
                    continue;
                }
                let Some(transform) = world.get_component_mut::<TransformComponent>(child) else {
                    continue;
                };
                if transform.parent() != Some(parent) {
                    log::trace!("Skipping {:?}: parent link does not point at {:?}", child, parent);
                    continue;
                }

                let matrix = parent_matrix * transform.local_matrix();
                transform.apply_world(&Transform::from_matrix(&matrix), matrix);
                transform.settle();
                let has_children = !transform.children().is_empty();

                if let Some(volume) = world.get_component_mut::<VolumeComponent>(child) {
                    volume.update_world(&matrix);
                }

                visited.insert(child);
                updated += 1;
                if has_children {
                    queue.push_back((child, matrix));
                }
            }
        }

        log::trace!("TransformPropagator: updated {} child transforms", updated);
        updated
    }
}

impl System for TransformPropagator {
    fn run(&mut self, world: &mut World) {
        Self::propagate(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TransformState;
    use crate::foundation::math::{constants::HALF_PI, Quat, Vec3};
    use approx::assert_relative_eq;

    fn spawn(world: &mut World, transform: TransformComponent) -> Entity {
        world.spawn_spatial(transform, VolumeComponent::from_radius(1.0))
    }

    fn world_matrix(world: &World, entity: Entity) -> Mat4 {
        world.get_component::<TransformComponent>(entity).unwrap().world_matrix()
    }

    fn local_matrix(world: &World, entity: Entity) -> Mat4 {
        world.get_component::<TransformComponent>(entity).unwrap().local_matrix()
    }

    #[test]
    fn test_child_world_is_parent_times_local() {
        let mut world = World::new();
        let root = spawn(
            &mut world,
            TransformComponent::from_transform(
                Vec3::new(10.0, 0.0, -3.0),
                Quat::from_axis_angle(&Vec3::y_axis(), HALF_PI),
                Vec3::new(2.0, 2.0, 2.0),
            ),
        );
        let child = spawn(
            &mut world,
            TransformComponent::from_transform(
                Vec3::new(1.0, 2.0, 0.0),
                Quat::from_axis_angle(&Vec3::x_axis(), 0.3),
                Vec3::new(0.5, 0.5, 0.5),
            ),
        );
        let grandchild = spawn(&mut world, TransformComponent::from_position(Vec3::new(0.0, 0.0, 4.0)));
        world.add_child(root, child).unwrap();
        world.add_child(child, grandchild).unwrap();

        assert_eq!(TransformPropagator::propagate(&mut world), 2);

        assert_relative_eq!(
            world_matrix(&world, child),
            world_matrix(&world, root) * local_matrix(&world, child),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            world_matrix(&world, grandchild),
            world_matrix(&world, child) * local_matrix(&world, grandchild),
            epsilon = 1e-5
        );

        // Decomposed fields agree with the cached matrix
        let transform = world.get_component::<TransformComponent>(child).unwrap();
        assert_relative_eq!(transform.compose_world_matrix(), transform.world_matrix(), epsilon = 1e-4);
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let mut world = World::new();
        let root = spawn(
            &mut world,
            TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0))
                .with_orientation(Quat::from_axis_angle(&Vec3::z_axis(), 0.7)),
        );
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(0.0, 5.0, 0.0)));
        world.add_child(root, child).unwrap();

        TransformPropagator::propagate(&mut world);
        let first = world_matrix(&world, child);
        let first_volume = *world.get_component::<VolumeComponent>(child).unwrap();

        TransformPropagator::propagate(&mut world);

        assert_relative_eq!(world_matrix(&world, child), first, epsilon = 1e-6);
        assert_eq!(*world.get_component::<VolumeComponent>(child).unwrap(), first_volume);
    }

    #[test]
    fn test_child_volume_follows_transform() {
        let mut world = World::new();
        let root = world.spawn_spatial(
            TransformComponent::from_position(Vec3::new(5.0, 0.0, 0.0)).with_uniform_scale(3.0),
            VolumeComponent::from_radius(1.0),
        );
        let child = world.spawn_spatial(
            TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)),
            VolumeComponent::from_radius(2.0),
        );
        world.add_child(root, child).unwrap();

        TransformPropagator::propagate(&mut world);

        let volume = world.get_component::<VolumeComponent>(child).unwrap();
        assert_relative_eq!(volume.world.center, Vec3::new(5.0, 3.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(volume.world.radius, 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_states_settle_except_marked() {
        let mut world = World::new();
        let root = spawn(&mut world, TransformComponent::identity());
        let child = spawn(&mut world, TransformComponent::identity());
        world.add_child(root, child).unwrap();
        world.get_component_mut::<TransformComponent>(child).unwrap().mark_for_delete();

        TransformPropagator::propagate(&mut world);

        assert_eq!(world.get_component::<TransformComponent>(root).unwrap().state, TransformState::Idle);
        assert_eq!(
            world.get_component::<TransformComponent>(child).unwrap().state,
            TransformState::MarkedForDelete
        );
    }

    #[test]
    fn test_orphan_of_destroyed_parent_is_untouched() {
        let mut world = World::new();
        let root = spawn(&mut world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)));
        world.add_child(root, child).unwrap();
        world.destroy_entity(root);

        TransformPropagator::propagate(&mut world);

        let transform = world.get_component::<TransformComponent>(child).unwrap();
        assert_eq!(transform.state, TransformState::Created);
        assert_eq!(transform.local_position(), Vec3::new(0.0, 1.0, 0.0));
    }
}
