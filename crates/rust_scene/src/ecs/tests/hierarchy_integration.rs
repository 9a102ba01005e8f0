//! Integration tests for the frame pipeline
//!
//! Builds small scene graphs and checks the properties that must hold after
//! each pass: world matrices, volume containment, cascading deletes and the
//! visible lists.

use crate::ecs::components::{
    DirectionalLightComponent, MaterialComponent, RenderableComponent,
    TransformComponent, VolumeComponent,
};
use crate::ecs::systems::{DestructionPropagator, TransformPropagator, VolumePropagator};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::{Quat, Vec3};
use crate::render::{Camera, Viewport};
use crate::scene::SceneManager;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drawable(world: &mut World, transform: TransformComponent, radius: f32) -> Entity {
        let entity = world.spawn_spatial(transform, VolumeComponent::from_radius(radius));
        world.add_component(entity, MaterialComponent::visible());
        world.add_component(entity, RenderableComponent::Model(7));
        entity
    }

    /// Three level chain with rotation and scale at every level
    fn chain(world: &mut World) -> [Entity; 3] {
        let root = drawable(
            world,
            TransformComponent::from_position(Vec3::new(0.0, 0.0, -30.0))
                .with_orientation(Quat::from_axis_angle(&Vec3::y_axis(), 0.4))
                .with_uniform_scale(2.0),
            1.0,
        );
        let arm = drawable(
            world,
            TransformComponent::from_position(Vec3::new(3.0, 0.0, 0.0))
                .with_orientation(Quat::from_axis_angle(&Vec3::z_axis(), -0.8)),
            0.5,
        );
        let hand = drawable(world, TransformComponent::from_position(Vec3::new(0.0, 2.0, 0.0)), 0.25);
        world.add_child(root, arm).unwrap();
        world.add_child(arm, hand).unwrap();
        [root, arm, hand]
    }

    #[test]
    fn test_systems_run_through_trait_objects() {
        let mut world = World::new();
        let [root, arm, hand] = chain(&mut world);

        let mut systems: Vec<Box<dyn System>> = vec![
            Box::new(TransformPropagator::new()),
            Box::new(VolumePropagator::new()),
            Box::new(DestructionPropagator::new()),
        ];
        for system in &mut systems {
            system.run(&mut world);
        }

        let get = |e| world.get_component::<TransformComponent>(e).unwrap();
        assert_relative_eq!(get(arm).world_matrix(), get(root).world_matrix() * get(arm).local_matrix(), epsilon = 1e-5);
        assert_relative_eq!(get(hand).world_matrix(), get(arm).world_matrix() * get(hand).local_matrix(), epsilon = 1e-5);

        let sphere = |e| world.get_component::<VolumeComponent>(e).unwrap().world;
        assert!(sphere(root).contains(&sphere(arm)));
        assert!(sphere(root).contains(&sphere(hand)));
        assert!(sphere(arm).contains(&sphere(hand)));
    }

    #[test]
    fn test_moving_root_moves_subtree() {
        let mut world = World::new();
        let [root, _, hand] = chain(&mut world);
        TransformPropagator::propagate(&mut world);
        let before = world.get_component::<TransformComponent>(hand).unwrap().world_position();

        world
            .get_component_mut::<TransformComponent>(root)
            .unwrap()
            .set_local_position(Vec3::new(5.0, 0.0, -30.0));
        TransformPropagator::propagate(&mut world);

        let after = world.get_component::<TransformComponent>(hand).unwrap().world_position();
        assert_relative_eq!(after - before, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_reparented_subtree_is_visible_again() {
        let mut scene = SceneManager::new();
        let camera = Camera::perspective(Vec3::zeros(), 90.0, Viewport::new(1920.0, 1080.0), 0.1, 100.0);

        let world = scene.world_mut();
        let far_root = drawable(world, TransformComponent::from_position(Vec3::new(0.0, 0.0, 500.0)), 1.0);
        let near_root = drawable(world, TransformComponent::from_position(Vec3::new(0.0, 0.0, -10.0)), 1.0);
        let child = drawable(world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)), 1.0);
        world.add_child(far_root, child).unwrap();

        let visibility = scene.update_frame(&camera, None);
        assert_eq!(visibility.renderables, vec![near_root]);

        let world = scene.world_mut();
        world.remove_child(far_root, child).unwrap();
        world.add_child(near_root, child).unwrap();
        // World placement is kept on detach, so restore a local offset
        world
            .get_component_mut::<TransformComponent>(child)
            .unwrap()
            .set_local_position(Vec3::new(1.0, 0.0, 0.0));

        let visibility = scene.update_frame(&camera, None);
        assert_eq!(visibility.renderables, vec![near_root, child]);
    }

    #[test]
    fn test_spared_children_survive_and_cast_shadows() {
        let mut scene = SceneManager::new();
        let camera = Camera::perspective(Vec3::new(0.0, 2.0, 0.0), 75.0, Viewport::new(1280.0, 720.0), 0.5, 150.0);

        let world = scene.world_mut();
        let carrier = drawable(
            world,
            TransformComponent::from_position(Vec3::new(0.0, 0.0, -20.0)).with_keep_children_alive(true),
            1.0,
        );
        let escorts: Vec<Entity> = (0..3)
            .map(|i| {
                let escort = drawable(world, TransformComponent::from_position(Vec3::new(i as f32 * 2.0 - 2.0, 0.0, 0.0)), 0.5);
                world.add_child(carrier, escort).unwrap();
                escort
            })
            .collect();
        let sun = world.create_entity();
        world.add_component(sun, DirectionalLightComponent::new(Vec3::new(0.2, -1.0, 0.1)));

        scene.update_frame(&camera, Some(sun));
        scene
            .world_mut()
            .get_component_mut::<TransformComponent>(carrier)
            .unwrap()
            .mark_for_delete();
        let visibility = scene.update_frame(&camera, Some(sun));

        assert!(!scene.world().is_valid(carrier));
        assert_eq!(visibility.renderables.len(), 3);
        for escort in &escorts {
            assert!(visibility.renderables.contains(escort));
            assert!(scene.world().get_component::<TransformComponent>(*escort).unwrap().is_root());
        }
        let casters: usize = visibility.shadow_casters.iter().map(Vec::len).sum();
        assert!(casters >= 3);
    }
}
