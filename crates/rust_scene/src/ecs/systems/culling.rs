//! Hierarchical visibility culling
//!
//! Culling walks the hierarchy from the roots down. A parent's world sphere
//! encloses its subtree after volume propagation, so a culled parent prunes
//! every descendant without testing them.

use std::collections::{HashSet, VecDeque};

use crate::config::CullingConfig;
use crate::ecs::components::{MaterialComponent, RenderableComponent, TransformComponent, VolumeComponent};
use crate::ecs::{Entity, World};
use crate::render::Camera;
use crate::scene::{Aabb, ViewVolume, ViewVolumeBuilder};

/// Produces the visible entity lists for cameras and shadow cascades
#[derive(Debug, Clone, Default)]
pub struct CullingManager {
    config: CullingConfig,
}

impl CullingManager {
    /// Create a culling manager with the given paddings
    pub fn new(config: CullingConfig) -> Self {
        Self { config }
    }

    /// Active paddings
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Replace the paddings
    pub fn set_config(&mut self, config: CullingConfig) {
        self.config = config;
    }

    /// Entities visible to the main camera, using the render padding
    pub fn renderable_entities(&self, camera: &Camera, world: &World) -> Vec<Entity> {
        let volume = ViewVolumeBuilder::new()
            .with_padding(self.config.render_padding)
            .build(camera);
        Self::cull_entities(&volume, world)
    }

    /// Entities that may cast into a shadow cascade, using the shadow padding
    pub fn shadow_casting_entities(&self, bounds: &Aabb, world: &World) -> Vec<Entity> {
        let volume = ViewVolumeBuilder::new()
            .with_padding(self.config.shadow_padding)
            .orthographic_box(*bounds);
        Self::cull_entities(&volume, world)
    }

    /// Breadth-first cull of the hierarchy against `view_volume`
    ///
    /// An entity is kept when it is visible, has something to render and its
    /// world sphere is not culled. An entity that is skipped or culled is not
    /// descended into, so its whole subtree is dropped with it. Parents come
    /// before their children in the result.
    pub fn cull_entities(view_volume: &ViewVolume, world: &World) -> Vec<Entity> {
        let mut queue: VecDeque<Entity> = world
            .query::<TransformComponent>()
            .into_iter()
            .filter(|(entity, transform)| {
                transform.is_root()
                    && world.has_component::<VolumeComponent>(*entity)
                    && world
                        .get_component::<MaterialComponent>(*entity)
                        .is_some_and(|m| m.visible)
            })
            .map(|(entity, _)| entity)
            .collect();
        let mut visited: HashSet<Entity> = queue.iter().copied().collect();

        let mut visible = Vec::new();
        while let Some(entity) = queue.pop_front() {
            let Some(transform) = world.get_component::<TransformComponent>(entity) else {
                continue;
            };
            let shown = world
                .get_component::<MaterialComponent>(entity)
                .is_some_and(|m| m.visible);
            if !shown || !world.has_component::<RenderableComponent>(entity) {
                log::trace!("Skipping {:?}: hidden or nothing to render", entity);
                continue;
            }
            let Some(volume) = world.get_component::<VolumeComponent>(entity) else {
                log::trace!("Skipping {:?}: no bounding volume", entity);
                continue;
            };
            if view_volume.is_sphere_culled(&volume.world) {
                continue;
            }

            for &child in transform.children() {
                let linked = world
                    .get_component::<TransformComponent>(child)
                    .is_some_and(|t| t.parent() == Some(entity));
                if linked && visited.insert(child) {
                    queue.push_back(child);
                }
            }
            visible.push(entity);
        }

        log::trace!("Culling kept {} entities", visible.len());
        visible
    }
}
