//! # Scene Manager
//!
//! High-level coordinator for one frame of hierarchy maintenance and
//! visibility. It owns the ECS world and runs the passes in their fixed
//! order:
//!
//! ```text
//! sweep (last frame's deletions)
//!      ↓
//! transform → volume → destruction
//!      ↓
//! main camera cull → cascade fit → per-cascade caster cull
//! ```
//!
//! Deletions requested after a frame are swept at the start of the next one,
//! so the entity lists handed to the renderer stay valid until then.

use std::time::{Duration, Instant};

use crate::config::{ConfigError, SceneConfig};
use crate::ecs::components::DirectionalLightComponent;
use crate::ecs::systems::{CullingManager, DestructionPropagator, TransformPropagator, VolumePropagator};
use crate::ecs::{Entity, World};
use crate::render::{Camera, CascadedShadowMap};

/// Entity lists produced by one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameVisibility {
    /// Entities visible to the main camera, parents before children
    pub renderables: Vec<Entity>,
    /// Shadow casters per cascade, near to far; empty without a shadow light
    pub shadow_casters: Vec<Vec<Entity>>,
}

/// Performance statistics for scene management
#[derive(Debug, Clone, Default)]
pub struct SceneStats {
    /// Frames processed so far
    pub frame_index: u64,

    /// Current number of entities in the scene
    pub entity_count: usize,

    /// Entities destroyed by the sweep at the start of the frame
    pub destroyed_count: usize,

    /// Child transforms recomputed by transform propagation
    pub transform_updates: usize,

    /// Child volumes merged into parents
    pub volume_merges: usize,

    /// Entities newly marked by destruction propagation
    pub newly_marked: usize,

    /// Number of entities visible to the main camera
    pub visible_count: usize,

    /// Number of shadow casters per cascade
    pub shadow_caster_counts: Vec<usize>,

    /// Time spent on the hierarchy passes (microseconds)
    pub hierarchy_time_us: u64,

    /// Time spent on main camera culling (microseconds)
    pub culling_time_us: u64,

    /// Time spent fitting cascades and culling casters (microseconds)
    pub shadow_time_us: u64,
}

impl SceneStats {
    /// Calculate total frame time in microseconds
    pub fn total_frame_time_us(&self) -> u64 {
        self.hierarchy_time_us + self.culling_time_us + self.shadow_time_us
    }
}

/// Owns the world and runs the per-frame visibility pipeline
pub struct SceneManager {
    /// ECS world containing all entities and components
    world: World,

    /// Scene configuration
    config: SceneConfig,

    /// Cascade state for the shadow-casting light
    shadow_map: CascadedShadowMap,

    /// Camera and cascade culling
    culling: CullingManager,

    /// Performance statistics
    stats: SceneStats,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::from_valid_config(SceneConfig::default())
    }
}

impl SceneManager {
    /// Create a new scene manager with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene manager with custom configuration
    pub fn with_config(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SceneConfig) -> Self {
        log::info!(
            "Scene manager: {} cascades, render padding {}, shadow padding {}",
            config.shadows.cascade_count,
            config.culling.render_padding,
            config.culling.shadow_padding
        );
        Self {
            world: World::new(),
            shadow_map: CascadedShadowMap::new(&config.shadows),
            culling: CullingManager::new(config.culling.clone()),
            config,
            stats: SceneStats::default(),
        }
    }

    /// ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable ECS world for gameplay edits between frames
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Get current performance statistics
    pub fn stats(&self) -> &SceneStats {
        &self.stats
    }

    /// Cascades fitted by the last frame
    pub fn shadow_map(&self) -> &CascadedShadowMap {
        &self.shadow_map
    }

    /// Run one frame
    ///
    /// `light` selects the directional light; `None` picks the first
    /// shadow-casting directional light in the world. Without a
    /// shadow-casting light the cascades are left as they were and no caster
    /// lists are produced.
    pub fn update_frame(&mut self, camera: &Camera, light: Option<Entity>) -> FrameVisibility {
        let hierarchy_start = Instant::now();
        self.stats.destroyed_count = DestructionPropagator::sweep(&mut self.world);
        self.stats.transform_updates = TransformPropagator::propagate(&mut self.world);
        self.stats.volume_merges = VolumePropagator::propagate(&mut self.world);
        self.stats.newly_marked = DestructionPropagator::propagate(&mut self.world);
        let hierarchy_time = hierarchy_start.elapsed();

        let culling_start = Instant::now();
        let renderables = self.culling.renderable_entities(camera, &self.world);
        let culling_time = culling_start.elapsed();

        let shadow_start = Instant::now();
        let shadow_casters = match self.shadow_light(light) {
            Some(light) => {
                self.shadow_map.update(camera, &light);
                self.shadow_map
                    .cascades()
                    .iter()
                    .map(|cascade| self.culling.shadow_casting_entities(&cascade.bounds, &self.world))
                    .collect()
            }
            None => Vec::new(),
        };
        let shadow_time = shadow_start.elapsed();

        let visibility = FrameVisibility { renderables, shadow_casters };
        self.update_stats(&visibility, hierarchy_time, culling_time, shadow_time);
        visibility
    }

    fn shadow_light(&self, light: Option<Entity>) -> Option<DirectionalLightComponent> {
        let component = match light {
            Some(entity) => self.world.get_component::<DirectionalLightComponent>(entity),
            None => self
                .world
                .query::<DirectionalLightComponent>()
                .into_iter()
                .map(|(_, light)| light)
                .find(|light| light.casts_shadows),
        };
        component.filter(|light| light.casts_shadows).cloned()
    }

    fn update_stats(
        &mut self,
        visibility: &FrameVisibility,
        hierarchy_time: Duration,
        culling_time: Duration,
        shadow_time: Duration,
    ) {
        self.stats.frame_index += 1;
        self.stats.entity_count = self.world.entity_count();
        self.stats.visible_count = visibility.renderables.len();
        self.stats.shadow_caster_counts = visibility.shadow_casters.iter().map(Vec::len).collect();
        self.stats.hierarchy_time_us = hierarchy_time.as_micros() as u64;
        self.stats.culling_time_us = culling_time.as_micros() as u64;
        self.stats.shadow_time_us = shadow_time.as_micros() as u64;

        log::trace!(
            "Frame {}: {} entities, {} visible, casters {:?}",
            self.stats.frame_index,
            self.stats.entity_count,
            self.stats.visible_count,
            self.stats.shadow_caster_counts
        );
    }
}
