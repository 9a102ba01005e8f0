//! # Rust Scene
//!
//! Scene hierarchy and visibility for RustEngine.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: Parent-relative transforms propagated breadth-first
//! - **Bounding Volumes**: Parent spheres that enclose their whole subtree
//! - **Cascading Deletes**: Subtree destruction with optional child survival
//! - **Hierarchical Culling**: Frustum and box culling that prunes whole subtrees
//! - **Cascaded Shadow Maps**: Practical split scheme with stable sphere fitting
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_scene::prelude::*;
//!
//! let mut scene = SceneManager::new();
//! let world = scene.world_mut();
//!
//! let ship = world.spawn_spatial(
//!     TransformComponent::from_position(Vec3::new(0.0, 0.0, -10.0)),
//!     VolumeComponent::from_radius(2.0),
//! );
//! world.add_component(ship, MaterialComponent::visible());
//! world.add_component(ship, RenderableComponent::Primitive(PrimitiveShape::Cube));
//!
//! let camera = Camera::perspective(Vec3::zeros(), 90.0, Viewport::new(1920.0, 1080.0), 0.1, 100.0);
//! let visibility = scene.update_frame(&camera, None);
//! assert_eq!(visibility.renderables, vec![ship]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::cast_precision_loss)]

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod scene;
pub mod render;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, CullingConfig, SceneConfig, ShadowConfig},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        ecs::{Entity, SceneError, System, World},
        ecs::components::{
            DirectionalLightComponent, MaterialComponent, PrimitiveShape, RenderableComponent,
            TransformComponent, TransformState, VolumeComponent,
        },
        ecs::systems::{CullingManager, DestructionPropagator, TransformPropagator, VolumePropagator},
        scene::{Aabb, BoundingSphere, FrameVisibility, SceneManager, SceneStats, ViewVolume, ViewVolumeBuilder},
        render::{Camera, CascadedShadowMap, ProjectionType, ShadowCascade, Viewport},
    };
}
