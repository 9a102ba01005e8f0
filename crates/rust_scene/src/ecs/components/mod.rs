//! ECS Components module
//!
//! Contains the spatial and visibility components used by the scene passes

pub mod transform;
pub mod volume;
pub mod material;
pub mod lighting;

pub use transform::{TransformComponent, TransformState};
pub use volume::VolumeComponent;
pub use material::{MaterialComponent, RenderableComponent, PrimitiveShape};
pub use lighting::{DirectionalLightComponent, DEFAULT_LIGHT_DIRECTION};
