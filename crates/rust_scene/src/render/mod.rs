//! Rendering inputs and outputs of the visibility pipeline
//!
//! The camera feeds the culling passes. The shadow module turns the camera
//! and a directional light into cascade matrices for the renderer.

pub mod camera;
pub mod shadow;

pub use camera::{Camera, ProjectionType, Viewport};
pub use shadow::{CascadedShadowMap, CascadeUniforms, ShadowCascade, MAX_CASCADES};
