//! ECS Systems module
//!
//! Per-frame passes over the hierarchy. Run order within a frame is transform,
//! volume, destruction, then culling.

pub mod transform_propagation;
pub mod volume_propagation;
pub mod destruction;
pub mod culling;

pub use transform_propagation::TransformPropagator;
pub use volume_propagation::VolumePropagator;
pub use destruction::DestructionPropagator;
pub use culling::CullingManager;
