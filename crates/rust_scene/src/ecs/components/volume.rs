//! Bounding volume component
//!
//! Stores an authored sphere in the entity's local space and the derived
//! world-space sphere. After volume propagation the world sphere of every
//! parent encloses the world spheres of its whole subtree.

use crate::ecs::Component;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::BoundingSphere;

/// Bounding sphere component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeComponent {
    /// Sphere relative to the entity origin, before any transform
    pub local: BoundingSphere,
    /// World space sphere, rewritten by the propagation passes
    pub world: BoundingSphere,
}

impl Component for VolumeComponent {}

impl VolumeComponent {
    /// Sphere of `radius` centered on the entity origin
    pub fn from_radius(radius: f32) -> Self {
        Self::from_local_sphere(BoundingSphere::new(Vec3::zeros(), radius))
    }

    /// Volume from a local sphere; the world sphere starts equal to it
    pub fn from_local_sphere(local: BoundingSphere) -> Self {
        Self { local, world: local }
    }

    /// Recompute the world sphere from the local one
    pub fn update_world(&mut self, world_matrix: &Mat4) {
        self.world = self.local.transformed(world_matrix);
    }
}
