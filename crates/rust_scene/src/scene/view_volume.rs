//! View volumes used for visibility culling
//!
//! A perspective camera produces a six-plane frustum, an orthographic camera
//! or a shadow cascade produces an axis-aligned box. Both answer the same
//! three questions through [`ViewVolume`].

use crate::foundation::math::{Mat4, Vec3};
use crate::render::{Camera, ProjectionType};
use crate::scene::{Aabb, BoundingSphere, Plane};

/// Six-plane view frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Planes in the order left, right, bottom, top, near, far; normals point inward
    pub planes: [Plane; 6],
    /// Distance every plane is pushed outward
    pub padding: f32,
}

impl Frustum {
    /// Extract the planes of a `projection * view` matrix
    ///
    /// Each plane is a sum or difference of the fourth row with one of the
    /// first three (Gribb/Hartmann), then normalized.
    pub fn from_matrix(view_projection: &Mat4, padding: f32) -> Self {
        let m = view_projection;
        let row = |i: usize| [m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let plane = |a: [f32; 4], b: [f32; 4], sign: f32| {
            Plane::from_coefficients(
                a[0] + sign * b[0],
                a[1] + sign * b[1],
                a[2] + sign * b[2],
                a[3] + sign * b[3],
            )
        };

        Self {
            planes: [
                plane(r3, r0, 1.0),
                plane(r3, r0, -1.0),
                plane(r3, r1, 1.0),
                plane(r3, r1, -1.0),
                plane(r3, r2, 1.0),
                plane(r3, r2, -1.0),
            ],
            padding,
        }
    }

    /// Frustum whose planes are all degenerate, it never culls
    pub fn unbounded(padding: f32) -> Self {
        Self {
            planes: [Plane::degenerate(); 6],
            padding,
        }
    }

    fn is_point_culled(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .any(|plane| plane.distance_to_point(point) < -self.padding)
    }

    fn is_sphere_culled(&self, sphere: &BoundingSphere) -> bool {
        let limit = -(sphere.radius + self.padding);
        self.planes
            .iter()
            .any(|plane| plane.distance_to_point(sphere.center) < limit)
    }

    // Only the min and max corners are tested against each plane. A box
    // outside the frustum but not behind any single plane survives, and for
    // planes whose normal mixes signs a box can be culled while one of its
    // other corners is still inside.
    fn is_box_culled(&self, aabb: &Aabb) -> bool {
        self.planes.iter().any(|plane| {
            plane.distance_to_point(aabb.min) < -self.padding
                && plane.distance_to_point(aabb.max) < -self.padding
        })
    }
}

/// Axis-aligned orthographic view box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBox {
    /// Box bounds in world space
    pub bounds: Aabb,
    /// Distance the box is grown on every side
    pub padding: f32,
}

impl OrthoBox {
    /// Box with the given bounds and padding
    pub fn new(bounds: Aabb, padding: f32) -> Self {
        Self { bounds, padding }
    }

    fn padded(&self) -> Aabb {
        self.bounds.expanded(self.padding)
    }
}

/// Culling volume of a camera or light
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewVolume {
    /// Perspective frustum
    Perspective(Frustum),
    /// Orthographic box
    Orthographic(OrthoBox),
}

impl ViewVolume {
    /// Whether a point lies outside the volume
    pub fn is_point_culled(&self, point: Vec3) -> bool {
        match self {
            Self::Perspective(frustum) => frustum.is_point_culled(point),
            Self::Orthographic(ortho) => !ortho.padded().contains_point(point),
        }
    }

    /// Whether a sphere lies entirely outside the volume
    pub fn is_sphere_culled(&self, sphere: &BoundingSphere) -> bool {
        match self {
            Self::Perspective(frustum) => frustum.is_sphere_culled(sphere),
            Self::Orthographic(ortho) => !ortho.padded().intersects_sphere(sphere),
        }
    }

    /// Whether a box lies outside the volume
    pub fn is_box_culled(&self, aabb: &Aabb) -> bool {
        match self {
            Self::Perspective(frustum) => frustum.is_box_culled(aabb),
            Self::Orthographic(ortho) => !ortho.padded().intersects(aabb),
        }
    }

    /// Padding applied to every test
    pub fn padding(&self) -> f32 {
        match self {
            Self::Perspective(frustum) => frustum.padding,
            Self::Orthographic(ortho) => ortho.padding,
        }
    }
}

/// Builds view volumes with a shared padding
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewVolumeBuilder {
    padding: f32,
}

impl ViewVolumeBuilder {
    /// Builder with zero padding
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: Set the padding
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding.max(0.0);
        self
    }

    /// View volume of a camera
    ///
    /// Perspective cameras yield a frustum. Orthographic cameras yield the
    /// box enclosing their world-space clip corners. A degenerate or
    /// non-invertible camera, such as one with a zero-width viewport, yields
    /// a volume that culls nothing.
    pub fn build(&self, camera: &Camera) -> ViewVolume {
        if camera.is_degenerate() {
            log::warn!("Degenerate camera, culling disabled for this volume");
            return ViewVolume::Perspective(Frustum::unbounded(self.padding));
        }
        match camera.projection_type {
            ProjectionType::Perspective => self.from_view_projection(&camera.get_view_projection_matrix()),
            ProjectionType::Orthographic => {
                let bounds = camera
                    .frustum_corners()
                    .and_then(|corners| Aabb::from_points(&corners));
                match bounds {
                    Some(bounds) => self.orthographic_box(bounds),
                    None => {
                        log::warn!("Degenerate orthographic camera, culling disabled for this volume");
                        ViewVolume::Perspective(Frustum::unbounded(self.padding))
                    }
                }
            }
        }
    }

    /// Frustum of an arbitrary `projection * view` matrix
    pub fn from_view_projection(&self, view_projection: &Mat4) -> ViewVolume {
        ViewVolume::Perspective(Frustum::from_matrix(view_projection, self.padding))
    }

    /// Box volume, used for shadow cascades
    pub fn orthographic_box(&self, bounds: Aabb) -> ViewVolume {
        ViewVolume::Orthographic(OrthoBox::new(bounds, self.padding))
    }
}
