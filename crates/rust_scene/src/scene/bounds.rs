//! Bounding volumes and planes used by the visibility passes

use crate::foundation::math::{max_axis_scale, Mat4, Point3, Vec3, EPSILON};

/// Slack used by containment checks to absorb floating-point error
const CONTAINMENT_TOLERANCE: f32 = 1e-4;

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB enclosing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().skip(1).fold(Self::new(first, first), |aabb, p| Self {
            min: aabb.min.inf(p),
            max: aabb.max.sup(p),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box by `amount` on every side
    pub fn expanded(&self, amount: f32) -> Self {
        let pad = Vec3::new(amount, amount, amount);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if a sphere overlaps this box
    ///
    /// Exact test using the closest point of the box to the sphere center.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        let closest = sphere.center.sup(&self.min).inf(&self.max);
        (closest - sphere.center).magnitude_squared() <= sphere.radius * sphere.radius
    }
}

/// Bounding sphere, the entity volume stored by [`VolumeComponent`](crate::ecs::components::VolumeComponent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius (never negative)
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: 0.0,
        }
    }
}

impl BoundingSphere {
    /// Create a sphere, clamping a negative radius to zero
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Whether `other` lies entirely inside this sphere
    pub fn contains(&self, other: &BoundingSphere) -> bool {
        let distance = (other.center - self.center).magnitude();
        distance + other.radius <= self.radius + CONTAINMENT_TOLERANCE * self.radius.max(1.0)
    }

    /// Whether a point lies inside this sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).magnitude() <= self.radius + CONTAINMENT_TOLERANCE
    }

    /// Grow this sphere so it also encloses `other`
    ///
    /// The center stays put and the radius becomes
    /// `max(radius, distance + other.radius)`. The result is not the minimal
    /// enclosing sphere, but it always contains both inputs and keeps parent
    /// volumes anchored at the parent origin.
    pub fn merge(&mut self, other: &BoundingSphere) {
        let distance = (other.center - self.center).magnitude();
        self.radius = self.radius.max(distance + other.radius);
    }

    /// Sphere transformed by a local-to-world matrix
    ///
    /// The radius is scaled by the largest axis scale so the result stays
    /// conservative under non-uniform scale.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&Point3::from(self.center)).coords;
        let radius = self.radius * max_axis_scale(matrix);
        if !center.iter().all(|c| c.is_finite()) || !radius.is_finite() {
            log::warn!("Non-finite bounding sphere after transform, keeping local volume");
            return *self;
        }
        Self { center, radius }
    }

    /// Axis-aligned box enclosing the sphere
    pub fn to_aabb(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec3::new(self.radius, self.radius, self.radius))
    }
}

/// Plane defined by normal and distance from origin
///
/// Points `p` with `normal · p + distance >= 0` are on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized, or zero for a degenerate plane)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from raw coefficients `(a, b, c, d)` and normalize it
    ///
    /// A normal shorter than epsilon yields a degenerate plane that reports
    /// every point at distance zero, so it never culls anything.
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let length = normal.magnitude();
        if length < EPSILON || !length.is_finite() {
            return Self::degenerate();
        }
        Self {
            normal: normal / length,
            distance: d / length,
        }
    }

    /// Plane that never rejects anything
    pub fn degenerate() -> Self {
        Self {
            normal: Vec3::zeros(),
            distance: 0.0,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_merge_matches_two_level_scenario() {
        let mut root = BoundingSphere::new(Vec3::zeros(), 2.0);
        let child = BoundingSphere::new(Vec3::new(0.0, 4.0, 0.0), 2.0);

        root.merge(&child);

        assert!(root.radius >= 6.0);
        assert!(root.contains(&child));
        assert_eq!(root.center, Vec3::zeros());
    }

    #[test]
    fn test_merge_keeps_larger_parent() {
        let mut root = BoundingSphere::new(Vec3::zeros(), 10.0);
        root.merge(&BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0));
        assert_relative_eq!(root.radius, 10.0);
    }

    #[test]
    fn test_transformed_sphere_uses_largest_scale() {
        let matrix = Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 4.0, 2.0));
        let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.5).transformed(&matrix);

        assert_relative_eq!(sphere.center, Vec3::new(4.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(sphere.radius, 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_normalization() {
        let plane = Plane::from_coefficients(0.0, 2.0, 0.0, -4.0);
        assert_relative_eq!(plane.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(plane.distance, -2.0);
        assert_relative_eq!(plane.distance_to_point(Vec3::new(5.0, 3.0, 1.0)), 1.0);
    }

    #[test]
    fn test_degenerate_plane_never_rejects() {
        let plane = Plane::from_coefficients(0.0, 0.0, 0.0, -100.0);
        assert_eq!(plane.distance_to_point(Vec3::new(1e6, 1e6, 1e6)), 0.0);
    }

    #[test]
    fn test_aabb_from_points_and_sphere_overlap() {
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
        ])
        .unwrap();

        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 5.0));
        assert!(aabb.intersects_sphere(&BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.5)));
        assert!(!aabb.intersects_sphere(&BoundingSphere::new(Vec3::new(3.0, 4.0, 0.0), 1.5)));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
