//! Math utilities and types
//!
//! Provides fundamental math types for scene management. All matrices use the
//! nalgebra column-vector convention: a point is transformed as `M * p`, and a
//! world matrix is composed as `Translate * Rotate * Scale`.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
    UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Tolerance used to guard divisions and normalizations in hot paths
pub const EPSILON: f32 = 1e-6;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from all three parts
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Convert to a transformation matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose a transformation matrix into position, rotation and scale
    ///
    /// Translation is read from the fourth column and scale from the length of
    /// each basis column. Mirrored (negative) scale cannot be recovered this way
    /// and comes back positive with a flipped rotation; a polar decomposition
    /// would be required to support it.
    ///
    /// Degenerate matrices (a basis column shorter than [`EPSILON`], or a
    /// rotation that does not normalize) fall back to the identity rotation.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let basis_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31);
        let basis_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32);
        let basis_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33);
        let scale = Vec3::new(basis_x.magnitude(), basis_y.magnitude(), basis_z.magnitude());

        if scale.min() < EPSILON {
            log::warn!("Degenerate matrix scale {:?}, using identity rotation", scale);
            return Self { position, rotation: Quat::identity(), scale };
        }

        let rotation_matrix = Mat3::from_columns(&[
            basis_x / scale.x,
            basis_y / scale.y,
            basis_z / scale.z,
        ]);
        let rotation = nalgebra::Rotation3::from_matrix_unchecked(rotation_matrix);
        let raw = Quat::from_rotation_matrix(&rotation).into_inner();

        let rotation = if raw.coords.iter().all(|c| c.is_finite()) {
            Quat::try_new(raw, EPSILON).unwrap_or_else(Quat::identity)
        } else {
            Quat::identity()
        };

        Self { position, rotation, scale }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Largest per-axis scale factor encoded in a transformation matrix
///
/// Used to scale bounding sphere radii so that a sphere stays conservative
/// under non-uniform scale.
pub fn max_axis_scale(matrix: &Mat4) -> f32 {
    let sx = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
    let sy = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
    let sz = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
    sx.max(sy).max(sz)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Linear interpolation between two vectors
    pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Normalize a vector, returning `None` when its length is below epsilon
    pub fn try_normalize(v: Vec3) -> Option<Vec3> {
        v.try_normalize(super::EPSILON)
    }
}

/// Extension trait for Mat4 with projection and view helpers
///
/// All projections follow the OpenGL convention: right-handed view space
/// looking down -Z, clip-space depth in `[-1, 1]`.
pub trait Mat4Ext {
    /// Create a perspective projection matrix from a vertical field of view
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Bias matrix mapping NDC `[-1, 1]` to texture space `[0, 1]` on every axis
    fn ndc_to_texture() -> Mat4;

    /// Transform a homogeneous point and perform the perspective divide
    ///
    /// Returns `None` when `w` is too close to zero to divide by.
    fn unproject(&self, ndc: Vec3) -> Option<Vec3>;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn ndc_to_texture() -> Mat4 {
        Mat4::new(
            0.5, 0.0, 0.0, 0.5,
            0.0, 0.5, 0.0, 0.5,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn unproject(&self, ndc: Vec3) -> Option<Vec3> {
        let clip = self * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if clip.w.abs() < EPSILON {
            return None;
        }
        Some(Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compose_decompose_roundtrip() {
        let original = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );

        let reconstructed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(reconstructed.position, original.position, epsilon = 1e-5);
        assert_relative_eq!(reconstructed.scale, original.scale, epsilon = 1e-5);

        // Quaternions may flip sign but represent the same rotation
        let dot = original.rotation.coords.dot(&reconstructed.rotation.coords);
        assert!(dot.abs() > 0.9999, "Quaternion rotation mismatch: dot product = {}", dot);
    }

    #[test]
    fn test_roundtrip_unit_scale() {
        let original = Transform::new(
            Vec3::new(-4.0, 0.5, 10.0),
            Quat::from_euler_angles(0.3, -1.2, 2.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        let reconstructed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(reconstructed.position, original.position, epsilon = 1e-5);
        assert_relative_eq!(reconstructed.scale, original.scale, epsilon = 1e-5);
        assert_relative_eq!(reconstructed.to_matrix(), original.to_matrix(), epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_matrix_falls_back_to_identity() {
        let mut matrix = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));
        matrix.m14 = 7.0;

        let decomposed = Transform::from_matrix(&matrix);

        assert_eq!(decomposed.rotation, Quat::identity());
        assert_relative_eq!(decomposed.position, Vec3::new(7.0, 0.0, 0.0));
        assert!(decomposed.scale.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_max_axis_scale() {
        let t = Transform::new(
            Vec3::zeros(),
            Quat::from_euler_angles(0.4, 0.2, 0.1),
            Vec3::new(1.0, 3.0, 2.0),
        );
        assert_relative_eq!(max_axis_scale(&t.to_matrix()), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ndc_to_texture_maps_corners() {
        let bias = Mat4::ndc_to_texture();
        let low = bias.unproject(Vec3::new(-1.0, -1.0, -1.0)).unwrap();
        let high = bias.unproject(Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(low, Vec3::zeros());
        assert_relative_eq!(high, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_unproject_rejects_zero_w() {
        let mut m = Mat4::identity();
        m.m44 = 0.0;
        assert!(m.unproject(Vec3::zeros()).is_none());
    }
}
