//! # Camera
//!
//! Camera input for the visibility passes. The camera is plain data: the
//! culling and shadow passes read its matrices and clip-space corners, and
//! nothing in this crate moves it.
//!
//! ## Conventions
//! - Right-handed, Y-up world space
//! - The camera looks down its local -Z axis
//! - Projections use OpenGL clip space with depth in `[-1, 1]`

use nalgebra::{Isometry3, Translation3};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec3, EPSILON};

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    /// Perspective projection driven by the horizontal field of view
    Perspective,
    /// Orthographic projection driven by [`Camera::ortho_height`]
    Orthographic,
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Viewport {
    /// Viewport at the origin with the given size
    pub fn new(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }

    /// Width over height, 1.0 for a zero-height viewport
    pub fn aspect(&self) -> f32 {
        if self.height.abs() < EPSILON {
            return 1.0;
        }
        self.width / self.height
    }
}

/// 3D camera for perspective and orthographic projections
///
/// Orientation is stored as a quaternion rotating the camera's local axes
/// into world space. The field of view is horizontal; the vertical field of
/// view is derived from it through the viewport aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection model
    pub projection_type: ProjectionType,
    /// Camera position in world space
    pub position: Vec3,
    /// Camera orientation in world space
    pub orientation: Quat,
    /// Horizontal field of view in radians (perspective only)
    pub horizontal_fov: f32,
    /// Height of the view volume in world units (orthographic only)
    pub ortho_height: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
    /// Output viewport
    pub viewport: Viewport,
}

impl Camera {
    /// Create a perspective camera looking down -Z
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `horizontal_fov_degrees` - Horizontal field of view in degrees
    /// * `viewport` - Viewport whose aspect ratio shapes the frustum
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, horizontal_fov_degrees: f32, viewport: Viewport, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            position,
            orientation: Quat::identity(),
            horizontal_fov: utils::deg_to_rad(horizontal_fov_degrees),
            ortho_height: 2.0,
            near,
            far,
            viewport,
        }
    }

    /// Create an orthographic camera looking down -Z
    ///
    /// The view volume is `height` units tall and `height * aspect` wide.
    pub fn orthographic(position: Vec3, height: f32, viewport: Viewport, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            position,
            orientation: Quat::identity(),
            horizontal_fov: utils::deg_to_rad(60.0),
            ortho_height: height,
            near,
            far,
            viewport,
        }
    }

    /// Builder pattern: point the camera at `target`
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        self.look_at(target, up);
        self
    }

    /// Rotate the camera to face `target`
    ///
    /// When `up` is parallel to the view direction another axis is used as up.
    /// A target at the camera position leaves the orientation unchanged.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let Some(direction) = utils::try_normalize(target - self.position) else {
            log::warn!("Camera look_at target coincides with position {:?}", self.position);
            return;
        };
        let up = if direction.cross(&up).magnitude() < EPSILON {
            if direction.y.abs() < 0.9 { Vec3::y() } else { Vec3::z() }
        } else {
            up
        };
        self.orientation = Quat::look_at_rh(&direction, &up).inverse();
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update the viewport, for example after a window resize
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if (self.viewport.aspect() - viewport.aspect()).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.viewport.aspect(), viewport.aspect());
        }
        self.viewport = viewport;
    }

    /// Viewport aspect ratio
    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }

    /// Vertical field of view in radians
    ///
    /// `2 * atan(tan(horizontal / 2) / aspect)`
    pub fn vertical_fov(&self) -> f32 {
        2.0 * ((self.horizontal_fov * 0.5).tan() / self.aspect()).atan()
    }

    /// Direction the camera looks in world space
    pub fn forward(&self) -> Vec3 {
        self.orientation * -Vec3::z()
    }

    /// Camera up axis in world space
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }

    /// Camera right axis in world space
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// Whether the parameters can produce a usable view volume
    pub fn is_degenerate(&self) -> bool {
        let aspect = self.aspect();
        let finite = self.position.iter().all(|c| c.is_finite())
            && self.orientation.coords.iter().all(|c| c.is_finite())
            && self.near.is_finite()
            && self.far.is_finite()
            && aspect.is_finite();
        if !finite || self.far - self.near < EPSILON || aspect < EPSILON {
            return true;
        }
        match self.projection_type {
            ProjectionType::Perspective => {
                !(self.near >= EPSILON
                    && self.horizontal_fov > EPSILON
                    && self.horizontal_fov < std::f32::consts::PI)
            }
            ProjectionType::Orthographic => {
                !(self.ortho_height > EPSILON && self.ortho_height * aspect > EPSILON)
            }
        }
    }

    /// World-to-view matrix
    ///
    /// The inverse of the camera's rigid placement in the world.
    pub fn get_view_matrix(&self) -> Mat4 {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
            .inverse()
            .to_homogeneous()
    }

    /// View-to-clip matrix
    ///
    /// Identity for a degenerate camera (see [`is_degenerate`](Self::is_degenerate)).
    pub fn get_projection_matrix(&self) -> Mat4 {
        if self.is_degenerate() {
            return Mat4::identity();
        }
        match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective(self.vertical_fov(), self.aspect(), self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let half_height = self.ortho_height * 0.5;
                let half_width = half_height * self.aspect();
                Mat4::orthographic(-half_width, half_width, -half_height, half_height, self.near, self.far)
            }
        }
    }

    /// Combined `projection * view` matrix
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        self.get_projection_matrix() * self.get_view_matrix()
    }

    /// World-space corners of the view volume
    ///
    /// Near plane first, then far plane, each in the order
    /// `(-1,-1) (1,-1) (1,1) (-1,1)` of clip-space x and y. `None` when the
    /// camera is degenerate or the view-projection matrix cannot be inverted.
    pub fn frustum_corners(&self) -> Option<[Vec3; 8]> {
        const NDC: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        if self.is_degenerate() {
            return None;
        }

        let inverse = self.get_view_projection_matrix().try_inverse()?;
        let mut corners = [Vec3::zeros(); 8];
        for (i, (x, y)) in NDC.iter().enumerate() {
            corners[i] = inverse.unproject(Vec3::new(*x, *y, -1.0))?;
            corners[i + 4] = inverse.unproject(Vec3::new(*x, *y, 1.0))?;
        }
        if corners.iter().flat_map(|c| c.iter()).any(|v| !v.is_finite()) {
            return None;
        }
        Some(corners)
    }
}
