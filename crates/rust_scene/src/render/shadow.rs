//! Cascaded shadow maps for a directional light
//!
//! The camera's depth range is split into cascades with the practical split
//! scheme, a blend of logarithmic and uniform distribution. Each cascade gets
//! an orthographic light volume fitted around the bounding sphere of its
//! slice of the camera frustum. Fitting to a sphere keeps the volume size
//! constant while the camera rotates, and snapping to texels keeps it from
//! shimmering while the camera moves.

use bytemuck::{Pod, Zeroable};

use crate::config::ShadowConfig;
use crate::ecs::components::DirectionalLightComponent;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4, EPSILON};
use crate::render::Camera;
use crate::scene::Aabb;

/// Maximum number of cascades supported by the uniform layout
pub const MAX_CASCADES: usize = 4;

/// One shadow cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascade {
    /// Far split as a fraction of the camera depth range
    pub split_fraction: f32,
    /// Far split as a view-space distance from the camera
    pub far_bound: f32,
    /// World-to-light view matrix
    pub light_view: Mat4,
    /// Orthographic light projection
    pub projection: Mat4,
    /// World to shadow map texture coordinates, `[0, 1]` on every axis
    pub texture_matrix: Mat4,
    /// World-space box enclosing the light volume, used to cull casters
    pub bounds: Aabb,
    /// Center of the fitted sphere
    pub center: Vec3,
    /// Radius of the fitted sphere
    pub radius: f32,
}

impl ShadowCascade {
    /// `projection * light_view`
    pub fn light_view_projection(&self) -> Mat4 {
        self.projection * self.light_view
    }

    /// Unit volume around the origin, used when no valid fit exists
    fn unit(split_fraction: f32, far_bound: f32) -> Self {
        let light_view = Mat4::look_at(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros(), Vec3::y());
        let projection = Mat4::orthographic(-1.0, 1.0, -1.0, 1.0, 0.0, 2.0);
        Self {
            split_fraction,
            far_bound,
            light_view,
            projection,
            texture_matrix: Mat4::ndc_to_texture() * projection * light_view,
            bounds: Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            center: Vec3::zeros(),
            radius: 1.0,
        }
    }
}

/// GPU layout of the cascade data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CascadeUniforms {
    /// Light view-projection per cascade, column-major
    pub light_view_projection: [[[f32; 4]; 4]; MAX_CASCADES],
    /// Texture matrix per cascade, column-major
    pub texture_matrices: [[[f32; 4]; 4]; MAX_CASCADES],
    /// View-space far bound per cascade
    pub far_bounds: [f32; MAX_CASCADES],
    /// Number of populated cascades
    pub cascade_count: u32,
    /// Pads the block to 16 bytes
    pub _padding: [u32; 3],
}

/// Cascaded shadow map state for one directional light
#[derive(Debug, Clone)]
pub struct CascadedShadowMap {
    config: ShadowConfig,
    cascades: Vec<ShadowCascade>,
}

impl CascadedShadowMap {
    /// Create cascades from configuration
    ///
    /// The cascade count is clamped to `1..=MAX_CASCADES`. Cascades start as
    /// unit volumes until the first [`update`](Self::update).
    pub fn new(config: &ShadowConfig) -> Self {
        let mut config = config.clone();
        let count = config.cascade_count.clamp(1, MAX_CASCADES);
        if count != config.cascade_count {
            log::warn!("Clamping cascade count {} to {}", config.cascade_count, count);
            config.cascade_count = count;
        }
        let cascades = Self::unit_cascades(count);
        log::debug!("Created {} shadow cascades ({}x{})", count, config.map_width, config.map_height);
        Self { config, cascades }
    }

    /// Active configuration
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Cascades ordered near to far
    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }

    /// Number of cascades
    pub fn cascade_count(&self) -> usize {
        self.cascades.len()
    }

    /// View-space far bound of every cascade, strictly increasing
    pub fn view_far_bounds(&self) -> Vec<f32> {
        self.cascades.iter().map(|c| c.far_bound).collect()
    }

    /// Practical split distances for `count` cascades
    ///
    /// Returns `(fraction, distance)` pairs for `i in 1..=count`, where the
    /// distance is `lambda * log + (1 - lambda) * uniform` and the fraction is
    /// its position within `[near, far]`. A near plane at zero makes the
    /// logarithmic term meaningless, so only the uniform term is used then.
    /// An empty or non-finite range yields `(i / count, i / count)`, the same
    /// bounds as the unit cascades.
    pub fn split_distances(near: f32, far: f32, count: usize, lambda: f32) -> Vec<(f32, f32)> {
        let range = far - near;
        if !(range >= EPSILON && range.is_finite()) {
            return (1..=count)
                .map(|i| {
                    let p = i as f32 / count as f32;
                    (p, p)
                })
                .collect();
        }
        let use_log = near >= EPSILON;
        (1..=count)
            .map(|i| {
                let p = i as f32 / count as f32;
                let uniform = near + range * p;
                let distance = if use_log {
                    let log = near * (far / near).powf(p);
                    lambda * log + (1.0 - lambda) * uniform
                } else {
                    uniform
                };
                ((distance - near) / range, distance)
            })
            .collect()
    }

    /// Refit every cascade to the camera and light
    pub fn update(&mut self, camera: &Camera, light: &DirectionalLightComponent) {
        let count = self.cascades.len();

        let corners = camera.frustum_corners();
        let (Some(corners), Some(direction)) = (corners, utils::try_normalize(light.direction)) else {
            log::warn!("Degenerate camera or light direction, using unit shadow cascades");
            self.cascades = Self::unit_cascades(count);
            return;
        };

        let splits = Self::split_distances(camera.near, camera.far, count, self.config.split_lambda);
        let mut previous = 0.0;
        let cascades: Vec<ShadowCascade> = splits
            .into_iter()
            .map(|(fraction, far_bound)| {
                let slice = Self::slice_corners(&corners, previous, fraction);
                previous = fraction;
                self.fit(&slice, direction, fraction, far_bound)
            })
            .collect();
        self.cascades = cascades;
        log::trace!("Updated shadow cascades, far bounds {:?}", self.view_far_bounds());
    }

    /// Uniform block for the renderer
    pub fn uniforms(&self) -> CascadeUniforms {
        let mut uniforms = CascadeUniforms::zeroed();
        for (i, cascade) in self.cascades.iter().enumerate() {
            uniforms.light_view_projection[i] = cascade.light_view_projection().into();
            uniforms.texture_matrices[i] = cascade.texture_matrix.into();
            uniforms.far_bounds[i] = cascade.far_bound;
        }
        uniforms.cascade_count = self.cascades.len() as u32;
        uniforms
    }

    /// Corners of the frustum slice between two depth fractions
    fn slice_corners(corners: &[Vec3; 8], near_fraction: f32, far_fraction: f32) -> [Vec3; 8] {
        let mut slice = [Vec3::zeros(); 8];
        for i in 0..4 {
            let ray = corners[i + 4] - corners[i];
            slice[i] = corners[i] + ray * near_fraction;
            slice[i + 4] = corners[i] + ray * far_fraction;
        }
        slice
    }

    fn fit(&self, slice: &[Vec3; 8], direction: Vec3, fraction: f32, far_bound: f32) -> ShadowCascade {
        let center = slice.iter().sum::<Vec3>() / 8.0;
        let radius = slice
            .iter()
            .map(|corner| (corner - center).magnitude())
            .fold(0.0_f32, f32::max);
        // Whole units keep the volume size stable from frame to frame
        let radius = radius.ceil().max(1.0);

        let up = if direction.dot(&Vec3::y()).abs() > 1.0 - 1e-3 { Vec3::z() } else { Vec3::y() };
        let eye = center - direction * radius;
        let light_view = Mat4::look_at(eye, center, up);
        let mut projection = Mat4::orthographic(-radius, radius, -radius, radius, 0.0, 2.0 * radius);

        if self.config.stabilize {
            self.snap_to_texels(&mut projection, &light_view);
        }

        let bounds = match Self::light_volume_bounds(&(projection * light_view)) {
            Some(bounds) => bounds,
            None => return ShadowCascade::unit(fraction, far_bound),
        };

        ShadowCascade {
            split_fraction: fraction,
            far_bound,
            light_view,
            projection,
            texture_matrix: Mat4::ndc_to_texture() * projection * light_view,
            bounds,
            center,
            radius,
        }
    }

    /// Shift the projection so the world origin lands on a texel corner
    fn snap_to_texels(&self, projection: &mut Mat4, light_view: &Mat4) {
        let half_width = self.config.map_width as f32 * 0.5;
        let half_height = self.config.map_height as f32 * 0.5;

        let origin = (*projection * light_view) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let texel_x = origin.x * half_width;
        let texel_y = origin.y * half_height;

        projection[(0, 3)] += (texel_x.round() - texel_x) / half_width;
        projection[(1, 3)] += (texel_y.round() - texel_y) / half_height;
    }

    /// World-space box around the clip volume of a cascade's light matrix
    fn light_volume_bounds(light_view_projection: &Mat4) -> Option<Aabb> {
        let to_world = light_view_projection.try_inverse()?;
        let mut corners = [Vec3::zeros(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let x = if i & 1 == 0 { -1.0 } else { 1.0 };
            let y = if i & 2 == 0 { -1.0 } else { 1.0 };
            let z = if i & 4 == 0 { -1.0 } else { 1.0 };
            *corner = to_world.unproject(Vec3::new(x, y, z))?;
        }
        Aabb::from_points(&corners)
    }

    fn unit_cascades(count: usize) -> Vec<ShadowCascade> {
        (1..=count)
            .map(|i| {
                let p = i as f32 / count as f32;
                ShadowCascade::unit(p, p)
            })
            .collect()
    }
}
