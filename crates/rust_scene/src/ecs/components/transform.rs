//! Transform component for the ECS system
//!
//! Follows Game Engine Architecture principles:
//! - Pure data component; hierarchy maintenance lives in the world and systems
//! - Local fields are authored by gameplay, world fields are derived
//! - Parent/child links are plain entity handles owned by the world

use crate::ecs::{Component, Entity};
use crate::foundation::math::{Mat4, Quat, Transform as MathTransform, Vec3};

/// Modification and lifecycle state of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformState {
    /// Spawned this frame, never propagated
    #[default]
    Created,
    /// Local fields changed since the last propagation
    Updated,
    /// Up to date
    Idle,
    /// Scheduled for removal at the next sweep
    MarkedForDelete,
}

/// ECS Transform component
///
/// Holds both the local (parent-relative) and world representation of an
/// entity's spatial state, together with its place in the hierarchy.
///
/// For root entities the world fields are authoritative and mirror the local
/// ones. For children the local fields are authoritative and the world fields
/// are written only by the transform propagation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    world_position: Vec3,
    local_position: Vec3,
    world_scale: Vec3,
    local_scale: Vec3,
    world_orientation: Quat,
    local_orientation: Quat,
    parent: Option<Entity>,
    children: Vec<Entity>,
    world_matrix: Option<Mat4>,

    /// Lifecycle state
    pub state: TransformState,

    /// When this entity is destroyed, detach its children instead of
    /// destroying them with it
    pub keep_children_alive: bool,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::from_transform(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self::from_transform(position, Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Create from position, orientation and scale
    ///
    /// The values are used as the local transform; until the entity is
    /// attached to a parent they are also its world transform.
    pub fn from_transform(position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            world_position: position,
            local_position: position,
            world_scale: scale,
            local_scale: scale,
            world_orientation: orientation,
            local_orientation: orientation,
            parent: None,
            children: Vec::new(),
            world_matrix: None,
            state: TransformState::Created,
            keep_children_alive: false,
        }
    }

    /// Builder pattern: Set rotation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.set_local_orientation(orientation);
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.set_local_scale(Vec3::new(scale, scale, scale));
        self
    }

    /// Builder pattern: keep children alive when this entity is destroyed
    pub fn with_keep_children_alive(mut self, keep: bool) -> Self {
        self.keep_children_alive = keep;
        self
    }

    /// World space position
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Parent-relative position
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// World space scale
    pub fn world_scale(&self) -> Vec3 {
        self.world_scale
    }

    /// Parent-relative scale
    pub fn local_scale(&self) -> Vec3 {
        self.local_scale
    }

    /// World space orientation
    pub fn world_orientation(&self) -> Quat {
        self.world_orientation
    }

    /// Parent-relative orientation
    pub fn local_orientation(&self) -> Quat {
        self.local_orientation
    }

    /// Parent entity, `None` for roots
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Ordered child list
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Whether this entity has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the entity is scheduled for destruction
    pub fn is_marked_for_delete(&self) -> bool {
        self.state == TransformState::MarkedForDelete
    }

    /// Schedule the entity (and, after propagation, its subtree) for removal
    pub fn mark_for_delete(&mut self) {
        self.state = TransformState::MarkedForDelete;
    }

    /// Set the parent-relative position
    pub fn set_local_position(&mut self, position: Vec3) {
        self.local_position = position;
        if self.is_root() {
            self.world_position = position;
        }
        self.touch();
    }

    /// Set the parent-relative orientation
    pub fn set_local_orientation(&mut self, orientation: Quat) {
        self.local_orientation = orientation;
        if self.is_root() {
            self.world_orientation = orientation;
        }
        self.touch();
    }

    /// Set the parent-relative scale
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.local_scale = scale;
        if self.is_root() {
            self.world_scale = scale;
        }
        self.touch();
    }

    /// Local-to-parent matrix
    pub fn local_matrix(&self) -> Mat4 {
        MathTransform::new(self.local_position, self.local_orientation, self.local_scale).to_matrix()
    }

    /// Local-to-world matrix
    ///
    /// Returns the matrix cached by the last propagation when present and
    /// composes it from the world fields otherwise.
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix.unwrap_or_else(|| self.compose_world_matrix())
    }

    /// Compose the world matrix from the world fields, ignoring the cache
    pub fn compose_world_matrix(&self) -> Mat4 {
        MathTransform::new(self.world_position, self.world_orientation, self.world_scale).to_matrix()
    }

    /// Store a freshly propagated world transform
    pub(crate) fn apply_world(&mut self, world: &MathTransform, matrix: Mat4) {
        self.world_position = world.position;
        self.world_orientation = world.rotation;
        self.world_scale = world.scale;
        self.world_matrix = Some(matrix);
    }

    /// Recompose and cache the matrix of a root, whose world fields are authored
    pub(crate) fn refresh_root_matrix(&mut self) -> Mat4 {
        let matrix = self.compose_world_matrix();
        self.world_matrix = Some(matrix);
        matrix
    }

    /// Mark the transform as settled after a propagation pass
    pub(crate) fn settle(&mut self) {
        if matches!(self.state, TransformState::Created | TransformState::Updated) {
            self.state = TransformState::Idle;
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Entity>) {
        self.parent = parent;
        if parent.is_none() {
            // A new root keeps its place in the world
            self.local_position = self.world_position;
            self.local_orientation = self.world_orientation;
            self.local_scale = self.world_scale;
        }
        self.touch();
    }

    pub(crate) fn push_child(&mut self, child: Entity) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: Entity) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        self.children.len() != before
    }

    fn touch(&mut self) {
        self.world_matrix = None;
        if self.state == TransformState::Idle {
            self.state = TransformState::Updated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_identity() {
        let transform = TransformComponent::identity();

        assert_eq!(transform.world_position(), Vec3::zeros());
        assert_relative_eq!(transform.world_orientation(), Quat::identity(), epsilon = 1e-6);
        assert_eq!(transform.world_scale(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(transform.state, TransformState::Created);
        assert!(transform.is_root());
    }

    #[test]
    fn test_root_setters_mirror_world() {
        let mut transform = TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.set_local_position(Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(transform.world_position(), Vec3::new(4.0, 5.0, 6.0));
        assert_relative_eq!(
            transform.world_matrix(),
            Mat4::new_translation(&Vec3::new(4.0, 5.0, 6.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_setters_mark_idle_as_updated() {
        let mut transform = TransformComponent::identity();
        transform.settle();
        assert_eq!(transform.state, TransformState::Idle);

        transform.set_local_scale(Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(transform.state, TransformState::Updated);
    }

    #[test]
    fn test_marked_state_survives_edits() {
        let mut transform = TransformComponent::identity();
        transform.mark_for_delete();
        transform.set_local_position(Vec3::new(1.0, 0.0, 0.0));
        transform.settle();

        assert!(transform.is_marked_for_delete());
    }

    #[test]
    fn test_local_matrix_order() {
        // Scale first, then rotate, then translate
        let transform = TransformComponent::from_transform(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), HALF_PI),
            Vec3::new(2.0, 2.0, 2.0),
        );

        let moved = transform.local_matrix().transform_point(&crate::foundation::math::Point3::new(1.0, 0.0, 0.0));

        // (1,0,0) scaled to (2,0,0), rotated 90 degrees about Y to (0,0,-2), then shifted by +X
        assert_relative_eq!(moved.coords, Vec3::new(1.0, 0.0, -2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_detaching_keeps_world_placement() {
        let mut transform = TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0));
        transform.parent = Some(Entity::default());
        transform.apply_world(
            &MathTransform::new(Vec3::new(5.0, 1.0, 0.0), Quat::identity(), Vec3::new(1.0, 1.0, 1.0)),
            Mat4::new_translation(&Vec3::new(5.0, 1.0, 0.0)),
        );

        transform.set_parent(None);

        assert!(transform.is_root());
        assert_eq!(transform.local_position(), Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(transform.world_position(), Vec3::new(5.0, 1.0, 0.0));
    }
}
