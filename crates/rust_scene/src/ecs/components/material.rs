//! Material and renderable presence components
//!
//! Shading data itself belongs to the renderer. These passes only need to
//! know whether an entity should be drawn and whether it has anything to draw.

use crate::ecs::Component;

/// Material visibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialComponent {
    /// Whether the entity and its subtree are drawn
    pub visible: bool,
}

impl Component for MaterialComponent {}

impl Default for MaterialComponent {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl MaterialComponent {
    /// Visible material
    pub fn visible() -> Self {
        Self { visible: true }
    }

    /// Hidden material
    pub fn hidden() -> Self {
        Self { visible: false }
    }
}

/// Built-in primitive shapes the renderer can instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveShape {
    /// Unit cube
    Cube,
    /// Unit sphere
    Sphere,
    /// Unit quad in the XY plane
    Quad,
}

/// What an entity renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderableComponent {
    /// Instance of a loaded model, identified by the renderer's model id
    Model(u32),
    /// Instance of a built-in primitive
    Primitive(PrimitiveShape),
}

impl Component for RenderableComponent {}
