//! Scene visibility
//!
//! Bounding volumes, view volumes and the per-frame scene manager that sits
//! between the ECS world (gameplay) and the renderer (graphics).
//!
//! ```text
//! ECS World (Gameplay)
//!      ↓
//! Scene Manager (hierarchy + culling)
//!      ↓
//! Renderer (Graphics)
//! ```

mod bounds;
mod scene_manager;
mod view_volume;

pub use bounds::{Aabb, BoundingSphere, Plane};
pub use scene_manager::{FrameVisibility, SceneManager, SceneStats};
pub use view_volume::{Frustum, OrthoBox, ViewVolume, ViewVolumeBuilder};
