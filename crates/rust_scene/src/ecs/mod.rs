//! Entity-Component-System implementation
//!
//! Provides the entity store, the spatial components and the per-frame
//! hierarchy passes used by the visibility pipeline.

pub mod world;
pub mod entity;
pub mod component;
pub mod components;
pub mod system;
pub mod systems;

mod storage;

#[cfg(test)]
mod tests;

pub use world::{World, SceneError};
pub use entity::Entity;
pub use component::Component;
pub use system::System;
