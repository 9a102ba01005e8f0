//! System trait and implementations

/// System trait for processing entities and components
///
/// Implemented by the hierarchy passes so a scheduler can run them in order
/// without knowing their concrete types.
pub trait System {
    /// Run the system
    fn run(&mut self, world: &mut crate::ecs::World);
}
