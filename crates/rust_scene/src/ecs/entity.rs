//! Entity implementation

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// A generational index into the [`World`](super::World). Destroying an
    /// entity bumps the slot generation, so stale handles simply stop
    /// resolving instead of aliasing a newer entity.
    pub struct Entity;
}

impl Entity {
    /// Raw 64-bit representation, useful for logging and sorting
    pub fn id(&self) -> u64 {
        slotmap::Key::data(self).as_ffi()
    }
}
