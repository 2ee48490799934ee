//! Keyboard, mouse button and pointer state as seen by the game loop.
//!
//! # Invariants
//! - One snapshot per window; clones share the same state.
//! - Writers (event delivery) and readers (loop thread) may live on different
//!   threads.
//! - Querying an unidentified key is a usage error: logged, answers `false`.

mod snapshot;

pub use snapshot::InputSnapshot;
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::{KeyCode, PhysicalKey};

pub fn crate_info() -> &'static str {
    "arcane-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
