//! Screen lifecycle management.
//!
//! # Invariants
//! - At most one screen is active.
//! - `show` runs exactly when a screen becomes active, `hide` exactly when it
//!   stops being active; the outgoing `hide` completes before the incoming
//!   `show` starts.
//! - Inactive screens are never updated or rendered.
//! - Teardown hides the active screen, then disposes every registered screen
//!   once, in registration order.

mod manager;
mod screen;

pub use manager::{ManagerState, NONE_SCREEN, ScreenManager};
pub use screen::Screen;

pub fn crate_info() -> &'static str {
    "arcane-screen v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("screen"));
    }
}
