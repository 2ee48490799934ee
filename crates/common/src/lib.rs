//! Shared types for the arcane shell.
//!
//! # Invariants
//! - Settings are validated before any window is created from them.

mod settings;

pub use settings::{AppSettings, SettingsError};

pub fn crate_info() -> &'static str {
    "arcane-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
