//! Sample game for the arcane shell.
//!
//! A tile field scrolls under an orthographic camera; `P` pauses into an
//! overlay screen and `Escape` quits. Shader programs live per registered
//! screen, meshes, textures and cameras per activation.

mod camera;
mod rpg;
mod screens;
mod shaders;

pub use camera::OrthoCamera;
pub use rpg::{GAME_NAME, GAME_SCREEN, PAUSED_SCREEN, RpgGame};
pub use screens::{GameScreen, PausedScreen};
pub use shaders::{SCENE_SHADER, scene_source};

pub fn crate_info() -> &'static str {
    "arcane-game v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("game"));
    }
}
