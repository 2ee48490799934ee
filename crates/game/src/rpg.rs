use crate::screens::{GameScreen, PausedScreen};
use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::KeyCode;
use arcane_runtime::{Context, Game};
use arcane_screen::ScreenManager;
use glam::Vec4;
use std::path::PathBuf;

pub const GAME_NAME: &str = "RPG Project";
pub const GAME_SCREEN: &str = "game";
pub const PAUSED_SCREEN: &str = "paused";

/// Sample game: a drifting tile field with a pause overlay.
///
/// `P` switches between the two screens, `Escape` ends the application.
#[derive(Debug, Default)]
pub struct RpgGame {
    screens: ScreenManager,
    texture_path: Option<PathBuf>,
    pause_held: bool,
}

impl RpgGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(path: impl Into<PathBuf>) -> Self {
        Self {
            texture_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn screens(&self) -> &ScreenManager {
        &self.screens
    }

    pub fn is_paused(&self) -> bool {
        self.screens.active_name() == Some(PAUSED_SCREEN)
    }

    fn toggle_pause(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        let next = if self.is_paused() { GAME_SCREEN } else { PAUSED_SCREEN };
        tracing::info!(screen = next, "switching screen");
        self.screens.set_active(next, gfx)
    }
}

impl Game for RpgGame {
    fn initialize(&mut self, ctx: &mut Context<'_>) -> Result<(), GfxError> {
        tracing::info!(game = GAME_NAME, "initializing");
        let game = match &self.texture_path {
            Some(path) => GameScreen::with_texture(path),
            None => GameScreen::new(),
        };
        self.screens.add_screen(GAME_SCREEN, Box::new(game), ctx.gfx)?;
        self.screens
            .add_screen(PAUSED_SCREEN, Box::new(PausedScreen::new()), ctx.gfx)?;
        Ok(())
    }

    fn update(&mut self, dt: f64, ctx: &mut Context<'_>) -> Result<(), GfxError> {
        if ctx.input.is_code_down(KeyCode::Escape) {
            ctx.request_exit();
            return Ok(());
        }

        let pause = ctx.input.is_code_down(KeyCode::KeyP);
        if pause && !self.pause_held {
            self.toggle_pause(ctx.gfx)?;
        }
        self.pause_held = pause;

        self.screens.update(dt, ctx.input);
        Ok(())
    }

    fn render(&self, alpha: f64, ctx: &mut Context<'_>) -> Result<(), GfxError> {
        self.screens.render(alpha, ctx.gfx)
    }

    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend) {
        tracing::info!(game = GAME_NAME, "disposing");
        self.screens.dispose(gfx);
    }

    fn clear_color(&self) -> Vec4 {
        Vec4::new(0.08, 0.08, 0.12, 1.0)
    }
}
