use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;
use glam::Vec4;

/// Everything a game can reach during one callback.
pub struct Context<'a> {
    pub gfx: &'a mut dyn GraphicsBackend,
    pub input: &'a InputSnapshot,
    exit: &'a mut bool,
}

impl<'a> Context<'a> {
    pub fn new(
        gfx: &'a mut dyn GraphicsBackend,
        input: &'a InputSnapshot,
        exit: &'a mut bool,
    ) -> Self {
        Self { gfx, input, exit }
    }

    /// Ask the loop to finish after the current iteration.
    pub fn request_exit(&mut self) {
        if !*self.exit {
            tracing::info!("exit requested by game");
        }
        *self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        *self.exit
    }
}

/// A game driven by the application loop.
///
/// Every method runs on the loop thread. `dispose` is called exactly once,
/// also when `initialize`, `update` or `render` failed.
pub trait Game: Send + 'static {
    fn initialize(&mut self, ctx: &mut Context<'_>) -> Result<(), GfxError>;

    /// One fixed simulation step of `dt` seconds.
    fn update(&mut self, dt: f64, ctx: &mut Context<'_>) -> Result<(), GfxError>;

    /// Draw calls for the current frame. The frame is already begun.
    fn render(&self, alpha: f64, ctx: &mut Context<'_>) -> Result<(), GfxError>;

    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend);

    fn clear_color(&self) -> Vec4 {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    }
}
