use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;

/// A unit of presentation and simulation that can be swapped in and out.
///
/// Resources a screen needs for every activation (shader programs, renderers)
/// live until [`Screen::dispose`]; resources built in [`Screen::show`] must be
/// released in [`Screen::hide`].
pub trait Screen: Send {
    /// Acquire per-activation resources. On error everything acquired during
    /// this call must already be released.
    fn show(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError>;

    /// Release per-activation resources.
    fn hide(&mut self, gfx: &mut dyn GraphicsBackend);

    /// Release per-registration resources. Called once, after the final `hide`.
    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend);

    /// Advance the simulation by one fixed step of `dt` seconds.
    fn update(&mut self, dt: f64, input: &InputSnapshot);

    /// Draw the current state, `alpha` of the way towards the next step.
    fn render(&self, alpha: f64, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError>;
}
