use crate::error::WindowError;
use arcane_common::AppSettings;
use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;

/// A platform window with its graphics context.
///
/// Created, driven and destroyed on the loop thread.
pub trait Window {
    /// Make the window visible. Windows start hidden.
    fn show(&mut self);

    /// Deliver pending platform events; input events go to `input`.
    fn poll_events(&mut self, input: &InputSnapshot);

    fn should_close(&self) -> bool;

    fn graphics(&mut self) -> &mut dyn GraphicsBackend;

    /// Finish the current frame and put it on screen.
    fn present(&mut self) -> Result<(), GfxError>;

    fn destroy(self: Box<Self>);
}

/// Opens windows for the loop thread.
pub trait WindowFactory: Send + 'static {
    fn create(&mut self, settings: &AppSettings) -> Result<Box<dyn Window>, WindowError>;
}
