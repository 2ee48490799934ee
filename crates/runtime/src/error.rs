use arcane_common::SettingsError;
use arcane_gfx::GfxError;

/// Failures opening or driving a window.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("failed to create window: {0}")]
    Create(String),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("an instance is already running")]
    AlreadyRunning,
    #[error("application already ran; the game was consumed by the first start")]
    Finished,
    #[error("failed to spawn loop thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("loop thread panicked")]
    Panicked,
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Gfx(#[from] GfxError),
}
