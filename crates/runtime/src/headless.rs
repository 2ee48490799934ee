//! Window without a display, backed by [`HeadlessBackend`].
//!
//! Drives the real application loop in tests and in the CLI simulator. The
//! factory exposes a shared [`HeadlessReport`] that survives the window so
//! callers can inspect resource accounting after the loop has exited.

use crate::error::WindowError;
use crate::window::{Window, WindowFactory};
use arcane_common::AppSettings;
use arcane_gfx::{GfxError, GraphicsBackend, HeadlessBackend};
use arcane_input::InputSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Called on every `poll_events` with the number of frames presented so far.
pub type InputScript = Box<dyn FnMut(u64, &InputSnapshot) + Send>;

/// What happened to the headless window, readable after it is gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessReport {
    pub title: String,
    pub created: bool,
    pub shown: bool,
    pub destroyed: bool,
    pub presented: u64,
    pub draws: u64,
    /// Meshes, textures and programs still alive when the window was destroyed.
    pub live_at_destroy: usize,
    pub invalid_deletes: u64,
}

pub struct HeadlessWindow {
    gfx: HeadlessBackend,
    close_after: Option<u64>,
    close: Arc<AtomicBool>,
    script: Option<InputScript>,
    report: Arc<Mutex<HeadlessReport>>,
}

impl Window for HeadlessWindow {
    fn show(&mut self) {
        self.report.lock().shown = true;
    }

    fn poll_events(&mut self, input: &InputSnapshot) {
        let presented = self.report.lock().presented;
        if let Some(script) = self.script.as_mut() {
            script(presented, input);
        }
        if self.close_after.is_some_and(|n| presented >= n) {
            self.close.store(true, Ordering::SeqCst);
        }
    }

    fn should_close(&self) -> bool {
        self.close.load(Ordering::SeqCst)
    }

    fn graphics(&mut self) -> &mut dyn GraphicsBackend {
        &mut self.gfx
    }

    fn present(&mut self) -> Result<(), GfxError> {
        self.gfx.end_frame()?;
        let mut report = self.report.lock();
        report.presented += 1;
        report.draws = self.gfx.total_draws();
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        let mut report = self.report.lock();
        report.destroyed = true;
        report.live_at_destroy = self.gfx.live_total();
        report.invalid_deletes = self.gfx.invalid_deletes();
        if report.live_at_destroy > 0 {
            tracing::warn!(live = report.live_at_destroy, "headless window destroyed with live resources");
        }
    }
}

/// Builds [`HeadlessWindow`]s.
#[derive(Default)]
pub struct HeadlessWindowFactory {
    close_after: Option<u64>,
    fail: bool,
    fail_shaders: bool,
    close: Arc<AtomicBool>,
    script: Option<InputScript>,
    report: Arc<Mutex<HeadlessReport>>,
}

impl HeadlessWindowFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request close once `frames` frames have been presented.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Make `create` fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn failing_shaders(mut self) -> Self {
        self.fail_shaders = true;
        self
    }

    pub fn with_input_script(
        mut self,
        script: impl FnMut(u64, &InputSnapshot) + Send + 'static,
    ) -> Self {
        self.script = Some(Box::new(script));
        self
    }

    /// Flag that closes the window when set, as a user clicking close would.
    pub fn close_handle(&self) -> Arc<AtomicBool> {
        self.close.clone()
    }

    pub fn report(&self) -> Arc<Mutex<HeadlessReport>> {
        self.report.clone()
    }
}

impl WindowFactory for HeadlessWindowFactory {
    fn create(&mut self, settings: &AppSettings) -> Result<Box<dyn Window>, WindowError> {
        settings.validate()?;
        if self.fail {
            return Err(WindowError::Create("headless window creation disabled".into()));
        }
        let mut gfx = HeadlessBackend::new().with_viewport(settings.width, settings.height);
        gfx.set_fail_shaders(self.fail_shaders);
        {
            let mut report = self.report.lock();
            report.title = settings.name.clone();
            report.created = true;
        }
        tracing::debug!(title = %settings.name, "headless window created");
        Ok(Box::new(HeadlessWindow {
            gfx,
            close_after: self.close_after,
            close: self.close.clone(),
            script: self.script.take(),
            report: self.report.clone(),
        }))
    }
}
