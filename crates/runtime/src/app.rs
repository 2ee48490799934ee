use crate::clock::{Clock, SystemClock};
use crate::error::RuntimeError;
use crate::game::{Context, Game};
use crate::scheduler::{FrameScheduler, FrameTarget, SchedulerConfig};
use crate::window::{Window, WindowFactory};
use arcane_common::AppSettings;
use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const LOOP_THREAD_NAME: &str = "arcane-main";

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    WindowClosed,
    Stopped,
    ExitRequested,
}

/// Totals for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    pub frames: u64,
    pub updates: u64,
    /// Simulation time discarded by the update cap, in seconds.
    pub dropped: f64,
    pub exit: Option<ExitReason>,
}

type LoopHandle = JoinHandle<Result<LoopStats, RuntimeError>>;

/// Owns a game and runs it on a dedicated loop thread.
///
/// The game and window factory move onto the loop thread at [`start`]; an
/// application therefore runs at most once.
///
/// [`start`]: Application::start
pub struct Application<G, F> {
    settings: AppSettings,
    config: SchedulerConfig,
    input: InputSnapshot,
    running: Arc<AtomicBool>,
    clock: Option<Box<dyn Clock>>,
    parts: Option<(G, F)>,
    thread: Option<LoopHandle>,
}

impl<G: Game, F: WindowFactory> Application<G, F> {
    pub fn new(game: G, factory: F, settings: AppSettings) -> Self {
        Self {
            settings,
            config: SchedulerConfig::default(),
            input: InputSnapshot::new(),
            running: Arc::new(AtomicBool::new(false)),
            clock: None,
            parts: Some((game, factory)),
            thread: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the wall clock, e.g. with a [`ManualClock`](crate::ManualClock).
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Handle to the input state the loop reads. Writes from any thread are
    /// visible to the game.
    pub fn input(&self) -> InputSnapshot {
        self.input.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Spawn the loop thread.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.is_running() {
            tracing::error!("an instance is already running");
            return Err(RuntimeError::AlreadyRunning);
        }
        let Some((game, factory)) = self.parts.take() else {
            tracing::error!("application already ran");
            return Err(RuntimeError::Finished);
        };

        tracing::info!(title = %self.settings.name, "starting up");
        self.running.store(true, Ordering::SeqCst);
        let main_loop = MainLoop {
            game,
            factory,
            settings: self.settings.clone(),
            config: self.config.clone(),
            clock: self
                .clock
                .take()
                .unwrap_or_else(|| Box::new(SystemClock::new())),
            input: self.input.clone(),
            running: self.running.clone(),
        };

        let handle = thread::Builder::new()
            .name(LOOP_THREAD_NAME.into())
            .spawn(move || main_loop.run())
            .map_err(|err| {
                self.running.store(false, Ordering::SeqCst);
                RuntimeError::Spawn(err)
            })?;
        self.thread = Some(handle);
        Ok(())
    }

    /// Ask the loop to finish and join it.
    ///
    /// Returns `Ok(None)` if nothing was running or the shutdown timeout
    /// elapsed, in which case the thread is left to finish on its own.
    pub fn stop(&mut self) -> Result<Option<LoopStats>, RuntimeError> {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.thread.take() else {
            return Ok(None);
        };
        tracing::info!("shutting down");

        if let Some(timeout) = self.config.shutdown_timeout {
            let deadline = Instant::now() + timeout;
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    tracing::warn!(?timeout, "loop thread did not stop in time, detaching");
                    return Ok(None);
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
        join(handle).map(Some)
    }

    /// Join the loop thread without asking it to stop.
    pub fn wait(&mut self) -> Result<Option<LoopStats>, RuntimeError> {
        match self.thread.take() {
            Some(handle) => join(handle).map(Some),
            None => Ok(None),
        }
    }
}

impl<G, F> Drop for Application<G, F> {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.running.store(false, Ordering::SeqCst);
            if handle.join().is_err() {
                tracing::error!("loop thread panicked");
            }
        }
    }
}

fn join(handle: LoopHandle) -> Result<LoopStats, RuntimeError> {
    handle.join().map_err(|_| RuntimeError::Panicked)?
}

/// State moved onto the loop thread.
struct MainLoop<G, F> {
    game: G,
    factory: F,
    settings: AppSettings,
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    input: InputSnapshot,
    running: Arc<AtomicBool>,
}

impl<G: Game, F: WindowFactory> MainLoop<G, F> {
    fn run(mut self) -> Result<LoopStats, RuntimeError> {
        let span = tracing::info_span!("main_loop", title = %self.settings.name);
        let _guard = span.enter();

        let result = self.open_and_drive();
        self.running.store(false, Ordering::SeqCst);
        match &result {
            Ok(stats) => tracing::info!(
                frames = stats.frames,
                updates = stats.updates,
                exit = ?stats.exit,
                "loop finished"
            ),
            Err(err) => tracing::error!(error = %err, "loop terminated"),
        }
        result
    }

    fn open_and_drive(&mut self) -> Result<LoopStats, RuntimeError> {
        let mut window = self.factory.create(&self.settings)?;
        let result = self.drive(window.as_mut());
        self.game.dispose(window.graphics());
        window.destroy();
        result
    }

    fn drive(&mut self, window: &mut dyn Window) -> Result<LoopStats, RuntimeError> {
        let mut exit = false;
        self.game
            .initialize(&mut Context::new(window.graphics(), &self.input, &mut exit))?;
        window.show();

        let mut scheduler = FrameScheduler::new(self.config.clone());
        scheduler.reset(self.clock.now());
        let mut stats = LoopStats::default();

        loop {
            let reason = if window.should_close() {
                Some(ExitReason::WindowClosed)
            } else if !self.running.load(Ordering::SeqCst) {
                Some(ExitReason::Stopped)
            } else if exit {
                Some(ExitReason::ExitRequested)
            } else {
                None
            };
            if reason.is_some() {
                stats.exit = reason;
                break;
            }

            let report = {
                let mut frame = GameFrame {
                    game: &mut self.game,
                    gfx: window.graphics(),
                    input: &self.input,
                    exit: &mut exit,
                };
                scheduler.frame(self.clock.now(), &mut frame)?
            };
            stats.frames += 1;
            stats.updates += u64::from(report.updates);
            stats.dropped += report.dropped;

            window.present()?;
            window.poll_events(&self.input);
        }
        Ok(stats)
    }
}

/// Adapts a [`Game`] to the scheduler for one frame.
struct GameFrame<'a, G> {
    game: &'a mut G,
    gfx: &'a mut dyn GraphicsBackend,
    input: &'a InputSnapshot,
    exit: &'a mut bool,
}

impl<G: Game> FrameTarget for GameFrame<'_, G> {
    type Error = GfxError;

    fn update(&mut self, dt: f64) -> Result<(), GfxError> {
        self.game
            .update(dt, &mut Context::new(&mut *self.gfx, self.input, &mut *self.exit))
    }

    fn render(&mut self, alpha: f64) -> Result<(), GfxError> {
        self.gfx.begin_frame(self.game.clear_color())?;
        self.game
            .render(alpha, &mut Context::new(&mut *self.gfx, self.input, &mut *self.exit))
    }
}
