use anyhow::Result;
use arcane_common::AppSettings;
use arcane_game::{GAME_NAME, GameScreen, PausedScreen, RpgGame};
use arcane_gfx::{GfxError, GraphicsBackend, HeadlessBackend};
use arcane_input::{ElementState, InputSnapshot, KeyCode, PhysicalKey};
use arcane_runtime::headless::HeadlessWindowFactory;
use arcane_runtime::{Application, ManualClock, SchedulerConfig};
use arcane_screen::{NONE_SCREEN, Screen, ScreenManager};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcane-cli", about = "CLI tool for the arcane shell")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the default settings
    Info,
    /// Run the sample game headless under a simulated clock
    Simulate {
        /// Frames to present before the window closes
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Simulated wall time per frame, in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        /// Simulation steps per second
        #[arg(long, default_value = "30")]
        tick_rate: f64,
        /// Most updates per frame, 0 for no cap
        #[arg(long, default_value = "5")]
        max_updates: u32,
        /// Press P at this frame
        #[arg(long)]
        pause_at: Option<u64>,
    },
    /// Walk the A -> B -> niL -> A lifecycle and print what each screen saw
    Screens,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => info()?,
        Commands::Simulate {
            frames,
            frame_ms,
            tick_rate,
            max_updates,
            pause_at,
        } => simulate(frames, frame_ms, tick_rate, max_updates, pause_at)?,
        Commands::Screens => screens()?,
    }

    Ok(())
}

fn info() -> Result<()> {
    println!("arcane-cli v{}", env!("CARGO_PKG_VERSION"));
    println!("common: {}", arcane_common::crate_info());
    println!("gfx: {}", arcane_gfx::crate_info());
    println!("input: {}", arcane_input::crate_info());
    println!("screen: {}", arcane_screen::crate_info());
    println!("runtime: {}", arcane_runtime::crate_info());
    println!("render-wgpu: {}", arcane_render_wgpu::crate_info());
    println!("game: {}", arcane_game::crate_info());
    println!("default settings:");
    print!("{}", AppSettings::new(GAME_NAME, 800, 460).to_yaml()?);
    Ok(())
}

fn simulate(
    frames: u64,
    frame_ms: u64,
    tick_rate: f64,
    max_updates: u32,
    pause_at: Option<u64>,
) -> Result<()> {
    anyhow::ensure!(
        tick_rate.is_finite() && tick_rate > 0.0,
        "tick rate must be positive, got {tick_rate}"
    );
    tracing::info!(frames, frame_ms, tick_rate, max_updates, "simulating headless run");

    let clock = ManualClock::new();
    let ticker = clock.clone();
    let step = Duration::from_millis(frame_ms);
    let factory = HeadlessWindowFactory::new()
        .close_after(frames)
        .with_input_script(move |frame, input: &InputSnapshot| {
            ticker.advance(step);
            if let Some(at) = pause_at {
                let state = if frame == at {
                    ElementState::Pressed
                } else {
                    ElementState::Released
                };
                input.set_key(PhysicalKey::Code(KeyCode::KeyP), state);
            }
        });
    let report = factory.report();

    let config = SchedulerConfig {
        update_period: Duration::from_secs_f64(1.0 / tick_rate),
        max_updates_per_frame: (max_updates > 0).then_some(max_updates),
        ..SchedulerConfig::default()
    };
    let settings = AppSettings::new(GAME_NAME, 800, 460);
    let mut app = Application::new(RpgGame::new(), factory, settings)
        .with_config(config)
        .with_clock(clock);
    app.start()?;
    let stats = app
        .wait()?
        .ok_or_else(|| anyhow::anyhow!("loop produced no statistics"))?;

    println!(
        "frames={} updates={} dropped={:.3}s exit={:?}",
        stats.frames, stats.updates, stats.dropped, stats.exit
    );
    let report = report.lock();
    println!(
        "window: presented={} draws={} live_at_destroy={} invalid_deletes={}",
        report.presented, report.draws, report.live_at_destroy, report.invalid_deletes
    );
    anyhow::ensure!(report.live_at_destroy == 0, "resources leaked at shutdown");
    tracing::info!(frames = stats.frames, updates = stats.updates, "simulation finished");
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    shown: u32,
    hidden: u32,
    disposed: u32,
}

/// Counts lifecycle calls before forwarding them.
struct Counted {
    inner: Box<dyn Screen>,
    tally: Arc<Mutex<Tally>>,
}

impl Screen for Counted {
    fn show(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        self.tally.lock().shown += 1;
        self.inner.show(gfx)
    }

    fn hide(&mut self, gfx: &mut dyn GraphicsBackend) {
        self.tally.lock().hidden += 1;
        self.inner.hide(gfx);
    }

    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend) {
        self.tally.lock().disposed += 1;
        self.inner.dispose(gfx);
    }

    fn update(&mut self, dt: f64, input: &InputSnapshot) {
        self.inner.update(dt, input);
    }

    fn render(&self, alpha: f64, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        self.inner.render(alpha, gfx)
    }
}

fn screens() -> Result<()> {
    tracing::info!("walking screen lifecycle");
    let mut gfx = HeadlessBackend::new();
    let mut manager = ScreenManager::new();
    let a = Arc::new(Mutex::new(Tally::default()));
    let b = Arc::new(Mutex::new(Tally::default()));

    let print = |step: &str, manager: &ScreenManager, gfx: &HeadlessBackend| {
        let (a, b) = (*a.lock(), *b.lock());
        println!(
            "{step:<12} active={:<6} A(show={} hide={} dispose={}) B(show={} hide={} dispose={}) live={}",
            manager.active_name().unwrap_or(NONE_SCREEN),
            a.shown,
            a.hidden,
            a.disposed,
            b.shown,
            b.hidden,
            b.disposed,
            gfx.live_total()
        );
    };

    manager.add_screen(
        "A",
        Box::new(Counted {
            inner: Box::new(GameScreen::new()),
            tally: a.clone(),
        }),
        &mut gfx,
    )?;
    print("add A", &manager, &gfx);
    manager.add_screen(
        "B",
        Box::new(Counted {
            inner: Box::new(PausedScreen::new()),
            tally: b.clone(),
        }),
        &mut gfx,
    )?;
    print("add B", &manager, &gfx);

    for name in ["B", NONE_SCREEN, "A"] {
        manager.set_active(name, &mut gfx)?;
        print(&format!("activate {name}"), &manager, &gfx);
    }

    manager.dispose(&mut gfx);
    print("dispose", &manager, &gfx);
    anyhow::ensure!(gfx.live_total() == 0, "resources leaked after dispose");
    tracing::info!("screen walk finished");
    Ok(())
}
