mod window;

use anyhow::{Context as _, Result};
use arcane_common::AppSettings;
use arcane_game::{GAME_NAME, RpgGame};
use arcane_runtime::{Application, SchedulerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use window::WinitWindowFactory;

#[derive(Parser, Debug)]
#[command(name = "arcane-desktop", about = "Run the sample game in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Settings file (.yaml, .yml or .json)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Window width, overrides the settings file
    #[arg(long)]
    width: Option<u32>,

    /// Window height, overrides the settings file
    #[arg(long)]
    height: Option<u32>,

    /// Present with vsync (true/false), overrides the settings file
    #[arg(long, action = clap::ArgAction::Set)]
    vsync: Option<bool>,

    /// Image used for the ground tiles
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Simulation steps per second
    #[arg(long, default_value_t = 30.0)]
    tick_rate: f64,
}

impl Cli {
    fn settings(&self) -> Result<AppSettings> {
        let mut settings = match &self.settings {
            Some(path) => AppSettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => AppSettings::new(GAME_NAME, 800, 460),
        };
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(vsync) = self.vsync {
            settings.vsync = vsync;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn scheduler(&self) -> Result<SchedulerConfig> {
        anyhow::ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick rate must be positive, got {}",
            self.tick_rate
        );
        Ok(SchedulerConfig {
            update_period: Duration::from_secs_f64(1.0 / self.tick_rate),
            shutdown_timeout: Some(Duration::from_secs(2)),
            ..SchedulerConfig::default()
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let settings = cli.settings()?;
    tracing::info!(title = %settings.name, "arcane-desktop starting");

    let game = match &cli.texture {
        Some(path) => RpgGame::with_texture(path),
        None => RpgGame::new(),
    };
    let mut app = Application::new(game, WinitWindowFactory::new(), settings)
        .with_config(cli.scheduler()?);
    app.start()?;

    let stats = app.wait()?;
    if let Some(stats) = stats {
        tracing::info!(
            frames = stats.frames,
            updates = stats.updates,
            exit = ?stats.exit,
            "arcane-desktop finished"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from(["arcane-desktop", "--width", "1280", "--vsync", "false"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.name, GAME_NAME);
        assert_eq!((settings.width, settings.height), (1280, 460));
        assert!(!settings.vsync);
    }

    #[test]
    fn zero_size_is_rejected() {
        let cli = Cli::parse_from(["arcane-desktop", "--height", "0"]);
        assert!(cli.settings().is_err());
    }

    #[test]
    fn tick_rate_sets_update_period() {
        let cli = Cli::parse_from(["arcane-desktop", "--tick-rate", "60"]);
        let config = cli.scheduler().unwrap();
        assert!((config.update_period.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);

        let cli = Cli::parse_from(["arcane-desktop", "--tick-rate", "0"]);
        assert!(cli.scheduler().is_err());
    }
}
