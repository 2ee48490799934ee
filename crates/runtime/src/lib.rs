//! Frame scheduling and the application loop.
//!
//! # Invariants
//! - Simulation advances in whole fixed periods; the accumulator is
//!   decremented by the period, never by the frame delta.
//! - Each loop iteration renders exactly once, after the catch-up updates.
//! - Exactly one loop thread per [`Application`]; a second `start` is refused.
//! - The loop disposes the game and destroys the window on every exit path.

mod app;
mod clock;
mod error;
mod game;
pub mod headless;
mod scheduler;
mod timestep;
mod window;

pub use app::{Application, ExitReason, LoopStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RuntimeError, WindowError};
pub use game::{Context, Game};
pub use scheduler::{FrameReport, FrameScheduler, FrameTarget, SchedulerConfig};
pub use timestep::FixedTimestep;
pub use window::{Window, WindowFactory};

pub fn crate_info() -> &'static str {
    "arcane-runtime v0.1.0"
}
