mod game;
mod paused;

pub use game::GameScreen;
pub use paused::PausedScreen;
