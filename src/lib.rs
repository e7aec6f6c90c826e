mod ai;
pub mod api;
mod common;
mod config;
mod game;
mod logging;
mod player;
mod player_ai;
mod pool;
pub mod prelude;
mod ship;
mod timer;

pub use ai::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use logging::init_logging;
pub use player::*;
pub use player_ai::*;
pub use pool::*;
pub use ship::*;
pub use timer::*;
