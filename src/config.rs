use std::time::Duration;

use crate::common::UserId;

/// Width and height of the square game field.
pub const BOARD_SIZE: i32 = 10;

/// Lengths of the ships a generated fleet is made of.
pub const FLEET_SHIP_LENGTHS: [usize; 6] = [4, 3, 3, 2, 2, 2];

/// Name given to the bot that replaces a guest who never showed up.
pub const BOT_NAME: &str = "General Chaos";

/// User id the bot plays under. Never matched against real users.
pub const BOT_USER_ID: UserId = -1;

/// How many times a single ship may be re-rolled before fleet generation
/// gives up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 5000;

pub const DEFAULT_MATCHING_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FLEET_CREATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_BATTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadlines a game arms its timer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Time a host waits for a real guest before a bot takes the slot.
    pub matching_timeout: Duration,
    /// Time both sides get to submit their fleets.
    pub fleet_creation_timeout: Duration,
    /// Time the side to move gets before forfeiting.
    pub battle_timeout: Duration,
}

impl GameConfig {
    /// Same deadline for every phase, handy for tests.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            matching_timeout: timeout,
            fleet_creation_timeout: timeout,
            battle_timeout: timeout,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            matching_timeout: DEFAULT_MATCHING_TIMEOUT,
            fleet_creation_timeout: DEFAULT_FLEET_CREATION_TIMEOUT,
            battle_timeout: DEFAULT_BATTLE_TIMEOUT,
        }
    }
}

/// Returns `true` when the coordinate lies on the game field.
pub fn on_board(x: i32, y: i32) -> bool {
    (0..BOARD_SIZE).contains(&x) && (0..BOARD_SIZE).contains(&y)
}
