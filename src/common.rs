//! Common types: coordinates, attack outcomes, identifiers and errors.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{on_board, BOARD_SIZE};
use crate::game::GameState;

/// Externally supplied user identifier.
pub type UserId = i64;

/// Identifier of a game, generated by the game itself.
pub type GameId = u32;

/// A coordinate on the game field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `true` when the cell lies inside the 10x10 field.
    pub fn is_on_board(&self) -> bool {
        on_board(self.x, self.y)
    }

    /// Returns `true` for the same cell and for its eight neighbours.
    pub fn touches(&self, other: &Cell) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// Every cell of the field, row by row.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Cell::new(x, y)))
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Cell::new(x, y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Result of a single attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackResult {
    /// A live deck was destroyed; the attacker keeps the turn.
    Hit,
    /// Nothing was there; the turn passes.
    Missed,
    /// The last live deck of the enemy fleet was destroyed.
    Win,
}

/// Errors surfaced by the game core. Messages are relayed to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Not your turn.")]
    NotYourTurn,
    #[error("State not suitable for attack: {0}.")]
    StateNotSuitableForAttack(GameState),
    #[error("Target cannot be outside the game field. Available coordinates are 0-9.")]
    OutsideOfField,
    #[error("Oops, host fleet is null.")]
    HostFleetMissing,
    #[error("Oops, guest fleet is null.")]
    GuestFleetMissing,
    #[error("Location {0} is already excluded.")]
    AlreadyExcluded(Cell),
    #[error("Can't start playing: you already participate in ongoing game id={0}.")]
    AlreadyPlaying(GameId),
    #[error("User id={user} participates in several games: {}.", join_ids(.games))]
    SeveralGames { user: UserId, games: Vec<GameId> },
    #[error("User id={user} doesn't participate in game id={game}.")]
    UnknownUser { user: UserId, game: GameId },
    #[error("Game id={0} isn't waiting for a guest.")]
    NotWaitingForGuest(GameId),
    #[error("Can't save ships in state {0}.")]
    FleetNotAccepted(GameState),
    #[error("No locations left to attack.")]
    NoTargetsLeft,
    #[error("Couldn't place ship of length {length} after {attempts} attempts.")]
    FleetGenerationFailed { length: usize, attempts: usize },
}

fn join_ids(ids: &[GameId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
