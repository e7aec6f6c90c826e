use crate::{
    common::{Cell, GameError, UserId},
    config::BOT_NAME,
    ship::{Fleet, Ship},
};

/// A participant of a game, either a real user or the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub is_bot: bool,
    pub fleet: Option<Fleet>,
    /// Cells this user has already fired at, in firing order.
    pub excluded_locations: Vec<Cell>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            is_bot: false,
            fleet: None,
            excluded_locations: Vec::new(),
        }
    }

    /// The bot that takes an empty guest slot, fleet already in place.
    pub fn bot(id: UserId, fleet: Fleet) -> Self {
        Self {
            id,
            name: Some(BOT_NAME.to_string()),
            is_bot: true,
            fleet: Some(fleet),
            excluded_locations: Vec::new(),
        }
    }

    pub fn has_fleet(&self) -> bool {
        self.fleet.is_some()
    }

    /// Remember `cell` as fired at. Fails if it already was.
    pub fn exclude(&mut self, cell: Cell) -> Result<(), GameError> {
        if self.excluded_locations.contains(&cell) {
            return Err(GameError::AlreadyExcluded(cell));
        }
        self.excluded_locations.push(cell);
        Ok(())
    }
}

/// Strategy used when a game slot is occupied by a bot.
pub trait Ai: Send + Sync {
    /// Produce a complete fleet for the bot.
    fn generate_ships(&self) -> Result<Vec<Ship>, GameError>;

    /// Pick the next cell to fire at, avoiding destroyed decks of
    /// `enemy_fleet` and everything in `excluded`.
    fn choose_attack_location(
        &self,
        enemy_fleet: &[Ship],
        excluded: &[Cell],
    ) -> Result<Cell, GameError>;
}
