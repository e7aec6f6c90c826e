//! Ships and their decks.

use std::collections::HashMap;

use crate::common::Cell;

/// One segment of a ship and the atomic unit of damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deck {
    location: Cell,
    destroyed: bool,
}

impl Deck {
    /// A fresh, undamaged deck.
    pub fn new(location: Cell) -> Self {
        Self {
            location,
            destroyed: false,
        }
    }

    pub fn location(&self) -> Cell {
        self.location
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/// A ship made of decks keyed by their location. The shape never changes,
/// only the destruction state of its decks does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ship {
    decks: HashMap<Cell, Deck>,
}

impl Ship {
    /// Build an undamaged ship occupying `cells`. Repeated cells collapse
    /// into one deck.
    pub fn new<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        let decks = cells
            .into_iter()
            .map(|cell| (cell, Deck::new(cell)))
            .collect();
        Self { decks }
    }

    /// Copy of this ship's shape with every deck undamaged.
    pub fn pristine_copy(&self) -> Self {
        Ship::new(self.decks.keys().copied())
    }

    pub fn decks(&self) -> impl Iterator<Item = &Deck> {
        self.decks.values()
    }

    /// Deck locations in a stable order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.decks.keys().copied().collect();
        cells.sort();
        cells
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.decks.contains_key(cell)
    }

    pub fn deck(&self, cell: &Cell) -> Option<&Deck> {
        self.decks.get(cell)
    }

    /// Destroy the deck at `cell`. Returns `true` if the ship has a deck there.
    pub(crate) fn hit(&mut self, cell: &Cell) -> bool {
        match self.decks.get_mut(cell) {
            Some(deck) => {
                deck.destroy();
                true
            }
            None => false,
        }
    }

    /// A ship is destroyed once all of its decks are.
    pub fn is_destroyed(&self) -> bool {
        self.decks.values().all(Deck::destroyed)
    }
}

/// The complete set of a player's ships.
pub type Fleet = Vec<Ship>;

/// Locations of all destroyed decks across a fleet.
pub fn destroyed_cells(fleet: &[Ship]) -> impl Iterator<Item = Cell> + '_ {
    fleet
        .iter()
        .flat_map(Ship::decks)
        .filter(|deck| deck.destroyed())
        .map(Deck::location)
}

/// Returns `true` when every ship of the fleet is destroyed.
pub fn fleet_destroyed(fleet: &[Ship]) -> bool {
    fleet.iter().all(Ship::is_destroyed)
}
