// Random fleet placement and target selection for the bot.

use rand::Rng;

use crate::{
    common::{Cell, GameError},
    config::{BOARD_SIZE, FLEET_SHIP_LENGTHS, MAX_PLACEMENT_ATTEMPTS},
    ship::{destroyed_cells, Fleet, Ship},
};

/// Direction a ship extends in from its anchor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Whether a ship of `length` starting at `anchor` stays on the field.
    /// Derived from the anchor's distance to the edge in this direction.
    pub fn fits(self, anchor: Cell, length: usize) -> bool {
        let room = match self {
            Direction::Up => anchor.y,
            Direction::Down => BOARD_SIZE - 1 - anchor.y,
            Direction::Left => anchor.x,
            Direction::Right => BOARD_SIZE - 1 - anchor.x,
        };
        room >= 0 && (room as usize) + 1 >= length
    }
}

/// Cells of a ship laid out from `anchor` along `direction`.
pub fn lay_out(anchor: Cell, direction: Direction, length: usize) -> Vec<Cell> {
    let (dx, dy) = direction.delta();
    (0..length as i32)
        .map(|i| Cell::new(anchor.x + dx * i, anchor.y + dy * i))
        .collect()
}

/// Place a single ship of `length` so that none of its decks coincides with
/// or touches (diagonals included) a deck of `placed`.
pub fn place_ship<R: Rng + ?Sized>(
    rng: &mut R,
    placed: &[Ship],
    length: usize,
) -> Result<Ship, GameError> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let anchor = Cell::new(
            rng.random_range(0..BOARD_SIZE),
            rng.random_range(0..BOARD_SIZE),
        );
        let feasible: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| d.fits(anchor, length))
            .collect();
        if feasible.is_empty() {
            continue;
        }
        let direction = feasible[rng.random_range(0..feasible.len())];
        let cells = lay_out(anchor, direction, length);

        let clashes = cells.iter().any(|cell| {
            placed
                .iter()
                .flat_map(Ship::decks)
                .any(|deck| deck.location().touches(cell))
        });
        if !clashes {
            return Ok(Ship::new(cells));
        }
    }
    Err(GameError::FleetGenerationFailed {
        length,
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

/// Generate the standard fleet: one 4-deck, two 3-deck and three 2-deck ships.
pub fn generate_fleet<R: Rng + ?Sized>(rng: &mut R) -> Result<Fleet, GameError> {
    let mut fleet = Fleet::with_capacity(FLEET_SHIP_LENGTHS.len());
    for length in FLEET_SHIP_LENGTHS {
        let ship = place_ship(rng, &fleet, length)?;
        fleet.push(ship);
    }
    Ok(fleet)
}

/// Pick uniformly among the cells that are neither destroyed decks of
/// `enemy_fleet` nor listed in `excluded`.
pub fn choose_target<R: Rng + ?Sized>(
    rng: &mut R,
    enemy_fleet: &[Ship],
    excluded: &[Cell],
) -> Result<Cell, GameError> {
    let destroyed: Vec<Cell> = destroyed_cells(enemy_fleet).collect();
    let candidates: Vec<Cell> = Cell::all()
        .filter(|cell| !destroyed.contains(cell) && !excluded.contains(cell))
        .collect();
    if candidates.is_empty() {
        return Err(GameError::NoTargetsLeft);
    }
    Ok(candidates[rng.random_range(0..candidates.len())])
}
