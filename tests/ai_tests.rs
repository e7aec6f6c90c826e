use battleship_server::{
    choose_target, generate_fleet, lay_out, place_ship, Ai, Cell, Direction, GameError,
    RandomAi, Ship, BOARD_SIZE, FLEET_SHIP_LENGTHS,
};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn assert_well_formed(fleet: &[Ship]) {
    let mut lengths: Vec<usize> = fleet.iter().map(Ship::len).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(lengths, FLEET_SHIP_LENGTHS.to_vec());

    for ship in fleet {
        let cells = ship.cells();
        assert!(cells.iter().all(Cell::is_on_board));
        // straight and contiguous
        let same_x = cells.iter().all(|c| c.x == cells[0].x);
        let same_y = cells.iter().all(|c| c.y == cells[0].y);
        assert!(same_x || same_y);
        for pair in cells.windows(2) {
            let step = (pair[1].x - pair[0].x) + (pair[1].y - pair[0].y);
            assert_eq!(step, 1);
        }
    }

    for (i, a) in fleet.iter().enumerate() {
        for b in fleet.iter().skip(i + 1) {
            for ca in a.cells() {
                for cb in b.cells() {
                    assert!(!ca.touches(&cb), "{} touches {}", ca, cb);
                }
            }
        }
    }
}

#[test]
fn direction_fits_from_edges() {
    let corner = Cell::new(0, 0);
    assert!(!Direction::Up.fits(corner, 2));
    assert!(!Direction::Left.fits(corner, 2));
    assert!(Direction::Down.fits(corner, 4));
    assert!(Direction::Right.fits(corner, 4));
    assert!(Direction::Up.fits(Cell::new(0, 3), 4));
    assert!(!Direction::Up.fits(Cell::new(0, 2), 4));
    assert!(Direction::Right.fits(Cell::new(BOARD_SIZE - 4, 0), 4));
    assert!(!Direction::Right.fits(Cell::new(BOARD_SIZE - 3, 0), 4));
}

#[test]
fn lay_out_follows_direction() {
    let cells = lay_out(Cell::new(5, 5), Direction::Up, 3);
    assert_eq!(cells, vec![Cell::new(5, 5), Cell::new(5, 4), Cell::new(5, 3)]);
    let cells = lay_out(Cell::new(5, 5), Direction::Left, 2);
    assert_eq!(cells, vec![Cell::new(5, 5), Cell::new(4, 5)]);
}

#[test]
fn placement_gives_up_on_a_crowded_board() {
    let mut rng = SmallRng::seed_from_u64(3);
    // Single-deck ships on every other cell leave no room for anything.
    let crowded: Vec<Ship> = (0..BOARD_SIZE)
        .step_by(2)
        .flat_map(|x| (0..BOARD_SIZE).step_by(2).map(move |y| Ship::new([Cell::new(x, y)])))
        .collect();
    let err = place_ship(&mut rng, &crowded, 2).unwrap_err();
    assert!(matches!(err, GameError::FleetGenerationFailed { length: 2, .. }));
}

#[test]
fn random_ai_generates_standard_fleet() {
    let ai = RandomAi::seeded(11);
    let fleet = ai.generate_ships().unwrap();
    assert_well_formed(&fleet);
    assert!(fleet.iter().all(|s| !s.is_destroyed()));
}

#[test]
fn target_skips_excluded_cells() {
    let mut rng = SmallRng::seed_from_u64(5);
    let excluded: Vec<Cell> = Cell::all().filter(|c| *c != Cell::new(6, 7)).collect();
    let fleet = vec![Ship::new([Cell::new(0, 0)])];
    for _ in 0..10 {
        assert_eq!(choose_target(&mut rng, &fleet, &excluded).unwrap(), Cell::new(6, 7));
    }
}

#[test]
fn exhausted_board_is_an_error() {
    let mut rng = SmallRng::seed_from_u64(5);
    let excluded: Vec<Cell> = Cell::all().collect();
    let err = choose_target(&mut rng, &[], &excluded).unwrap_err();
    assert_eq!(err, GameError::NoTargetsLeft);
    assert_eq!(err.to_string(), "No locations left to attack.");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn generated_fleets_are_well_formed(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let fleet = generate_fleet(&mut rng).unwrap();
        assert_well_formed(&fleet);
    }

    #[test]
    fn target_is_never_excluded(seed in any::<u64>(), taken in proptest::collection::vec((0..10i32, 0..10i32), 0..99)) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let excluded: Vec<Cell> = taken.into_iter().map(Cell::from).collect();
        let fleet = generate_fleet(&mut rng).unwrap();
        let target = choose_target(&mut rng, &fleet, &excluded).unwrap();
        prop_assert!(target.is_on_board());
        prop_assert!(!excluded.contains(&target));
    }
}
