use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    ai,
    common::{Cell, GameError},
    player::Ai,
    ship::{Fleet, Ship},
};

/// Bot that places its fleet at random and fires at random untried cells.
pub struct RandomAi {
    rng: Mutex<SmallRng>,
}

impl RandomAi {
    /// Bot seeded from the thread-local generator.
    pub fn new() -> Self {
        let mut seed_rng = rand::rng();
        Self {
            rng: Mutex::new(SmallRng::from_rng(&mut seed_rng)),
        }
    }

    /// Bot with a fixed seed, for reproducible games.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    fn rng(&self) -> MutexGuard<'_, SmallRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RandomAi {
    fn default() -> Self {
        Self::new()
    }
}

impl Ai for RandomAi {
    fn generate_ships(&self) -> Result<Fleet, GameError> {
        ai::generate_fleet(&mut *self.rng())
    }

    fn choose_attack_location(
        &self,
        enemy_fleet: &[Ship],
        excluded: &[Cell],
    ) -> Result<Cell, GameError> {
        ai::choose_target(&mut *self.rng(), enemy_fleet, excluded)
    }
}
