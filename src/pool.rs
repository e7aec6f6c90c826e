//! Registry of game sessions and the matchmaking over it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::{
    common::{GameError, GameId, UserId},
    config::GameConfig,
    game::{Game, GameState},
    player::Ai,
};

/// Games keyed by id, shared by every request handler.
pub struct GamePool {
    games: Mutex<HashMap<GameId, Game>>,
    ai: Arc<dyn Ai>,
    config: GameConfig,
}

impl GamePool {
    pub fn new(ai: Arc<dyn Ai>, config: GameConfig) -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            ai,
            config,
        }
    }

    fn games(&self) -> MutexGuard<'_, HashMap<GameId, Game>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The ongoing game of `user_id`, or else the most recently started
    /// finished one. Fails if the user is in more than one ongoing game.
    pub fn get_game(&self, user_id: UserId) -> Result<Option<Game>, GameError> {
        let games = self.games();
        let mine: Vec<&Game> = games
            .values()
            .filter(|game| game.has_participant(user_id))
            .collect();
        let mut ongoing: Vec<&Game> = mine.iter().copied().filter(|g| !g.its_over()).collect();

        match ongoing.len() {
            0 => Ok(mine.into_iter().max_by_key(|g| g.started()).cloned()),
            1 => Ok(ongoing.pop().cloned()),
            _ => {
                let mut ids: Vec<GameId> = ongoing.iter().map(|g| g.id()).collect();
                ids.sort_unstable();
                Err(GameError::SeveralGames {
                    user: user_id,
                    games: ids,
                })
            }
        }
    }

    /// Join the longest-waiting game that still has a free guest slot, or
    /// open a new one. Returns `true` when an existing game was joined.
    pub fn start_playing(&self, user_id: UserId) -> Result<bool, GameError> {
        let mut games = self.games();
        if let Some(game) = games
            .values()
            .find(|g| g.has_participant(user_id) && !g.its_over())
        {
            return Err(GameError::AlreadyPlaying(game.id()));
        }

        if let Some(id) = join_oldest(&waiting_games(&games), user_id) {
            info!("user {} joined game {}", user_id, id);
            return Ok(true);
        }

        let game = loop {
            let game = Game::new(user_id, self.ai.clone(), self.config);
            if !games.contains_key(&game.id()) {
                break game;
            }
            warn!("game id {} already taken, rolling another", game.id());
            game.dispose_of_timer();
        };
        info!("user {} opened game {}", user_id, game.id());
        games.insert(game.id(), game);
        Ok(false)
    }

    /// Register an externally constructed game, replacing any game with the
    /// same id.
    pub fn add_game(&self, game: Game) {
        self.games().insert(game.id(), game);
    }

    /// Drop every game and its pending timer.
    pub fn clear_games(&self) {
        let mut games = self.games();
        for game in games.values() {
            game.dispose_of_timer();
        }
        games.clear();
    }

    pub fn len(&self) -> usize {
        self.games().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games().is_empty()
    }

    pub fn game_by_id(&self, id: GameId) -> Option<Game> {
        self.games().get(&id).cloned()
    }
}

/// Games still waiting for a guest, longest waiting first.
fn waiting_games(games: &HashMap<GameId, Game>) -> Vec<Game> {
    let mut waiting: Vec<Game> = games
        .values()
        .filter(|g| g.state() == GameState::WaitingForGuest)
        .cloned()
        .collect();
    waiting.sort_by_key(|g| (g.started(), g.id()));
    waiting
}

/// Take the first free guest slot. The bot may have filled any of them
/// since they were listed.
fn join_oldest(waiting: &[Game], user_id: UserId) -> Option<GameId> {
    for game in waiting {
        if game.try_start(user_id) {
            return Some(game.id());
        }
        debug!("game {} no longer waiting for a guest", game.id());
    }
    None
}
