//! Game session: fleet creation, turn taking, attack resolution and the
//! deadlines racing against the players.
//!
//! A [`Game`] is a cheap handle around mutex-guarded state. Every public
//! operation and every timer callback takes the same lock, so a timeout and
//! an attack arriving at the same moment are applied one after the other.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::SystemTime;

use log::{debug, error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{
    common::{AttackResult, Cell, GameError, GameId, UserId},
    config::{GameConfig, BOT_USER_ID},
    player::{Ai, User},
    ship::{fleet_destroyed, Fleet, Ship},
    timer::Timer,
};

/// Phase of a game. Doubles as the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    WaitingForGuest,
    BothPlayersCreateFleets,
    OnePlayerCreatesFleet,
    HostTurn,
    GuestTurn,
    HostWon,
    GuestWon,
    Cancelled,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameState::HostWon | GameState::GuestWon | GameState::Cancelled
        )
    }

    pub fn is_battle(self) -> bool {
        matches!(self, GameState::HostTurn | GameState::GuestTurn)
    }

    pub fn is_creating_fleets(self) -> bool {
        matches!(
            self,
            GameState::BothPlayersCreateFleets | GameState::OnePlayerCreatesFleet
        )
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Host,
    Guest,
}

impl Side {
    fn opponent(self) -> Side {
        match self {
            Side::Host => Side::Guest,
            Side::Guest => Side::Host,
        }
    }

    fn turn_state(self) -> GameState {
        match self {
            Side::Host => GameState::HostTurn,
            Side::Guest => GameState::GuestTurn,
        }
    }

    fn won_state(self) -> GameState {
        match self {
            Side::Host => GameState::HostWon,
            Side::Guest => GameState::GuestWon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    Matching,
    FleetCreation,
    Battle,
}

/// Consistent copy of a game taken under a single lock.
#[derive(Debug, Clone)]
pub struct GameView {
    pub id: GameId,
    pub state: GameState,
    pub timer_seconds_left: Option<i64>,
    pub start_time: SystemTime,
    pub host: User,
    pub guest: Option<User>,
}

struct GameCore {
    id: GameId,
    host: User,
    guest: Option<User>,
    state: GameState,
    start_time: SystemTime,
    started: Instant,
    config: GameConfig,
    ai: Arc<dyn Ai>,
    timer: Option<Timer>,
    timer_seq: u64,
    this: Weak<Mutex<GameCore>>,
}

/// Shared handle to one game session.
#[derive(Clone)]
pub struct Game {
    core: Arc<Mutex<GameCore>>,
}

fn lock(core: &Mutex<GameCore>) -> MutexGuard<'_, GameCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Game {
    /// Open a game hosted by `host_id` and start waiting for a guest. If no
    /// guest joins within the matching timeout, a bot takes the slot.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(host_id: UserId, ai: Arc<dyn Ai>, config: GameConfig) -> Self {
        let id = rand::rng().random_range(1..=i32::MAX as u32);
        let core = Arc::new_cyclic(|this| {
            Mutex::new(GameCore {
                id,
                host: User::new(host_id),
                guest: None,
                state: GameState::WaitingForGuest,
                start_time: SystemTime::now(),
                started: Instant::now(),
                config,
                ai,
                timer: None,
                timer_seq: 0,
                this: this.clone(),
            })
        });
        lock(&core).arm_timer(Deadline::Matching);
        info!("game {} created by user {}", id, host_id);
        Self { core }
    }

    fn lock(&self) -> MutexGuard<'_, GameCore> {
        lock(&self.core)
    }

    /// A real guest joins before the bot does.
    pub fn start(&self, guest_id: UserId) -> Result<(), GameError> {
        self.lock().start(guest_id)
    }

    /// Join as guest if the slot is still free. Returns `false` when the game
    /// got a guest (or the bot) or left `WaitingForGuest` in the meantime.
    pub fn try_start(&self, guest_id: UserId) -> bool {
        let mut core = self.lock();
        if !core.waiting_for_guest() {
            return false;
        }
        core.start(guest_id).is_ok()
    }

    /// Store a fleet for `user_id`. Decks always start undamaged whatever
    /// the state of the ships passed in.
    pub fn save_ships(&self, user_id: UserId, ships: &[Ship]) -> Result<(), GameError> {
        self.lock().save_ships(user_id, ships)
    }

    /// Fire at `cell` on behalf of `user_id`.
    pub fn attack(&self, user_id: UserId, cell: Cell) -> Result<AttackResult, GameError> {
        self.lock().attack(user_id, cell)
    }

    /// Abort the game without a winner.
    pub fn cancel(&self) {
        self.lock().cancel()
    }

    /// End the game by forfeit.
    pub fn set_technical_winner(&self, host_won: bool) {
        self.lock().set_technical_winner(host_won)
    }

    /// `user_id` walks away: the opponent wins a battle, anything earlier is
    /// cancelled, a finished game stays as it is.
    pub fn abort(&self, user_id: UserId) -> Result<(), GameError> {
        self.lock().abort(user_id)
    }

    pub fn dispose_of_timer(&self) {
        self.lock().dispose_of_timer()
    }

    pub fn id(&self) -> GameId {
        self.lock().id
    }

    pub fn state(&self) -> GameState {
        self.lock().state
    }

    /// Seconds until the pending deadline, negative once it has passed.
    /// `None` when no timer is held.
    pub fn timer_seconds_left(&self) -> Option<i64> {
        self.lock().timer.as_ref().map(Timer::remaining_seconds)
    }

    pub fn battle_ongoing(&self) -> bool {
        self.state().is_battle()
    }

    pub fn creating_fleets(&self) -> bool {
        self.state().is_creating_fleets()
    }

    pub fn its_over(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn host(&self) -> User {
        self.lock().host.clone()
    }

    pub fn guest(&self) -> Option<User> {
        self.lock().guest.clone()
    }

    pub fn start_time(&self) -> SystemTime {
        self.lock().start_time
    }

    pub(crate) fn started(&self) -> Instant {
        self.lock().started
    }

    /// Whether a real (non-bot) user with this id takes part.
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.lock().side_of(user_id).is_some()
    }

    pub fn view(&self) -> GameView {
        let core = self.lock();
        GameView {
            id: core.id,
            state: core.state,
            timer_seconds_left: core.timer.as_ref().map(Timer::remaining_seconds),
            start_time: core.start_time,
            host: core.host.clone(),
            guest: core.guest.clone(),
        }
    }

    /// Whether both handles point at the same session.
    pub fn ptr_eq(&self, other: &Game) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        f.debug_struct("Game")
            .field("id", &core.id)
            .field("state", &core.state)
            .field("host", &core.host.id)
            .field("guest", &core.guest.as_ref().map(|g| g.id))
            .finish()
    }
}

impl GameCore {
    fn user(&self, side: Side) -> Option<&User> {
        match side {
            Side::Host => Some(&self.host),
            Side::Guest => self.guest.as_ref(),
        }
    }

    fn user_mut(&mut self, side: Side) -> Option<&mut User> {
        match side {
            Side::Host => Some(&mut self.host),
            Side::Guest => self.guest.as_mut(),
        }
    }

    fn has_fleet(&self, side: Side) -> bool {
        self.user(side).is_some_and(User::has_fleet)
    }

    fn side_of(&self, user_id: UserId) -> Option<Side> {
        if self.host.id == user_id {
            return Some(Side::Host);
        }
        match &self.guest {
            Some(guest) if !guest.is_bot && guest.id == user_id => Some(Side::Guest),
            _ => None,
        }
    }

    fn guest_is_bot(&self) -> bool {
        self.guest.as_ref().is_some_and(|g| g.is_bot)
    }

    fn arm_timer(&mut self, deadline: Deadline) {
        let delay = match deadline {
            Deadline::Matching => self.config.matching_timeout,
            Deadline::FleetCreation => self.config.fleet_creation_timeout,
            Deadline::Battle => self.config.battle_timeout,
        };
        self.dispose_of_timer();
        self.timer_seq += 1;
        let seq = self.timer_seq;
        let this = self.this.clone();
        self.timer = Some(Timer::start(delay, move || {
            if let Some(core) = this.upgrade() {
                lock(&core).on_deadline(seq, deadline);
            }
        }));
        debug!("game {}: {:?} timer armed for {:?}", self.id, deadline, delay);
    }

    fn dispose_of_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.dispose();
        }
    }

    fn on_deadline(&mut self, seq: u64, deadline: Deadline) {
        // A callback already in flight when its timer got replaced or disposed.
        let current = self.timer.as_ref().is_some_and(|t| !t.is_disposed());
        if seq != self.timer_seq || !current || self.state.is_terminal() {
            return;
        }
        match deadline {
            Deadline::Matching => self.on_matching_timeout(),
            Deadline::FleetCreation => self.on_fleet_creation_timeout(),
            Deadline::Battle => self.on_battle_timeout(),
        }
    }

    fn on_matching_timeout(&mut self) {
        if self.guest.is_some() || self.state != GameState::WaitingForGuest {
            return;
        }
        match self.ai.generate_ships() {
            Ok(fleet) => {
                info!("game {}: no guest showed up, bot joins", self.id);
                self.guest = Some(User::bot(BOT_USER_ID, fleet));
                self.state = GameState::OnePlayerCreatesFleet;
                self.arm_timer(Deadline::FleetCreation);
            }
            Err(e) => {
                error!("game {}: bot couldn't build a fleet: {}", self.id, e);
                self.cancel();
            }
        }
    }

    fn on_fleet_creation_timeout(&mut self) {
        if !self.state.is_creating_fleets() {
            return;
        }
        match (self.has_fleet(Side::Host), self.has_fleet(Side::Guest)) {
            (true, false) => {
                info!("game {}: guest didn't place a fleet in time", self.id);
                self.set_technical_winner(true);
            }
            (false, true) => {
                info!("game {}: host didn't place a fleet in time", self.id);
                self.set_technical_winner(false);
            }
            (false, false) => {
                info!("game {}: nobody placed a fleet in time", self.id);
                self.state = GameState::Cancelled;
                self.dispose_of_timer();
            }
            (true, true) => {}
        }
    }

    fn on_battle_timeout(&mut self) {
        if !self.state.is_battle() {
            return;
        }
        // The fired timer is kept so its negative remaining time stays visible.
        self.state = if self.state == GameState::HostTurn {
            GameState::GuestWon
        } else {
            GameState::HostWon
        };
        info!("game {}: move timed out, {}", self.id, self.state);
    }

    fn waiting_for_guest(&self) -> bool {
        self.state == GameState::WaitingForGuest && self.guest.is_none()
    }

    fn start(&mut self, guest_id: UserId) -> Result<(), GameError> {
        if !self.waiting_for_guest() {
            return Err(GameError::NotWaitingForGuest(self.id));
        }
        self.guest = Some(User::new(guest_id));
        self.state = GameState::BothPlayersCreateFleets;
        self.arm_timer(Deadline::FleetCreation);
        info!("game {}: user {} joined", self.id, guest_id);
        Ok(())
    }

    fn save_ships(&mut self, user_id: UserId, ships: &[Ship]) -> Result<(), GameError> {
        if !self.state.is_creating_fleets() {
            return Err(GameError::FleetNotAccepted(self.state));
        }
        let side = self.side_of(user_id).ok_or(GameError::UnknownUser {
            user: user_id,
            game: self.id,
        })?;
        let fleet: Fleet = ships.iter().map(Ship::pristine_copy).collect();
        if let Some(user) = self.user_mut(side) {
            user.fleet = Some(fleet);
        }
        info!("game {}: user {} saved {} ships", self.id, user_id, ships.len());

        if self.has_fleet(side.opponent()) {
            self.state = GameState::HostTurn;
            self.arm_timer(Deadline::Battle);
            info!("game {}: battle begins", self.id);
        } else {
            self.state = GameState::OnePlayerCreatesFleet;
        }
        Ok(())
    }

    fn attack(&mut self, user_id: UserId, cell: Cell) -> Result<AttackResult, GameError> {
        let attacker = match self.state {
            GameState::HostTurn if self.host.id != user_id => {
                return Err(GameError::NotYourTurn)
            }
            GameState::GuestTurn if self.side_of(user_id) != Some(Side::Guest) => {
                return Err(GameError::NotYourTurn)
            }
            GameState::HostTurn => Side::Host,
            GameState::GuestTurn => Side::Guest,
            other => return Err(GameError::StateNotSuitableForAttack(other)),
        };
        if !cell.is_on_board() {
            return Err(GameError::OutsideOfField);
        }
        if !self.has_fleet(Side::Host) {
            return Err(GameError::HostFleetMissing);
        }
        if !self.has_fleet(Side::Guest) {
            return Err(GameError::GuestFleetMissing);
        }

        let result = self.resolve_attack(attacker, cell)?;
        debug!("game {}: user {} fired at {}: {:?}", self.id, user_id, cell, result);

        if self.state == GameState::GuestTurn && self.guest_is_bot() {
            self.play_bot_turns();
        }
        if self.state.is_battle() {
            self.arm_timer(Deadline::Battle);
        }
        Ok(result)
    }

    /// Apply one shot by `attacker`: exclusion, damage, win detection and
    /// turn passing.
    fn resolve_attack(&mut self, attacker: Side, cell: Cell) -> Result<AttackResult, GameError> {
        let id = self.id;
        self.user_mut(attacker)
            .ok_or(GameError::GuestFleetMissing)?
            .exclude(cell)?;

        let defender = self
            .user_mut(attacker.opponent())
            .and_then(|u| u.fleet.as_mut())
            .ok_or(match attacker.opponent() {
                Side::Host => GameError::HostFleetMissing,
                Side::Guest => GameError::GuestFleetMissing,
            })?;
        let hit = defender
            .iter_mut()
            .filter(|ship| !ship.is_destroyed())
            .any(|ship| ship.hit(&cell));

        if fleet_destroyed(defender) {
            self.state = attacker.won_state();
            self.dispose_of_timer();
            info!("game {}: fleet destroyed, {}", id, self.state);
            return Ok(AttackResult::Win);
        }
        if hit {
            Ok(AttackResult::Hit)
        } else {
            self.state = attacker.opponent().turn_state();
            Ok(AttackResult::Missed)
        }
    }

    /// Let the bot fire until it misses or the battle is over.
    fn play_bot_turns(&mut self) {
        while self.state == GameState::GuestTurn {
            let Some(guest) = self.guest.as_ref().filter(|g| g.is_bot) else {
                break;
            };
            let enemy = self.host.fleet.as_deref().unwrap_or_default();
            let target = match self.ai.choose_attack_location(enemy, &guest.excluded_locations) {
                Ok(target) => target,
                Err(e) => {
                    error!("game {}: bot couldn't pick a target: {}", self.id, e);
                    break;
                }
            };
            match self.resolve_attack(Side::Guest, target) {
                Ok(AttackResult::Hit) => {
                    debug!("game {}: bot hit {}, fires again", self.id, target);
                }
                Ok(result) => {
                    debug!("game {}: bot fired at {}: {:?}", self.id, target, result);
                    break;
                }
                Err(e) => {
                    warn!("game {}: bot shot at {} rejected: {}", self.id, target, e);
                    break;
                }
            }
        }
        if self.state.is_battle() {
            self.state = GameState::HostTurn;
        }
    }

    fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = GameState::Cancelled;
        self.dispose_of_timer();
        info!("game {}: cancelled", self.id);
    }

    fn set_technical_winner(&mut self, host_won: bool) {
        self.dispose_of_timer();
        if self.state.is_terminal() {
            return;
        }
        self.state = if host_won {
            GameState::HostWon
        } else {
            GameState::GuestWon
        };
        info!("game {}: technical win, {}", self.id, self.state);
    }

    fn abort(&mut self, user_id: UserId) -> Result<(), GameError> {
        let side = self.side_of(user_id).ok_or(GameError::UnknownUser {
            user: user_id,
            game: self.id,
        })?;
        if self.state.is_battle() {
            self.set_technical_winner(side == Side::Guest);
        } else {
            self.cancel();
        }
        Ok(())
    }
}
