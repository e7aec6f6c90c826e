//! Thin HTTP layer: request/response shapes, routing and the controller
//! glue sitting in front of [`GamePool`] and [`Game`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    common::{AttackResult, Cell, GameError, GameId, UserId},
    game::{Game, GameState, GameView},
    player::User,
    pool::GamePool,
    ship::Ship,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<GamePool>,
}

impl AppState {
    pub fn new(pool: GamePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPlayingRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartPlayingResponse {
    pub joined: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShipInput {
    pub decks: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveShipsRequest {
    pub ships: Vec<ShipInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttackResponse {
    pub result: AttackResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckOutput {
    pub x: i32,
    pub y: i32,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOutput {
    pub id: UserId,
    pub name: Option<String>,
    pub is_bot: bool,
    pub has_fleet: bool,
    /// Every deck for the requesting user; only destroyed decks otherwise.
    pub decks: Vec<DeckOutput>,
    pub excluded_locations: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOutput {
    pub id: GameId,
    pub state: GameState,
    pub timer_seconds_left: Option<i64>,
    pub start_time_millis: u64,
    pub battle_ongoing: bool,
    pub creating_fleets: bool,
    pub its_over: bool,
    pub host: UserOutput,
    pub guest: Option<UserOutput>,
}

impl GameOutput {
    fn new(view: GameView, viewer: UserId) -> Self {
        let start_time_millis = view
            .start_time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            id: view.id,
            state: view.state,
            timer_seconds_left: view.timer_seconds_left,
            start_time_millis,
            battle_ongoing: view.state.is_battle(),
            creating_fleets: view.state.is_creating_fleets(),
            its_over: view.state.is_terminal(),
            host: user_output(&view.host, viewer),
            guest: view.guest.as_ref().map(|g| user_output(g, viewer)),
        }
    }
}

fn user_output(user: &User, viewer: UserId) -> UserOutput {
    let own = !user.is_bot && user.id == viewer;
    let mut decks: Vec<DeckOutput> = user
        .fleet
        .iter()
        .flatten()
        .flat_map(Ship::decks)
        .filter(|deck| own || deck.destroyed())
        .map(|deck| DeckOutput {
            x: deck.location().x,
            y: deck.location().y,
            destroyed: deck.destroyed(),
        })
        .collect();
    decks.sort_by_key(|d| (d.y, d.x));
    UserOutput {
        id: user.id,
        name: user.name.clone(),
        is_bot: user.is_bot,
        has_fleet: user.has_fleet(),
        decks,
        excluded_locations: user.excluded_locations.clone(),
    }
}

/// Error relayed to the client as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("request failed: {} {}", self.status, self.message);
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/play", post(start_playing))
        .route("/api/users/{user_id}/game", get(get_game))
        .route("/api/users/{user_id}/ships", post(save_ships))
        .route("/api/users/{user_id}/attack", post(attack))
        .route("/api/users/{user_id}/abort", post(abort))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

fn find_game(pool: &GamePool, user_id: UserId) -> Result<Game, ApiError> {
    pool.get_game(user_id)?
        .ok_or_else(|| ApiError::not_found(format!("User id={} has no game.", user_id)))
}

/// Reject fleets that reuse a cell. Shape and spacing are left to the client.
pub fn validate_fleet(ships: &[ShipInput]) -> Result<Vec<Ship>, ApiError> {
    let mut seen = HashSet::new();
    for cell in ships.iter().flat_map(|s| s.decks.iter()) {
        if !seen.insert(*cell) {
            return Err(ApiError::bad_request("Ships contain duplicate cells."));
        }
    }
    Ok(ships
        .iter()
        .map(|s| Ship::new(s.decks.iter().copied()))
        .collect())
}

pub async fn start_playing(
    State(state): State<AppState>,
    Json(request): Json<StartPlayingRequest>,
) -> Result<Json<StartPlayingResponse>, ApiError> {
    let joined = state.pool.start_playing(request.user_id)?;
    info!("user {} start playing: joined={}", request.user_id, joined);
    Ok(Json(StartPlayingResponse { joined }))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<GameOutput>, ApiError> {
    let game = find_game(&state.pool, user_id)?;
    Ok(Json(GameOutput::new(game.view(), user_id)))
}

pub async fn save_ships(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<SaveShipsRequest>,
) -> Result<Json<GameOutput>, ApiError> {
    let game = find_game(&state.pool, user_id)?;
    let ships = validate_fleet(&request.ships)?;
    game.save_ships(user_id, &ships)?;
    info!("user {} saved {} ships in game {}", user_id, ships.len(), game.id());
    Ok(Json(GameOutput::new(game.view(), user_id)))
}

pub async fn attack(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(target): Json<Cell>,
) -> Result<Json<AttackResponse>, ApiError> {
    let game = find_game(&state.pool, user_id)?;
    let result = game.attack(user_id, target)?;
    info!("user {} attacked {} in game {}: {:?}", user_id, target, game.id(), result);
    Ok(Json(AttackResponse { result }))
}

/// Leave the game: before the battle it is cancelled, during the battle the
/// opponent wins. Finished games are left alone.
pub async fn abort(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<GameOutput>, ApiError> {
    let game = find_game(&state.pool, user_id)?;
    game.abort(user_id)?;
    info!("user {} aborted game {}: {}", user_id, game.id(), game.state());
    Ok(Json(GameOutput::new(game.view(), user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GameConfig, player_ai::RandomAi};
    use tokio::time::Duration;

    fn app_state() -> AppState {
        let config = GameConfig::uniform(Duration::from_secs(60));
        AppState::new(GamePool::new(Arc::new(RandomAi::seeded(7)), config))
    }

    fn fleet(cells: &[(i32, i32)]) -> SaveShipsRequest {
        SaveShipsRequest {
            ships: cells
                .iter()
                .map(|&c| ShipInput {
                    decks: vec![Cell::from(c)],
                })
                .collect(),
        }
    }

    async fn join(state: &AppState, user_id: UserId) -> bool {
        start_playing(State(state.clone()), Json(StartPlayingRequest { user_id }))
            .await
            .unwrap()
            .0
            .joined
    }

    #[tokio::test(start_paused = true)]
    async fn second_player_joins_first_game() {
        let state = app_state();
        assert!(!join(&state, 1).await);
        assert!(join(&state, 2).await);

        let Json(game) = get_game(State(state.clone()), Path(2)).await.unwrap();
        assert_eq!(game.state, GameState::BothPlayersCreateFleets);
        assert_eq!(game.host.id, 1);
        assert_eq!(game.guest.map(|g| g.id), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_is_rejected_with_game_id() {
        let state = app_state();
        join(&state, 1).await;
        let err = start_playing(State(state.clone()), Json(StartPlayingRequest { user_id: 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err
            .message
            .starts_with("Can't start playing: you already participate in ongoing game id="));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_user_has_no_game() {
        let state = app_state();
        let err = get_game(State(state), Path(42)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_cells_never_reach_the_game() {
        let state = app_state();
        join(&state, 1).await;
        join(&state, 2).await;
        let request = fleet(&[(1, 1), (1, 1)]);
        let err = save_ships(State(state.clone()), Path(1), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Ships contain duplicate cells.");

        let Json(game) = get_game(State(state), Path(1)).await.unwrap();
        assert!(!game.host.has_fleet);
    }

    #[tokio::test(start_paused = true)]
    async fn opponent_decks_stay_hidden_until_hit() {
        let state = app_state();
        join(&state, 1).await;
        join(&state, 2).await;
        save_ships(State(state.clone()), Path(1), Json(fleet(&[(1, 1)])))
            .await
            .unwrap();
        let Json(game) = save_ships(State(state.clone()), Path(2), Json(fleet(&[(2, 2), (5, 5)])))
            .await
            .unwrap();
        assert_eq!(game.state, GameState::HostTurn);
        assert_eq!(game.guest.as_ref().map(|g| g.decks.len()), Some(2));

        let Json(response) = attack(State(state.clone()), Path(1), Json(Cell::new(2, 2)))
            .await
            .unwrap();
        assert_eq!(response.result, AttackResult::Hit);

        let Json(game) = get_game(State(state), Path(1)).await.unwrap();
        let guest = game.guest.unwrap();
        assert_eq!(guest.decks.len(), 1);
        assert!(guest.decks[0].destroyed);
        assert_eq!(game.host.excluded_locations, vec![Cell::new(2, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn attack_errors_are_relayed_verbatim() {
        let state = app_state();
        join(&state, 1).await;
        join(&state, 2).await;
        let err = attack(State(state), Path(1), Json(Cell::new(0, 0)))
            .await
            .unwrap_err();
        assert_eq!(
            err.message,
            "State not suitable for attack: BothPlayersCreateFleets."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abort_during_battle_hands_the_win_to_the_opponent() {
        let state = app_state();
        join(&state, 1).await;
        join(&state, 2).await;
        save_ships(State(state.clone()), Path(1), Json(fleet(&[(1, 1)])))
            .await
            .unwrap();
        save_ships(State(state.clone()), Path(2), Json(fleet(&[(2, 2)])))
            .await
            .unwrap();

        let Json(game) = abort(State(state), Path(1)).await.unwrap();
        assert_eq!(game.state, GameState::GuestWon);
        assert!(game.its_over);
        assert_eq!(game.timer_seconds_left, None);
    }

    #[tokio::test(start_paused = true)]
    async fn guest_abort_during_battle_lets_the_host_win() {
        let state = app_state();
        join(&state, 1).await;
        join(&state, 2).await;
        save_ships(State(state.clone()), Path(1), Json(fleet(&[(1, 1)])))
            .await
            .unwrap();
        save_ships(State(state.clone()), Path(2), Json(fleet(&[(2, 2)])))
            .await
            .unwrap();

        let Json(game) = abort(State(state.clone()), Path(2)).await.unwrap();
        assert_eq!(game.state, GameState::HostWon);

        // Aborting again leaves the result alone.
        let Json(game) = abort(State(state), Path(1)).await.unwrap();
        assert_eq!(game.state, GameState::HostWon);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_before_battle_cancels() {
        let state = app_state();
        join(&state, 1).await;
        let Json(game) = abort(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(game.state, GameState::Cancelled);

        // A cancelled game no longer blocks a new one.
        assert!(!join(&state, 1).await);
    }
}
