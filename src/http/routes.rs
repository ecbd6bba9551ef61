//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::error::UnknownMode;
use crate::game::{GameMode, ManagerError, RoomError, RoomSummary, WorldSnapshot};
use crate::util::time::uptime_secs;

/// Build the admin router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rooms", get(list_rooms_handler).post(create_room_handler))
        .route("/rooms/:id", get(room_handler).delete(delete_room_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    max_rooms: usize,
    active_players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.active_rooms(),
        max_rooms: state.rooms.max_rooms(),
        active_players: state.rooms.total_players(),
    })
}

// ============================================================================
// Room endpoints
// ============================================================================

async fn list_rooms_handler(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let rooms = state.rooms.list_rooms().iter().map(|r| r.summary()).collect();
    Json(rooms)
}

#[derive(Deserialize)]
struct CreateRoomRequest {
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_map")]
    map_id: String,
    /// Bots to add before the match starts
    #[serde(default)]
    bots: usize,
    #[serde(default)]
    start: bool,
}

fn default_mode() -> String {
    GameMode::FreeForAll.as_str().to_string()
}

fn default_map() -> String {
    "outpost".to_string()
}

async fn create_room_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomSummary>), ApiError> {
    let mode: GameMode = req.mode.parse()?;
    let room = state.rooms.create_room(mode, &req.map_id)?;

    if req.bots > 0 {
        room.spawn_bots(req.bots);
    }
    if req.start {
        room.start()?;
    }

    Ok((StatusCode::CREATED, Json(room.summary())))
}

#[derive(Serialize)]
struct RoomDetail {
    #[serde(flatten)]
    summary: RoomSummary,
    snapshot: WorldSnapshot,
}

async fn room_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDetail>, ApiError> {
    let room = state
        .rooms
        .get_room(&id)
        .ok_or(ManagerError::NotFound(id))?;

    Ok(Json(RoomDetail {
        summary: room.summary(),
        snapshot: room.snapshot(),
    }))
}

async fn delete_room_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.rooms.remove_room(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::AtCapacity { .. } => ApiError::Unavailable(err.to_string()),
            ManagerError::NotFound(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        ApiError::Conflict(err.to_string())
    }
}

impl From<UnknownMode> for ApiError {
    fn from(err: UnknownMode) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_errors_map_to_status_codes() {
        let full = ApiError::from(ManagerError::AtCapacity { max: 1 }).into_response();
        assert_eq!(full.status(), StatusCode::SERVICE_UNAVAILABLE);

        let missing = ApiError::from(ManagerError::NotFound(Uuid::nil())).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn room_and_mode_errors_map_to_status_codes() {
        let started = ApiError::from(RoomError::MatchInProgress).into_response();
        assert_eq!(started.status(), StatusCode::CONFLICT);

        let mode = "ctf".parse::<GameMode>().unwrap_err();
        assert_eq!(ApiError::from(mode).into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn create_request_defaults() {
        let req: CreateRoomRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.mode, "FFA");
        assert_eq!(req.map_id, "outpost");
        assert_eq!(req.bots, 0);
        assert!(!req.start);
    }
}
