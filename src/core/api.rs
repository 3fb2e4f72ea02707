//! HTTP + WebSocket API for decisim
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /gesture/new - Create gesture session
//! - POST /gesture/:id/event - Feed a pointer event (or reset)
//! - GET /gesture/:id - Gesture view
//! - GET /gesture/:id/trace - Export trace envelope
//! - POST /ladder/new - Create ladder session
//! - POST /ladder/:id/action - Dispatch a ladder action
//! - GET /ladder/:id - Ladder view
//! - GET /ladder/:id/replay - Export replay payload
//! - POST /replay/verify - Verify an envelope or payload
//! - WS /ws/:id - Live view updates

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::core::confidence::LadderModel;
use crate::core::gesture_fsm::GestureAction;
use crate::core::ladder_fsm::LadderAction;
use crate::core::normalizer::InputNormalizer;
use crate::core::replay::{ReplayEngine, ReplayLibrary};
use crate::core::scoring::GestureModel;
use crate::core::session::{Dispatched, GestureSession, LadderSession};
use crate::core::view::{gesture_view, ladder_view, replay_readout};
use crate::types::{
    Bounds, GestureEnvelope, GestureView, LadderReplayPayload, LadderView, PlaybackResult,
    PointerKind, RawPointer, ReplayAction, ReplayReadout,
};

/// Gesture session plus its input surface
pub struct GestureEntry {
    pub session: GestureSession,
    pub normalizer: InputNormalizer,
    pub update_tx: broadcast::Sender<SessionUpdate>,
}

pub struct LadderEntry {
    pub session: LadderSession,
    pub update_tx: broadcast::Sender<SessionUpdate>,
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "view", rename_all = "snake_case")]
pub enum SessionUpdate {
    Gesture(GestureView),
    Ladder(LadderView),
}

/// App state
pub struct AppState {
    pub config: SimConfig,
    pub gesture_model: GestureModel,
    pub ladder_model: LadderModel,
    pub replay: ReplayEngine,
    pub gestures: RwLock<HashMap<String, GestureEntry>>,
    pub ladders: RwLock<HashMap<String, LadderEntry>>,
    pub library: RwLock<ReplayLibrary>,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: SimConfig) -> Self {
        let gesture_model = GestureModel::standard();
        let ladder_model = LadderModel::standard();
        let replay = ReplayEngine::new(&config, gesture_model.clone(), ladder_model.clone());
        Self {
            config,
            gesture_model,
            ladder_model,
            replay,
            gestures: RwLock::new(HashMap::new()),
            ladders: RwLock::new(HashMap::new()),
            library: RwLock::new(ReplayLibrary::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn session_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}_{:04x}", prefix, n)
    }
}

/// Create gesture session request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGestureRequest {
    /// Device-space surface; unit square when omitted
    pub bounds: Option<Bounds>,
    pub target_id: Option<String>,
}

/// Create ladder session request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLadderRequest {
    pub route_id: Option<String>,
}

/// Create session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Pointer event (`pointerdown`..`pointercancel`) or `reset`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEventRequest {
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_pointer")]
    pub pointer_id: i64,
    #[serde(default)]
    pub button: i32,
}

fn default_pointer() -> i64 {
    1
}

/// Dispatch response
#[derive(Debug, Serialize)]
pub struct DispatchResponse<V> {
    pub accepted: bool,
    pub reason: String,
    pub follow_up: Option<String>,
    pub view: V,
}

impl<V> DispatchResponse<V> {
    fn new(result: Dispatched, view: V) -> Self {
        Self {
            accepted: result.accepted,
            reason: result.reason.code().to_string(),
            follow_up: result.follow_up.map(|r| r.code().to_string()),
            view,
        }
    }
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse<V> {
    pub session_id: String,
    pub view: V,
    pub replay: ReplayReadout,
}

/// Verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub result: PlaybackResult,
    pub duplicate: bool,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
    pub replays_loaded: usize,
}

/// Create the API router
pub fn create_router(config: SimConfig) -> Router {
    let state = Arc::new(AppState::new(config));

    Router::new()
        .route("/health", get(health))
        .route("/gesture/new", post(create_gesture))
        .route("/gesture/:id", get(get_gesture))
        .route("/gesture/:id/event", post(gesture_event))
        .route("/gesture/:id/trace", get(gesture_trace))
        .route("/ladder/new", post(create_ladder))
        .route("/ladder/:id", get(get_ladder))
        .route("/ladder/:id/action", post(ladder_action))
        .route("/ladder/:id/replay", get(ladder_replay))
        .route("/replay/verify", post(verify_replay))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gestures = state.gestures.read().await.len();
    let ladders = state.ladders.read().await.len();
    let replays = state.library.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: gestures + ladders,
        replays_loaded: replays,
    })
}

// =============================================================================
// GESTURE
// =============================================================================

async fn create_gesture(
    State(state): State<Arc<AppState>>,
    body: Option<Json<NewGestureRequest>>,
) -> Json<NewSessionResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let session_id = state.session_id("gesture");
    let (tx, _) = broadcast::channel(100);

    let entry = GestureEntry {
        session: GestureSession::new(state.gesture_model.clone()),
        normalizer: InputNormalizer::new(
            req.bounds.unwrap_or_else(Bounds::unit),
            req.target_id.unwrap_or_else(|| "stage".to_string()),
        ),
        update_tx: tx,
    };
    state.gestures.write().await.insert(session_id.clone(), entry);
    info!("Gesture session {} created", session_id);

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    })
}

async fn get_gesture(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse<GestureView>>, StatusCode> {
    let gestures = state.gestures.read().await;
    let entry = gestures.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionStatusResponse {
        session_id: id,
        view: gesture_view(entry.session.state()),
        replay: replay_readout(entry.session.recorder()),
    }))
}

async fn gesture_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<GestureEventRequest>,
) -> Result<Json<DispatchResponse<GestureView>>, StatusCode> {
    let mut gestures = state.gestures.write().await;
    let entry = gestures.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let result = if req.kind == "reset" {
        entry.session.dispatch(GestureAction::Reset)
    } else {
        let kind = PointerKind::from_wire(&req.kind).ok_or_else(|| {
            debug!("Unsupported gesture event kind '{}'", req.kind);
            StatusCode::BAD_REQUEST
        })?;
        let raw = RawPointer {
            kind,
            client_x: req.x,
            client_y: req.y,
            pointer_id: req.pointer_id,
            button: req.button,
        };
        let sample = entry.normalizer.sample(&raw);
        entry.session.dispatch_sample(sample)
    };

    let view = gesture_view(entry.session.state());
    let _ = entry.update_tx.send(SessionUpdate::Gesture(view.clone()));
    Ok(Json(DispatchResponse::new(result, view)))
}

async fn gesture_trace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GestureEnvelope>, StatusCode> {
    let gestures = state.gestures.read().await;
    let entry = gestures.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry.session.export(state.replay.trace_version(), state.replay.source())))
}

// =============================================================================
// LADDER
// =============================================================================

async fn create_ladder(
    State(state): State<Arc<AppState>>,
    body: Option<Json<NewLadderRequest>>,
) -> Result<Json<NewSessionResponse>, StatusCode> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let route_id = req.route_id.unwrap_or_else(|| state.config.default_route.clone());
    let session = LadderSession::new(state.ladder_model.clone(), &route_id).map_err(|e| {
        debug!("Ladder session refused: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let session_id = state.session_id("ladder");
    let (tx, _) = broadcast::channel(100);
    state
        .ladders
        .write()
        .await
        .insert(session_id.clone(), LadderEntry { session, update_tx: tx });

    Ok(Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    }))
}

async fn get_ladder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse<LadderView>>, StatusCode> {
    let ladders = state.ladders.read().await;
    let entry = ladders.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionStatusResponse {
        session_id: id,
        view: ladder_view(entry.session.model(), entry.session.state()),
        replay: replay_readout(entry.session.recorder()),
    }))
}

async fn ladder_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReplayAction>,
) -> Result<Json<DispatchResponse<LadderView>>, StatusCode> {
    let action = LadderAction::from_replay(0, &req).map_err(|e| {
        debug!("Malformed ladder action: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let mut ladders = state.ladders.write().await;
    let entry = ladders.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let result = entry.session.dispatch(action);

    let view = ladder_view(entry.session.model(), entry.session.state());
    let _ = entry.update_tx.send(SessionUpdate::Ladder(view.clone()));
    Ok(Json(DispatchResponse::new(result, view)))
}

async fn ladder_replay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LadderReplayPayload>, StatusCode> {
    let ladders = state.ladders.read().await;
    let entry = ladders.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(state.replay.build_replay_payload(&entry.session)))
}

// =============================================================================
// REPLAY
// =============================================================================

async fn verify_replay(State(state): State<Arc<AppState>>, body: String) -> Json<VerifyResponse> {
    let result = state.replay.verify_json(&body);
    let duplicate = if result.ok {
        let mut library = state.library.write().await;
        match library.load(&state.replay, &body) {
            Ok(loaded) => loaded.duplicate,
            Err(err) => {
                warn!("Verified artifact failed to load: {}", err);
                false
            }
        }
    } else {
        false
    };
    Json(VerifyResponse { result, duplicate })
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let rx = subscribe(&state, &id).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

async fn subscribe(state: &AppState, id: &str) -> Option<broadcast::Receiver<SessionUpdate>> {
    if let Some(entry) = state.gestures.read().await.get(id) {
        return Some(entry.update_tx.subscribe());
    }
    state.ladders.read().await.get(id).map(|entry| entry.update_tx.subscribe())
}

/// Forward updates until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<SessionUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        while let Ok(update) = rx.recv().await {
            let json = serde_json::to_string(&update).unwrap_or_default();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }
}

/// Run the API server
pub async fn run_server(config: SimConfig) -> crate::error::Result<()> {
    let addr = config.server_addr.clone();
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("decisim API running on {}", addr);
    info!("  POST /gesture/new         - Create gesture session");
    info!("  POST /gesture/:id/event   - Feed pointer event");
    info!("  GET  /gesture/:id/trace   - Export trace");
    info!("  POST /ladder/new          - Create ladder session");
    info!("  POST /ladder/:id/action   - Dispatch ladder action");
    info!("  GET  /ladder/:id/replay   - Export replay payload");
    info!("  POST /replay/verify       - Verify trace or payload");
    info!("  WS   /ws/:id              - Live updates");
    axum::serve(listener, router).await?;
    Ok(())
}
