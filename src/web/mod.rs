//! Real-time front-end adapter: advances the engine on a wall-clock interval
//! and streams every notification over server-sent events.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
    time::MissedTickBehavior,
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    config::{AidType, InvalidAidType},
    engine::Engine,
    events::{Action, Notification},
    scenario::Scenario,
    snapshot::GameSnapshot,
    spatial::LatLng,
};

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub snapshot: Option<GameSnapshot>,
}

/// Body of `POST /api/drops`. The aid type stays a string so unknown names
/// can be answered with a 400 instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct DropRequest {
    pub aid_type: String,
    pub lat: f64,
    pub lng: f64,
}

impl DropRequest {
    pub fn into_action(self) -> Result<Action, InvalidAidType> {
        let aid_type: AidType = self.aid_type.parse()?;
        Ok(Action::PlaceDrop {
            aid_type,
            position: LatLng::new(self.lat, self.lng),
        })
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    latest: Arc<Mutex<Option<GameSnapshot>>>,
    actions: mpsc::Sender<Action>,
    scenario_name: String,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
    /// Wall-clock period between engine advances; simulated time runs at
    /// real speed.
    pub step: Duration,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        host,
        port,
        step,
    } = config;

    let engine = scenario.build_engine()?;
    let scenario_name = scenario.name.clone();

    let (tx, _) = broadcast::channel::<String>(512);
    let (action_tx, action_rx) = mpsc::channel::<Action>(64);
    let latest = Arc::new(Mutex::new(Some(engine.snapshot())));

    let driver = tokio::spawn(drive(engine, step, action_rx, tx.clone(), latest.clone()));
    let label = scenario_name.clone();
    tokio::spawn(async move {
        match driver.await {
            Ok(()) => info!(scenario = %label, "game loop finished"),
            Err(err) => error!(?err, "game loop task failed"),
        }
    });

    let state = Arc::new(AppState {
        broadcaster: tx,
        latest,
        actions: action_tx,
        scenario_name,
    });

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    info!(%addr, "serving game (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/start", post(start_game))
        .route("/api/drops", post(place_drop))
        .with_state(state)
}

async fn drive(
    mut engine: Engine,
    step: Duration,
    mut actions: mpsc::Receiver<Action>,
    broadcaster: broadcast::Sender<String>,
    latest: Arc<Mutex<Option<GameSnapshot>>>,
) {
    let step_ms = step.as_millis().max(1) as u64;
    let mut interval = tokio::time::interval(Duration::from_millis(step_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(action) = actions.recv() => engine.dispatch(action),
            _ = interval.tick() => {
                let result = engine.advance_with_hook(step_ms, |notification| {
                    publish(&notification, &broadcaster, &latest);
                });
                if let Err(err) = result {
                    error!(?err, "engine tick failed");
                    return;
                }
                if engine.is_won() {
                    return;
                }
            }
        }
    }
}

fn publish(
    notification: &Notification,
    broadcaster: &broadcast::Sender<String>,
    latest: &Mutex<Option<GameSnapshot>>,
) {
    if let Notification::Snapshot(snapshot) = notification {
        if let Ok(mut guard) = latest.lock() {
            *guard = Some(snapshot.as_ref().clone());
        }
    }
    match serde_json::to_string(notification) {
        // No subscribers is fine.
        Ok(payload) => {
            let _ = broadcaster.send(payload);
        }
        Err(err) => warn!(%err, "failed to encode notification"),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let snapshot = state
        .latest
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        snapshot,
    })
}

async fn start_game(State(state): State<Arc<AppState>>) -> StatusCode {
    forward(&state, Action::StartGame).await
}

async fn place_drop(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DropRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    match request.into_action() {
        Ok(action) => Ok(forward(&state, action).await),
        Err(err) => {
            warn!(%err, "supply drop request refused");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            ))
        }
    }
}

async fn forward(state: &AppState, action: Action) -> StatusCode {
    match state.actions.send(action).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::GONE,
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
