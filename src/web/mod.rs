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
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    animation::{frame_interval, spawn_loop, CancellationToken},
    config::LabConfig,
    evaluator::HeadlessEvaluator,
    model::{ParameterRecord, Parameters},
    session::{Panel, Session, UiAction},
};

#[derive(Clone, Debug, Serialize)]
pub struct UiFrame {
    pub panel: Panel,
    pub time: f64,
    pub markers: usize,
    pub parameters: Parameters,
}

impl UiFrame {
    fn capture(session: &Session<HeadlessEvaluator>) -> Self {
        Self {
            panel: session.panel().clone(),
            time: session.model().time(),
            markers: session.particles().len(),
            parameters: session.get_parameters(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session<HeadlessEvaluator>>>,
    broadcaster: broadcast::Sender<String>,
    cadence: Duration,
}

impl AppState {
    pub fn new(lab: &LabConfig) -> Self {
        let mut session = Session::new(lab, HeadlessEvaluator::new());
        session.pump();
        let (broadcaster, _) = broadcast::channel::<String>(512);
        Self {
            session: Arc::new(Mutex::new(session)),
            broadcaster,
            cadence: frame_interval(lab.animation.frames_per_second),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    pub fn frame(&self) -> UiFrame {
        let session = self.session.lock().expect("session lock poisoned");
        UiFrame::capture(&session)
    }

    /// Applies a UI action and publishes the resulting frame. Starting
    /// playback spawns the animation loop, so this must run inside a tokio
    /// runtime.
    pub fn apply(&self, action: UiAction) -> UiFrame {
        let (frame, started) = {
            let mut session = self.session.lock().expect("session lock poisoned");
            let started = session.apply(action);
            session.pump();
            (UiFrame::capture(&session), started)
        };
        self.publish(&frame);
        if let Some(token) = started {
            self.start_animation(token);
        }
        frame
    }

    pub fn replace_parameters(&self, record: ParameterRecord) -> Result<UiFrame, String> {
        let frame = {
            let mut session = self.session.lock().expect("session lock poisoned");
            session
                .set_parameters(record)
                .map_err(|err| err.to_string())?;
            session.pump();
            UiFrame::capture(&session)
        };
        self.publish(&frame);
        Ok(frame)
    }

    fn publish(&self, frame: &UiFrame) {
        if let Ok(payload) = serde_json::to_string(frame) {
            let _ = self.broadcaster.send(payload);
        }
    }

    fn start_animation(&self, token: CancellationToken) {
        let state = self.clone();
        spawn_loop(token, self.cadence, move || {
            let frame = {
                let Ok(mut session) = state.session.lock() else {
                    return false;
                };
                if session.animation_tick().is_none() {
                    return false;
                }
                session.pump();
                UiFrame::capture(&session)
            };
            state.publish(&frame);
            true
        });
    }
}

pub struct WebServerConfig {
    pub lab: LabConfig,
    pub host: String,
    pub port: u16,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/parameters", get(get_parameters).put(put_parameters))
        .route("/api/actions", post(post_action))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig { lab, host, port } = config;
    let state = AppState::new(&lab);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, session = %lab.name, "logistic lab listening (Ctrl+C to stop)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for Ctrl+C");
    }
    info!("shutting down");
}

async fn latest_state(State(state): State<AppState>) -> Json<UiFrame> {
    Json(state.frame())
}

async fn get_parameters(State(state): State<AppState>) -> Json<Parameters> {
    Json(state.frame().parameters)
}

async fn put_parameters(
    State(state): State<AppState>,
    Json(record): Json<ParameterRecord>,
) -> Result<Json<Parameters>, (StatusCode, String)> {
    state
        .replace_parameters(record)
        .map(|frame| Json(frame.parameters))
        .map_err(|message| (StatusCode::BAD_REQUEST, message))
}

async fn post_action(State(state): State<AppState>, Json(action): Json<UiAction>) -> Json<UiFrame> {
    Json(state.apply(action))
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{animation::PlaybackState, model::ParameterId};

    #[tokio::test]
    async fn test_play_publishes_frames_until_scrub() {
        let state = AppState::new(&LabConfig::classroom());
        let mut rx = state.subscribe();

        let frame = state.apply(UiAction::TogglePlay);
        assert_eq!(frame.panel.playback, PlaybackState::Playing);
        assert_eq!(frame.panel.play_button, "Pause");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(state.frame().time > 0.0);

        let frame = state.apply(UiAction::ScrubStart {
            parameter: ParameterId::Time,
        });
        assert_eq!(frame.panel.playback, PlaybackState::Stopped);
        let stopped_at = state.frame().time;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(state.frame().time, stopped_at);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_partial_parameters_rejected() {
        let state = AppState::new(&LabConfig::classroom());
        let before = state.frame().parameters;
        let mut record = ParameterRecord::from(before);
        record.capacity = None;
        let err = state.replace_parameters(record).unwrap_err();
        assert!(err.contains("capacity"));
        assert_eq!(state.frame().parameters, before);
    }
}
