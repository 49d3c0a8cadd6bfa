//! Play/pause control for the time parameter.
//!
//! The controller is a two-state machine. While playing, a scheduler task
//! re-arms itself once per frame and checks a cancellation token at the top
//! of every tick. Each Playing period gets a fresh token, so a loop left over
//! from an earlier period stays cancelled even after playback resumes.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// Tolerance for float drift when deciding that time reached its maximum.
const WRAP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Shared stop flag for one Playing period.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Next animation time: `time + step`, wrapping to 0 at `max_time`.
pub fn advance(time: f64, step: f64, max_time: f64) -> f64 {
    let next = time + step;
    if next + WRAP_EPSILON * max_time.abs().max(1.0) >= max_time {
        0.0
    } else {
        next
    }
}

pub fn frame_interval(frames_per_second: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(frames_per_second.max(1)))
}

#[derive(Debug)]
pub struct AnimationController {
    state: PlaybackState,
    token: CancellationToken,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    pub fn new() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self {
            state: PlaybackState::Stopped,
            token,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Token for the current Playing period, if any.
    pub fn token(&self) -> Option<CancellationToken> {
        self.is_playing().then(|| self.token.clone())
    }

    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Stopped => {
                self.token = CancellationToken::new();
                self.state = PlaybackState::Playing;
                debug!("animation playing");
            }
            PlaybackState::Playing => self.stop(),
        }
        self.state
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        if self.state == PlaybackState::Playing {
            debug!("animation stopped");
        }
        self.state = PlaybackState::Stopped;
    }

    /// External interruption such as grabbing the time slider.
    pub fn interrupt(&mut self) {
        self.stop();
    }

    /// One frame: `None` once stopped, otherwise the advanced time.
    pub fn tick(&self, time: f64, step: f64, max_time: f64) -> Option<f64> {
        if !self.is_playing() || self.token.is_cancelled() {
            return None;
        }
        Some(advance(time, step, max_time))
    }
}

/// Runs `on_tick` every `cadence` until `token` is cancelled or `on_tick`
/// returns `false`. The token is checked before each tick.
pub fn spawn_loop<F>(token: CancellationToken, cadence: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            if token.is_cancelled() {
                break;
            }
            if !on_tick() {
                break;
            }
            tokio::time::sleep(cadence).await;
        }
        debug!("animation loop exited");
    })
}
