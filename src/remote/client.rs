//! Backend API client

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Remote;
use super::fallback;
use super::messages::*;
use super::transport::{Method, Request, Transport, TransportError};
use crate::consts::REQUEST_TIMEOUT_MS;
use crate::error::RemoteUnavailable;
use crate::platform::SharedClock;
use crate::progression::GameStats;

/// Best-effort client for the hunt backend
pub struct RemoteClient<T: Transport> {
    transport: T,
    base_url: String,
    timeout_ms: u64,
    clock: SharedClock,
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(transport: T, base_url: &str, clock: SharedClock) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: REQUEST_TIMEOUT_MS,
            clock,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim_end_matches('/').to_string();
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn set_timeout(&mut self, ms: u64) {
        self.timeout_ms = ms;
    }

    /// Issue one request; any failure yields `fallback()` instead
    fn call<R: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        fallback: impl FnOnce() -> R,
    ) -> Remote<R> {
        let request = Request {
            method,
            url: format!("{}{}", self.base_url, path),
            body,
        };
        log::debug!("API {} {}", method.as_str(), request.url);

        match self.exchange(&request) {
            Ok(value) => Remote::Live(value),
            Err(reason) => {
                log::warn!(
                    "API {} {} failed ({}), using fallback",
                    method.as_str(),
                    path,
                    reason
                );
                Remote::Fallback {
                    value: fallback(),
                    reason,
                }
            }
        }
    }

    fn exchange<R: DeserializeOwned>(&mut self, request: &Request) -> Result<R, RemoteUnavailable> {
        let response = self
            .transport
            .send(request, self.timeout_ms)
            .map_err(|e| match e {
                TransportError::TimedOut => RemoteUnavailable::Timeout(self.timeout_ms),
                TransportError::Network(msg) => RemoteUnavailable::Transport(msg),
            })?;

        // The deadline won the race; the late answer is discarded
        if response.elapsed_ms > self.timeout_ms {
            return Err(RemoteUnavailable::Late {
                elapsed_ms: response.elapsed_ms,
                timeout_ms: self.timeout_ms,
            });
        }
        if !(200..300).contains(&response.status) {
            return Err(RemoteUnavailable::Status(response.status));
        }
        serde_json::from_str(&response.body).map_err(|e| RemoteUnavailable::Decode(e.to_string()))
    }

    fn encode<B: Serialize>(body: &B) -> Option<serde_json::Value> {
        match serde_json::to_value(body) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to encode request body: {}", e);
                None
            }
        }
    }

    /// `POST /game/start`
    pub fn start_game(&mut self, team_id: &str, start_time: u64) -> Remote<StartGameResponse> {
        let request = StartGameRequest {
            team_id: team_id.to_string(),
            start_time,
        };
        let now = self.clock.now_ms();
        let body = Self::encode(&request);
        self.call(Method::Post, "/game/start", body, || {
            fallback::start_game(&request, now)
        })
    }

    /// `GET /team/status/{teamId}`
    pub fn team_status(&mut self, team_id: &str) -> Remote<TeamStatus> {
        let now = self.clock.now_ms();
        let path = format!("/team/status/{}", team_id);
        self.call(Method::Get, &path, None, || fallback::team_status(team_id, now))
    }

    /// `POST /checkpoint/complete`
    pub fn complete_checkpoint(
        &mut self,
        team_id: &str,
        checkpoint: u8,
        earned_key: bool,
    ) -> Remote<CompleteCheckpointResponse> {
        let request = CompleteCheckpointRequest {
            team_id: team_id.to_string(),
            checkpoint,
            earned_key,
            completed_at: self.clock.now_ms(),
        };
        let body = Self::encode(&request);
        self.call(Method::Post, "/checkpoint/complete", body, || {
            fallback::complete_checkpoint(&request)
        })
    }

    /// `POST /game/end`
    pub fn end_game(&mut self, team_id: &str, stats: GameStats) -> Remote<EndGameResponse> {
        let now = self.clock.now_ms();
        let request = EndGameRequest {
            team_id: team_id.to_string(),
            end_time: now,
            stats,
        };
        let body = Self::encode(&request);
        self.call(Method::Post, "/game/end", body, || {
            fallback::end_game(&request, now)
        })
    }

    /// `GET /leaderboard`
    pub fn leaderboard(&mut self) -> Remote<LeaderboardResponse> {
        self.call(Method::Get, "/leaderboard", None, fallback::leaderboard)
    }

    /// `POST /feedback`
    pub fn submit_feedback(&mut self, team_id: Option<&str>, feedback: &str) -> Remote<FeedbackResponse> {
        let request = FeedbackRequest {
            team_id: team_id.map(str::to_string),
            feedback: feedback.to_string(),
            submitted_at: self.clock.now_ms(),
        };
        let body = Self::encode(&request);
        self.call(Method::Post, "/feedback", body, fallback::feedback)
    }

    /// `GET /health`; only a live `success: true` counts as healthy
    pub fn health_check(&mut self) -> bool {
        match self.call(Method::Get, "/health", None, fallback::health) {
            Remote::Live(health) => health.success,
            Remote::Fallback { .. } => false,
        }
    }
}
