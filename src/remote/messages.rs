//! JSON bodies of the backend API
//!
//! Response fields default when absent so a terse server still decodes.

use serde::{Deserialize, Serialize};

use crate::leaderboard::LeaderboardEntry;
use crate::progression::GameStats;

/// `POST /game/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub team_id: String,
    pub start_time: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartGameResponse {
    pub success: bool,
    pub team_id: String,
    pub start_time: u64,
    pub message: String,
}

/// `GET /team/status/{teamId}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStatus {
    pub team_id: String,
    pub checkpoints: Vec<u8>,
    pub keys: Vec<u8>,
    pub is_game_complete: bool,
    pub last_updated: u64,
}

/// `POST /checkpoint/complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCheckpointRequest {
    pub team_id: String,
    pub checkpoint: u8,
    pub earned_key: bool,
    pub completed_at: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteCheckpointResponse {
    pub success: bool,
    pub checkpoint: u8,
    pub earned_key: bool,
    pub message: String,
}

/// `POST /game/end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndGameRequest {
    pub team_id: String,
    pub end_time: u64,
    pub stats: GameStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndGameResponse {
    pub success: bool,
    pub team_id: String,
    pub completion_time: u64,
    pub message: String,
}

/// `GET /leaderboard`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// `POST /feedback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub team_id: Option<String>,
    pub feedback: String,
    pub submitted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub success: bool,
}
