//! Locally synthesized stand-ins for backend answers
//!
//! Each mirrors what the backend would say for a healthy request, so play
//! continues offline. The status fallback reports no progress; the
//! progression machine never overwrites local state with it.

use super::messages::*;

pub fn start_game(request: &StartGameRequest, now: u64) -> StartGameResponse {
    StartGameResponse {
        success: true,
        team_id: request.team_id.clone(),
        start_time: now,
        message: "Game started successfully".to_string(),
    }
}

pub fn team_status(team_id: &str, now: u64) -> TeamStatus {
    TeamStatus {
        team_id: team_id.to_string(),
        checkpoints: Vec::new(),
        keys: Vec::new(),
        is_game_complete: false,
        last_updated: now,
    }
}

pub fn complete_checkpoint(request: &CompleteCheckpointRequest) -> CompleteCheckpointResponse {
    CompleteCheckpointResponse {
        success: true,
        checkpoint: request.checkpoint,
        earned_key: request.earned_key,
        message: "Checkpoint completed successfully".to_string(),
    }
}

pub fn end_game(request: &EndGameRequest, now: u64) -> EndGameResponse {
    EndGameResponse {
        success: true,
        team_id: request.team_id.clone(),
        completion_time: now,
        message: "Game completed successfully".to_string(),
    }
}

pub fn leaderboard() -> LeaderboardResponse {
    LeaderboardResponse::default()
}

pub fn feedback() -> FeedbackResponse {
    FeedbackResponse {
        success: true,
        message: "Mock response".to_string(),
    }
}

/// Unlike the other stand-ins, an unreachable backend is not healthy
pub fn health() -> HealthResponse {
    HealthResponse { success: false }
}
