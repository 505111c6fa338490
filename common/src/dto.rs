//! JSON bodies exchanged between the tournament servers and their clients.
//!
//! Field names are camelCase on the wire. Request bodies also accept the
//! PascalCase spelling older clients send (`PlayerId`, `RoundNumber`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BracketStatus, MatchStatus, Outcome, RoundStatus, TournamentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Trivia tournament
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPlayerRequest {
    #[serde(alias = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPlayerResponse {
    pub player_id: u32,
    pub player_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusResponse {
    pub player_id: u32,
    pub player_name: String,
    pub tournament_status: TournamentStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    /// `None` until the tournament has started
    pub current_round_status: Option<RoundStatus>,
    /// Only present while the current round is in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    /// Same as `current_round_status`, under the name the tool-using agents read
    #[serde(default)]
    pub round_status: Option<RoundStatus>,
    /// Same as `current_question`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub can_submit: bool,
    pub has_submitted: bool,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[serde(alias = "PlayerId")]
    pub player_id: u32,
    #[serde(alias = "RoundNumber")]
    pub round_number: u32,
    #[serde(alias = "Answer", default)]
    pub answer: String,
    /// 0=Rock, 1=Paper, 2=Scissors
    #[serde(alias = "Move")]
    pub r#move: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub success: bool,
    pub message: String,
    pub answer_correct: bool,
    pub server_move: u8,
    pub outcome: Outcome,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundResultDto {
    pub round_number: u32,
    pub answer: String,
    pub r#move: u8,
    pub answer_correct: bool,
    pub outcome: Outcome,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: u32,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round_number: u32,
    pub status: RoundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub submissions: usize,
    /// Revealed once the round is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_move: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentStateResponse {
    pub tournament_id: u32,
    pub status: TournamentStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub current_round_status: Option<RoundStatus>,
    pub player_count: usize,
    pub rounds: Vec<RoundSummary>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub leaderboard_hidden: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRoundRequest {
    #[serde(alias = "Question")]
    pub question: Option<String>,
    #[serde(alias = "Answer")]
    pub answer: Option<String>,
    /// Trivia move code; random when absent
    #[serde(alias = "ServerMove")]
    pub server_move: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefereeResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Bracket tournament
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketRegisterResponse {
    pub player_id: u32,
    pub player_name: String,
    pub tournament_id: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedNameResponse {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRegisterRequest {
    #[serde(alias = "Count")]
    pub count: usize,
    #[serde(alias = "UseAutoNames", default)]
    pub use_auto_names: bool,
    #[serde(alias = "Names", default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRegisterResponse {
    pub players: Vec<BracketPlayerDto>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BracketPlayerDto {
    pub id: u32,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub id: u32,
    pub round: u32,
    pub status: MatchStatus,
    pub player1: BracketPlayerDto,
    pub player2: BracketPlayerDto,
    /// 0 until the player moved, then 1=Rock, 2=Paper, 3=Scissors
    pub player1_move: u8,
    pub player2_move: u8,
    pub winner: Option<BracketPlayerDto>,
    pub ties: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketStateResponse {
    pub tournament_id: u32,
    pub status: BracketStatus,
    pub current_round: u32,
    pub current_round_status: RoundStatus,
    pub required_players: usize,
    pub players: Vec<BracketPlayerDto>,
    pub matches: Vec<MatchDto>,
    pub winner: Option<BracketPlayerDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMoveRequest {
    #[serde(alias = "Move")]
    pub r#move: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMoveResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub rank: usize,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub tournament_id: u32,
    /// "trivia" or "bracket"
    pub mode: String,
    pub completed_at: DateTime<Utc>,
    pub standings: Vec<Standing>,
}
