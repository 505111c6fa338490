use chrono::{DateTime, Utc};
use common::dto::{
    HistoryEntry, LeaderboardEntry, PlayerRoundResultDto, PlayerStatusResponse, RefereeResponse,
    RegisterPlayerResponse, RoundSummary, StartRoundRequest, SubmitAnswerRequest,
    SubmitAnswerResponse, TournamentStateResponse,
};
use common::{
    HIDDEN_LEADERBOARD_ROUNDS, MAX_PLAYER_NAME_LEN, Move, Outcome, RoundStatus, TournamentStatus,
    answers_match, round_score,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::history::{HistorySink, standings_from_scores};
use crate::question_bank::{Question, QuestionBank};

#[derive(Debug, Clone)]
struct Player {
    id: u32,
    name: String,
    score: u32,
}

#[derive(Debug, Clone)]
struct PlayerRoundResult {
    round_number: u32,
    answer: String,
    mv: Move,
    answer_correct: bool,
    outcome: Outcome,
    score: u32,
    submitted_at: DateTime<Utc>,
}

impl PlayerRoundResult {
    fn to_dto(&self) -> PlayerRoundResultDto {
        PlayerRoundResultDto {
            round_number: self.round_number,
            answer: self.answer.clone(),
            r#move: self.mv.trivia_code(),
            answer_correct: self.answer_correct,
            outcome: self.outcome,
            score: self.score,
            submitted_at: self.submitted_at,
        }
    }
}

#[derive(Debug, Clone)]
struct Round {
    number: u32,
    status: RoundStatus,
    question: Question,
    /// Drawn when the round starts
    server_move: Option<Move>,
    results: BTreeMap<u32, PlayerRoundResult>,
}

#[derive(Debug)]
struct Tournament {
    id: u32,
    status: TournamentStatus,
    players: BTreeMap<u32, Player>,
    next_player_id: u32,
    rounds: Vec<Round>,
    /// 1-based pointer into `rounds`
    current_round: u32,
}

impl Tournament {
    fn new(id: u32) -> Self {
        Self {
            id,
            status: TournamentStatus::Pending,
            players: BTreeMap::new(),
            next_player_id: 1,
            rounds: Vec::new(),
            current_round: 1,
        }
    }

    fn current(&self) -> Option<&Round> {
        self.rounds.get(self.current_round as usize - 1)
    }

    fn current_mut(&mut self) -> Option<&mut Round> {
        self.rounds.get_mut(self.current_round as usize - 1)
    }

    fn player(&self, player_id: u32) -> ServiceResult<&Player> {
        self.players
            .get(&player_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Player {} not found", player_id)))
    }
}

struct TriviaState {
    tournament: Tournament,
    rng: StdRng,
}

/// In-memory trivia RPS tournament.
///
/// Every operation takes the single state lock for its whole duration.
pub struct TriviaService {
    state: Mutex<TriviaState>,
    bank: QuestionBank,
    total_rounds: u32,
    history: HistorySink,
}

impl TriviaService {
    pub fn new(bank: QuestionBank, total_rounds: u32, history: HistorySink) -> Self {
        Self::with_rng(bank, total_rounds, history, StdRng::from_entropy())
    }

    pub fn with_rng(bank: QuestionBank, total_rounds: u32, history: HistorySink, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(TriviaState {
                tournament: Tournament::new(1),
                rng,
            }),
            bank,
            total_rounds: total_rounds.max(1),
            history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TriviaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn register_player(&self, name: &str) -> ServiceResult<RegisterPlayerResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("Player name is required".to_string()));
        }
        if name.chars().count() > MAX_PLAYER_NAME_LEN {
            return Err(ServiceError::BadRequest(format!(
                "Player name must be at most {} characters",
                MAX_PLAYER_NAME_LEN
            )));
        }

        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status == TournamentStatus::Completed {
            return Err(ServiceError::InvalidState(
                "Tournament is completed; registration is closed".to_string(),
            ));
        }
        if tournament
            .players
            .values()
            .any(|p| p.name.eq_ignore_ascii_case(name))
        {
            return Err(ServiceError::BadRequest(format!("Player name '{}' is already taken", name)));
        }

        let id = tournament.next_player_id;
        tournament.next_player_id += 1;
        tournament.players.insert(
            id,
            Player {
                id,
                name: name.to_string(),
                score: 0,
            },
        );
        info!("Player {} registered as '{}' in tournament {}", id, name, tournament.id);

        Ok(RegisterPlayerResponse {
            player_id: id,
            player_name: name.to_string(),
            message: format!("Welcome {}! You are registered for tournament {}", name, tournament.id),
        })
    }

    pub fn player_status(&self, player_id: u32) -> ServiceResult<PlayerStatusResponse> {
        let state = self.lock();
        let tournament = &state.tournament;
        let player = tournament.player(player_id)?;

        let round = match tournament.status {
            TournamentStatus::Pending => None,
            _ => tournament.current(),
        };
        let has_submitted = round.is_some_and(|r| r.results.contains_key(&player_id));
        let in_progress = tournament.status == TournamentStatus::InProgress
            && round.is_some_and(|r| r.status == RoundStatus::InProgress);
        let round_status = round.map(|r| r.status);
        let question = round
            .filter(|_| in_progress)
            .map(|r| r.question.question.clone());

        Ok(PlayerStatusResponse {
            player_id,
            player_name: player.name.clone(),
            tournament_status: tournament.status,
            current_round: tournament.current_round,
            total_rounds: self.total_rounds,
            current_round_status: round_status,
            current_question: question.clone(),
            round_status,
            question,
            can_submit: in_progress && !has_submitted,
            has_submitted,
            score: player.score,
        })
    }

    pub fn submit_answer(&self, req: &SubmitAnswerRequest) -> ServiceResult<SubmitAnswerResponse> {
        let mv = Move::from_trivia_code(req.r#move)?;

        let mut state = self.lock();
        let tournament = &mut state.tournament;
        let player_name = tournament.player(req.player_id)?.name.clone();

        if tournament.status != TournamentStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }
        if req.round_number != tournament.current_round {
            return Err(ServiceError::InvalidState(format!(
                "Round {} is not the current round (current round is {})",
                req.round_number, tournament.current_round
            )));
        }

        let round = tournament
            .current_mut()
            .ok_or_else(|| ServiceError::Internal("Current round is missing".to_string()))?;
        if round.status != RoundStatus::InProgress {
            return Err(ServiceError::InvalidState(format!(
                "Round {} is not accepting submissions",
                round.number
            )));
        }
        if round.results.contains_key(&req.player_id) {
            return Err(ServiceError::InvalidState(format!(
                "Player {} already submitted for round {}",
                req.player_id, round.number
            )));
        }
        let server_move = round
            .server_move
            .ok_or_else(|| ServiceError::Internal("Round started without a server move".to_string()))?;

        let answer_correct = answers_match(&req.answer, &round.question.answer);
        let outcome = mv.against(server_move);
        let score = round_score(answer_correct, outcome);
        round.results.insert(
            req.player_id,
            PlayerRoundResult {
                round_number: round.number,
                answer: req.answer.trim().to_string(),
                mv,
                answer_correct,
                outcome,
                score,
                submitted_at: Utc::now(),
            },
        );
        let round_number = round.number;

        if let Some(player) = tournament.players.get_mut(&req.player_id) {
            player.score += score;
        }
        info!(
            "Round {}: {} answered {} and played {} vs {} ({}) for {} points",
            round_number,
            player_name,
            if answer_correct { "correctly" } else { "incorrectly" },
            mv,
            server_move,
            outcome,
            score
        );

        Ok(SubmitAnswerResponse {
            success: true,
            message: format!("Submission received for round {}", round_number),
            answer_correct,
            server_move: server_move.trivia_code(),
            outcome,
            score,
        })
    }

    pub fn player_results(&self, player_id: u32) -> ServiceResult<Vec<PlayerRoundResultDto>> {
        let state = self.lock();
        let tournament = &state.tournament;
        tournament.player(player_id)?;

        Ok(tournament
            .rounds
            .iter()
            .filter_map(|r| r.results.get(&player_id))
            .map(PlayerRoundResult::to_dto)
            .collect())
    }

    fn leaderboard_hidden(&self, tournament: &Tournament) -> bool {
        tournament.status == TournamentStatus::InProgress
            && tournament.current_round > self.total_rounds.saturating_sub(HIDDEN_LEADERBOARD_ROUNDS)
    }

    fn leaderboard(tournament: &Tournament) -> Vec<LeaderboardEntry> {
        let mut players: Vec<&Player> = tournament.players.values().collect();
        players.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        players
            .into_iter()
            .enumerate()
            .map(|(idx, p)| LeaderboardEntry {
                rank: idx + 1,
                player_id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    pub fn tournament_state(&self) -> TournamentStateResponse {
        let state = self.lock();
        let tournament = &state.tournament;
        let hidden = self.leaderboard_hidden(tournament);

        let rounds = tournament
            .rounds
            .iter()
            .map(|r| {
                let completed = r.status == RoundStatus::Completed;
                RoundSummary {
                    round_number: r.number,
                    status: r.status,
                    question: (r.status != RoundStatus::Pending).then(|| r.question.question.clone()),
                    submissions: r.results.len(),
                    server_move: r.server_move.filter(|_| completed).map(Move::trivia_code),
                    correct_answer: completed.then(|| r.question.answer.clone()),
                }
            })
            .collect();

        TournamentStateResponse {
            tournament_id: tournament.id,
            status: tournament.status,
            current_round: tournament.current_round,
            total_rounds: self.total_rounds,
            current_round_status: tournament.current().map(|r| r.status),
            player_count: tournament.players.len(),
            rounds,
            leaderboard: if hidden { Vec::new() } else { Self::leaderboard(tournament) },
            leaderboard_hidden: hidden,
        }
    }

    pub fn start_tournament(&self) -> ServiceResult<RefereeResponse> {
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status != TournamentStatus::Pending {
            return Err(ServiceError::InvalidState("Tournament has already started".to_string()));
        }
        if tournament.players.is_empty() {
            return Err(ServiceError::InvalidState(
                "At least one player must register before the tournament starts".to_string(),
            ));
        }

        tournament.rounds = (1..=self.total_rounds)
            .map(|number| Round {
                number,
                status: RoundStatus::Pending,
                question: self.bank.for_round(number).clone(),
                server_move: None,
                results: BTreeMap::new(),
            })
            .collect();
        tournament.current_round = 1;
        tournament.status = TournamentStatus::InProgress;
        info!(
            "Tournament {} started with {} players and {} rounds",
            tournament.id,
            tournament.players.len(),
            self.total_rounds
        );

        Ok(RefereeResponse {
            success: true,
            message: format!("Tournament {} started", tournament.id),
        })
    }

    pub fn start_round(&self, overrides: &StartRoundRequest) -> ServiceResult<RefereeResponse> {
        let server_move = overrides
            .server_move
            .map(Move::from_trivia_code)
            .transpose()?;
        let override_question = match (&overrides.question, &overrides.answer) {
            (Some(q), Some(a)) if !q.trim().is_empty() && !a.trim().is_empty() => {
                Some(Question::new(q.trim(), a.trim()))
            }
            (None, None) => None,
            _ => {
                return Err(ServiceError::BadRequest(
                    "A custom question needs both a question and an answer".to_string(),
                ));
            }
        };

        let mut state = self.lock();
        let TriviaState { tournament, rng } = &mut *state;
        if tournament.status != TournamentStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }
        let round = tournament
            .current_mut()
            .ok_or_else(|| ServiceError::Internal("Current round is missing".to_string()))?;
        if round.status != RoundStatus::Pending {
            return Err(ServiceError::InvalidState(format!("Round {} has already started", round.number)));
        }

        if let Some(question) = override_question {
            round.question = question;
        }
        let server_move = server_move.unwrap_or_else(|| Move::random(rng));
        round.server_move = Some(server_move);
        round.status = RoundStatus::InProgress;
        info!("Round {} started: {}", round.number, round.question.question);

        Ok(RefereeResponse {
            success: true,
            message: format!("Round {} started", round.number),
        })
    }

    pub fn end_round(&self) -> ServiceResult<RefereeResponse> {
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status != TournamentStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }
        let total_rounds = self.total_rounds;
        let round = tournament
            .current_mut()
            .ok_or_else(|| ServiceError::Internal("Current round is missing".to_string()))?;
        if round.status != RoundStatus::InProgress {
            return Err(ServiceError::InvalidState(format!("Round {} is not in progress", round.number)));
        }
        round.status = RoundStatus::Completed;
        let finished = round.number;
        info!("Round {} completed with {} submissions", finished, round.results.len());

        if finished >= total_rounds {
            tournament.status = TournamentStatus::Completed;
            info!("Tournament {} completed", tournament.id);
            self.history.submit(HistoryEntry {
                tournament_id: tournament.id,
                mode: "trivia".to_string(),
                completed_at: Utc::now(),
                standings: standings_from_scores(
                    tournament.players.values().map(|p| (p.name.clone(), p.score)),
                ),
            });
            return Ok(RefereeResponse {
                success: true,
                message: format!("Round {} completed; tournament {} is over", finished, tournament.id),
            });
        }

        tournament.current_round += 1;
        Ok(RefereeResponse {
            success: true,
            message: format!("Round {} completed; round {} is next", finished, tournament.current_round),
        })
    }

    /// Puts the current round back to Pending and takes back the points it awarded.
    pub fn reset_round(&self) -> ServiceResult<RefereeResponse> {
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status != TournamentStatus::InProgress {
            return Err(ServiceError::InvalidState("Only a running tournament can reset a round".to_string()));
        }
        let round = tournament
            .current_mut()
            .ok_or_else(|| ServiceError::Internal("Current round is missing".to_string()))?;

        let awarded: Vec<(u32, u32)> = round
            .results
            .iter()
            .map(|(player_id, result)| (*player_id, result.score))
            .collect();
        round.results.clear();
        round.server_move = None;
        round.status = RoundStatus::Pending;
        let number = round.number;

        for (player_id, score) in &awarded {
            if let Some(player) = tournament.players.get_mut(player_id) {
                player.score = player.score.saturating_sub(*score);
            }
        }
        info!("Round {} reset; {} submissions discarded", number, awarded.len());

        Ok(RefereeResponse {
            success: true,
            message: format!("Round {} reset", number),
        })
    }

    pub fn reset_tournament(&self) -> RefereeResponse {
        let mut state = self.lock();
        let next_id = state.tournament.id + 1;
        state.tournament = Tournament::new(next_id);
        info!("Tournament reset; tournament {} is open for registration", next_id);

        RefereeResponse {
            success: true,
            message: format!("Tournament {} created", next_id),
        }
    }
}
