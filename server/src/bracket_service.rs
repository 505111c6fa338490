use chrono::Utc;
use common::dto::{
    BracketPlayerDto, BracketRegisterResponse, BracketStateResponse, BulkRegisterRequest,
    BulkRegisterResponse, HistoryEntry, MatchDto, RefereeResponse, SubmitMoveResponse,
};
use common::{BracketStatus, MAX_PLAYER_NAME_LEN, MatchStatus, Move, Outcome, RoundStatus};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::history::{HistorySink, standings_from_scores};
use crate::names::generate_name;

#[derive(Debug, Clone)]
struct BracketPlayer {
    id: u32,
    name: String,
    is_active: bool,
}

impl BracketPlayer {
    fn to_dto(&self) -> BracketPlayerDto {
        BracketPlayerDto {
            id: self.id,
            name: self.name.clone(),
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone)]
struct Match {
    id: u32,
    round: u32,
    status: MatchStatus,
    player1: u32,
    player2: u32,
    player1_move: Option<Move>,
    player2_move: Option<Move>,
    winner: Option<u32>,
    ties: u32,
}

impl Match {
    fn involves(&self, player_id: u32) -> bool {
        self.player1 == player_id || self.player2 == player_id
    }
}

#[derive(Debug)]
struct BracketTournament {
    id: u32,
    status: BracketStatus,
    required_players: usize,
    players: BTreeMap<u32, BracketPlayer>,
    next_player_id: u32,
    matches: Vec<Match>,
    next_match_id: u32,
    current_round: u32,
    current_round_status: RoundStatus,
    winner: Option<u32>,
}

impl BracketTournament {
    fn new(id: u32, required_players: usize) -> Self {
        Self {
            id,
            status: BracketStatus::WaitingForPlayers,
            required_players,
            players: BTreeMap::new(),
            next_player_id: 1,
            matches: Vec::new(),
            next_match_id: 1,
            current_round: 1,
            current_round_status: RoundStatus::Pending,
            winner: None,
        }
    }

    fn seats_left(&self) -> usize {
        self.required_players.saturating_sub(self.players.len())
    }

    fn name_taken(&self, name: &str) -> bool {
        self.players.values().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    fn player(&self, player_id: u32) -> ServiceResult<&BracketPlayer> {
        self.players
            .get(&player_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Player {} not found", player_id)))
    }

    fn player_dto(&self, player_id: u32) -> BracketPlayerDto {
        self.players
            .get(&player_id)
            .map(BracketPlayer::to_dto)
            .unwrap_or_else(|| BracketPlayerDto {
                id: player_id,
                name: String::new(),
                is_active: false,
            })
    }

    fn match_dto(&self, m: &Match) -> MatchDto {
        MatchDto {
            id: m.id,
            round: m.round,
            status: m.status,
            player1: self.player_dto(m.player1),
            player2: self.player_dto(m.player2),
            player1_move: Move::bracket_code(m.player1_move),
            player2_move: Move::bracket_code(m.player2_move),
            winner: m.winner.map(|id| self.player_dto(id)),
            ties: m.ties,
        }
    }

    fn add_player(&mut self, name: String) -> &BracketPlayer {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.entry(id).or_insert(BracketPlayer {
            id,
            name,
            is_active: true,
        })
    }

    /// Pairs `player_ids` in order (1v2, 3v4, ...) into matches of the current round.
    fn create_round_matches(&mut self, player_ids: &[u32]) {
        for pair in player_ids.chunks(2) {
            if let &[player1, player2] = pair {
                let id = self.next_match_id;
                self.next_match_id += 1;
                self.matches.push(Match {
                    id,
                    round: self.current_round,
                    status: MatchStatus::Pending,
                    player1,
                    player2,
                    player1_move: None,
                    player2_move: None,
                    winner: None,
                    ties: 0,
                });
            }
        }
        self.current_round_status = RoundStatus::Pending;
    }

    fn start_if_full(&mut self) {
        if self.status != BracketStatus::WaitingForPlayers || self.seats_left() > 0 {
            return;
        }
        let seeds: Vec<u32> = self.players.keys().copied().collect();
        self.status = BracketStatus::InProgress;
        self.current_round = 1;
        self.create_round_matches(&seeds);
        info!(
            "Bracket tournament {} is full with {} players; round 1 has {} matches",
            self.id,
            seeds.len(),
            seeds.len() / 2
        );
    }

    fn current_round_matches(&self) -> impl Iterator<Item = &Match> {
        let round = self.current_round;
        self.matches.iter().filter(move |m| m.round == round)
    }

    fn wins(&self, player_id: u32) -> u32 {
        self.matches.iter().filter(|m| m.winner == Some(player_id)).count() as u32
    }
}

struct BracketState {
    tournament: BracketTournament,
    rng: StdRng,
}

fn validate_name(name: &str) -> ServiceResult<String> {
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
    Ok(name.to_string())
}

/// In-memory single-elimination PSR tournament.
///
/// Every operation takes the single state lock for its whole duration.
pub struct BracketService {
    state: Mutex<BracketState>,
    required_players: usize,
    history: HistorySink,
}

impl BracketService {
    pub fn new(required_players: usize, history: HistorySink) -> Self {
        Self::with_rng(required_players, history, StdRng::from_entropy())
    }

    pub fn with_rng(required_players: usize, history: HistorySink, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(BracketState {
                tournament: BracketTournament::new(1, required_players),
                rng,
            }),
            required_players,
            history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BracketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(tournament: &BracketTournament, wanted: usize) -> ServiceResult<()> {
        if tournament.status != BracketStatus::WaitingForPlayers {
            return Err(ServiceError::InvalidState(
                "Tournament has already started; registration is closed".to_string(),
            ));
        }
        if wanted > tournament.seats_left() {
            return Err(ServiceError::InvalidState(format!(
                "Tournament has {} open seats, cannot register {}",
                tournament.seats_left(),
                wanted
            )));
        }
        Ok(())
    }

    pub fn register(&self, name: &str) -> ServiceResult<BracketRegisterResponse> {
        let name = validate_name(name)?;
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        Self::ensure_open(tournament, 1)?;
        if tournament.name_taken(&name) {
            return Err(ServiceError::BadRequest(format!("Player name '{}' is already taken", name)));
        }

        let player_id = tournament.add_player(name.clone()).id;
        info!("Player {} registered as '{}' in bracket tournament {}", player_id, name, tournament.id);
        let seats_left = tournament.seats_left();
        tournament.start_if_full();

        let message = if seats_left == 0 {
            "Registration complete. The tournament has started!".to_string()
        } else {
            format!("Registered. Waiting for {} more players", seats_left)
        };
        Ok(BracketRegisterResponse {
            player_id,
            player_name: name,
            tournament_id: tournament.id,
            message,
        })
    }

    pub fn generate_name(&self) -> String {
        let mut state = self.lock();
        let BracketState { tournament, rng } = &mut *state;
        generate_name(rng, |candidate| tournament.name_taken(candidate))
    }

    /// Registers a batch of players; either every player is added or none is.
    pub fn register_bulk(&self, req: &BulkRegisterRequest) -> ServiceResult<BulkRegisterResponse> {
        if req.count == 0 {
            return Err(ServiceError::BadRequest("Count must be at least 1".to_string()));
        }
        let mut names: Vec<String> = req
            .names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .take(req.count)
            .map(|n| validate_name(n))
            .collect::<ServiceResult<_>>()?;
        if names.len() < req.count && !req.use_auto_names {
            return Err(ServiceError::BadRequest(format!(
                "{} names supplied for {} players; enable auto names to fill the rest",
                names.len(),
                req.count
            )));
        }

        let mut state = self.lock();
        let BracketState { tournament, rng } = &mut *state;
        Self::ensure_open(tournament, req.count)?;

        let mut batch: HashSet<String> = HashSet::new();
        for name in &names {
            if tournament.name_taken(name) || !batch.insert(name.to_lowercase()) {
                return Err(ServiceError::BadRequest(format!("Player name '{}' is already taken", name)));
            }
        }
        while names.len() < req.count {
            let name = generate_name(rng, |candidate| {
                tournament.name_taken(candidate) || batch.contains(&candidate.to_lowercase())
            });
            batch.insert(name.to_lowercase());
            names.push(name);
        }

        let players: Vec<BracketPlayerDto> = names
            .into_iter()
            .map(|name| tournament.add_player(name).to_dto())
            .collect();
        info!("Registered {} players in bracket tournament {}", players.len(), tournament.id);
        tournament.start_if_full();

        let message = if tournament.status == BracketStatus::InProgress {
            format!("Registered {} players. The tournament has started!", players.len())
        } else {
            format!(
                "Registered {} players. Waiting for {} more players",
                players.len(),
                tournament.seats_left()
            )
        };
        Ok(BulkRegisterResponse { players, message })
    }

    pub fn state(&self) -> BracketStateResponse {
        let state = self.lock();
        let tournament = &state.tournament;
        BracketStateResponse {
            tournament_id: tournament.id,
            status: tournament.status,
            current_round: tournament.current_round,
            current_round_status: tournament.current_round_status,
            required_players: tournament.required_players,
            players: tournament.players.values().map(BracketPlayer::to_dto).collect(),
            matches: tournament.matches.iter().map(|m| tournament.match_dto(m)).collect(),
            winner: tournament.winner.map(|id| tournament.player_dto(id)),
        }
    }

    pub fn current_match(&self, player_id: u32) -> ServiceResult<MatchDto> {
        let state = self.lock();
        let tournament = &state.tournament;
        tournament.player(player_id)?;
        tournament
            .current_round_matches()
            .find(|m| m.involves(player_id) && m.status == MatchStatus::InProgress)
            .map(|m| tournament.match_dto(m))
            .ok_or_else(|| ServiceError::NotFound(format!("No active match for player {}", player_id)))
    }

    pub fn current_match_completed(&self, player_id: u32) -> ServiceResult<MatchDto> {
        let state = self.lock();
        let tournament = &state.tournament;
        tournament.player(player_id)?;
        tournament
            .matches
            .iter()
            .filter(|m| m.involves(player_id) && m.status == MatchStatus::Completed)
            .max_by_key(|m| m.round)
            .map(|m| tournament.match_dto(m))
            .ok_or_else(|| ServiceError::NotFound(format!("No completed match for player {}", player_id)))
    }

    pub fn start_round(&self) -> ServiceResult<RefereeResponse> {
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status != BracketStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }
        if tournament.current_round_status != RoundStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Round {} has already started",
                tournament.current_round
            )));
        }

        let round = tournament.current_round;
        for m in tournament.matches.iter_mut().filter(|m| m.round == round) {
            m.status = MatchStatus::InProgress;
        }
        tournament.current_round_status = RoundStatus::InProgress;
        info!("Bracket round {} started", round);

        Ok(RefereeResponse {
            success: true,
            message: format!("Round {} started", round),
        })
    }

    pub fn submit_move(&self, player_id: u32, code: u8) -> ServiceResult<SubmitMoveResponse> {
        let mv = Move::from_bracket_code(code)?
            .ok_or_else(|| ServiceError::BadRequest("A move is required".to_string()))?;

        let mut state = self.lock();
        let tournament = &mut state.tournament;
        let player = tournament.player(player_id)?;
        if !player.is_active {
            return Err(ServiceError::InvalidState(format!("Player {} has been eliminated", player_id)));
        }
        if tournament.status != BracketStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }

        let round = tournament.current_round;
        let m = tournament
            .matches
            .iter_mut()
            .find(|m| m.round == round && m.involves(player_id) && m.status == MatchStatus::InProgress)
            .ok_or_else(|| ServiceError::InvalidState(format!("No active match for player {}", player_id)))?;

        let slot = if m.player1 == player_id {
            &mut m.player1_move
        } else {
            &mut m.player2_move
        };
        if slot.is_some() {
            return Err(ServiceError::InvalidState("Move already submitted for this match".to_string()));
        }
        *slot = Some(mv);

        let (Some(move1), Some(move2)) = (m.player1_move, m.player2_move) else {
            return Ok(SubmitMoveResponse {
                success: true,
                message: format!("Move {} submitted. Waiting for opponent", mv),
            });
        };

        let (winner, loser) = match move1.against(move2) {
            Outcome::Tie => {
                m.player1_move = None;
                m.player2_move = None;
                m.ties += 1;
                info!("Match {} tied ({} vs {}); replaying", m.id, move1, move2);
                return Ok(SubmitMoveResponse {
                    success: true,
                    message: format!("Tie! Both players played {}. Submit a new move", move1),
                });
            }
            Outcome::Win => (m.player1, m.player2),
            Outcome::Loss => (m.player2, m.player1),
        };
        m.winner = Some(winner);
        m.status = MatchStatus::Completed;
        let match_id = m.id;

        if let Some(p) = tournament.players.get_mut(&loser) {
            p.is_active = false;
        }
        if tournament
            .current_round_matches()
            .all(|m| m.status == MatchStatus::Completed)
        {
            tournament.current_round_status = RoundStatus::Completed;
            info!("Bracket round {} completed", round);
        }
        let winner_name = tournament.player_dto(winner).name;
        info!("Match {} won by {} ({} vs {})", match_id, winner_name, move1, move2);

        Ok(SubmitMoveResponse {
            success: true,
            message: format!("Match complete. {} wins with {} vs {}", winner_name, move1, move2),
        })
    }

    /// Moves to the next round once every match of the current round is decided.
    pub fn advance(&self) -> ServiceResult<RefereeResponse> {
        let mut state = self.lock();
        let tournament = &mut state.tournament;
        if tournament.status != BracketStatus::InProgress {
            return Err(ServiceError::InvalidState("Tournament is not in progress".to_string()));
        }
        if tournament.current_round_status != RoundStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "Round {} still has undecided matches",
                tournament.current_round
            )));
        }

        let winners: Vec<u32> = tournament
            .current_round_matches()
            .filter_map(|m| m.winner)
            .collect();

        if let &[champion] = winners.as_slice() {
            tournament.status = BracketStatus::Completed;
            tournament.winner = Some(champion);
            let champion_name = tournament.player_dto(champion).name;
            info!("Bracket tournament {} won by {}", tournament.id, champion_name);

            let scores: Vec<(String, u32)> = tournament
                .players
                .values()
                .map(|p| (p.name.clone(), tournament.wins(p.id)))
                .collect();
            self.history.submit(HistoryEntry {
                tournament_id: tournament.id,
                mode: "bracket".to_string(),
                completed_at: Utc::now(),
                standings: standings_from_scores(scores),
            });
            return Ok(RefereeResponse {
                success: true,
                message: format!("Tournament complete. {} is the champion", champion_name),
            });
        }

        tournament.current_round += 1;
        tournament.create_round_matches(&winners);
        info!(
            "Bracket round {} created with {} matches",
            tournament.current_round,
            winners.len() / 2
        );
        Ok(RefereeResponse {
            success: true,
            message: format!("Round {} is ready", tournament.current_round),
        })
    }

    pub fn reset(&self) -> RefereeResponse {
        let mut state = self.lock();
        let next_id = state.tournament.id + 1;
        state.tournament = BracketTournament::new(next_id, self.required_players);
        info!("Bracket tournament reset; tournament {} is open for registration", next_id);

        RefereeResponse {
            success: true,
            message: format!("Tournament {} created", next_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(required: usize) -> BracketService {
        BracketService::with_rng(required, HistorySink::detached(), StdRng::seed_from_u64(5))
    }

    fn bulk(count: usize) -> BulkRegisterRequest {
        BulkRegisterRequest {
            count,
            use_auto_names: true,
            names: vec![],
        }
    }

    fn code(mv: Move) -> u8 {
        Move::bracket_code(Some(mv))
    }

    #[test]
    fn test_tournament_starts_when_full() {
        let svc = service(4);
        let first = svc.register("Ada").unwrap();
        assert_eq!(first.tournament_id, 1);
        assert_eq!(svc.state().status, BracketStatus::WaitingForPlayers);

        let res = svc.register_bulk(&bulk(3)).unwrap();
        assert_eq!(res.players.len(), 3);

        let state = svc.state();
        assert_eq!(state.status, BracketStatus::InProgress);
        assert_eq!(state.players.len(), 4);
        assert_eq!(state.matches.len(), 2);
        assert_eq!(state.current_round_status, RoundStatus::Pending);
        assert_eq!(state.matches[0].player1.name, "Ada");
        assert_eq!(state.matches[0].player2.id, 2);

        assert!(matches!(svc.register("Late"), Err(ServiceError::InvalidState(_))));
    }

    #[test]
    fn test_bulk_registration_is_all_or_nothing() {
        let svc = service(4);
        svc.register("Ada").unwrap();
        assert!(svc.register_bulk(&bulk(4)).is_err());
        assert_eq!(svc.state().players.len(), 1);

        let dup = BulkRegisterRequest {
            count: 2,
            use_auto_names: false,
            names: vec!["Bob".to_string(), "ada".to_string()],
        };
        assert!(matches!(svc.register_bulk(&dup), Err(ServiceError::BadRequest(_))));
        assert_eq!(svc.state().players.len(), 1);

        let short = BulkRegisterRequest {
            count: 2,
            use_auto_names: false,
            names: vec!["Bob".to_string()],
        };
        assert!(svc.register_bulk(&short).is_err());
    }

    #[test]
    fn test_bulk_uses_given_names_then_auto_names() {
        let svc = service(4);
        let res = svc
            .register_bulk(&BulkRegisterRequest {
                count: 3,
                use_auto_names: true,
                names: vec!["Ada".to_string(), "  ".to_string(), "Bob".to_string()],
            })
            .unwrap();
        let names: Vec<&str> = res.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(&names[..2], &["Ada", "Bob"]);
        assert!(!names[2].is_empty());
    }

    #[test]
    fn test_moves_require_started_round() {
        let svc = service(2);
        let ada = svc.register("Ada").unwrap().player_id;
        svc.register("Bob").unwrap();

        assert!(matches!(svc.current_match(ada), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.submit_move(ada, code(Move::Rock)), Err(ServiceError::InvalidState(_))));

        svc.start_round().unwrap();
        assert_eq!(svc.current_match(ada).unwrap().status, MatchStatus::InProgress);
        assert!(matches!(svc.submit_move(ada, 0), Err(ServiceError::BadRequest(_))));
        assert!(matches!(svc.submit_move(ada, 9), Err(ServiceError::BadRequest(_))));
        assert!(matches!(svc.submit_move(42, 1), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_tie_replays_match() {
        let svc = service(2);
        let ada = svc.register("Ada").unwrap().player_id;
        let bob = svc.register("Bob").unwrap().player_id;
        svc.start_round().unwrap();

        svc.submit_move(ada, code(Move::Paper)).unwrap();
        assert!(svc.submit_move(ada, code(Move::Rock)).is_err());
        svc.submit_move(bob, code(Move::Paper)).unwrap();

        let m = svc.current_match(ada).unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert_eq!(m.ties, 1);
        assert_eq!(m.player1_move, 0);
        assert_eq!(m.player2_move, 0);
        assert!(matches!(svc.current_match_completed(ada), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_full_bracket_to_champion() {
        let svc = service(4);
        svc.register_bulk(&BulkRegisterRequest {
            count: 4,
            use_auto_names: false,
            names: vec!["Ada".into(), "Bob".into(), "Cy".into(), "Dee".into()],
        })
        .unwrap();

        assert!(svc.advance().is_err());
        svc.start_round().unwrap();
        // Ada beats Bob, Dee beats Cy
        svc.submit_move(1, code(Move::Paper)).unwrap();
        svc.submit_move(2, code(Move::Rock)).unwrap();
        assert_eq!(svc.state().current_round_status, RoundStatus::InProgress);
        svc.submit_move(3, code(Move::Paper)).unwrap();
        svc.submit_move(4, code(Move::Scissors)).unwrap();

        let state = svc.state();
        assert_eq!(state.current_round_status, RoundStatus::Completed);
        assert!(!state.players[1].is_active);
        assert!(!state.players[2].is_active);

        let finished = svc.current_match_completed(2).unwrap();
        assert_eq!(finished.winner.unwrap().name, "Ada");
        assert_eq!(finished.player1_move, 2);

        // Eliminated players cannot keep playing
        assert!(matches!(svc.submit_move(2, code(Move::Rock)), Err(ServiceError::InvalidState(_))));

        svc.advance().unwrap();
        let state = svc.state();
        assert_eq!(state.current_round, 2);
        assert_eq!(state.current_round_status, RoundStatus::Pending);
        let final_match = state.matches.last().unwrap();
        assert_eq!((final_match.player1.id, final_match.player2.id), (1, 4));

        svc.start_round().unwrap();
        svc.submit_move(4, code(Move::Rock)).unwrap();
        svc.submit_move(1, code(Move::Scissors)).unwrap();
        svc.advance().unwrap();

        let state = svc.state();
        assert_eq!(state.status, BracketStatus::Completed);
        assert_eq!(state.winner.unwrap().name, "Dee");
        assert!(svc.advance().is_err());

        svc.reset();
        let state = svc.state();
        assert_eq!(state.tournament_id, 2);
        assert!(state.players.is_empty());
        assert!(state.matches.is_empty());
    }

    #[test]
    fn test_generated_name_is_unused() {
        let svc = service(8);
        let name = svc.generate_name();
        svc.register(&name).unwrap();
        assert_ne!(svc.generate_name(), name);
    }
}
