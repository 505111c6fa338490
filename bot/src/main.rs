mod client;
mod solver;

use anyhow::{Result, anyhow};
use clap::Parser;
use common::dto::{
    BracketRegisterResponse, BracketStateResponse, GeneratedNameResponse, MatchDto,
    PlayerRoundResultDto, PlayerStatusResponse, RegisterPlayerRequest, RegisterPlayerResponse,
    SubmitAnswerRequest, SubmitAnswerResponse, SubmitMoveRequest, SubmitMoveResponse,
};
use common::{BracketStatus, MatchStatus, Move, TournamentStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use client::{ArenaClient, normalize_base_url};

#[derive(Parser, Debug)]
#[command(
    name = "arena-bot",
    about = "Run one or more bots against a trivia or bracket tournament server"
)]
struct Args {
    /// Base HTTP URL of the tournament server (e.g. http://localhost:5289)
    #[arg(long, default_value = "http://localhost:5289")]
    url: String,

    /// Tournament type the server hosts: trivia | bracket
    #[arg(long, default_value = "trivia")]
    mode: String,

    /// Number of bots to run concurrently
    #[arg(long, default_value_t = 1)]
    bots: usize,

    /// Name prefix; bracket bots ask the server for a name when omitted
    #[arg(long)]
    name: Option<String>,

    /// Delay between status polls
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 3600)]
    timeout_secs: u64,
}

#[derive(Debug, Clone, Copy)]
enum BotMode {
    Trivia,
    Bracket,
}

fn parse_mode(mode: &str) -> Result<BotMode> {
    match mode.to_ascii_lowercase().as_str() {
        "trivia" | "rps" => Ok(BotMode::Trivia),
        "bracket" | "psr" => Ok(BotMode::Bracket),
        other => Err(anyhow!("Unknown mode '{}'", other)),
    }
}

struct BotContext {
    idx: usize,
    client: ArenaClient,
    name: Option<String>,
    poll: Duration,
    status_tx: watch::Sender<String>,
    rng: StdRng,
}

impl BotContext {
    fn status(&self, status: impl Into<String>) {
        let _ = self.status_tx.send(status.into());
    }

    fn player_name(&self) -> Option<String> {
        // Keep the name short; the server caps names at 50 characters
        let uuid_suffix = &Uuid::new_v4().simple().to_string()[24..32];
        self.name
            .as_ref()
            .map(|prefix| format!("{}{}-{}", prefix, self.idx + 1, uuid_suffix))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let base_url = normalize_base_url(&args.url)?;
    let mode = parse_mode(&args.mode)?;
    let http_client = Client::new();

    info!(
        "Starting {} bot(s) targeting {} in {:?} mode",
        args.bots, base_url, mode
    );

    let mut handles = Vec::new();
    for idx in 0..args.bots {
        let client = ArenaClient::new(http_client.clone(), base_url.clone());
        let name = match (&args.name, mode) {
            (Some(prefix), _) => Some(prefix.clone()),
            (None, BotMode::Trivia) => Some("bot".to_string()),
            (None, BotMode::Bracket) => None,
        };
        let poll = Duration::from_millis(args.poll_ms);
        let deadline = Duration::from_secs(args.timeout_secs);

        let handle = tokio::spawn(async move {
            match tokio::time::timeout(deadline, run_bot(idx, mode, client, name, poll)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("Bot {} failed: {:#}", idx + 1, err),
                Err(_) => error!("Bot {} gave up after {:?}", idx + 1, deadline),
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn run_bot(
    idx: usize,
    mode: BotMode,
    client: ArenaClient,
    name: Option<String>,
    poll: Duration,
) -> Result<()> {
    let (status_tx, status_rx) = watch::channel::<String>(String::from("starting"));
    let logger = tokio::spawn(log_progress(idx, status_rx));

    let mut ctx = BotContext {
        idx,
        client,
        name,
        poll,
        status_tx,
        rng: StdRng::from_entropy(),
    };
    let result = match mode {
        BotMode::Trivia => play_trivia(&mut ctx).await,
        BotMode::Bracket => play_bracket(&mut ctx).await,
    };
    if let Err(err) = &result {
        ctx.status(format!("error: {err}"));
    }

    drop(ctx);
    let _ = logger.await;
    result
}

async fn play_trivia(ctx: &mut BotContext) -> Result<()> {
    let name = ctx.player_name().unwrap_or_else(|| format!("bot{}", ctx.idx + 1));
    let registered: RegisterPlayerResponse = ctx
        .client
        .post("/api/player/register", &RegisterPlayerRequest { name })
        .await?;
    let player_id = registered.player_id;
    info!(
        "Bot {} registered as {} (player_id {})",
        ctx.idx + 1,
        registered.player_name,
        player_id
    );

    loop {
        let status: PlayerStatusResponse = ctx
            .client
            .get(&format!("/api/player/{}/status", player_id))
            .await?;

        match status.tournament_status {
            TournamentStatus::Completed => break,
            TournamentStatus::Pending => ctx.status("waiting for the tournament to start"),
            TournamentStatus::InProgress if status.can_submit => {
                let question = status.current_question.unwrap_or_default();
                let answer = solver::solve(&question).unwrap_or_else(|| "unknown".to_string());
                let mv = Move::random(&mut ctx.rng);
                let request = SubmitAnswerRequest {
                    player_id,
                    round_number: status.current_round,
                    answer,
                    r#move: mv.trivia_code(),
                };
                match ctx
                    .client
                    .post::<_, SubmitAnswerResponse>("/api/player/submit-answer", &request)
                    .await
                {
                    Ok(response) => {
                        info!(
                            "Bot {} round {}: answered {:?} ({}), played {} ({}), score {}",
                            ctx.idx + 1,
                            status.current_round,
                            request.answer,
                            if response.answer_correct { "correct" } else { "wrong" },
                            mv,
                            response.outcome,
                            response.score
                        );
                    }
                    Err(err) => warn!("Bot {} could not submit: {:#}", ctx.idx + 1, err),
                }
            }
            TournamentStatus::InProgress => ctx.status(format!(
                "round {}/{}: waiting, score {}",
                status.current_round, status.total_rounds, status.score
            )),
        }
        tokio::time::sleep(ctx.poll).await;
    }

    let results: Vec<PlayerRoundResultDto> = ctx
        .client
        .get(&format!("/api/player/{}/results", player_id))
        .await?;
    let total: u32 = results.iter().map(|r| r.score).sum();
    info!(
        "Bot {} finished the tournament: {} rounds played, {} points",
        ctx.idx + 1,
        results.len(),
        total
    );
    Ok(())
}

async fn play_bracket(ctx: &mut BotContext) -> Result<()> {
    let name = match ctx.player_name() {
        Some(name) => name,
        None => {
            let generated: GeneratedNameResponse = ctx.client.get("/api/players/generate-name").await?;
            generated.name
        }
    };
    let registered: BracketRegisterResponse = ctx
        .client
        .post("/api/players/register", &RegisterPlayerRequest { name })
        .await?;
    let player_id = registered.player_id;
    info!(
        "Bot {} registered as {} (player_id {}) in tournament {}",
        ctx.idx + 1,
        registered.player_name,
        player_id,
        registered.tournament_id
    );

    let mut seen_ties = 0;
    loop {
        let state: BracketStateResponse = ctx.client.get("/api/tournament/state").await?;
        if state.status == BracketStatus::Completed {
            match &state.winner {
                Some(winner) if winner.id == player_id => info!("Bot {} is the champion!", ctx.idx + 1),
                Some(winner) => info!("Bot {} done; {} won the tournament", ctx.idx + 1, winner.name),
                None => info!("Bot {} done", ctx.idx + 1),
            }
            return Ok(());
        }
        let eliminated = state
            .players
            .iter()
            .any(|p| p.id == player_id && !p.is_active);
        if eliminated {
            let last: Option<MatchDto> = ctx
                .client
                .get_optional(&format!("/api/players/{}/current-match-completed", player_id))
                .await?;
            let winner = last.and_then(|m| m.winner).map(|w| w.name).unwrap_or_default();
            info!("Bot {} was eliminated by {}", ctx.idx + 1, winner);
            return Ok(());
        }

        let current: Option<MatchDto> = ctx
            .client
            .get_optional(&format!("/api/players/{}/current-match", player_id))
            .await?;
        match current {
            Some(m) if m.status == MatchStatus::InProgress => {
                let my_move = if m.player1.id == player_id {
                    m.player1_move
                } else {
                    m.player2_move
                };
                if m.ties > seen_ties {
                    info!("Bot {} tied match {}; playing again", ctx.idx + 1, m.id);
                    seen_ties = m.ties;
                }
                if my_move == 0 {
                    let mv = Move::random(&mut ctx.rng);
                    let request = SubmitMoveRequest {
                        r#move: Move::bracket_code(Some(mv)),
                    };
                    match ctx
                        .client
                        .post::<_, SubmitMoveResponse>(&format!("/api/players/{}/move", player_id), &request)
                        .await
                    {
                        Ok(response) => info!("Bot {} played {}: {}", ctx.idx + 1, mv, response.message),
                        Err(err) => warn!("Bot {} could not move: {:#}", ctx.idx + 1, err),
                    }
                } else {
                    ctx.status(format!("round {}: waiting for opponent", m.round));
                }
            }
            _ => {
                seen_ties = 0;
                ctx.status(match state.status {
                    BracketStatus::WaitingForPlayers => format!(
                        "waiting for players ({}/{})",
                        state.players.len(),
                        state.required_players
                    ),
                    _ => format!("round {}: waiting for the referee", state.current_round),
                });
            }
        }
        tokio::time::sleep(ctx.poll).await;
    }
}

async fn log_progress(idx: usize, mut status_rx: watch::Receiver<String>) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    let mut last = String::new();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !last.is_empty() {
                    info!("Bot {} status: {}", idx + 1, last);
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                last = status_rx.borrow().clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert!(matches!(parse_mode("trivia").unwrap(), BotMode::Trivia));
        assert!(matches!(parse_mode("PSR").unwrap(), BotMode::Bracket));
        assert!(parse_mode("chess").is_err());
    }
}
