use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

use super::middleware::{referee_middleware, RefereeKey};
use super::rate_limit::{rate_limit_layer, rate_limit_middleware, RateLimiter};
use super::{bracket, history, referee, trivia};
use crate::bracket_service::BracketService;
use crate::history::HistoryStore;
use crate::trivia_service::TriviaService;

/// The tournament a server process hosts
#[derive(Clone)]
pub enum GameServices {
    Trivia(Arc<TriviaService>),
    Bracket(Arc<BracketService>),
}

#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub referee_key: Option<String>,
    /// Registration requests allowed per client per minute
    pub register_rate_limit: usize,
    pub web_dir: Option<String>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            referee_key: None,
            register_rate_limit: 60,
            web_dir: None,
        }
    }
}

fn trivia_routes(service: Arc<TriviaService>, limiter: RateLimiter, key: RefereeKey) -> Router {
    let registration = Router::new()
        .route("/api/player/register", post(trivia::register))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    let referee_routes = Router::new()
        .route("/api/referee/start-tournament", post(referee::start_tournament))
        .route("/api/referee/start-round", post(referee::start_round))
        .route("/api/referee/end-round", post(referee::end_round))
        .route("/api/referee/reset-round", post(referee::reset_round))
        .route("/api/referee/reset-tournament", post(referee::reset_tournament))
        .layer(middleware::from_fn_with_state(key, referee_middleware));

    Router::new()
        .route("/api/player/:id/status", get(trivia::player_status))
        .route("/api/player/:id/results", get(trivia::player_results))
        .route("/api/player/submit-answer", post(trivia::submit_answer))
        .route("/api/tournament/state", get(trivia::tournament_state))
        .merge(registration)
        .merge(referee_routes)
        .with_state(service)
}

fn bracket_routes(service: Arc<BracketService>, limiter: RateLimiter, key: RefereeKey) -> Router {
    let registration = Router::new()
        .route("/api/players/register", post(bracket::register))
        .route("/api/players/register-bulk", post(bracket::register_bulk))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    let referee_routes = Router::new()
        .route("/api/referee/start-round", post(referee::bracket_start_round))
        .route("/api/referee/advance", post(referee::bracket_advance))
        .route("/api/referee/reset", post(referee::bracket_reset))
        .layer(middleware::from_fn_with_state(key, referee_middleware));

    Router::new()
        .route("/api/players/generate-name", get(bracket::generate_name))
        .route("/api/players/:id/current-match", get(bracket::current_match))
        .route(
            "/api/players/:id/current-match-completed",
            get(bracket::current_match_completed),
        )
        .route("/api/players/:id/move", post(bracket::submit_move))
        .route("/api/tournament/state", get(bracket::tournament_state))
        .merge(registration)
        .merge(referee_routes)
        .with_state(service)
}

/// Builds the full router. Must be called inside a Tokio runtime; the rate limiter's
/// cleanup task runs until `shutdown` is cancelled.
pub fn build_router(
    services: GameServices,
    history_store: Arc<dyn HistoryStore>,
    options: &ApiOptions,
    shutdown: CancellationToken,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limiter = rate_limit_layer(options.register_rate_limit, 60, shutdown);
    let key = RefereeKey::new(options.referee_key.as_deref());

    let game_routes = match services {
        GameServices::Trivia(service) => trivia_routes(service, limiter, key),
        GameServices::Bracket(service) => bracket_routes(service, limiter, key),
    };

    let history_routes = Router::new()
        .route("/api/history", get(history::list_history))
        .with_state(history_store);

    let mut app = Router::new()
        .route("/api/health", get(health_check))
        .merge(game_routes)
        .merge(history_routes);

    if let Some(dir) = &options.web_dir {
        let index_path = format!("{}/index.html", dir);
        let serve_dir = ServeDir::new(dir).not_found_service(ServeFile::new(&index_path));
        app = app.fallback_service(serve_dir);
        info!("Serving static files from: {}", dir);
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}

/// Serves `app` until `shutdown` is cancelled.
pub async fn run_api_server(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    info!("API server listening on {}", listener.local_addr()?);

    // Peer addresses key the registration rate limit
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))
}

async fn health_check() -> &'static str {
    "OK"
}
