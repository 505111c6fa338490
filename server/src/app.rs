use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::{build_router, run_api_server, ApiOptions, GameServices};
use crate::bracket_service::BracketService;
use crate::config::{GameMode, ServerConfig};
use crate::history::{spawn_history_writer, HistoryStore, MemoryHistoryStore, PgHistoryStore};
use crate::question_bank::QuestionBank;
use crate::trivia_service::TriviaService;

/// A running tournament server: HTTP API plus the history writer
pub struct ArenaServer {
    addr: SocketAddr,
    mode: GameMode,
    cancellation_token: CancellationToken,
    api_handle: JoinHandle<()>,
    history_handle: JoinHandle<()>,
}

impl ArenaServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub async fn start(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.addr))?;
        Self::start_with_listener(config, listener).await
    }

    pub async fn start_with_listener(config: ServerConfig, listener: TcpListener) -> Result<Self> {
        config.validate()?;

        let history_store: Arc<dyn HistoryStore> = match &config.database {
            Some(db) => {
                info!("Archiving tournaments to PostgreSQL at {}:{}", db.host, db.port);
                Arc::new(PgHistoryStore::connect(db).await?)
            }
            None => {
                info!("Archiving tournaments in memory");
                Arc::new(MemoryHistoryStore::new())
            }
        };
        let (history_sink, history_handle) = spawn_history_writer(history_store.clone());

        let services = match config.mode {
            GameMode::Trivia => {
                let bank = match &config.questions_file {
                    Some(path) => QuestionBank::from_file(path)?,
                    None => QuestionBank::default(),
                };
                info!(
                    "Trivia tournament: {} rounds, {} questions in bank",
                    config.total_rounds,
                    bank.len()
                );
                GameServices::Trivia(Arc::new(TriviaService::new(bank, config.total_rounds, history_sink)))
            }
            GameMode::Bracket => {
                info!("Bracket tournament: {} players", config.required_players);
                GameServices::Bracket(Arc::new(BracketService::new(config.required_players, history_sink)))
            }
        };

        let options = ApiOptions {
            referee_key: config.referee_key.clone(),
            register_rate_limit: config.register_rate_limit,
            web_dir: config.web_dir.clone(),
        };
        if options.referee_key.is_none() {
            info!("ARENA_REFEREE_KEY not set; referee routes are open");
        }
        let addr = listener.local_addr()?;
        let cancellation_token = CancellationToken::new();
        let app = build_router(services, history_store, &options, cancellation_token.clone());

        let token = cancellation_token.clone();
        let api_handle = tokio::spawn(async move {
            if let Err(e) = run_api_server(listener, app, token).await {
                error!("API server stopped: {:?}", e);
            }
        });

        info!("{} server started on {}", config.mode.as_str(), addr);
        Ok(Self {
            addr,
            mode: config.mode,
            cancellation_token,
            api_handle,
            history_handle,
        })
    }

    /// Stops accepting requests, then waits for queued history entries to be written.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down {} server on {}", self.mode.as_str(), self.addr);
        self.cancellation_token.cancel();

        for (name, handle) in [("API server", self.api_handle), ("History writer", self.history_handle)] {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("{} panicked during shutdown: {:?}", name, e),
                Err(_) => error!("{} shutdown timed out", name),
            }
        }

        info!("Server shut down gracefully");
        Ok(())
    }
}
