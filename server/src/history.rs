use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::dto::{HistoryEntry, Standing};
use refinery::config::{Config, ConfigDbType};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::DatabaseConfig;

mod migrations {
    use refinery::embed_migrations;
    embed_migrations!("./migrations");
}

/// Archive of completed tournaments.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, entry: HistoryEntry) -> Result<()>;
    /// Most recent first
    async fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    /// Runs the embedded migrations and opens a connection pool.
    pub async fn connect(db: &DatabaseConfig) -> Result<Self> {
        let mut db_config = Config::new(ConfigDbType::Postgres)
            .set_db_host(&db.host)
            .set_db_port(&db.port)
            .set_db_user(&db.user)
            .set_db_pass(&db.pass)
            .set_db_name(&db.name);

        migrations::migrations::runner()
            .run_async(&mut db_config)
            .await
            .context("Failed to run history migrations")?;
        info!("Database migrations completed");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&db.url())
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }
}

type HistoryRow = (i32, String, DateTime<Utc>, Json<Vec<Standing>>);

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO tournament_history (tournament_id, mode, completed_at, standings) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.tournament_id as i32)
        .bind(&entry.mode)
        .bind(entry.completed_at)
        .bind(Json(&entry.standings))
        .execute(&self.pool)
        .await
        .context("Failed to insert tournament history")?;
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT tournament_id, mode, completed_at, standings FROM tournament_history \
             ORDER BY completed_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query tournament history")?;

        Ok(rows
            .into_iter()
            .map(|(tournament_id, mode, completed_at, standings)| HistoryEntry {
                tournament_id: tournament_id as u32,
                mode,
                completed_at,
                standings: standings.0,
            })
            .collect())
    }
}

/// Sending half handed to the tournament services.
///
/// Services finish tournaments while holding their state lock, so they only
/// enqueue the entry here; a writer task performs the store I/O.
#[derive(Clone)]
pub struct HistorySink {
    tx: mpsc::UnboundedSender<HistoryEntry>,
}

impl HistorySink {
    pub fn submit(&self, entry: HistoryEntry) {
        let tournament_id = entry.tournament_id;
        if self.tx.send(entry).is_err() {
            error!("History writer stopped; tournament {} was not archived", tournament_id);
        }
    }

    /// A sink with no writer behind it, for services used outside a server.
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

/// Spawns the task that drains the sink into `store`. It ends once every sink is dropped.
pub fn spawn_history_writer(store: Arc<dyn HistoryStore>) -> (HistorySink, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<HistoryEntry>();
    let handle = tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            let tournament_id = entry.tournament_id;
            match store.record(entry).await {
                Ok(()) => info!("Archived tournament {}", tournament_id),
                Err(e) => error!("Failed to archive tournament {}: {:?}", tournament_id, e),
            }
        }
    });
    (HistorySink { tx }, handle)
}

/// Ranks `(name, score)` pairs by score, highest first, ties broken by name.
pub fn standings_from_scores<I>(scores: I) -> Vec<Standing>
where
    I: IntoIterator<Item = (String, u32)>,
{
    let mut scores: Vec<(String, u32)> = scores.into_iter().collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scores
        .into_iter()
        .enumerate()
        .map(|(idx, (name, score))| Standing {
            rank: idx + 1,
            name,
            score,
        })
        .collect()
}
