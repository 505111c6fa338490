use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use common::{DEFAULT_REQUIRED_PLAYERS, DEFAULT_TOTAL_ROUNDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Question + RPS move against the server, scored over a fixed number of rounds
    Trivia,
    /// Single-elimination PSR matches between players
    Bracket,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Trivia => "trivia",
            GameMode::Bracket => "bracket",
        }
    }
}

impl FromStr for GameMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trivia" | "rps" => Ok(GameMode::Trivia),
            "bracket" | "psr" => Ok(GameMode::Bracket),
            other => bail!("Unknown game mode '{}': expected 'trivia' or 'bracket'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub pass: String,
    pub name: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.pass, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub mode: GameMode,
    pub addr: String,
    pub total_rounds: u32,
    pub required_players: usize,
    pub questions_file: Option<String>,
    /// Bearer key required on referee routes; open when unset
    pub referee_key: Option<String>,
    pub web_dir: Option<String>,
    /// Registration requests allowed per client per minute
    pub register_rate_limit: usize,
    /// History is kept in memory unless every database setting is present
    pub database: Option<DatabaseConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Trivia,
            addr: "0.0.0.0:5289".to_string(),
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            required_players: DEFAULT_REQUIRED_PLAYERS,
            questions_file: None,
            referee_key: None,
            web_dir: None,
            register_rate_limit: 60,
            database: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, raw, e)),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Reads `ARENA_*` variables; call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let defaults = ServerConfig::default();

        let mode = match optional_var("ARENA_MODE") {
            Some(raw) => raw.parse().context("ARENA_MODE")?,
            None => defaults.mode,
        };

        let database = match (
            optional_var("ARENA_DB_HOST"),
            optional_var("ARENA_DB_PORT"),
            optional_var("ARENA_DB_USER"),
            optional_var("ARENA_DB_PASS"),
            optional_var("ARENA_DB_NAME"),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(name)) => Some(DatabaseConfig {
                host,
                port,
                user,
                pass,
                name,
            }),
            (None, None, None, None, None) => None,
            _ => bail!("ARENA_DB_HOST, ARENA_DB_PORT, ARENA_DB_USER, ARENA_DB_PASS and ARENA_DB_NAME must be set together"),
        };

        let config = ServerConfig {
            mode,
            addr: optional_var("ARENA_ADDR").unwrap_or(defaults.addr),
            total_rounds: parsed_var("ARENA_TOTAL_ROUNDS", defaults.total_rounds)?,
            required_players: parsed_var("ARENA_REQUIRED_PLAYERS", defaults.required_players)?,
            questions_file: optional_var("ARENA_QUESTIONS_FILE"),
            referee_key: optional_var("ARENA_REFEREE_KEY"),
            web_dir: optional_var("ARENA_WEB_DIR"),
            register_rate_limit: parsed_var("ARENA_REGISTER_RATE_LIMIT", defaults.register_rate_limit)?,
            database,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_rounds == 0 {
            bail!("ARENA_TOTAL_ROUNDS must be at least 1");
        }
        if self.required_players < 2 || !self.required_players.is_power_of_two() {
            bail!(
                "ARENA_REQUIRED_PLAYERS must be a power of two and at least 2, got {}",
                self.required_players
            );
        }
        if self.register_rate_limit == 0 {
            bail!("ARENA_REGISTER_RATE_LIMIT must be at least 1");
        }
        Ok(())
    }
}
