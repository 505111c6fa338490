#![allow(dead_code)]

pub mod test_client;

pub use test_client::TestClient;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use server::api::{build_router, ApiOptions, GameServices};
use server::bracket_service::BracketService;
use server::history::{spawn_history_writer, MemoryHistoryStore};
use server::question_bank::{Question, QuestionBank};
use server::trivia_service::TriviaService;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Macro to wrap test bodies with a timeout to prevent hanging tests
#[macro_export]
macro_rules! timeout_test {
    ($duration:expr, $body:expr) => {
        tokio::time::timeout($duration, $body)
            .await
            .map_err(|_| anyhow::anyhow!("Test timed out after {:?}", $duration))?
    };
}

pub fn test_questions() -> QuestionBank {
    QuestionBank::new(vec![
        Question::new("What is 15 + 27?", "42"),
        Question::new("What is the capital of France?", "Paris"),
        Question::new("What is 100 - 35?", "65"),
    ])
    .expect("test question bank is valid")
}

pub struct TestApp {
    pub client: TestClient,
    pub history: Arc<MemoryHistoryStore>,
    /// Stops the router's background tasks when the test ends
    _shutdown: DropGuard,
}

pub fn trivia_app(total_rounds: u32, options: ApiOptions) -> TestApp {
    let history = Arc::new(MemoryHistoryStore::new());
    let (sink, _writer) = spawn_history_writer(history.clone());
    let service = TriviaService::with_rng(test_questions(), total_rounds, sink, StdRng::seed_from_u64(1));
    let shutdown = CancellationToken::new();
    let router = build_router(
        GameServices::Trivia(Arc::new(service)),
        history.clone(),
        &options,
        shutdown.clone(),
    );
    TestApp {
        client: TestClient::new(router),
        history,
        _shutdown: shutdown.drop_guard(),
    }
}

pub fn bracket_app(required_players: usize, options: ApiOptions) -> TestApp {
    let history = Arc::new(MemoryHistoryStore::new());
    let (sink, _writer) = spawn_history_writer(history.clone());
    let service = BracketService::with_rng(required_players, sink, StdRng::seed_from_u64(1));
    let shutdown = CancellationToken::new();
    let router = build_router(
        GameServices::Bracket(Arc::new(service)),
        history.clone(),
        &options,
        shutdown.clone(),
    );
    TestApp {
        client: TestClient::new(router),
        history,
        _shutdown: shutdown.drop_guard(),
    }
}
