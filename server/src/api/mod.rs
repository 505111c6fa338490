pub mod bracket;
pub mod extract;
pub mod history;
pub mod middleware;
pub mod rate_limit;
pub mod referee;
pub mod server;
pub mod trivia;

pub use server::{build_router, run_api_server, ApiOptions, GameServices};
