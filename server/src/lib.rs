pub mod api;
pub mod app;
pub mod bracket_service;
pub mod config;
pub mod error;
pub mod history;
pub mod names;
pub mod question_bank;
pub mod trivia_service;
