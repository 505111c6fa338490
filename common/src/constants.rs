/// Points awarded for a correct trivia answer
pub const CORRECT_ANSWER_POINTS: u32 = 10;

/// Points awarded when the player's move beats the server move
pub const RPS_WIN_POINTS: u32 = 20;

/// Points awarded when the player's move ties the server move
pub const RPS_TIE_POINTS: u32 = 10;

pub const RPS_LOSS_POINTS: u32 = 0;

/// Default number of rounds in a trivia tournament
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

/// Default number of seats in a bracket tournament
pub const DEFAULT_REQUIRED_PLAYERS: usize = 8;

/// Rounds at the end of a trivia tournament during which the leaderboard is hidden
pub const HIDDEN_LEADERBOARD_ROUNDS: u32 = 2;

pub const MAX_PLAYER_NAME_LEN: usize = 50;
