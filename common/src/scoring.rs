use crate::{CORRECT_ANSWER_POINTS, Outcome, RPS_LOSS_POINTS, RPS_TIE_POINTS, RPS_WIN_POINTS};

pub fn outcome_points(outcome: Outcome) -> u32 {
    match outcome {
        Outcome::Win => RPS_WIN_POINTS,
        Outcome::Tie => RPS_TIE_POINTS,
        Outcome::Loss => RPS_LOSS_POINTS,
    }
}

/// Score for one trivia round: answer bonus plus the RPS result.
pub fn round_score(answer_correct: bool, outcome: Outcome) -> u32 {
    let answer_points = if answer_correct { CORRECT_ANSWER_POINTS } else { 0 };
    answer_points + outcome_points(outcome)
}
