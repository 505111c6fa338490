use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Tie,
    Loss,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
        )
    }

    /// Outcome of playing `self` against `other`, from `self`'s point of view.
    pub fn against(self, other: Move) -> Outcome {
        if self == other {
            Outcome::Tie
        } else if self.beats(other) {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Move {
        Move::ALL[rng.gen_range(0..Move::ALL.len())]
    }

    /// Trivia servers number moves from zero: 0=Rock, 1=Paper, 2=Scissors.
    pub fn from_trivia_code(code: u8) -> Result<Move> {
        match code {
            0 => Ok(Move::Rock),
            1 => Ok(Move::Paper),
            2 => Ok(Move::Scissors),
            _ => Err(anyhow!("Invalid move code {}: expected 0 (Rock), 1 (Paper) or 2 (Scissors)", code)),
        }
    }

    pub fn trivia_code(self) -> u8 {
        match self {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 2,
        }
    }

    /// Bracket servers number moves from one and reserve 0 for "no move yet".
    pub fn from_bracket_code(code: u8) -> Result<Option<Move>> {
        match code {
            0 => Ok(None),
            1 => Ok(Some(Move::Rock)),
            2 => Ok(Some(Move::Paper)),
            3 => Ok(Some(Move::Scissors)),
            _ => Err(anyhow!("Invalid move code {}: expected 1 (Rock), 2 (Paper) or 3 (Scissors)", code)),
        }
    }

    pub fn bracket_code(mv: Option<Move>) -> u8 {
        match mv {
            None => 0,
            Some(Move::Rock) => 1,
            Some(Move::Paper) => 2,
            Some(Move::Scissors) => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "1" => Ok(Move::Rock),
            "paper" | "2" => Ok(Move::Paper),
            "scissors" | "scissor" | "3" => Ok(Move::Scissors),
            other => bail!("Invalid move: {}. Must be one of: rock, paper, scissors", other),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Win => "Win",
            Outcome::Tie => "Tie",
            Outcome::Loss => "Loss",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_move_beats_exactly_one() {
        for mv in Move::ALL {
            let beaten = Move::ALL.iter().filter(|other| mv.beats(**other)).count();
            assert_eq!(beaten, 1, "{} should beat exactly one move", mv);
            assert!(!mv.beats(mv));
        }
    }

    #[test]
    fn test_against() {
        assert_eq!(Move::Rock.against(Move::Scissors), Outcome::Win);
        assert_eq!(Move::Rock.against(Move::Paper), Outcome::Loss);
        assert_eq!(Move::Paper.against(Move::Paper), Outcome::Tie);
        assert_eq!(Move::Scissors.against(Move::Paper), Outcome::Win);
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(Move::from_trivia_code(0).unwrap(), Move::Rock);
        assert_eq!(Move::from_trivia_code(2).unwrap(), Move::Scissors);
        assert!(Move::from_trivia_code(3).is_err());

        assert_eq!(Move::from_bracket_code(0).unwrap(), None);
        assert_eq!(Move::from_bracket_code(1).unwrap(), Some(Move::Rock));
        assert!(Move::from_bracket_code(4).is_err());
        assert_eq!(Move::bracket_code(Some(Move::Scissors)), 3);
        assert_eq!(Move::bracket_code(None), 0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("ROCK".parse::<Move>().unwrap(), Move::Rock);
        assert_eq!(" paper ".parse::<Move>().unwrap(), Move::Paper);
        assert_eq!("3".parse::<Move>().unwrap(), Move::Scissors);
        assert!("lizard".parse::<Move>().is_err());
    }
}
