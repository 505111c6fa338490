use serde::{Deserialize, Serialize};

// Status enums travel as their integer discriminant, which is what the
// dashboard and the client scripts compare against.
macro_rules! numeric_status {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
        #[serde(into = "u8", try_from = "u8")]
        pub enum $name {
            $($variant = $value),+
        }

        impl From<$name> for u8 {
            fn from(status: $name) -> u8 {
                status as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(format!("invalid {} value: {}", stringify!($name), other)),
                }
            }
        }
    };
}

numeric_status! {
    /// Lifecycle of a trivia tournament
    TournamentStatus { Pending = 0, InProgress = 1, Completed = 2 }
}

numeric_status! {
    RoundStatus { Pending = 0, InProgress = 1, Completed = 2 }
}

numeric_status! {
    /// Lifecycle of a bracket tournament; it starts on its own once every seat is taken
    BracketStatus { WaitingForPlayers = 0, InProgress = 1, Completed = 2 }
}

numeric_status! {
    MatchStatus { Pending = 0, InProgress = 1, Completed = 2 }
}
