//! Robot command tokens.
//!
//! [`Command`] is the closed set of single-character tokens a client may
//! submit. Tokens are upper case on the way in and lower case on the way out
//! to observers, which forward them verbatim as key presses to the robot.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::RelayError;

/// A single admissible robot command.
///
/// Commands carry no identity beyond their value: two queued `W`s are
/// indistinguishable and both are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `W` — walk forward.
    Forward,
    /// `A` — strafe left.
    StrafeLeft,
    /// `S` — walk backward.
    Back,
    /// `D` — strafe right.
    StrafeRight,
    /// `Q` — rotate left.
    RotateLeft,
    /// `E` — rotate right.
    RotateRight,
    /// `T` — the disruptive special action, admitted only by chance.
    SpecialAction,
}

impl Command {
    /// Every admissible command, in alphabet order `W A S D Q E T`.
    pub const ALL: [Self; 7] = [
        Self::Forward,
        Self::StrafeLeft,
        Self::Back,
        Self::StrafeRight,
        Self::RotateLeft,
        Self::RotateRight,
        Self::SpecialAction,
    ];

    /// Parses a raw submitted token. Only the exact upper-case characters
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidCommand`] for anything outside the
    /// admissible alphabet.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        match raw {
            "W" => Ok(Self::Forward),
            "A" => Ok(Self::StrafeLeft),
            "S" => Ok(Self::Back),
            "D" => Ok(Self::StrafeRight),
            "Q" => Ok(Self::RotateLeft),
            "E" => Ok(Self::RotateRight),
            "T" => Ok(Self::SpecialAction),
            _ => Err(RelayError::InvalidCommand),
        }
    }

    /// The submitted (upper-case) token.
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Self::Forward => 'W',
            Self::StrafeLeft => 'A',
            Self::Back => 'S',
            Self::StrafeRight => 'D',
            Self::RotateLeft => 'Q',
            Self::RotateRight => 'E',
            Self::SpecialAction => 'T',
        }
    }

    /// Returns `true` for the probabilistically gated special action.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, Self::SpecialAction)
    }

    /// The line written to observers: lower-cased token plus newline.
    #[must_use]
    pub fn frame(self) -> String {
        format!("{}\n", self.token().to_ascii_lowercase())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for Command {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
