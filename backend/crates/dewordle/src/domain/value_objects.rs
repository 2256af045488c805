//! Domain Value Objects
//!
//! Validated, immutable inputs. Anything constructed here has already passed
//! the input constraints, so use cases never re-check them.

use derive_more::Display;
use std::str::FromStr;

/// Identifier of a game in the catalog (Dewordle itself is `1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub struct GameId(i32);

impl GameId {
    pub const DEWORDLE: GameId = GameId(1);

    pub fn new(id: i32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Outcome of one completed game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Outcome {
    #[display("win")]
    Win,
    #[display("loss")]
    Loss,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

/// Error returned for an outcome that is neither `win` nor `loss`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized outcome: {0:?} (expected \"win\" or \"loss\")")]
pub struct UnknownOutcome(pub String);

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            _ => Err(UnknownOutcome(s.to_string())),
        }
    }
}

/// Score of one game, `0..=i32::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub struct Score(i32);

impl Score {
    pub fn new(raw: i64) -> Option<Self> {
        i32::try_from(raw).ok().filter(|v| *v >= 0).map(Self)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Number of guesses used in one game, at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub struct Guesses(i16);

impl Guesses {
    pub fn new(raw: i64) -> Option<Self> {
        i16::try_from(raw).ok().filter(|v| *v >= 1).map(Self)
    }

    pub fn value(&self) -> i16 {
        self.0
    }
}

/// User name: 3-32 ASCII letters, digits, `_` or `-`
///
/// Uniqueness is case-insensitive, so the lowercase form is kept alongside
/// the name as typed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{original}")]
pub struct UserName {
    original: String,
    canonical: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserNameError {
    #[error("User name must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("User name may only contain letters, digits, '_' and '-'")]
    InvalidCharacter,
}

impl UserName {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 32;

    pub fn new(raw: impl Into<String>) -> Result<Self, UserNameError> {
        let original = raw.into().trim().to_string();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&original.len()) {
            return Err(UserNameError::Length {
                min: Self::MIN_LEN,
                max: Self::MAX_LEN,
            });
        }
        if !original
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(UserNameError::InvalidCharacter);
        }
        let canonical = original.to_ascii_lowercase();
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Rebuild from trusted storage without validation
    pub(crate) fn from_stored(original: String, canonical: String) -> Self {
        Self {
            original,
            canonical,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// Requested window into a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}
