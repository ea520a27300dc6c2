//! Validity windows of states and the clock they are measured against.
//!
//! All times are whole seconds. A duration with a [`Limit::Temporary`]
//! limit has no validity of its own: it lasts only as long as something
//! keeps the state applied.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Token used in the persisted form for an unbounded limit.
pub const FOREVER_TOKEN: &str = "FOREVER";

/// Error type for persisted duration strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("Unexpected token count {count} in duration {text:?}")]
    TokenCount { count: usize, text: String },
    #[error("Invalid duration token {token:?} in {text:?}")]
    InvalidToken { token: String, text: String },
}

/// Source of the current time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock time since the unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Units accepted by `over(limit, unit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn to_seconds(&self, amount: u64) -> u64 {
        let factor = match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 60 * 60,
            TimeUnit::Days => 24 * 60 * 60,
        };
        amount.saturating_mul(factor)
    }
}

/// The limit of a validity window.
///
/// Ordered `Temporary < Seconds(_) < Forever`; a limit of zero seconds is
/// the temporary sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Limit {
    Temporary,
    Seconds(u64),
    Forever,
}

impl Limit {
    /// A limit in seconds, normalizing zero to [`Limit::Temporary`].
    pub fn seconds(seconds: u64) -> Self {
        if seconds == 0 {
            Limit::Temporary
        } else {
            Limit::Seconds(seconds)
        }
    }

    pub fn of(amount: u64, unit: TimeUnit) -> Self {
        Self::seconds(unit.to_seconds(amount))
    }

    /// Whether the limit is explicit (anything but temporary).
    pub fn is_explicit(&self) -> bool {
        *self > Limit::Temporary
    }

    fn token(&self) -> String {
        match self {
            Limit::Temporary => "0".to_string(),
            Limit::Seconds(s) => s.to_string(),
            Limit::Forever => FOREVER_TOKEN.to_string(),
        }
    }
}

/// The point in time a duration stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum End {
    At(u64),
    Never,
}

/// A validity window `[start, start + limit)`.
///
/// A frozen duration records the elapsed time at the moment it was
/// snapshotted and no longer advances with the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub start: u64,
    pub limit: Limit,
    pub elapsed: Option<u64>,
}

impl Duration {
    pub fn new(start: u64, limit: Limit) -> Self {
        Self {
            start,
            limit,
            elapsed: None,
        }
    }

    /// A temporary duration starting at `start`.
    pub fn temporary(start: u64) -> Self {
        Self::new(start, Limit::Temporary)
    }

    pub fn is_temporary(&self) -> bool {
        self.limit == Limit::Temporary
    }

    pub fn is_frozen(&self) -> bool {
        self.elapsed.is_some()
    }

    /// Seconds elapsed since `start`, or the recorded value if frozen.
    pub fn elapsed(&self, now: u64) -> u64 {
        self.elapsed
            .unwrap_or_else(|| now.saturating_sub(self.start))
    }

    /// End of the validity window.
    pub fn end(&self) -> End {
        match self.limit {
            Limit::Temporary => End::At(self.start),
            Limit::Seconds(s) => End::At(self.start.saturating_add(s)),
            Limit::Forever => End::Never,
        }
    }

    /// Seconds left before the window closes; `None` for unbounded windows.
    pub fn remaining(&self, now: u64) -> Option<u64> {
        match self.limit {
            Limit::Temporary => Some(0),
            Limit::Seconds(s) => Some(s.saturating_sub(self.elapsed(now))),
            Limit::Forever => None,
        }
    }

    /// Whether the window has closed. A temporary window is always closed.
    pub fn expired(&self, now: u64) -> bool {
        match self.limit {
            Limit::Temporary => true,
            Limit::Seconds(s) => self.elapsed(now) >= s,
            Limit::Forever => false,
        }
    }

    /// Snapshot of this duration with the elapsed time recorded at `now`.
    pub fn frozen(&self, now: u64) -> Self {
        Self {
            start: self.start,
            limit: self.limit,
            elapsed: Some(self.elapsed(now)),
        }
    }

    /// Whether this window outlasts `other` as seen at `now`.
    pub fn outlasts(&self, other: &Duration, now: u64) -> bool {
        match (self.remaining(now), other.remaining(now)) {
            (None, None) => false,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a > b,
        }
    }

    /// Parse `"<start> <limit>[ <elapsed>]"` or the legacy `"<start>"`.
    pub fn parse(text: &str) -> Result<Self, DurationError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let number = |token: &str| -> Result<u64, DurationError> {
            token.parse().map_err(|_| DurationError::InvalidToken {
                token: token.to_string(),
                text: text.to_string(),
            })
        };
        let limit = |token: &str| -> Result<Limit, DurationError> {
            if token == FOREVER_TOKEN {
                Ok(Limit::Forever)
            } else {
                number(token).map(Limit::seconds)
            }
        };

        match tokens.as_slice() {
            [start] => Ok(Self::temporary(number(start)?)),
            [start, lim] => Ok(Self::new(number(start)?, limit(lim)?)),
            [start, lim, elapsed] => Ok(Self {
                start: number(start)?,
                limit: limit(lim)?,
                elapsed: Some(number(elapsed)?),
            }),
            _ => Err(DurationError::TokenCount {
                count: tokens.len(),
                text: text.to_string(),
            }),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.limit.token())?;
        if let Some(elapsed) = self.elapsed {
            write!(f, " {elapsed}")?;
        }
        Ok(())
    }
}
