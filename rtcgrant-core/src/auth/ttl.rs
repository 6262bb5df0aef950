//! Token validity windows
//!
//! A window is either a number of seconds, a duration expression such as
//! `"2h"` or `"10 minutes"`, or an absolute expiry instant.

use crate::{GrantError, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default token lifetime: 6 hours
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Latest expiry a token may carry: 9999-12-31T23:59:59Z
pub const MAX_EXPIRY: u64 = 253_402_300_799;

const MINUTE: f64 = 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// How long an issued token stays valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ttl {
    /// Seconds from the signing instant
    Seconds(u64),
    /// Duration expression relative to the signing instant
    Expression(String),
    /// Absolute expiry
    At(SystemTime),
}

impl Ttl {
    /// Build an expression window, rejecting anything that does not parse
    pub fn expression(expr: impl Into<String>) -> Result<Self> {
        let expr = expr.into();
        parse_duration(&expr)?;
        Ok(Ttl::Expression(expr))
    }

    /// Check that the window can be resolved
    pub fn validate(&self) -> Result<()> {
        let secs = match self {
            Ttl::Seconds(secs) => *secs,
            Ttl::Expression(expr) => parse_duration(expr)?.as_secs(),
            Ttl::At(at) => epoch_secs(at)?,
        };
        if secs > MAX_EXPIRY {
            return Err(beyond_max(self));
        }
        Ok(())
    }

    /// Expiry as seconds since the epoch for a token signed at `now`
    pub fn expires_at(&self, now: u64) -> Result<u64> {
        let expiry = match self {
            Ttl::Seconds(secs) => now.checked_add(*secs),
            Ttl::Expression(expr) => now.checked_add(parse_duration(expr)?.as_secs()),
            Ttl::At(at) => Some(epoch_secs(at)?),
        };
        match expiry {
            Some(expiry) if expiry <= MAX_EXPIRY => Ok(expiry),
            _ => Err(beyond_max(self)),
        }
    }
}

fn epoch_secs(at: &SystemTime) -> Result<u64> {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| GrantError::Configuration("expiry is before the unix epoch".to_string()))
}

fn beyond_max(ttl: &Ttl) -> GrantError {
    GrantError::Configuration(format!("expiry {} is past {}", ttl, MAX_EXPIRY))
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::Seconds(DEFAULT_TTL.as_secs())
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Seconds(duration.as_secs())
    }
}

impl From<SystemTime> for Ttl {
    fn from(at: SystemTime) -> Self {
        Ttl::At(at)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Seconds(secs) => write!(f, "{}s", secs),
            Ttl::Expression(expr) => write!(f, "{}", expr),
            Ttl::At(at) => match at.duration_since(UNIX_EPOCH) {
                Ok(d) => write!(f, "@{}", d.as_secs()),
                Err(_) => write!(f, "@<before epoch>"),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Seconds(u64),
            Expression(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Seconds(secs) => Ok(Ttl::Seconds(secs)),
            Repr::Expression(expr) => Ttl::expression(expr).map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a duration expression.
///
/// Supported forms are a number (integer or decimal) followed by an
/// optional space and a unit:
/// - `s`, `sec`, `secs`, `second`, `seconds`
/// - `m`, `min`, `mins`, `minute`, `minutes`
/// - `h`, `hr`, `hrs`, `hour`, `hours`
/// - `d`, `day`, `days`
/// - `w`, `week`, `weeks`
/// - `y`, `yr`, `yrs`, `year`, `years`
pub fn parse_duration(expr: &str) -> Result<Duration> {
    let invalid = || GrantError::Configuration(format!("invalid duration expression: '{}'", expr));

    let s = expr.trim().to_lowercase();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(invalid)?;
    let (num_str, unit) = s.split_at(split);
    let unit = unit.strip_prefix(' ').unwrap_or(unit);

    if num_str.is_empty() || num_str.starts_with('.') || num_str.ends_with('.') {
        return Err(invalid());
    }
    let value: f64 = num_str.parse().map_err(|_| invalid())?;

    let scale = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return Err(invalid()),
    };

    Ok(Duration::from_secs((value * scale).round() as u64))
}
