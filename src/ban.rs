//! Ban record model and expiration semantics.
//!
//! Records are stored as five text fields; timestamps use a sortable
//! `%Y-%m-%dT%H:%M:%S` form in UTC. An empty or unparsable expiration
//! means the ban is permanent.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Timestamp layout used for `created_at` / `expires_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A banned CIDR range.
///
/// Fields are immutable once stored; an update is modeled as delete+add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRecord {
    /// CIDR block, e.g. "10.0.0.0/8". Unique key within the registry.
    pub network: String,
    /// Free-text reason, may be empty.
    pub reason: String,
    /// Who issued the ban; empty for system-issued bans.
    pub issued_by: String,
    /// Creation timestamp (UTC).
    pub created_at: String,
    /// Expiration timestamp; empty (or unparsable) means permanent.
    pub expires_at: String,
}

/// Expiration state of a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanState {
    /// No expiration, or an expiration that does not parse as a timestamp.
    Permanent,
    /// Expiration is strictly in the future.
    Active,
    /// Expiration has passed; the record should be evicted on the next lookup.
    Expired,
}

impl BanRecord {
    /// Create a permanent ban record.
    pub fn permanent(
        network: impl Into<String>,
        reason: impl Into<String>,
        issued_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            network: network.into(),
            reason: reason.into(),
            issued_by: issued_by.into(),
            created_at: format_timestamp(created_at),
            expires_at: String::new(),
        }
    }

    /// Create a temporary ban record expiring at `expires_at`.
    pub fn temporary(
        network: impl Into<String>,
        reason: impl Into<String>,
        issued_by: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            expires_at: format_timestamp(expires_at),
            ..Self::permanent(network, reason, issued_by, created_at)
        }
    }

    /// Parsed expiration instant, if the stored text parses.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.expires_at)
    }

    /// Evaluate the expiration state machine at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> BanState {
        match self.expiry() {
            None => BanState::Permanent,
            Some(expiry) if now < expiry => BanState::Active,
            Some(_) => BanState::Expired,
        }
    }

    /// The disconnect line shown to a banned peer.
    pub fn rejection_message(&self, now: DateTime<Utc>) -> String {
        match self.expiry() {
            None => format!("You are banned forever: {}", self.reason),
            Some(expiry) => format!(
                "You are banned for {}: {}",
                remaining_description(expiry - now),
                self.reason
            ),
        }
    }
}

/// Render a timestamp in the stored text layout.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Returns `None` for empty or malformed text.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Describe a remaining duration using its largest two non-zero units.
///
/// Units are months (30-day), days, hours, minutes, seconds; the first
/// non-zero unit is paired with the next finer one, and a remainder under
/// one minute is seconds alone. The month branch reports the total day
/// count, matching the wire-compatible output of the legacy implementation.
pub fn remaining_description(remaining: Duration) -> String {
    let days = remaining.num_days();
    let months = days / 30;
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    let seconds = remaining.num_seconds().max(0) % 60;

    if months > 0 {
        format!(
            "{} month{} and {} day{}",
            months,
            plural(months),
            days,
            plural(days)
        )
    } else if days > 0 {
        format!(
            "{} day{} and {} hour{}",
            days,
            plural(days),
            hours,
            plural(hours)
        )
    } else if hours > 0 {
        format!(
            "{} hour{} and {} minute{}",
            hours,
            plural(hours),
            minutes,
            plural(minutes)
        )
    } else if minutes > 0 {
        format!(
            "{} minute{} and {} second{}",
            minutes,
            plural(minutes),
            seconds,
            plural(seconds)
        )
    } else {
        format!("{} second{}", seconds, plural(seconds))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
