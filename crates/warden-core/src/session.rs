use crate::error::{WardenError, WardenResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Environment variable holding the session time-to-live in seconds.
pub const SESSION_DURATION_ENV: &str = "SESSION_DURATION";

/// A session token bound to a user and the moment it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque UUID-v4 token handed to the client.
    pub session_id: String,
    /// The user the token authenticates.
    pub user_id: String,
    /// Issue time, UTC.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record from its parts.
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            created_at,
        }
    }

    /// When this record stops resolving, or `None` if it never expires.
    pub fn expires_at(&self, duration: SessionDuration) -> Option<DateTime<Utc>> {
        duration.as_chrono().map(|ttl| self.created_at + ttl)
    }

    /// A record is expired strictly after `created_at + duration`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, duration: SessionDuration) -> bool {
        self.expires_at(duration).is_some_and(|deadline| now > deadline)
    }
}

/// Session time-to-live in whole seconds. Zero or negative means "never expires".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDuration(i64);

impl SessionDuration {
    /// Sessions never expire.
    pub const UNBOUNDED: SessionDuration = SessionDuration(0);

    /// A duration of `secs` seconds.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Raw seconds as configured.
    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// True when sessions never expire.
    pub fn is_unbounded(self) -> bool {
        self.0 <= 0
    }

    /// The TTL as a chrono duration, `None` when unbounded.
    pub fn as_chrono(self) -> Option<Duration> {
        if self.is_unbounded() {
            None
        } else {
            Some(Duration::seconds(self.0))
        }
    }

    /// Parse an integer number of seconds.
    pub fn parse(raw: &str) -> WardenResult<Self> {
        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| WardenError::Config(format!("{SESSION_DURATION_ENV}={raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(SessionDuration::parse("60").unwrap().as_secs(), 60);
        assert_eq!(SessionDuration::parse(" 5 ").unwrap().as_secs(), 5);
        assert!(SessionDuration::parse("-3").unwrap().is_unbounded());
        assert!(matches!(
            SessionDuration::parse("soon"),
            Err(WardenError::Config(_))
        ));
    }

    #[test]
    fn test_zero_never_expires() {
        let record = SessionRecord::new("s", "u", Utc::now());
        let far_future = record.created_at + Duration::days(10_000);
        assert!(record.expires_at(SessionDuration::UNBOUNDED).is_none());
        assert!(!record.is_expired_at(far_future, SessionDuration::UNBOUNDED));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let record = SessionRecord::new("s", "u", Utc::now());
        let ttl = SessionDuration::from_secs(1);
        let deadline = record.created_at + Duration::seconds(1);

        assert!(!record.is_expired_at(deadline, ttl));
        assert!(record.is_expired_at(deadline + Duration::milliseconds(1), ttl));
    }

    #[test]
    fn test_record_json_shape() {
        let record = SessionRecord::new("abc", "u1", Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["session_id"], "abc");
        assert_eq!(value["user_id"], "u1");
        assert!(value["created_at"].is_string());
    }
}
