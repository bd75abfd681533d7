// crates/aidd-core/src/core/time.rs
// ============================================================================
// Module: Time Model
// Description: Canonical wall-clock timestamp representation for persisted
//   records.
// Purpose: Give active state, stage results, and event logs a single,
//   human-readable timestamp type.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every timestamp persisted by this system (`updated_at`, `stage_entered_at`,
//! event log entries) is an ISO-8601 UTC string. [`Timestamp`] wraps
//! `time::OffsetDateTime` and serializes as that string rather than as a
//! tagged enum, since nothing in this system replays logical time the way an
//! evidence-trigger log would.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Canonical timestamp used across persisted AIDD artifacts.
///
/// # Invariants
/// - Always represents an instant in UTC.
/// - Serializes to and parses from RFC 3339 text, matching the persisted
///   JSON artifacts described in the external interface contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i128);

impl Timestamp {
    /// Builds a timestamp from an `OffsetDateTime`, normalizing to UTC.
    #[must_use]
    pub fn from_offset(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC).unix_timestamp_nanos())
    }

    /// Returns the timestamp as an `OffsetDateTime`.
    #[must_use]
    pub fn to_offset(self) -> OffsetDateTime {
        // `unix_timestamp_nanos` always round-trips for values produced by
        // `from_offset`, so the fallback branch below is unreachable in
        // practice but kept to avoid panicking on adversarial input.
        OffsetDateTime::from_unix_timestamp_nanos(self.0).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Parses a timestamp from an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns an error when `text` is not valid RFC 3339.
    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(text, &Rfc3339).map(Self::from_offset)
    }

    /// Formats the timestamp as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns an error only when the underlying formatter fails, which does
    /// not happen for any value constructed via [`Timestamp::from_offset`].
    pub fn to_rfc3339(self) -> Result<String, time::error::Format> {
        self.to_offset().format(&Rfc3339)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self
            .to_rfc3339()
            .map_err(|err| serde::ser::Error::custom(err.to_string()))?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(|err| D::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn round_trips_through_rfc3339() {
        let parsed = Timestamp::parse("2026-07-28T12:00:00Z").expect("valid rfc3339");
        let text = parsed.to_rfc3339().expect("formats");
        assert_eq!(text, "2026-07-28T12:00:00Z");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Timestamp::parse("not-a-timestamp").is_err());
    }

    #[test]
    fn orders_chronologically() {
        let earlier = Timestamp::parse("2026-01-01T00:00:00Z").expect("valid");
        let later = Timestamp::parse("2026-06-01T00:00:00Z").expect("valid");
        assert!(earlier < later);
    }
}
