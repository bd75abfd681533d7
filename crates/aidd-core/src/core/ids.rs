// crates/aidd-core/src/core/ids.rs
// ============================================================================
// Module: Identifiers
// Description: Opaque string-backed identifier newtypes used throughout the
//   stage dispatch and gate engine.
// Purpose: Prevent accidental mixing of ticket numbers, scope keys, and other
//   plain strings at call sites.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every identifier in this crate is a thin wrapper around `String`. None of
//! them validate format beyond non-emptiness; callers that need stricter
//! shapes (for example [`ScopeKey`], which must already be sanitized) build
//! them only through [`crate::resolve_scope_key`].

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Declares a transparent, string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Builds a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Ticket identifier, e.g. `AIDD-142`.
    Ticket
);

string_id!(
    /// Free-text hint appended to a ticket to form a slug, e.g. `retry-limit`.
    SlugHint
);

string_id!(
    /// Sanitized, path-safe key derived from a ticket and optional slug hint.
    ///
    /// # Invariants
    /// - Only ever constructed by [`crate::resolve_scope_key`]; never built
    ///   directly from untrusted input by other crates.
    ScopeKey
);

string_id!(
    /// Monotonically increasing implement/review iteration marker, e.g. `03`.
    IterationId
);

string_id!(
    /// Identifier of a persisted QA handoff artifact.
    HandoffId
);

string_id!(
    /// Identifier of a persisted stage report artifact.
    ReportId
);
