//! Identifiers used across the ticketing engine.
//!
//! Event/Seat/Reservation/Booking ids mirror the 64-bit surrogate primary
//! keys of the relational schema (§6.2): they are assigned by the database,
//! never generated client-side. `RequestId` and `BookingReference` are
//! 128-bit time-ordered identifiers (ULIDs) instead, since both need to be
//! mintable before any row exists and to sort lexicographically by creation
//! time.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! surrogate_id {
    ($name:ident) => {
        #[doc = concat!("Surrogate 64-bit identity primary key for a `", stringify!($name), "`.")]
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identity value.
            #[must_use]
            pub const fn from_raw(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database identity value.
            #[must_use]
            pub const fn as_raw(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

surrogate_id!(EventId);
surrogate_id!(SeatId);
surrogate_id!(ReservationId);
surrogate_id!(BookingId);

/// Authenticated principal identity, as carried by the `X-User-ID` header.
///
/// Full authentication is out of scope here; a request is simply assumed to
/// already carry a verified identity by the time it reaches the engine.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw principal identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the principal identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Handle for a v2 queued request, a 128-bit time-ordered identifier the
/// client polls via `GET /v2/reservations/{request_id}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Ulid);

impl RequestId {
    /// Mints a fresh, time-ordered request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parses a request id previously rendered with [`RequestId::to_string`].
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid ULID string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ulid::from_string(s).map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique, time-sortable, opaque booking reference quoted back to
/// the user (e.g. in confirmation emails or receipts).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingReference(Ulid);

impl BookingReference {
    /// Mints a fresh booking reference.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parses a booking reference previously rendered with
    /// [`BookingReference::to_string`] (the `BK-` prefix is required).
    ///
    /// # Errors
    ///
    /// Returns an error if `s` does not carry the `BK-` prefix or the
    /// remainder is not a valid ULID string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        let rest = s.strip_prefix("BK-").unwrap_or(s);
        Ulid::from_string(rest).map(Self)
    }
}

impl Default for BookingReference {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BK-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrogate_id_roundtrips_raw_value() {
        let id = SeatId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn request_id_roundtrips_through_string() {
        let id = RequestId::new();
        let parsed = RequestId::parse(&id.to_string()).expect("valid ulid");
        assert_eq!(id, parsed);
    }

    #[test]
    fn booking_reference_is_prefixed_and_opaque() {
        let reference = BookingReference::new();
        let rendered = reference.to_string();
        assert!(rendered.starts_with("BK-"));
        assert_eq!(rendered.len(), 3 + 26);
    }

    #[test]
    fn booking_references_sort_by_creation_order() {
        let first = BookingReference::new();
        let second = BookingReference::new();
        assert!(first.to_string() <= second.to_string());
    }
}
