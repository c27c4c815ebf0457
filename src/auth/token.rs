//! Immutable cached bearer token and its freshness rules.

pub mod secret;

// self
use crate::{_prelude::*, auth::Secret};

/// Freshness of a cached token relative to an instant and a refresh skew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token may be handed out without refreshing.
	Fresh,
	/// Token is inside the refresh skew window: still accepted upstream, but due for renewal.
	Stale,
	/// Token reached its expiry instant.
	Expired,
}

/// Bearer token issued by the token endpoint.
///
/// Instances are never mutated; a refresh installs a new value in the provider's slot.
#[derive(Clone)]
pub struct CachedToken {
	value: Secret,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Creates a token with an absolute expiry.
	pub fn new(
		value: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { value: Secret::new(value), issued_at, expires_at }
	}

	/// Bearer token value. Callers must avoid logging it.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// Instant the token endpoint answered.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Instant the token stops being accepted upstream.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Computes the status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime, refresh_skew: Duration) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}
		// A skew reaching past the representable range keeps the token permanently stale.
		match self.expires_at.checked_sub(refresh_skew) {
			Some(renew_at) if instant < renew_at => TokenStatus::Fresh,
			_ => TokenStatus::Stale,
		}
	}

	/// Returns `true` if the token can be used without refreshing at `instant`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, refresh_skew: Duration) -> bool {
		matches!(self.status_at(instant, refresh_skew), TokenStatus::Fresh)
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Formats the `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.value.expose())
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
