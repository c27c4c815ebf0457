//! Token refresh telemetry.
//!
//! Each trip to the token endpoint is one refresh. It is labeled with what caused it
//! ([`RefreshTrigger`]) and how it ended ([`RefreshOutcome`]), the latter derived from the
//! fetch result so a rejected credential and an unreachable endpoint stay distinguishable
//! on dashboards.
//!
//! # Feature Flags
//!
//! - `tracing`: every refresh runs inside a `here_auth.refresh` span whose `outcome` field is
//!   filled in when the fetch ends; serving a stale token emits a warning event.
//! - `metrics`: `here_auth_token_refresh_total{trigger, outcome}` counts refreshes,
//!   `here_auth_token_refresh_seconds{trigger}` records their latency, and
//!   `here_auth_stale_token_served_total` counts stale fallbacks.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{
	_prelude::*,
	error::{ClassifiedError, ErrorKind},
};

/// What sent the provider to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
	/// A caller found no token, or one inside the skew window.
	Lazy,
	/// A caller asked for a new token regardless of the cached one.
	Forced,
}
impl RefreshTrigger {
	/// Label used for span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Lazy => "lazy",
			Self::Forced => "forced",
		}
	}
}
impl Display for RefreshTrigger {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a refresh ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// A new token replaced the slot contents.
	Installed,
	/// The endpoint answered but no usable token came back.
	Rejected,
	/// No answer arrived: timeout, DNS, or connection failure.
	Unreachable,
}
impl RefreshOutcome {
	/// Derives the outcome from a finished fetch.
	pub fn of<T>(result: &Result<T, ClassifiedError>) -> Self {
		match result {
			Ok(_) => Self::Installed,
			Err(err) if err.kind == ErrorKind::Transport => Self::Unreachable,
			Err(_) => Self::Rejected,
		}
	}

	/// Label used for span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Installed => "installed",
			Self::Rejected => "rejected",
			Self::Unreachable => "unreachable",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
