//! Token endpoint configuration consumed by the credential provider.
//!
//! Values come from [`TokenEndpointConfigBuilder`] or from the environment:
//!
//! - `HERE_OAUTH_TOKEN_URL` overrides the token endpoint.
//! - `HERE_HTTP_TIMEOUT_SECONDS` overrides the request timeout (fractional seconds allowed).
//! - `HERE_TOKEN_REFRESH_SKEW_SECONDS` overrides the proactive refresh margin.
//!
//! Blank variables are ignored so CI can export empty placeholders.

/// Builder API for assembling endpoint configs.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Default OAuth 2.0 token endpoint for HERE accounts.
pub const DEFAULT_TOKEN_URL: &str = "https://account.api.here.com/oauth2/token";
/// Default timeout applied to each token request.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Default margin subtracted from a token's expiry before it is renewed.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::minutes(5);

/// Environment variable overriding the token endpoint URL.
pub const ENV_TOKEN_URL: &str = "HERE_OAUTH_TOKEN_URL";
/// Environment variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT_SECONDS: &str = "HERE_HTTP_TIMEOUT_SECONDS";
/// Environment variable overriding the refresh skew in seconds.
pub const ENV_REFRESH_SKEW_SECONDS: &str = "HERE_TOKEN_REFRESH_SKEW_SECONDS";

/// Immutable token endpoint settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEndpointConfig {
	/// Token endpoint receiving the client-credentials POST.
	pub url: Url,
	/// Upper bound for a single token request, connect included.
	pub timeout: StdDuration,
	/// Margin subtracted from `expires_at` when deciding whether a token is usable.
	pub refresh_skew: Duration,
}
impl TokenEndpointConfig {
	/// Creates a new builder seeded with the defaults.
	pub fn builder() -> TokenEndpointConfigBuilder {
		TokenEndpointConfigBuilder::default()
	}

	/// Reads overrides from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads overrides through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &'static str| {
			lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let mut builder = Self::builder();

		if let Some(raw) = read(ENV_TOKEN_URL) {
			builder =
				builder.url(Url::parse(&raw).map_err(|source| ConfigError::InvalidTokenUrl { source })?);
		}
		if let Some(raw) = read(ENV_TIMEOUT_SECONDS) {
			let timeout = raw
				.parse::<f64>()
				.ok()
				.and_then(|secs| StdDuration::try_from_secs_f64(secs).ok())
				.ok_or(ConfigError::InvalidEnvironment { name: ENV_TIMEOUT_SECONDS, value: raw })?;

			builder = builder.timeout(timeout);
		}
		if let Some(raw) = read(ENV_REFRESH_SKEW_SECONDS) {
			let secs = raw.parse::<i64>().map_err(|_| ConfigError::InvalidEnvironment {
				name: ENV_REFRESH_SKEW_SECONDS,
				value: raw,
			})?;

			builder = builder.refresh_skew(Duration::seconds(secs));
		}

		builder.build()
	}
}
