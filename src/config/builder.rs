// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	config::{DEFAULT_REFRESH_SKEW, DEFAULT_TIMEOUT, DEFAULT_TOKEN_URL, TokenEndpointConfig},
	error::ConfigError,
};

/// Builder for [`TokenEndpointConfig`] values.
#[derive(Debug)]
pub struct TokenEndpointConfigBuilder {
	/// Token endpoint; the HERE default when unset.
	pub url: Option<Url>,
	/// Request timeout.
	pub timeout: StdDuration,
	/// Proactive refresh margin.
	pub refresh_skew: Duration,
}
impl Default for TokenEndpointConfigBuilder {
	fn default() -> Self {
		Self { url: None, timeout: DEFAULT_TIMEOUT, refresh_skew: DEFAULT_REFRESH_SKEW }
	}
}
impl TokenEndpointConfigBuilder {
	/// Sets the token endpoint.
	pub fn url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}

	/// Sets the request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the refresh skew (defaults to five minutes).
	pub fn refresh_skew(mut self, skew: Duration) -> Self {
		self.refresh_skew = skew;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<TokenEndpointConfig, ConfigError> {
		let url = match self.url {
			Some(url) => url,
			None => Url::parse(DEFAULT_TOKEN_URL)
				.map_err(|source| ConfigError::InvalidTokenUrl { source })?,
		};
		let config =
			TokenEndpointConfig { url, timeout: self.timeout, refresh_skew: self.refresh_skew };

		config.validate()?;

		Ok(config)
	}
}

impl TokenEndpointConfig {
	/// Validates invariants for the config.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.timeout.is_zero() {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if self.refresh_skew.is_negative() {
			return Err(ConfigError::NegativeRefreshSkew);
		}

		validate_endpoint(&self.url)
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureTokenUrl { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
