//! Transport primitives for token endpoint exchanges.
//!
//! [`TokenHttpClient`] is the provider's only dependency on an HTTP stack. The provider
//! hands it a fully encoded [`TokenRequest`] and expects either a [`TokenResponse`]
//! snapshot (any status) or a [`TransportError`] when no status could be obtained.
//! [`ReqwestHttpClient`] is the default implementation; tests and embedders can plug in
//! their own.

// crates.io
use ::http::header::{HeaderName, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// `User-Agent` sent with token requests.
pub const USER_AGENT: &str = concat!("here-auth/", env!("CARGO_PKG_VERSION"));
/// Content type of the client-credentials request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Boxed future returned by [`TokenHttpClient::post_form`].
pub type TokenHttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to POST a form to the token endpoint.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by
/// every clone of a provider, and the returned future must be `Send` so callers can
/// drive refreshes from any executor thread. Implementations must honor
/// [`TokenRequest::timeout`] and report it as [`TransportError::Timeout`].
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` as `POST` with an `application/x-www-form-urlencoded` body.
	fn post_form(&self, request: TokenRequest) -> TokenHttpFuture<'_>;
}

/// Encoded token request.
#[derive(Clone)]
pub struct TokenRequest {
	/// Token endpoint.
	pub url: Url,
	/// Form-encoded body; contains the client secret.
	pub body: String,
	/// Upper bound for the whole exchange.
	pub timeout: StdDuration,
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("url", &self.url.as_str())
			.field("body", &"<redacted>")
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Snapshot of the token endpoint's answer.
#[derive(Clone, Debug, Default)]
pub struct TokenResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly, so the client built by [`ReqwestHttpClient::new`]
/// does not follow redirects. Configure any custom client passed to
/// [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_form(&self, request: TokenRequest) -> TokenHttpFuture<'_> {
		use ::http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};

		Box::pin(async move {
			let response = self
				.0
				.post(request.url)
				.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
				.header(ACCEPT, "application/json")
				.header(USER_AGENT_HEADER, USER_AGENT)
				.timeout(request.timeout)
				.body(request.body)
				.send()
				.await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok::<_, TransportError>(TokenResponse { status, headers, body })
		})
	}
}

/// Parses a `Retry-After` header (delta-seconds or HTTP-date) relative to the current clock.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	parse_retry_after_at(headers, OffsetDateTime::now_utc())
}

/// Parses a `Retry-After` header relative to `now`; past dates clamp to zero.
pub fn parse_retry_after_at(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let raw = header_str(headers, &RETRY_AFTER)?;

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}

	let moment = OffsetDateTime::parse(raw, &Rfc2822).ok()?;
	let delta = moment - now;

	Some(if delta.is_positive() { delta } else { Duration::ZERO })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
	let raw = headers.get(name)?.to_str().ok()?.trim();

	if raw.is_empty() { None } else { Some(raw) }
}

#[cfg(test)]
mod tests {
	// crates.io
	use ::http::HeaderValue;
	use time::macros;
	// self
	use super::*;

	fn headers(value: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static(value));

		headers
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		assert_eq!(parse_retry_after(&headers("30")), Some(Duration::seconds(30)));
		assert_eq!(parse_retry_after(&headers(" 0 ")), Some(Duration::ZERO));
	}

	#[test]
	fn retry_after_accepts_http_dates() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(
			parse_retry_after_at(&headers("Wed, 01 Jan 2025 00:02:00 +0000"), now),
			Some(Duration::minutes(2))
		);
		assert_eq!(
			parse_retry_after_at(&headers("Tue, 31 Dec 2024 23:00:00 +0000"), now),
			Some(Duration::ZERO)
		);
	}

	#[test]
	fn retry_after_ignores_missing_or_garbage_values() {
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
		assert_eq!(parse_retry_after(&headers("soon")), None);
		assert_eq!(parse_retry_after(&headers("-5")), None);
	}

	#[test]
	fn token_request_debug_redacts_body() {
		let request = TokenRequest {
			url: Url::parse("https://example.com/token").expect("Test URL should parse."),
			body: "client_secret=hunter2".into(),
			timeout: StdDuration::from_secs(1),
		};

		assert!(!format!("{request:?}").contains("hunter2"));
	}
}
