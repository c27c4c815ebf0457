//! Crate-level error types: configuration misuse, the classified HTTP taxonomy, and
//! transport failures.

// self
use crate::{_prelude::*, auth::CredentialMode};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Misuse or invalid configuration; never retryable.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Classified failure from the token endpoint or an API response.
	#[error(transparent)]
	Classified(#[from] ClassifiedError),
}
impl Error {
	/// Returns the taxonomy kind when the error is a [`ClassifiedError`].
	pub fn kind(&self) -> Option<ErrorKind> {
		self.as_classified().map(|err| err.kind)
	}

	/// Borrows the inner [`ClassifiedError`], if any.
	pub fn as_classified(&self) -> Option<&ClassifiedError> {
		match self {
			Self::Classified(err) => Some(err),
			Self::Config(_) => None,
		}
	}

	/// Returns `true` when the caller may retry the operation after backing off.
	pub fn is_retryable(&self) -> bool {
		self.kind().is_some_and(ErrorKind::is_retryable)
	}
}

/// Configuration and misuse failures, kept apart from the runtime taxonomy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An operation was called on a provider configured for the other credential mode.
	#[error("`{operation}` is not available in {mode} mode.")]
	ModeMismatch {
		/// Name of the rejected operation.
		operation: &'static str,
		/// Mode the provider was constructed with.
		mode: CredentialMode,
	},
	/// A credential field was empty or whitespace.
	#[error("Credential field `{field}` must not be empty.")]
	EmptyCredential {
		/// Name of the offending field.
		field: &'static str,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint must use HTTPS unless it points at a loopback host.
	#[error("Token endpoint must use HTTPS: {url}.")]
	InsecureTokenUrl {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Request timeout must be strictly positive.
	#[error("Token endpoint timeout must be positive.")]
	NonPositiveTimeout,
	/// Refresh skew must not be negative.
	#[error("Refresh skew must not be negative.")]
	NegativeRefreshSkew,
	/// Environment variable holds a value that cannot be interpreted.
	#[error("Environment variable {name} has an invalid value: {value:?}.")]
	InvalidEnvironment {
		/// Variable name.
		name: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Taxonomy of runtime failures surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Bad or expired credentials (401/403, or a failed token exchange).
	Auth,
	/// Upstream throttling (429).
	RateLimit,
	/// Malformed request or unparsable response.
	Client,
	/// Upstream failure (5xx).
	Server,
	/// Connectivity failure or timeout before any status was received.
	Transport,
}
impl ErrorKind {
	/// Maps an HTTP status that is not 2xx to its kind.
	pub const fn from_status(status: u16) -> Self {
		match status {
			401 | 403 => Self::Auth,
			429 => Self::RateLimit,
			500.. => Self::Server,
			_ => Self::Client,
		}
	}

	/// Returns `true` for kinds that may succeed when retried with backoff.
	pub const fn is_retryable(self) -> bool {
		matches!(self, Self::RateLimit | Self::Server | Self::Transport)
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Auth => "auth_error",
			Self::RateLimit => "rate_limit_error",
			Self::Client => "client_error",
			Self::Server => "server_error",
			Self::Transport => "transport_error",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully classified failure carrying enough context to debug and to decide on retries.
///
/// Cloning is cheap; the cause is shared so one failed token fetch can be handed to every
/// caller that waited on it.
#[derive(Clone, Debug, ThisError)]
#[error("{message} ({}url={url}).", status_prefix(.status_code))]
pub struct ClassifiedError {
	/// Taxonomy kind.
	pub kind: ErrorKind,
	/// HTTP status, absent for transport failures.
	pub status_code: Option<u16>,
	/// Request URL.
	pub url: String,
	/// Human-readable summary.
	pub message: String,
	/// Truncated, best-effort text rendering of the response body.
	pub body_excerpt: Option<String>,
	/// `Retry-After` hint attached to rate-limit failures.
	pub retry_after: Option<Duration>,
	/// Full response body, kept only when a success response failed to parse.
	pub raw_body: Option<String>,
	/// Underlying cause, if any.
	#[source]
	pub source: Option<SharedError>,
}
impl ClassifiedError {
	/// Creates an error with no status or body context.
	pub fn new(kind: ErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind,
			status_code: None,
			url: url.into(),
			message: message.into(),
			body_excerpt: None,
			retry_after: None,
			raw_body: None,
			source: None,
		}
	}

	/// Attaches the HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status_code = Some(status);

		self
	}

	/// Attaches a body excerpt.
	pub fn with_body_excerpt(mut self, excerpt: Option<String>) -> Self {
		self.body_excerpt = excerpt;

		self
	}

	/// Attaches a `Retry-After` hint.
	pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
		self.retry_after = retry_after;

		self
	}

	/// Keeps the full response body for diagnostics.
	pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
		self.raw_body = Some(body.into());

		self
	}

	/// Chains an underlying cause.
	pub fn with_source(mut self, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		self.source = Some(Arc::new(src));

		self
	}

	/// Returns `true` when the caller may retry after backing off.
	pub fn is_retryable(&self) -> bool {
		self.kind.is_retryable()
	}

	/// Returns `true` for 404 responses.
	pub fn is_not_found(&self) -> bool {
		self.status_code == Some(404)
	}

	/// Re-labels the error while keeping status, body, and cause.
	pub(crate) fn reclassify(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
		self.kind = kind;
		self.message = message.into();

		self
	}
}

fn status_prefix(status: &Option<u16>) -> String {
	status.map(|code| format!("status={code}, ")).unwrap_or_default()
}

/// Transport-level failures raised before any HTTP status is known.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request exceeded its timeout.
	#[error("Request timed out before a response was received.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// DNS, TCP, or TLS failure.
	#[error("Network error occurred before a response was received.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// I/O failure reported by a custom [`TokenHttpClient`](crate::http::TokenHttpClient)
	/// implementation; the reqwest transport never produces it.
	#[error("I/O error occurred before a response was received.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` when the failure was a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
