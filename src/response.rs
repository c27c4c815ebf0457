//! Response classifier mapping completed HTTP exchanges onto [`ErrorKind`].
//!
//! Callers perform API requests themselves and hand the status, headers, and body to
//! [`classify`] (or [`classify_as`] for typed bodies). Failures before any status was
//! received go through [`classify_transport_error`]. Nothing in this module sleeps or
//! retries; rate-limit hints are attached to the error for the caller to act on.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{ClassifiedError, ErrorKind, TransportError},
	http,
};

/// Maximum number of characters kept in [`ClassifiedError::body_excerpt`].
pub const BODY_EXCERPT_LIMIT: usize = 256;

const EXCERPT_JSON_SCAN_LIMIT: usize = 64 * 1024;

/// Classifies a response and parses a successful body as JSON.
pub fn classify(
	status: u16,
	url: &str,
	headers: &HeaderMap,
	body: &[u8],
) -> Result<Value, ClassifiedError> {
	classify_as(status, url, headers, body)
}

/// Classifies a response and deserializes a successful body into `T`.
///
/// A 2xx body that fails to deserialize is a [`ErrorKind::Client`] failure carrying the
/// raw body and the JSON path of the mismatch.
pub fn classify_as<T>(
	status: u16,
	url: &str,
	headers: &HeaderMap,
	body: &[u8],
) -> Result<T, ClassifiedError>
where
	T: DeserializeOwned,
{
	if !(200..300).contains(&status) {
		return Err(classify_failure(status, url, headers, body));
	}

	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|err| {
		ClassifiedError::new(ErrorKind::Client, url, "Response body could not be parsed as JSON")
			.with_status(status)
			.with_body_excerpt(body_excerpt(body))
			.with_raw_body(String::from_utf8_lossy(body))
			.with_source(err)
	})
}

/// Builds the error for a non-2xx response.
pub fn classify_failure(
	status: u16,
	url: &str,
	headers: &HeaderMap,
	body: &[u8],
) -> ClassifiedError {
	let kind = ErrorKind::from_status(status);
	let message = match kind {
		ErrorKind::Auth => "Request was rejected as unauthorized",
		ErrorKind::RateLimit => "Request was rate limited",
		ErrorKind::Server => "Upstream server failed to handle the request",
		_ => "Request failed",
	};
	let retry_after =
		if kind == ErrorKind::RateLimit { http::parse_retry_after(headers) } else { None };

	ClassifiedError::new(kind, url, message)
		.with_status(status)
		.with_body_excerpt(body_excerpt(body))
		.with_retry_after(retry_after)
}

/// Classifies a failure that happened before any status was received.
pub fn classify_transport_error(url: &str, error: TransportError) -> ClassifiedError {
	let message = if error.is_timeout() {
		"Request timed out before a response was received"
	} else {
		"Request failed before a response was received"
	};

	ClassifiedError::new(ErrorKind::Transport, url, message).with_source(error)
}

/// Renders a short, human-readable excerpt of a response body.
///
/// JSON bodies are re-rendered compactly (a top-level string is unquoted); anything else is
/// decoded as lossy UTF-8. Blank bodies yield `None`.
pub fn body_excerpt(body: &[u8]) -> Option<String> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return None;
	}

	let decoded = if body.len() <= EXCERPT_JSON_SCAN_LIMIT {
		serde_json::from_slice::<Value>(body).ok()
	} else {
		None
	};
	let text = match decoded {
		Some(Value::String(text)) => text,
		Some(value) => value.to_string(),
		None => {
			// Four bytes per char is the UTF-8 worst case.
			let end = body.len().min(BODY_EXCERPT_LIMIT * 4 + 4);

			String::from_utf8_lossy(&body[..end]).into_owned()
		},
	};

	Some(truncate(text.trim()))
}

fn truncate(text: &str) -> String {
	match text.char_indices().nth(BODY_EXCERPT_LIMIT) {
		Some((idx, _)) => {
			let mut buf = text[..idx].to_owned();

			buf.push('…');

			buf
		},
		None => text.to_owned(),
	}
}

/// Reads and classifies a reqwest response.
///
/// A failure while reading the body is classified as [`ErrorKind::Transport`] with the
/// status attached.
#[cfg(feature = "reqwest")]
pub async fn classify_response<T>(response: reqwest::Response) -> Result<T, ClassifiedError>
where
	T: DeserializeOwned,
{
	let status = response.status().as_u16();
	let url = response.url().to_string();
	let headers = response.headers().to_owned();
	let body = response.bytes().await.map_err(|err| {
		classify_transport_error(&url, TransportError::from(err)).with_status(status)
	})?;

	classify_as(status, &url, &headers, &body)
}

/// Classifies an error returned by [`reqwest::RequestBuilder::send`].
///
/// Errors that carry a status (from `error_for_status`) are mapped like responses without
/// a body.
#[cfg(feature = "reqwest")]
pub fn classify_reqwest_error(url: &str, error: ReqwestError) -> ClassifiedError {
	let url = error.url().map(|value| value.to_string()).unwrap_or_else(|| url.to_owned());

	match error.status() {
		Some(status) => classify_failure(status.as_u16(), &url, &HeaderMap::new(), &[])
			.with_source(error),
		None => classify_transport_error(&url, error.into()),
	}
}
