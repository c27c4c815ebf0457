//! Client-credentials exchange against the token endpoint.
//!
//! Every failure here is reported as [`ErrorKind::Auth`] except transport failures, which
//! keep [`ErrorKind::Transport`]. The endpoint's status, body excerpt, and `Retry-After`
//! hint survive the relabeling.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientCredentials},
	config::TokenEndpointConfig,
	error::{ClassifiedError, ErrorKind},
	http::{TokenHttpClient, TokenRequest},
	provider::CredentialProvider,
	response,
};

/// Lifetime assumed when the endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN: i64 = 3_600;

#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Performs one token request and builds the resulting token. Never touches the slot.
	pub(super) async fn exchange_client_credentials(
		&self,
		client: &ClientCredentials,
	) -> Result<CachedToken, ClassifiedError> {
		let url = self.endpoint.url.as_str();
		let response = self
			.http_client
			.post_form(token_request(&self.endpoint, client))
			.await
			.map_err(|err| response::classify_transport_error(url, err))?;
		let issued_at = OffsetDateTime::now_utc();
		let payload = response::classify_as::<TokenEndpointResponse>(
			response.status,
			url,
			&response.headers,
			&response.body,
		)
		.map_err(|err| {
			let message = if err.status_code.is_some_and(|status| (200..300).contains(&status)) {
				"Token endpoint returned an unreadable token response"
			} else {
				"Token endpoint rejected the client credentials request"
			};

			err.reclassify(ErrorKind::Auth, message)
		})?;

		build_token(url, response.status, payload, issued_at)
	}
}

fn token_request(endpoint: &TokenEndpointConfig, client: &ClientCredentials) -> TokenRequest {
	let body = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("grant_type", "client_credentials")
		.append_pair("client_id", client.id())
		.append_pair("client_secret", client.secret().expose())
		.finish();

	TokenRequest { url: endpoint.url.clone(), body, timeout: endpoint.timeout }
}

fn build_token(
	url: &str,
	status: u16,
	payload: TokenEndpointResponse,
	issued_at: OffsetDateTime,
) -> Result<CachedToken, ClassifiedError> {
	let rejected =
		|message: &str| ClassifiedError::new(ErrorKind::Auth, url, message).with_status(status);

	if payload.access_token.trim().is_empty() {
		return Err(rejected("Token endpoint returned an empty access_token"));
	}

	let expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);

	if expires_in <= 0 {
		return Err(rejected("Token endpoint returned a non-positive expires_in"));
	}

	let expires_at = issued_at
		.checked_add(Duration::seconds(expires_in))
		.ok_or_else(|| rejected("Token endpoint returned an out-of-range expires_in"))?;

	Ok(CachedToken::new(payload.access_token, issued_at, expires_at))
}
