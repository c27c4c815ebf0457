//! Credential provider handing out API-key parameters or OAuth bearer headers.
//!
//! A [`CredentialProvider`] is constructed with fixed [`Credentials`]. In static-key mode it
//! only answers [`CredentialProvider::get_query_params`]; in OAuth mode it answers
//! [`CredentialProvider::get_auth_headers`] and owns the cached bearer token. Clones share
//! the token slot and the refresh guard, so they behave as one instance; separately
//! constructed providers never contend with each other. Calling an operation that belongs
//! to the other mode fails with [`ConfigError::ModeMismatch`].

mod exchange;
mod refresh;

pub use refresh::RefreshMetrics;

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	auth::{ApiKey, CachedToken, ClientCredentials, CredentialMode, Credentials},
	config::TokenEndpointConfig,
	error::{ClassifiedError, ConfigError},
	http::TokenHttpClient,
};

/// Query parameter carrying the static API key.
pub const API_KEY_PARAM: &str = "apiKey";
/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

#[cfg(feature = "reqwest")]
/// Provider specialized for the crate's default reqwest transport.
pub type ReqwestCredentialProvider = CredentialProvider<ReqwestHttpClient>;

/// Produces authentication material for outbound API requests.
pub struct CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
	credentials: Credentials,
	endpoint: TokenEndpointConfig,
	state: Arc<TokenState>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<C> CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a provider that reuses the caller-provided transport.
	pub fn with_http_client(
		credentials: Credentials,
		endpoint: TokenEndpointConfig,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			credentials,
			endpoint,
			state: Arc::new(TokenState::new()),
			refresh_metrics: Default::default(),
		}
	}

	/// Mode fixed by the credentials.
	pub fn mode(&self) -> CredentialMode {
		self.credentials.mode()
	}

	/// Token endpoint settings.
	pub fn endpoint(&self) -> &TokenEndpointConfig {
		&self.endpoint
	}

	/// Counters for token fetches issued by this provider and its clones.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Returns the cached token without checking freshness or refreshing.
	pub fn cached_token(&self) -> Option<Arc<CachedToken>> {
		self.state.slot.read().clone()
	}

	/// Returns `{"apiKey": <key>}` for static-key providers. Never performs I/O.
	pub fn get_query_params(&self) -> Result<BTreeMap<String, String>> {
		let key = self.api_key("get_query_params")?;

		Ok(BTreeMap::from([(API_KEY_PARAM.to_owned(), key.value().expose().to_owned())]))
	}

	/// Returns `{"Authorization": "Bearer <token>"}` for OAuth providers, refreshing the token
	/// first when it is absent or inside the refresh skew window.
	pub async fn get_auth_headers(&self) -> Result<BTreeMap<String, String>> {
		let token = self.access_token_for("get_auth_headers").await?;

		Ok(BTreeMap::from([(AUTHORIZATION_HEADER.to_owned(), token.bearer())]))
	}

	/// Applies the mode's credentials to a reqwest request: the `apiKey` query parameter for
	/// static keys, or the bearer `Authorization` header for OAuth.
	#[cfg(feature = "reqwest")]
	pub async fn authorize(
		&self,
		request: reqwest::RequestBuilder,
	) -> Result<reqwest::RequestBuilder> {
		match self.mode() {
			CredentialMode::StaticKey => Ok(request.query(&self.get_query_params()?)),
			CredentialMode::OAuth => {
				let token = self.access_token_for("authorize").await?;

				Ok(request.header(::http::header::AUTHORIZATION, token.bearer()))
			},
		}
	}

	fn api_key(&self, operation: &'static str) -> Result<&ApiKey> {
		match &self.credentials {
			Credentials::StaticKey(key) => Ok(key),
			Credentials::OAuthClientCredentials(_) => Err(self.mode_mismatch(operation)),
		}
	}

	fn client_credentials(&self, operation: &'static str) -> Result<&ClientCredentials> {
		match &self.credentials {
			Credentials::OAuthClientCredentials(client) => Ok(client),
			Credentials::StaticKey(_) => Err(self.mode_mismatch(operation)),
		}
	}

	fn mode_mismatch(&self, operation: &'static str) -> Error {
		ConfigError::ModeMismatch { operation, mode: self.mode() }.into()
	}
}
#[cfg(feature = "reqwest")]
impl CredentialProvider<ReqwestHttpClient> {
	/// Creates a provider backed by its own reqwest transport.
	pub fn new(credentials: Credentials, endpoint: TokenEndpointConfig) -> Result<Self> {
		Ok(Self::with_http_client(credentials, endpoint, ReqwestHttpClient::new()?))
	}
}
impl<C> Clone for CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			credentials: self.credentials.clone(),
			endpoint: self.endpoint.clone(),
			state: Arc::clone(&self.state),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
		}
	}
}
impl<C> Debug for CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("mode", &self.mode())
			.field("endpoint", &self.endpoint.url.as_str())
			.field("token_cached", &self.state.slot.read().is_some())
			.finish()
	}
}

/// Token slot, the guard serializing refreshes, and the result of the latest fetch.
///
/// The slot only ever receives whole new `Arc`s; readers clone the `Arc` and release the
/// read lock immediately.
struct TokenState {
	slot: RwLock<Option<Arc<CachedToken>>>,
	refresh_guard: AsyncMutex<()>,
	last_fetch: Mutex<FetchRecord>,
}
impl TokenState {
	fn new() -> Self {
		Self {
			slot: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			last_fetch: Mutex::new(FetchRecord::default()),
		}
	}

	fn fetch_generation(&self) -> u64 {
		self.last_fetch.lock().generation
	}

	/// Result of the latest fetch, if one finished after `generation` was observed.
	fn fetch_since(&self, generation: u64) -> Option<FetchResult> {
		let record = self.last_fetch.lock();

		if record.generation == generation { None } else { record.result.clone() }
	}

	/// Must be called with the refresh guard held.
	fn record_fetch(&self, result: FetchResult) {
		let mut record = self.last_fetch.lock();

		record.generation = record.generation.wrapping_add(1);
		record.result = Some(result);
	}
}

type FetchResult = Result<Arc<CachedToken>, ClassifiedError>;

/// Numbered result of the most recent token fetch.
#[derive(Default)]
struct FetchRecord {
	generation: u64,
	result: Option<FetchResult>,
}
