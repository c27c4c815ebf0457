// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use here_auth::{
	_preludet::*,
	auth::Credentials,
	error::{ErrorKind, TransportError},
	http::{TokenHttpClient, TokenHttpFuture, TokenRequest, TokenResponse},
	provider::CredentialProvider,
};

/// Issues numbered tokens after a short delay and counts calls.
struct CountingHttpClient {
	calls: AtomicUsize,
	fail_after: Option<usize>,
	expires_in: i64,
}
impl CountingHttpClient {
	fn failing_after(calls: usize) -> Self {
		Self { fail_after: Some(calls), ..Default::default() }
	}

	fn short_lived_then_failing() -> Self {
		Self { fail_after: Some(1), expires_in: 120, ..Default::default() }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl Default for CountingHttpClient {
	fn default() -> Self {
		Self { calls: AtomicUsize::new(0), fail_after: None, expires_in: 3_600 }
	}
}
impl TokenHttpClient for CountingHttpClient {
	fn post_form(&self, request: TokenRequest) -> TokenHttpFuture<'_> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		let fail = self.fail_after.is_some_and(|limit| call > limit);
		let expires_in = self.expires_in;

		Box::pin(async move {
			assert!(request.body.starts_with("grant_type=client_credentials&"));

			tokio::time::sleep(StdDuration::from_millis(100)).await;

			if fail {
				return Err(TransportError::from(std::io::Error::new(
					std::io::ErrorKind::ConnectionReset,
					"connection reset by peer",
				)));
			}

			Ok(TokenResponse {
				status: 200,
				headers: HeaderMap::new(),
				body: format!(
					"{{\"access_token\":\"token-{call}\",\"expires_in\":{expires_in}}}"
				)
				.into_bytes(),
			})
		})
	}
}

fn build_provider(client: Arc<dyn TokenHttpClient>) -> CredentialProvider<dyn TokenHttpClient> {
	let credentials = Credentials::oauth_client_credentials("custom-id", "custom-secret")
		.expect("Test client credentials should be valid.");

	CredentialProvider::with_http_client(
		credentials,
		test_endpoint_config("https://auth.example.com/oauth2/token"),
		client,
	)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn custom_transport_sees_one_request_per_burst() {
	let client = Arc::new(CountingHttpClient::default());
	let provider = build_provider(client.clone());
	let tasks = (0..32)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.access_token().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let token = task
			.await
			.expect("Caller task should not panic.")
			.expect("Every caller should receive the shared token.");

		assert_eq!(token.value().expose(), "token-1");
	}

	assert_eq!(client.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_observe_whole_tokens_during_forced_refresh() {
	let client = Arc::new(CountingHttpClient::default());
	let provider = build_provider(client.clone());

	provider.access_token().await.expect("Initial token request should succeed.");

	let refresher = {
		let provider = provider.clone();

		tokio::spawn(async move { provider.force_refresh().await })
	};
	let readers = (0..8)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move {
				let mut seen = Vec::new();

				for _ in 0..20 {
					let headers = provider
						.get_auth_headers()
						.await
						.expect("A valid token should always be served.");

					seen.extend(headers.into_values());
					tokio::time::sleep(StdDuration::from_millis(5)).await;
				}

				seen
			})
		})
		.collect::<Vec<_>>();

	refresher
		.await
		.expect("Refresher task should not panic.")
		.expect("Forced refresh should succeed.");

	for reader in readers {
		for value in reader.await.expect("Reader task should not panic.") {
			assert!(value == "Bearer token-1" || value == "Bearer token-2", "saw {value}");
		}
	}

	assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn failed_forced_refresh_leaves_token_in_place() {
	let client = Arc::new(CountingHttpClient::failing_after(1));
	let provider = build_provider(client.clone());
	let before = provider.access_token().await.expect("Initial token request should succeed.");
	let err = provider.force_refresh().await.expect_err("Second request should fail.");

	assert_eq!(err.kind(), Some(ErrorKind::Transport));
	assert!(err.is_retryable());

	let after = provider.access_token().await.expect("Prior token should still be served.");

	assert!(Arc::ptr_eq(&before, &after));
	assert_eq!(client.calls(), 2);
	assert_eq!(provider.refresh_metrics().failures(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_shares_one_failed_request() {
	let client = Arc::new(CountingHttpClient::failing_after(0));
	let provider = build_provider(client.clone());
	let tasks = (0..16)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.get_auth_headers().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let err = task
			.await
			.expect("Caller task should not panic.")
			.expect_err("No token exists, so every caller should see the failure.");

		assert_eq!(err.kind(), Some(ErrorKind::Transport));
	}

	assert_eq!(client.calls(), 1);
	assert_eq!(provider.refresh_metrics().attempts(), 1);
	assert_eq!(provider.refresh_metrics().failures(), 1);
	assert!(provider.cached_token().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_after_failed_renewal_serves_cached_token() {
	let client = Arc::new(CountingHttpClient::short_lived_then_failing());
	let provider = build_provider(client.clone());

	// Expires in two minutes, so it is already inside the five-minute skew window.
	provider.access_token().await.expect("Initial token request should succeed.");

	let tasks = (0..16)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.access_token().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let token = task
			.await
			.expect("Caller task should not panic.")
			.expect("The unexpired token should be served after the failed renewal.");

		assert_eq!(token.value().expose(), "token-1");
	}

	assert_eq!(client.calls(), 2);
	assert_eq!(provider.refresh_metrics().stale_fallbacks(), 16);
}
