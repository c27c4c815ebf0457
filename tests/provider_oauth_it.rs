// crates.io
use httpmock::prelude::*;
// self
use here_auth::{
	_preludet::*,
	auth::Credentials,
	config::TokenEndpointConfig,
	error::ErrorKind,
	http::ReqwestHttpClient,
	provider::{AUTHORIZATION_HEADER, CredentialProvider},
	response,
};

const CLIENT_ID: &str = "access-key-id";
const CLIENT_SECRET: &str = "access-key-secret";
const FORM_BODY: &str =
	"grant_type=client_credentials&client_id=access-key-id&client_secret=access-key-secret";
const TOKEN_BODY: &str =
	"{\"access_token\":\"cached-token\",\"token_type\":\"bearer\",\"expires_in\":86399}";

#[tokio::test]
async fn oauth_caches_token_after_success() {
	let server = MockServer::start_async().await;
	let provider = build_reqwest_test_provider(&server.url("/token"), CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("accept", "application/json")
				.body(FORM_BODY);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let first = provider.get_auth_headers().await.expect("Initial token request should succeed.");
	let second = provider.get_auth_headers().await.expect("Cached token should be reused.");

	assert_eq!(first.get(AUTHORIZATION_HEADER).map(String::as_str), Some("Bearer cached-token"));
	assert_eq!(first, second);

	mock.assert_calls_async(1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn oauth_concurrent_callers_share_one_request() {
	let server = MockServer::start_async().await;
	let provider = build_reqwest_test_provider(&server.url("/token"), CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_millis(200))
				.body(TOKEN_BODY);
		})
		.await;
	let tasks = (0..16)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.get_auth_headers().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let headers = task
			.await
			.expect("Caller task should not panic.")
			.expect("Every concurrent caller should receive a token.");

		assert_eq!(
			headers.get(AUTHORIZATION_HEADER).map(String::as_str),
			Some("Bearer cached-token")
		);
	}

	mock.assert_calls_async(1).await;

	assert_eq!(provider.refresh_metrics().attempts(), 1);
	assert_eq!(provider.refresh_metrics().successes(), 1);
}

#[tokio::test]
async fn oauth_force_refresh_replaces_fresh_token() {
	let server = MockServer::start_async().await;
	let provider = build_reqwest_test_provider(&server.url("/token"), CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let before = provider.access_token().await.expect("Initial token request should succeed.");

	provider.force_refresh().await.expect("Forced refresh should succeed.");

	let after = provider.cached_token().expect("Forced refresh should install a token.");

	assert!(!Arc::ptr_eq(&before, &after));
	assert!(after.issued_at() >= before.issued_at());

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn oauth_rejected_credentials_surface_auth_error() {
	let server = MockServer::start_async().await;
	let provider = build_reqwest_test_provider(&server.url("/token"), CLIENT_ID, "wrong-secret");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"errorCode\":401300}");
		})
		.await;
	let err = provider.get_auth_headers().await.expect_err("Rejected credentials should fail.");
	let classified = err.as_classified().expect("Token endpoint failures should be classified.");

	assert_eq!(classified.kind, ErrorKind::Auth);
	assert_eq!(classified.status_code, Some(401));
	assert_eq!(classified.url, server.url("/token"));
	assert!(!err.is_retryable());
	assert!(!err.to_string().contains("wrong-secret"));
	assert!(provider.cached_token().is_none());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn oauth_timeout_surfaces_transport_error() {
	let server = MockServer::start_async().await;
	let config = TokenEndpointConfig::builder()
		.url(Url::parse(&server.url("/token")).expect("Mock token endpoint URL should parse."))
		.timeout(StdDuration::from_millis(200))
		.build()
		.expect("Timeout config should be valid.");
	let credentials = Credentials::oauth_client_credentials(CLIENT_ID, CLIENT_SECRET)
		.expect("Test client credentials should be valid.");
	let provider = CredentialProvider::with_http_client(
		credentials,
		config,
		ReqwestHttpClient::with_client(test_reqwest_client()),
	);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).delay(StdDuration::from_secs(2)).body(TOKEN_BODY);
		})
		.await;
	let err = provider.get_auth_headers().await.expect_err("Slow token endpoint should time out.");
	let classified = err.as_classified().expect("Timeouts should be classified.");

	assert_eq!(classified.kind, ErrorKind::Transport);
	assert_eq!(classified.status_code, None);
	assert!(classified.message.contains("timed out"));
	assert!(err.is_retryable());
}

#[tokio::test]
async fn oauth_authorize_sets_bearer_header() {
	let server = MockServer::start_async().await;
	let provider = build_reqwest_test_provider(&server.url("/token"), CLIENT_ID, CLIENT_SECRET);
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/v7/flow").header("authorization", "Bearer cached-token");
			then.status(200).header("content-type", "application/json").body("{\"results\":[]}");
		})
		.await;
	let request = provider
		.authorize(test_reqwest_client().get(server.url("/v7/flow")))
		.await
		.expect("OAuth provider should authorize the request.");
	let response = request.send().await.expect("Mock API should answer.");
	let body: serde_json::Value =
		response::classify_response(response).await.expect("Authorized call should succeed.");

	assert_eq!(body["results"], serde_json::json!([]));

	api.assert_calls_async(1).await;
}
