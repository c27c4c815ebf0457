//! Credential lifecycle for HERE API clients: static API keys, singleflight OAuth
//! client-credentials tokens with proactive refresh, and a typed taxonomy for HTTP
//! responses and transport failures.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod provider;
pub mod response;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		config::TokenEndpointConfig,
		http::ReqwestHttpClient,
		provider::{CredentialProvider, ReqwestCredentialProvider},
	};

	/// Builds an endpoint config pointing at a mock token endpoint with a short timeout.
	pub fn test_endpoint_config(token_url: &str) -> TokenEndpointConfig {
		TokenEndpointConfig::builder()
			.url(Url::parse(token_url).expect("Mock token endpoint URL should parse."))
			.timeout(StdDuration::from_secs(5))
			.build()
			.expect("Mock token endpoint config should be valid.")
	}

	/// Constructs an OAuth-mode provider backed by the reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_provider(
		token_url: &str,
		client_id: &str,
		client_secret: &str,
	) -> ReqwestCredentialProvider {
		let credentials = Credentials::oauth_client_credentials(client_id, client_secret)
			.expect("Test client credentials should be valid.");

		CredentialProvider::with_http_client(
			credentials,
			test_endpoint_config(token_url),
			ReqwestHttpClient::with_client(test_reqwest_client()),
		)
	}

	/// Builds a reqwest client that talks to loopback mock servers directly, ignoring any
	/// proxy configured in the environment.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.no_proxy()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build reqwest client for tests.")
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use ::http::HeaderMap;
	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
