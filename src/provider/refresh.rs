//! Double-checked token acquisition.
//!
//! Readers first look at the slot without waiting on anything. Only when the token is
//! absent or inside the skew window do they queue on the provider's refresh guard. Once
//! through, a caller re-checks the slot and then the numbered record of the latest fetch:
//! if any fetch finished while it queued, it takes that result, failure included, instead
//! of calling the endpoint again. A burst of concurrent callers therefore produces a single
//! token request and waits at most one request timeout.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientCredentials},
	http::TokenHttpClient,
	obs::{self, RefreshOutcome, RefreshSpan, RefreshTrigger},
	provider::CredentialProvider,
};

impl<C> CredentialProvider<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Returns a usable bearer token, refreshing first when it is absent or inside the
	/// refresh skew window.
	///
	/// If that refresh fails while the cached token has not yet expired, the cached token is
	/// returned and the failure is only logged and counted.
	pub async fn access_token(&self) -> Result<Arc<CachedToken>> {
		self.access_token_for("access_token").await
	}

	/// Fetches a new token even if the current one is still fresh.
	///
	/// Waits for any in-flight refresh first. On failure the prior token stays in place and
	/// the error is returned.
	pub async fn force_refresh(&self) -> Result<()> {
		let client = self.client_credentials("force_refresh")?;
		let _singleflight = self.state.refresh_guard.lock().await;

		self.refresh_locked(client, RefreshTrigger::Forced).await.map(|_| ())
	}

	pub(super) async fn access_token_for(
		&self,
		operation: &'static str,
	) -> Result<Arc<CachedToken>> {
		let client = self.client_credentials(operation)?;
		// Read before the fast path so a fetch that ends while this caller queues is seen.
		let observed = self.state.fetch_generation();

		if let Some(token) = self.fresh_token() {
			return Ok(token);
		}

		let _singleflight = self.state.refresh_guard.lock().await;

		if let Some(token) = self.fresh_token() {
			self.refresh_metrics.record_coalesced();

			return Ok(token);
		}
		if let Some(shared) = self.state.fetch_since(observed) {
			self.refresh_metrics.record_coalesced();

			return shared.or_else(|err| self.stale_or(err.into()));
		}

		self.refresh_locked(client, RefreshTrigger::Lazy).await.or_else(|err| self.stale_or(err))
	}

	fn fresh_token(&self) -> Option<Arc<CachedToken>> {
		let now = OffsetDateTime::now_utc();

		self.cached_token().filter(|token| token.is_fresh_at(now, self.endpoint.refresh_skew))
	}

	/// Answers a failed lazy refresh with the cached token while it has not expired.
	fn stale_or(&self, err: Error) -> Result<Arc<CachedToken>> {
		let now = OffsetDateTime::now_utc();
		let Some(cached) = self.cached_token().filter(|token| !token.is_expired_at(now)) else {
			return Err(err);
		};

		self.refresh_metrics.record_stale_fallback();
		obs::record_stale_served();
		obs::warn_stale_fallback(&err, cached.expires_at());

		Ok(cached)
	}

	/// Must be called with the refresh guard held.
	async fn refresh_locked(
		&self,
		client: &ClientCredentials,
		trigger: RefreshTrigger,
	) -> Result<Arc<CachedToken>> {
		let span = RefreshSpan::new(trigger, self.mode());
		let started = Instant::now();

		self.refresh_metrics.record_attempt();

		let fetched =
			span.instrument(self.exchange_client_credentials(client)).await.map(Arc::new);
		let outcome = RefreshOutcome::of(&fetched);

		span.finish(outcome);
		obs::record_refresh(trigger, outcome, started.elapsed());

		match &fetched {
			Ok(token) => {
				*self.state.slot.write() = Some(Arc::clone(token));
				self.refresh_metrics.record_success();
			},
			Err(_) => self.refresh_metrics.record_failure(),
		}

		self.state.record_fetch(fetched.clone());

		fetched.map_err(Error::from)
	}
}
