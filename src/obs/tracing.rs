// self
use crate::{
	_prelude::*,
	auth::CredentialMode,
	obs::{RefreshOutcome, RefreshTrigger},
};

/// Future returned by [`RefreshSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`RefreshSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// `here_auth.refresh` span covering one trip to the token endpoint.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Opens the span; `outcome` stays empty until [`RefreshSpan::finish`].
	pub fn new(trigger: RefreshTrigger, mode: CredentialMode) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"here_auth.refresh",
				trigger = trigger.as_str(),
				mode = mode.as_str(),
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (trigger, mode);

			Self {}
		}
	}

	/// Runs the fetch inside the span without holding an entered guard across `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Fills in the `outcome` field.
	pub fn finish(&self, outcome: RefreshOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

/// Reports that a failed renewal was answered with the still-unexpired cached token.
pub fn warn_stale_fallback(error: &Error, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%error, %expires_at, "token renewal failed; serving the cached token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, expires_at);
	}
}
