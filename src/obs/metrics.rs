// self
use crate::{
	_prelude::*,
	obs::{RefreshOutcome, RefreshTrigger},
};

/// Counts a finished refresh and records how long the endpoint took.
pub fn record_refresh(trigger: RefreshTrigger, outcome: RefreshOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"here_auth_token_refresh_total",
			"trigger" => trigger.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
		metrics::histogram!("here_auth_token_refresh_seconds", "trigger" => trigger.as_str())
			.record(elapsed.as_secs_f64());
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (trigger, outcome, elapsed);
	}
}

/// Counts a cached token served after its renewal failed.
pub fn record_stale_served() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("here_auth_stale_token_served_total").increment(1);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_a_recorder_is_harmless() {
		record_refresh(RefreshTrigger::Forced, RefreshOutcome::Unreachable, StdDuration::ZERO);
		record_stale_served();
	}
}
