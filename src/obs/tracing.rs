// self
use crate::{_prelude::*, obs::OperationKind, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by presigner operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("sts_presigner.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OperationSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OperationSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OperationSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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
}

/// RAII guard returned by [`OperationSpan::entered`].
pub struct OperationSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OperationSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OperationSpanGuard(..)")
	}
}

/// Reports a failed refresh together with the instant that starts the cooldown.
pub fn emit_refresh_failure(error: &Error, at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(
			error = %error,
			status = error.status(),
			retry_after_secs = error.retry_after().map(|hint| hint.whole_seconds()),
			failed_at = at.unix_timestamp(),
			"Failed to refresh the STS credential; refresh attempts pause for the cooldown window."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, at);
	}
}

/// Reports a credential issued by the endpoint.
pub fn emit_refresh_success(expiration: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(expires_at = expiration.unix_timestamp(), "Refreshed the STS credential.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = expiration;
	}
}

/// Reports a persistence failure; the in-memory credential stays authoritative.
pub fn emit_store_failure(key: &str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, error = %error, "Failed to persist the STS credential.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}

/// Reports a background refresh that could not be scheduled.
pub fn emit_missing_runtime() {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!("No tokio runtime is available; skipping the background credential refresh.");
	}
}
