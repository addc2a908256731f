//! Credential refresh with singleflight deduplication and a failure cooldown.
//!
//! [`Presigner::refresh`] never fails from the caller's point of view. Each call resolves in
//! one of three ways:
//!
//! - the last failure is younger than [`PresignerConfig::cooldown`], so nothing is requested;
//! - a refresh is already in flight, so the caller waits for it and copies its credential;
//! - otherwise the caller starts a new operation that performs exactly one issuing call.
//!
//! The operation itself runs as a detached task on the presigner's runtime, so a caller that
//! stops waiting never cancels it. Its bookkeeping (cache write or invalidation, cooldown,
//! metrics) happens under the slot lock before waiters are released, which keeps the order of
//! completions identical to the order of cache writes.
//!
//! [`PresignerConfig::cooldown`]: crate::config::PresignerConfig::cooldown

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	credential::{Credential, IssuedCredential},
	http::CredentialIssuer,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	presigner::Presigner,
};

type Operation = Arc<OnceCell<Settlement>>;

/// How a call to [`Presigner::refresh`] resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// This call started the operation and the issuer returned a credential.
	Issued,
	/// This call started the operation and it failed; the cached credential was cleared and
	/// the cooldown started.
	Failed,
	/// Another caller's operation succeeded and its credential was copied into the cache.
	Joined,
	/// Another caller's operation failed; its bookkeeping already ran.
	JoinedFailure,
	/// The failure cooldown is active; the issuer was not called.
	CoolingDown,
}
impl RefreshOutcome {
	/// Returns `true` when the cache holds a freshly issued credential afterwards.
	pub const fn is_success(self) -> bool {
		matches!(self, RefreshOutcome::Issued | RefreshOutcome::Joined)
	}

	const fn operation_outcome(self) -> OperationOutcome {
		match self {
			RefreshOutcome::Issued => OperationOutcome::Success,
			RefreshOutcome::Failed | RefreshOutcome::JoinedFailure => OperationOutcome::Failure,
			RefreshOutcome::Joined => OperationOutcome::Joined,
			RefreshOutcome::CoolingDown => OperationOutcome::CoolingDown,
		}
	}
}

#[derive(Clone, Debug)]
enum Settlement {
	Issued { credential: Credential, generation: u64 },
	Failed,
	// The owning task was dropped before it could settle.
	Abandoned,
}

/// Shared refresh bookkeeping: the in-flight operation plus the cooldown anchor.
#[derive(Debug, Default)]
pub(crate) struct RefreshSlot(Mutex<SlotState>);
impl RefreshSlot {
	pub(crate) fn last_failure_at(&self) -> Option<OffsetDateTime> {
		self.0.lock().last_failure_at
	}

	pub(crate) fn is_busy(&self) -> bool {
		self.0.lock().in_flight.is_some()
	}

	fn enter(&self, now: OffsetDateTime, cooldown: Duration) -> Entry {
		let mut state = self.0.lock();

		if state.last_failure_at.is_some_and(|failed_at| now - failed_at < cooldown) {
			return Entry::CoolingDown;
		}
		if let Some(operation) = state.in_flight.as_ref() {
			return Entry::Join(operation.clone());
		}

		let operation = Arc::new(OnceCell::new());

		state.in_flight = Some(operation.clone());

		Entry::Start(operation)
	}

	fn release(&self, operation: &Operation) {
		let mut state = self.0.lock();

		if state.in_flight.as_ref().is_some_and(|current| Arc::ptr_eq(current, operation)) {
			state.in_flight = None;
		}
	}
}

#[derive(Debug, Default)]
struct SlotState {
	in_flight: Option<Operation>,
	last_failure_at: Option<OffsetDateTime>,
	// Bumped by every settled operation.
	generation: u64,
}

enum Entry {
	CoolingDown,
	Join(Operation),
	Start(Operation),
}

/// Ownership of the in-flight operation; settling or dropping it frees the slot.
struct Flight {
	slot: Arc<RefreshSlot>,
	operation: Operation,
	settled: bool,
}
impl Flight {
	fn new(slot: Arc<RefreshSlot>, operation: Operation) -> Self {
		Self { slot, operation, settled: false }
	}

	async fn settle(mut self, settlement: Settlement) {
		let _ = self.operation.set(settlement).await;

		self.settled = true;
	}
}
impl Drop for Flight {
	fn drop(&mut self) {
		if !self.settled {
			let _ = self.operation.set_blocking(Settlement::Abandoned);
		}

		self.slot.release(&self.operation);
	}
}

impl<I> Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	/// Refreshes the cached credential, joining the in-flight refresh when there is one.
	///
	/// Failures are absorbed: they clear the cached credential, start the cooldown, and are
	/// reported through the `tracing` feature. Without a runtime the caller drives the issuing
	/// call itself.
	pub async fn refresh(&self) -> RefreshOutcome {
		const KIND: OperationKind = OperationKind::Refresh;

		let span = OperationSpan::new(KIND, "refresh");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let outcome = span
			.instrument(async move {
				match self.refresh_slot.enter(self.clock.now(), self.config.cooldown) {
					Entry::CoolingDown => {
						self.refresh_metrics.record_skipped();

						RefreshOutcome::CoolingDown
					},
					Entry::Join(operation) => self.join(&operation).await,
					Entry::Start(operation) => {
						let flight = Flight::new(self.refresh_slot.clone(), operation.clone());

						match self.runtime() {
							Some(runtime) => {
								runtime.spawn(self.clone().fly(flight));
							},
							None => self.clone().fly(flight).await,
						}

						match operation.wait().await {
							Settlement::Issued { .. } => RefreshOutcome::Issued,
							Settlement::Failed | Settlement::Abandoned => RefreshOutcome::Failed,
						}
					},
				}
			})
			.await;

		obs::record_operation_outcome(KIND, outcome.operation_outcome());

		outcome
	}

	/// Starts a refresh without waiting for it.
	///
	/// Returns `true` when an operation is running afterwards, whether this call started it or
	/// joined one already in flight. Returns `false` during the cooldown or when no tokio
	/// runtime is reachable.
	pub fn refresh_in_background(&self) -> bool {
		let Some(runtime) = self.runtime() else {
			obs::emit_missing_runtime();

			return false;
		};

		match self.refresh_slot.enter(self.clock.now(), self.config.cooldown) {
			Entry::CoolingDown => {
				self.refresh_metrics.record_skipped();
				obs::record_operation_outcome(OperationKind::Refresh, OperationOutcome::CoolingDown);

				false
			},
			Entry::Join(_) => true,
			Entry::Start(operation) => {
				let flight = Flight::new(self.refresh_slot.clone(), operation);

				runtime.spawn(self.clone().fly(flight));

				true
			},
		}
	}

	async fn join(&self, operation: &Operation) -> RefreshOutcome {
		self.refresh_metrics.record_joined();

		match operation.wait().await {
			Settlement::Issued { credential, generation } => {
				let state = self.refresh_slot.0.lock();

				// A newer settlement already owns the cache.
				if state.generation == *generation {
					self.cache.write(credential.clone());
				}

				RefreshOutcome::Joined
			},
			Settlement::Failed | Settlement::Abandoned => RefreshOutcome::JoinedFailure,
		}
	}

	async fn fly(self, flight: Flight) {
		let span = OperationSpan::new(OperationKind::Refresh, "issue");

		span.instrument(async move {
			self.refresh_metrics.record_attempt();

			let result = self.issuer.issue(&self.config.issuer_endpoint).await;
			let settlement = self.conclude(result);

			flight.settle(settlement).await;
		})
		.await
	}

	fn conclude(&self, result: Result<IssuedCredential>) -> Settlement {
		let mut state = self.refresh_slot.0.lock();

		state.generation += 1;

		match result {
			Ok(issued) => {
				let expiration = issued.expiration;
				let credential = Credential::from(issued);

				state.last_failure_at = None;
				self.cache.write(credential.clone());
				self.refresh_metrics.record_success();
				obs::emit_refresh_success(expiration);

				Settlement::Issued { credential, generation: state.generation }
			},
			Err(e) => {
				let failed_at = self.clock.now();

				state.last_failure_at = Some(failed_at);

				if !self.cache.read().is_empty() {
					self.cache.write(Credential::empty());
				}

				self.refresh_metrics.record_failure();
				obs::emit_refresh_failure(&e, failed_at);

				Settlement::Failed
			},
		}
	}
}
