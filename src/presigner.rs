//! Presigner facade tying the credential cache, the refresher, and the URL signer together.

pub mod refresh;

mod sign;

pub use refresh::*;

// crates.io
use tokio::{runtime::Handle, sync::watch};
// self
use crate::{
	_prelude::*,
	cache::CredentialCache,
	clock::{Clock, SystemClock},
	config::PresignerConfig,
	credential::{Credential, CredentialState},
	http::CredentialIssuer,
	store::KeyValueStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestIssuer;

#[cfg(feature = "reqwest")]
/// Presigner specialized for the crate's default reqwest transport.
pub type ReqwestPresigner = Presigner<ReqwestIssuer>;

/// Hands out signed, time-limited URLs while keeping the cached credential fresh.
///
/// The presigner owns the issuing transport, the persisted credential cache, the clock, and the
/// refresh bookkeeping (single in-flight operation plus failure cooldown). Clones share all of
/// it, so one presigner per bucket/issuer pair can be handed to every caller in the process.
/// Independent instances never coordinate with each other.
pub struct Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	/// Transport used for every call to the issuing endpoint.
	pub issuer: Arc<I>,
	/// Validated configuration.
	pub config: Arc<PresignerConfig>,
	/// Credential store read by the signer and written by the refresher.
	pub cache: Arc<CredentialCache>,
	/// Time source for expiry, near-expiry, and cooldown decisions.
	pub clock: Arc<dyn Clock>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_slot: Arc<RefreshSlot>,
	runtime: Option<Handle>,
}
impl<I> Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	/// Creates a presigner over the caller-provided transport.
	///
	/// The persisted credential under [`PresignerConfig::storage_key`] is loaded immediately. If
	/// called from inside a tokio runtime, that runtime runs background refreshes; use
	/// [`Presigner::with_runtime`] otherwise.
	pub fn with_issuer(
		config: PresignerConfig,
		persistence: Arc<dyn KeyValueStore>,
		issuer: impl Into<Arc<I>>,
	) -> Self {
		let cache = CredentialCache::load(persistence, config.storage_key.clone());

		Self {
			issuer: issuer.into(),
			config: Arc::new(config),
			cache: Arc::new(cache),
			clock: Arc::new(SystemClock),
			refresh_metrics: Default::default(),
			refresh_slot: Default::default(),
			runtime: Handle::try_current().ok(),
		}
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Pins the runtime used for background refreshes.
	pub fn with_runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);

		self
	}

	/// Schedules the initial background refresh; returns `true` if a refresh is now running.
	pub fn warm_up(&self) -> bool {
		self.refresh_in_background()
	}

	/// Snapshot of the cached credential.
	pub fn credential(&self) -> Credential {
		self.cache.read()
	}

	/// Lifecycle state of the cached credential right now.
	pub fn credential_state(&self) -> CredentialState {
		self.cache.read().state_at(self.clock.now(), self.config.refresh_buffer)
	}

	/// Subscribes to credential replacements, e.g. to retry a sign that returned an empty URL.
	pub fn subscribe(&self) -> watch::Receiver<Credential> {
		self.cache.subscribe()
	}

	/// Instant of the last failed refresh, while the cooldown bookkeeping holds one.
	pub fn last_failure_at(&self) -> Option<OffsetDateTime> {
		self.refresh_slot.last_failure_at()
	}

	/// Returns `true` while a refresh operation is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.refresh_slot.is_busy()
	}

	fn runtime(&self) -> Option<Handle> {
		self.runtime.clone().or_else(|| Handle::try_current().ok())
	}
}
#[cfg(feature = "reqwest")]
impl Presigner<ReqwestIssuer> {
	/// Creates a presigner that provisions its own reqwest transport.
	pub fn new(config: PresignerConfig, persistence: Arc<dyn KeyValueStore>) -> Self {
		Self::with_issuer(config, persistence, ReqwestIssuer::default())
	}
}
impl<I> Clone for Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	fn clone(&self) -> Self {
		Self {
			issuer: self.issuer.clone(),
			config: self.config.clone(),
			cache: self.cache.clone(),
			clock: self.clock.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_slot: self.refresh_slot.clone(),
			runtime: self.runtime.clone(),
		}
	}
}
impl<I> Debug for Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Presigner")
			.field("issuer_endpoint", &self.config.issuer_endpoint.as_str())
			.field("cache", &self.cache)
			.field("refreshing", &self.is_refreshing())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, clock::ManualClock, store::MemoryStore};

	#[test]
	fn persisted_credential_is_loaded_on_construction() {
		let persistence = Arc::new(MemoryStore::default());
		let config = test_config();
		let stored = credential("AK", TEST_EPOCH, Duration::hours(1));

		persistence
			.set(
				&config.storage_key,
				&serde_json::to_string(&stored).expect("Credential should serialize."),
			)
			.expect("Seeding persistence should succeed.");

		let presigner = <Presigner<ScriptedIssuer>>::with_issuer(
			config,
			persistence,
			ScriptedIssuer::failing(500),
		)
		.with_clock(Arc::new(ManualClock::new(TEST_EPOCH)));

		assert_eq!(presigner.credential(), stored);
		assert_eq!(presigner.credential_state(), CredentialState::Valid);
		assert!(!presigner.is_refreshing());
		assert_eq!(presigner.last_failure_at(), None);
	}

	#[test]
	fn background_refresh_needs_a_runtime() {
		let (presigner, issuer, _, _) = build_scripted_presigner(ScriptedIssuer::failing(500));

		assert!(!presigner.warm_up());
		assert!(!presigner.is_refreshing());
		assert_eq!(issuer.calls(), 0);
	}

	#[tokio::test]
	async fn warm_up_fetches_the_first_credential() {
		let (presigner, issuer, persistence, _) = build_scripted_presigner(
			ScriptedIssuer::issuing(issued("AK", TEST_EPOCH, Duration::hours(1))),
		);
		let mut rx = presigner.subscribe();

		assert!(presigner.warm_up());

		rx.changed().await.expect("Cache sender should stay alive.");

		assert_eq!(rx.borrow().access_key_id.as_deref(), Some("AK"));
		assert_eq!(issuer.calls(), 1);
		assert!(
			persistence
				.get(&presigner.config.storage_key)
				.expect("Persistence reads should succeed.")
				.is_some()
		);
	}
}
