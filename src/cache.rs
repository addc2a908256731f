//! Process-wide credential cache backed by a [`KeyValueStore`].
//!
//! [`CredentialCache`] is the single source of truth for the current temporary credential.
//! Reads return a snapshot, writes replace all four fields at once, persist the new value,
//! and publish it to every [`watch`] subscriber. Neither operation suspends or fails:
//! persistence problems are reported through [`obs`] and the in-memory value stays
//! authoritative.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	credential::Credential,
	obs,
	store::{KeyValueStore, StoreError},
};

/// Credential store shared by the refresher and the signer.
pub struct CredentialCache {
	persistence: Arc<dyn KeyValueStore>,
	key: String,
	current: watch::Sender<Credential>,
	revision: AtomicU64,
}
impl CredentialCache {
	/// Loads the persisted credential under `key`, falling back to the empty credential when the
	/// entry is missing or unreadable.
	pub fn load(persistence: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
		let key = key.into();
		let initial = match persistence.get(&key) {
			Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
				obs::emit_store_failure(
					&key,
					&StoreError::Serialization {
						message: format!("Failed to parse the persisted credential: {e}"),
					},
				);

				Credential::empty()
			}),
			Ok(None) => Credential::empty(),
			Err(e) => {
				obs::emit_store_failure(&key, &e);

				Credential::empty()
			},
		};
		let (current, _) = watch::channel(initial);

		Self { persistence, key, current, revision: AtomicU64::new(0) }
	}

	/// Returns a snapshot of the current credential.
	pub fn read(&self) -> Credential {
		self.current.borrow().clone()
	}

	/// Replaces the credential, persists it, and notifies subscribers.
	pub fn write(&self, credential: Credential) {
		self.persist(&credential);
		self.current.send_replace(credential);
		self.revision.fetch_add(1, Ordering::SeqCst);
	}

	/// Subscribes to credential replacements.
	pub fn subscribe(&self) -> watch::Receiver<Credential> {
		self.current.subscribe()
	}

	/// Number of writes since the cache was loaded.
	pub fn revision(&self) -> u64 {
		self.revision.load(Ordering::SeqCst)
	}

	/// Persistence key used by this cache.
	pub fn key(&self) -> &str {
		&self.key
	}

	fn persist(&self, credential: &Credential) {
		let result = serde_json::to_string(credential)
			.map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize the credential: {e}"),
			})
			.and_then(|raw| self.persistence.set(&self.key, &raw));

		if let Err(e) = result {
			obs::emit_store_failure(&self.key, &e);
		}
	}
}
impl Debug for CredentialCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("key", &self.key)
			.field("revision", &self.revision())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{TEST_EPOCH, credential},
		store::MemoryStore,
	};

	const KEY: &str = "test:credential";

	struct BrokenStore;
	impl KeyValueStore for BrokenStore {
		fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn remove(&self, _key: &str) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}
	}

	#[test]
	fn write_persists_and_survives_reload() {
		let store = Arc::new(MemoryStore::default());
		let cache = CredentialCache::load(store.clone(), KEY);
		let value = credential("AK", TEST_EPOCH, Duration::hours(1));

		assert!(cache.read().is_empty());

		cache.write(value.clone());

		assert_eq!(cache.read(), value);
		assert_eq!(cache.revision(), 1);

		let reloaded = CredentialCache::load(store, KEY);

		assert_eq!(reloaded.read(), value);
		assert_eq!(reloaded.revision(), 0);
	}

	#[test]
	fn unreadable_persisted_value_loads_empty() {
		let store = Arc::new(MemoryStore::default());

		store.set(KEY, "{broken").expect("Seeding the memory store should succeed.");

		let cache = CredentialCache::load(store, KEY);

		assert!(cache.read().is_empty());
	}

	#[test]
	fn persistence_failures_keep_memory_authoritative() {
		let cache = CredentialCache::load(Arc::new(BrokenStore), KEY);
		let value = credential("AK", TEST_EPOCH, Duration::hours(1));

		cache.write(value.clone());

		assert_eq!(cache.read(), value);
	}

	#[tokio::test]
	async fn subscribers_observe_whole_replacements() {
		let cache = CredentialCache::load(Arc::new(MemoryStore::default()), KEY);
		let mut rx = cache.subscribe();
		let value = credential("AK", TEST_EPOCH, Duration::hours(1));

		cache.write(value.clone());
		rx.changed().await.expect("Cache sender should stay alive.");

		assert_eq!(*rx.borrow_and_update(), value);

		cache.write(Credential::empty());
		rx.changed().await.expect("Cache sender should stay alive.");

		assert!(rx.borrow().is_empty());
	}
}
