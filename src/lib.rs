//! Temporary-credential cache and pre-signed URL generator for STS-protected object storage.
//!
//! A [`presigner::Presigner`] keeps one cached credential fresh with deduplicated refreshes and
//! signs OSS-compatible query-string URLs from it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod obs;
pub mod presigner;
pub mod signature;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use tokio::sync::Notify;
	// self
	use crate::{
		clock::{Clock, ManualClock},
		config::PresignerConfig,
		credential::{Credential, IssuedCredential, KeySecret},
		error::TransientError,
		http::{CredentialIssuer, IssueFuture},
		presigner::Presigner,
		store::{KeyValueStore, MemoryStore},
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestIssuer;

	/// Fixed instant every test clock starts from.
	pub const TEST_EPOCH: OffsetDateTime = time::macros::datetime!(2025-11-10 12:00 UTC);

	/// Scripted [`CredentialIssuer`] that counts calls and can be held open with a gate.
	#[derive(Debug, Default)]
	pub struct ScriptedIssuer {
		responses: Mutex<Vec<Result<IssuedCredential, u16>>>,
		calls: AtomicUsize,
		gate: Option<Arc<Notify>>,
	}
	impl ScriptedIssuer {
		/// Issuer that answers every call with the provided credential.
		pub fn issuing(credential: IssuedCredential) -> Self {
			Self { responses: Mutex::new(vec![Ok(credential)]), ..Default::default() }
		}

		/// Issuer that fails every call with the provided HTTP status.
		pub fn failing(status: u16) -> Self {
			Self { responses: Mutex::new(vec![Err(status)]), ..Default::default() }
		}

		/// Queues responses; the last one repeats once the queue drains.
		pub fn scripted(responses: Vec<Result<IssuedCredential, u16>>) -> Self {
			let mut responses = responses;

			responses.reverse();

			Self { responses: Mutex::new(responses), ..Default::default() }
		}

		/// Holds every call open until the returned [`Notify`] is signalled.
		pub fn gated(mut self) -> (Self, Arc<Notify>) {
			let gate = Arc::new(Notify::new());

			self.gate = Some(gate.clone());

			(self, gate)
		}

		/// Number of calls that reached the issuer.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		fn next_response(&self) -> Result<IssuedCredential, u16> {
			let mut responses = self.responses.lock();

			if responses.len() > 1 {
				responses.pop().unwrap_or(Err(500))
			} else {
				responses.last().cloned().unwrap_or(Err(500))
			}
		}
	}
	impl CredentialIssuer for ScriptedIssuer {
		fn issue<'a>(&'a self, _endpoint: &'a Url) -> IssueFuture<'a> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);

				if let Some(gate) = self.gate.as_ref() {
					gate.notified().await;
				}

				self.next_response().map_err(|status| {
					TransientError::IssuerEndpoint {
						message: "Scripted issuer failure".into(),
						status: Some(status),
						retry_after: None,
					}
					.into()
				})
			})
		}
	}

	/// Builds an issued credential expiring `ttl` after `now`.
	pub fn issued(id: &str, now: OffsetDateTime, ttl: Duration) -> IssuedCredential {
		IssuedCredential {
			access_key_id: id.into(),
			access_key_secret: KeySecret::new(format!("{id}-secret")),
			security_token: KeySecret::new(format!("{id}-token")),
			expiration: now + ttl,
		}
	}

	/// Builds a usable stored credential expiring `ttl` after `now`.
	pub fn credential(id: &str, now: OffsetDateTime, ttl: Duration) -> Credential {
		issued(id, now, ttl).into()
	}

	/// Default configuration pointing at an unreachable test issuer.
	pub fn test_config() -> PresignerConfig {
		PresignerConfig::builder(
			Url::parse("https://issuer.invalid/sts").expect("Test issuer URL should parse."),
		)
		.build()
		.expect("Default test configuration should be valid.")
	}

	/// Constructs a [`Presigner`] over a scripted issuer, in-memory persistence, and a manual
	/// clock pinned at [`TEST_EPOCH`].
	pub fn build_scripted_presigner(
		issuer: ScriptedIssuer,
	) -> (Presigner<ScriptedIssuer>, Arc<ScriptedIssuer>, Arc<MemoryStore>, Arc<ManualClock>) {
		let issuer = Arc::new(issuer);
		let persistence = Arc::new(MemoryStore::default());
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let store: Arc<dyn KeyValueStore> = persistence.clone();
		let shared_clock: Arc<dyn Clock> = clock.clone();
		let presigner =
			<Presigner<ScriptedIssuer>>::with_issuer(test_config(), store, issuer.clone())
				.with_clock(shared_clock);

		(presigner, issuer, persistence, clock)
	}

	/// Builds a reqwest issuer that accepts the self-signed certificates produced by `httpmock`.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_issuer() -> ReqwestIssuer {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestIssuer::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
