//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::{future::Future, sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::MockServer;
// self
use sts_presigner::{
	clock::ManualClock,
	config::PresignerConfig,
	http::ReqwestIssuer,
	presigner::ReqwestPresigner,
	reqwest::Client,
	store::KeyValueStore,
	time::OffsetDateTime,
	url::Url,
};

/// Longest time any test waits for a background refresh.
pub const WAIT: StdDuration = StdDuration::from_secs(10);

/// Issuer that trusts the self-signed certificate served by `httpmock`.
pub fn mock_issuer() -> ReqwestIssuer {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestIssuer::with_client(client)
}

/// Issuing endpoint served by `server`.
pub fn issuer_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/sts")).expect("Mock issuer endpoint should parse.")
}

/// Presigner over the mock issuer with a manual clock pinned at `now`.
pub fn build_presigner(
	config: PresignerConfig,
	persistence: Arc<dyn KeyValueStore>,
	now: OffsetDateTime,
) -> (ReqwestPresigner, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::new(now));
	let presigner =
		ReqwestPresigner::with_issuer(config, persistence, mock_issuer()).with_clock(clock.clone());

	(presigner, clock)
}

/// Awaits `fut`, failing the test instead of hanging when it never resolves.
pub async fn within<F>(fut: F) -> F::Output
where
	F: Future,
{
	tokio::time::timeout(WAIT, fut).await.expect("Background refresh should settle in time.")
}
