//! Fetches a temporary credential from a mocked issuing endpoint and signs a download URL with
//! the default reqwest transport and the in-memory store.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use sts_presigner::{
	config::{PresignerConfig, SignOptions},
	http::ReqwestIssuer,
	presigner::ReqwestPresigner,
	reqwest::Client,
	store::MemoryStore,
	time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expiration = (OffsetDateTime::now_utc() + Duration::hours(1)).format(&Rfc3339)?;
	let issuer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sts");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"accessKeyId\":\"demo-id\",\"accessKeySecret\":\"demo-secret\",\"securityToken\":\"demo-token\",\"expiration\":\"{expiration}\"}}"
			));
		})
		.await;
	let config = PresignerConfig::builder(Url::parse(&server.url("/sts"))?)
		.proxy("https://cdn.example.com/", "media")
		.build()?;
	// The mock serves a self-signed certificate.
	let issuer = ReqwestIssuer::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let presigner =
		ReqwestPresigner::with_issuer(config, Arc::new(MemoryStore::default()), issuer);
	let url = "https://demo-bucket.oss-cn-hangzhou.aliyuncs.com/reports/2025.pdf";
	let mut updates = presigner.subscribe();

	// The first sign finds an empty cache and only schedules the refresh.
	assert!(presigner.sign(url, &SignOptions::default())?.is_empty());

	tokio::time::timeout(StdDuration::from_secs(10), updates.changed()).await??;

	println!("Signed download URL: {}.", presigner.sign(url, &SignOptions::default())?);
	println!(
		"Signed upload URL: {}.",
		presigner.sign(url, &SignOptions::default().with_method("PUT").with_expires_in(300))?
	);

	issuer_mock.assert_async().await;

	Ok(())
}
