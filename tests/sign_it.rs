#![cfg(feature = "reqwest")]

mod common;

// std
use std::{env, fs, path::PathBuf, process, sync::Arc};
// crates.io
use httpmock::prelude::*;
// self
use sts_presigner::{
	config::{PresignerConfig, SignOptions},
	credential::{CredentialState, KeySecret},
	signature,
	store::FileStore,
	time::{OffsetDateTime, macros::datetime},
};

const RESOURCE: &str = "https://bucket1.oss.example.com/folder/file.txt";
const NOW: OffsetDateTime = datetime!(2025-11-10 12:00 UTC);

fn temp_path(label: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"sts_presigner_sign_it_{label}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

fn config(server: &MockServer) -> PresignerConfig {
	PresignerConfig::builder(common::issuer_endpoint(server)).build().expect("Config should build.")
}

#[tokio::test]
async fn warm_up_then_sign_and_reload_from_disk() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sts").header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body(
				r#"{"accessKeyId":"AK","accessKeySecret":"SK","securityToken":"TOK","expiration":"2025-11-10T13:00:00Z"}"#,
			);
		})
		.await;
	let path = temp_path("warm_up");
	let store = Arc::new(FileStore::open(&path).expect("File store should open."));
	let (presigner, _) = common::build_presigner(config(&server), store, NOW);
	let mut rx = presigner.subscribe();

	assert_eq!(
		presigner.sign(RESOURCE, &SignOptions::default()).expect("Signing should not error."),
		""
	);

	common::within(rx.changed()).await.expect("Cache sender should stay alive.");

	mock.assert_calls_async(1).await;

	assert_eq!(presigner.credential_state(), CredentialState::Valid);

	let signed =
		presigner.sign(RESOURCE, &SignOptions::default()).expect("Signing should succeed.");
	let expected = signature::sign_canonical(
		&signature::canonical_string("GET", 1_762_777_800, "/bucket1/folder/file.txt", "TOK"),
		&KeySecret::new("SK"),
	)
	.expect("HMAC-SHA1 should accept the key.");

	assert_eq!(expected, "Nf+XAM3Uh6jDzHtStQHCGDWuxr8=");
	assert_eq!(
		signed,
		"/media/folder/file.txt?OSSAccessKeyId=AK&Expires=1762777800&Signature=Nf%2BXAM3Uh6jDzHtStQHCGDWuxr8%3D&security-token=TOK"
	);

	let reopened = Arc::new(FileStore::open(&path).expect("File store should reopen."));
	let (reloaded, _) = common::build_presigner(config(&server), reopened, NOW);

	assert_eq!(reloaded.sign(RESOURCE, &SignOptions::default()).ok(), Some(signed));
	assert!(!reloaded.is_refreshing());

	mock.assert_calls_async(1).await;

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store {}: {e}", path.display())
	});
}

#[tokio::test]
async fn origin_output_keeps_the_storage_host() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/sts");
			then.status(200).header("content-type", "application/json").body(
				r#"{"accessKeyId":"AK","accessKeySecret":"SK","securityToken":"T/K+","expiration":"2025-11-10T13:00:00Z"}"#,
			);
		})
		.await;

	let config = PresignerConfig::builder(common::issuer_endpoint(&server))
		.keep_origin()
		.default_expires_in(600)
		.build()
		.expect("Config should build.");
	let path = temp_path("origin");
	let store = Arc::new(FileStore::open(&path).expect("File store should open."));
	let (presigner, _) = common::build_presigner(config, store, NOW);

	assert!(common::within(presigner.refresh()).await.is_success());

	let signed = presigner
		.sign(RESOURCE, &SignOptions::default().with_method("PUT"))
		.expect("Signing should succeed.");

	assert!(signed.starts_with(
		"https://bucket1.oss.example.com/folder/file.txt?OSSAccessKeyId=AK&Expires=1762776600&"
	));
	assert!(signed.ends_with("&security-token=T%2FK%2B"));

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store {}: {e}", path.display())
	});
}
