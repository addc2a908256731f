//! Transport primitives for fetching temporary credentials from the issuing endpoint.
//!
//! The module exposes [`CredentialIssuer`], the presigner's only dependency on an HTTP
//! stack, plus the reqwest-backed [`ReqwestIssuer`]. Any non-2xx status, transport failure,
//! or malformed body is a refresh failure; timeouts are whatever the transport enforces.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, credential::IssuedCredential, error::TransientError};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Boxed future returned by [`CredentialIssuer::issue`].
pub type IssueFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedCredential>> + 'a + Send>>;

/// Abstraction over transports able to call the issuing endpoint.
///
/// Implementations must be `Send + Sync + 'static` so the presigner can move them into the
/// background task that owns a refresh, and the returned future must be `Send` for the same
/// reason.
pub trait CredentialIssuer
where
	Self: 'static + Send + Sync,
{
	/// Performs `GET endpoint` and decodes the issued credential.
	fn issue<'a>(&'a self, endpoint: &'a Url) -> IssueFuture<'a>;
}

/// Decodes an issuing endpoint body, keeping the JSON path of the first mismatch.
pub fn parse_issued_credential(body: &[u8], status: Option<u16>) -> Result<IssuedCredential> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::CredentialParse { source, status }.into())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestIssuer(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestIssuer {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a dedicated client that aborts issuing calls after `timeout`.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self> {
		let client = ReqwestClient::builder().timeout(timeout).build().map_err(ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestIssuer {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestIssuer {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CredentialIssuer for ReqwestIssuer {
	fn issue<'a>(&'a self, endpoint: &'a Url) -> IssueFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(endpoint.clone())
				.header(ACCEPT, "application/json")
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();

			if !status.is_success() {
				let retry_after = parse_retry_after(response.headers());

				return Err(TransientError::IssuerEndpoint {
					message: format!("HTTP {}", status.as_u16()),
					status: Some(status.as_u16()),
					retry_after,
				}
				.into());
			}

			let body = response.bytes().await.map_err(TransportError::from)?;

			parse_issued_credential(&body, Some(status.as_u16()))
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_reports_the_failing_field() {
		let err = parse_issued_credential(
			br#"{"accessKeyId":"AK","accessKeySecret":"SK","securityToken":"T","expiration":"soon"}"#,
			Some(200),
		)
		.expect_err("Invalid expiration should fail to parse.");

		match err {
			Error::Transient(TransientError::CredentialParse { source, status }) => {
				assert_eq!(source.path().to_string(), "expiration");
				assert_eq!(status, Some(200));
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "30".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn timeout_surfaces_as_a_transport_error() {
		// crates.io
		use httpmock::prelude::*;

		let server = MockServer::start_async().await;

		server
			.mock_async(|when, then| {
				when.method(GET).path("/slow");
				then.status(200).delay(std::time::Duration::from_millis(500));
			})
			.await;

		let issuer = ReqwestIssuer::with_timeout(std::time::Duration::from_millis(50))
			.expect("Client with a timeout should build.");
		let endpoint = Url::parse(&server.url("/slow")).expect("Mock endpoint should parse.");
		let err = issuer.issue(&endpoint).await.expect_err("Slow issuer should time out.");

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn reqwest_issuer_maps_statuses() {
		// crates.io
		use httpmock::prelude::*;

		let server = MockServer::start_async().await;
		let ok = server
			.mock_async(|when, then| {
				when.method(GET).path("/sts");
				then.status(200).header("content-type", "application/json").body(
					r#"{"accessKeyId":"AK","accessKeySecret":"SK","securityToken":"TOK","expiration":"2030-01-01T00:00:00Z"}"#,
				);
			})
			.await;
		let issuer = crate::_preludet::test_reqwest_issuer();
		let endpoint = Url::parse(&server.url("/sts")).expect("Mock endpoint should parse.");
		let issued = issuer.issue(&endpoint).await.expect("Issuer call should succeed.");

		ok.assert_async().await;

		assert_eq!(issued.access_key_id, "AK");
		assert_eq!(issued.security_token.expose(), "TOK");

		let failing = Url::parse(&server.url("/missing")).expect("Mock endpoint should parse.");
		let err = issuer.issue(&failing).await.expect_err("Unmatched route should fail.");

		assert!(matches!(err, Error::Transient(TransientError::IssuerEndpoint { .. })));
	}
}
