//! Temporary credential model: the cached four-field value, its lifecycle states, and the
//! payload returned by the issuing endpoint.

pub mod secret;

pub use secret::KeySecret;

// self
use crate::_prelude::*;

/// Lifecycle state of a [`Credential`] as observed by the signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialState {
	/// At least one of the key id, key secret, session token, or expiry is absent.
	Missing,
	/// Every field is present but the expiry instant has passed.
	Expired,
	/// Still valid, but inside the refresh buffer.
	NearExpiry,
	/// Valid with more than the refresh buffer remaining.
	Valid,
}
impl CredentialState {
	/// Returns `true` when the credential can sign URLs.
	pub fn is_usable(self) -> bool {
		matches!(self, Self::NearExpiry | Self::Valid)
	}
}

/// Cached temporary credential.
///
/// The four fields are replaced together: a credential is either fully populated from an
/// [`IssuedCredential`] or [`empty`](Credential::empty). A partially populated value can only
/// come from tampered persistence and is treated as [`CredentialState::Missing`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Credential {
	/// Access key id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access_key_id: Option<String>,
	/// Access key secret used as the HMAC key.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access_key_secret: Option<KeySecret>,
	/// Session token appended to every signed URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub security_token: Option<KeySecret>,
	/// Instant after which the issuer rejects the credential.
	#[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	pub expiration: Option<OffsetDateTime>,
}
impl Credential {
	/// The all-absent credential.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Returns `true` when every field is absent.
	pub fn is_empty(&self) -> bool {
		self.access_key_id.is_none()
			&& self.access_key_secret.is_none()
			&& self.security_token.is_none()
			&& self.expiration.is_none()
	}

	/// Classifies the credential at `now`, using `refresh_buffer` as the near-expiry margin.
	pub fn state_at(&self, now: OffsetDateTime, refresh_buffer: Duration) -> CredentialState {
		let Some(expiration) = self.expiration else {
			return CredentialState::Missing;
		};

		if self.signing_material().is_none() {
			return CredentialState::Missing;
		}
		if expiration <= now {
			return CredentialState::Expired;
		}
		if expiration - now < refresh_buffer {
			return CredentialState::NearExpiry;
		}

		CredentialState::Valid
	}

	/// Borrows the fields the signer needs, or `None` when any of them is absent or blank.
	pub fn signing_material(&self) -> Option<SigningMaterial<'_>> {
		let access_key_id = self.access_key_id.as_deref().filter(|id| !id.is_empty())?;
		let access_key_secret = self.access_key_secret.as_ref().filter(|s| !s.is_empty())?;
		let security_token = self.security_token.as_ref().filter(|t| !t.is_empty())?;

		Some(SigningMaterial { access_key_id, access_key_secret, security_token })
	}
}
impl From<IssuedCredential> for Credential {
	fn from(issued: IssuedCredential) -> Self {
		Self {
			access_key_id: Some(issued.access_key_id),
			access_key_secret: Some(issued.access_key_secret),
			security_token: Some(issued.security_token),
			expiration: Some(issued.expiration),
		}
	}
}

/// Borrowed view over the fields required to sign a URL.
#[derive(Clone, Copy, Debug)]
pub struct SigningMaterial<'a> {
	/// Access key id placed in `OSSAccessKeyId`.
	pub access_key_id: &'a str,
	/// HMAC key.
	pub access_key_secret: &'a KeySecret,
	/// Session token placed in the canonical string and in `security-token`.
	pub security_token: &'a KeySecret,
}

/// Credential payload returned by the issuing endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
	/// Access key id.
	pub access_key_id: String,
	/// Access key secret.
	pub access_key_secret: KeySecret,
	/// Session token.
	pub security_token: KeySecret,
	/// ISO-8601 expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expiration: OffsetDateTime,
}
