//! OSS-compatible query-string signing.
//!
//! The storage provider recomputes the canonical string
//!
//! ```text
//! METHOD \n \n \n EXPIRES \n /BUCKET/OBJECT?security-token=TOKEN
//! ```
//!
//! from the request it receives (the two blank lines are the unused content-MD5 and
//! content-type slots) and compares `base64(HMAC-SHA1(secret, canonical))` against the
//! `Signature` query parameter. Everything here must therefore stay byte-for-byte stable.

/// Latin-1 re-encoding of object paths.
pub mod latin1;

pub use latin1::latin1_reencode;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	config::{OutputBase, ResourceEncoding},
	credential::{KeySecret, SigningMaterial},
};

type HmacSha1 = Hmac<Sha1>;

/// Parses a resource URL, mapping failures into [`Error::InvalidResourceUrl`].
pub fn parse_resource_url(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| Error::InvalidResourceUrl { source })
}

/// Builds `/<bucket>/<object>` where the bucket is the first host label and the object is the
/// path without its leading slashes.
pub fn canonical_resource(url: &Url, encoding: ResourceEncoding) -> Result<String> {
	let host = url
		.host_str()
		.filter(|host| !host.is_empty())
		.ok_or_else(|| Error::ResourceUrlWithoutHost { url: url.to_string() })?;
	let bucket = host.split('.').next().unwrap_or(host);
	let object = url.path().trim_start_matches('/');
	let object = match encoding {
		ResourceEncoding::Latin1 => latin1_reencode(object),
		ResourceEncoding::Verbatim => Cow::Borrowed(object),
	};

	Ok(format!("/{bucket}/{object}"))
}

/// Assembles the canonical string the provider verifies.
pub fn canonical_string(
	method: &str,
	expires: i64,
	resource: &str,
	security_token: &str,
) -> String {
	format!("{method}\n\n\n{expires}\n{resource}?security-token={security_token}")
}

/// Computes `base64(HMAC-SHA1(secret, canonical))`.
pub fn sign_canonical(canonical: &str, secret: &KeySecret) -> Result<String> {
	let mut mac = HmacSha1::new_from_slice(secret.expose().as_bytes())
		.map_err(|_| Error::InvalidSigningKey)?;

	mac.update(canonical.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Absolute expiry (Unix seconds) for a URL signed at `now` that lives `expires_in` seconds.
pub fn expires_at(now: OffsetDateTime, expires_in: u64) -> i64 {
	now.unix_timestamp().saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX))
}

/// Fully specified presign request.
#[derive(Clone, Copy, Debug)]
pub struct PresignRequest<'a> {
	/// Resource to sign.
	pub url: &'a Url,
	/// HTTP method the URL will be used with.
	pub method: &'a str,
	/// Absolute expiry in Unix seconds.
	pub expires: i64,
	/// Canonical resource encoding.
	pub encoding: ResourceEncoding,
	/// Base of the rendered URL.
	pub output: &'a OutputBase,
}

/// Signs `request` with `material` and renders the final URL.
pub fn presign(request: PresignRequest<'_>, material: SigningMaterial<'_>) -> Result<String> {
	let resource = canonical_resource(request.url, request.encoding)?;
	let canonical = canonical_string(
		request.method,
		request.expires,
		&resource,
		material.security_token.expose(),
	);
	let signature = sign_canonical(&canonical, material.access_key_secret)?;
	let base = match request.output {
		OutputBase::Proxy { prefix, segment } => format!("{prefix}{segment}{}", request.url.path()),
		OutputBase::Origin =>
			format!("{}{}", request.url.origin().ascii_serialization(), request.url.path()),
	};

	Ok(format!(
		"{base}?OSSAccessKeyId={}&Expires={}&Signature={}&security-token={}",
		material.access_key_id,
		request.expires,
		urlencoding::encode(&signature),
		urlencoding::encode(material.security_token.expose()),
	))
}
