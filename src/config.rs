//! Presigner configuration: issuing endpoint, persistence key, refresh timing, and the shape of
//! the URLs handed back to callers.

/// Builder API for assembling configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Where signed URLs point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputBase {
	/// Rewrites the storage origin to `<prefix><segment><objectPath>` so a local reverse proxy
	/// fronts the bucket and the storage domain never reaches clients.
	Proxy {
		/// Application base path, e.g. `/` or `/app/`.
		prefix: String,
		/// Proxy route placed between the prefix and the object path.
		segment: String,
	},
	/// Keeps the storage origin of the resource URL.
	Origin,
}
impl Default for OutputBase {
	fn default() -> Self {
		Self::Proxy { prefix: "/".into(), segment: "media".into() }
	}
}

/// How the object path is encoded inside the canonical resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceEncoding {
	#[default]
	/// Re-encodes multi-byte UTF-8 paths as their Latin-1 byte-equivalent string.
	Latin1,
	/// Uses the object path unchanged.
	Verbatim,
}

/// Validated presigner configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignerConfig {
	/// Absolute URL of the issuing endpoint (`GET /sts`).
	pub issuer_endpoint: Url,
	/// Persistence key holding the serialized credential.
	pub storage_key: String,
	/// Window after a failed refresh during which no new refresh starts.
	pub cooldown: Duration,
	/// Remaining validity below which signing triggers a background refresh.
	pub refresh_buffer: Duration,
	/// Lifetime of signed URLs when the caller does not pick one, in seconds.
	pub default_expires_in: u64,
	/// HTTP method signed when the caller does not pick one.
	pub default_method: String,
	/// Base of the returned URLs.
	pub output: OutputBase,
	/// Canonical resource encoding.
	pub resource_encoding: ResourceEncoding,
}
impl PresignerConfig {
	/// Default persistence key.
	pub const DEFAULT_STORAGE_KEY: &'static str = "sts-presigner:credential";
	/// Default failure cooldown.
	pub const DEFAULT_COOLDOWN: Duration = Duration::seconds(10);
	/// Default near-expiry buffer.
	pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::minutes(5);
	/// Default signed URL lifetime in seconds.
	pub const DEFAULT_EXPIRES_IN: u64 = 1800;
	/// Default signed method.
	pub const DEFAULT_METHOD: &'static str = "GET";

	/// Creates a new builder for the provided issuing endpoint.
	pub fn builder(issuer_endpoint: Url) -> PresignerConfigBuilder {
		PresignerConfigBuilder::new(issuer_endpoint)
	}
}

/// Per-call signing options; unset fields fall back to the configuration defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOptions {
	/// HTTP method the URL will be used with.
	pub method: Option<String>,
	/// Lifetime of the signed URL in seconds.
	pub expires_in_seconds: Option<u64>,
}
impl SignOptions {
	/// Overrides the signed method.
	pub fn with_method(mut self, method: impl Into<String>) -> Self {
		self.method = Some(method.into());

		self
	}

	/// Overrides the signed URL lifetime.
	pub fn with_expires_in(mut self, seconds: u64) -> Self {
		self.expires_in_seconds = Some(seconds);

		self
	}

	pub(crate) fn resolve<'a>(&'a self, config: &'a PresignerConfig) -> (&'a str, u64) {
		(
			self.method.as_deref().unwrap_or(&config.default_method),
			self.expires_in_seconds.unwrap_or(config.default_expires_in),
		)
	}
}
