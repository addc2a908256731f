// self
use crate::{
	_prelude::*,
	config::{OutputBase, PresignerConfig, ResourceEncoding},
};

/// Errors raised while constructing or validating configurations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PresignerConfigError {
	/// Issuing endpoint must be an HTTP(S) URL.
	#[error("The issuing endpoint must use HTTP or HTTPS: {url}.")]
	UnsupportedIssuerScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Persistence key must not be blank.
	#[error("Storage key must not be empty.")]
	EmptyStorageKey,
	/// Durations must not be negative.
	#[error("The {field} duration must not be negative.")]
	NegativeDuration {
		/// Which duration failed validation.
		field: &'static str,
	},
	/// Signed URLs need a positive lifetime.
	#[error("Default signed URL lifetime must be positive.")]
	NonPositiveExpiresIn,
	/// Signed method must not be blank.
	#[error("Default signing method must not be empty.")]
	EmptyMethod,
}

/// Builder for [`PresignerConfig`] values.
#[derive(Debug)]
pub struct PresignerConfigBuilder {
	/// Issuing endpoint.
	pub issuer_endpoint: Url,
	/// Persistence key.
	pub storage_key: String,
	/// Failure cooldown.
	pub cooldown: Duration,
	/// Near-expiry buffer.
	pub refresh_buffer: Duration,
	/// Default signed URL lifetime in seconds.
	pub default_expires_in: u64,
	/// Default signed method.
	pub default_method: String,
	/// Base of returned URLs.
	pub output: OutputBase,
	/// Canonical resource encoding.
	pub resource_encoding: ResourceEncoding,
}
impl PresignerConfigBuilder {
	/// Creates a new builder seeded with defaults and the provided issuing endpoint.
	pub fn new(issuer_endpoint: Url) -> Self {
		Self {
			issuer_endpoint,
			storage_key: PresignerConfig::DEFAULT_STORAGE_KEY.into(),
			cooldown: PresignerConfig::DEFAULT_COOLDOWN,
			refresh_buffer: PresignerConfig::DEFAULT_REFRESH_BUFFER,
			default_expires_in: PresignerConfig::DEFAULT_EXPIRES_IN,
			default_method: PresignerConfig::DEFAULT_METHOD.into(),
			output: OutputBase::default(),
			resource_encoding: ResourceEncoding::default(),
		}
	}

	/// Sets the persistence key.
	pub fn storage_key(mut self, key: impl Into<String>) -> Self {
		self.storage_key = key.into();

		self
	}

	/// Sets the failure cooldown.
	pub fn cooldown(mut self, cooldown: Duration) -> Self {
		self.cooldown = cooldown;

		self
	}

	/// Sets the near-expiry buffer.
	pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
		self.refresh_buffer = buffer;

		self
	}

	/// Sets the default signed URL lifetime in seconds.
	pub fn default_expires_in(mut self, seconds: u64) -> Self {
		self.default_expires_in = seconds;

		self
	}

	/// Sets the default signed method.
	pub fn default_method(mut self, method: impl Into<String>) -> Self {
		self.default_method = method.into();

		self
	}

	/// Routes signed URLs through a local proxy at `<prefix><segment>`.
	pub fn proxy(mut self, prefix: impl Into<String>, segment: impl Into<String>) -> Self {
		self.output = OutputBase::Proxy { prefix: prefix.into(), segment: segment.into() };

		self
	}

	/// Keeps the storage origin in signed URLs.
	pub fn keep_origin(mut self) -> Self {
		self.output = OutputBase::Origin;

		self
	}

	/// Overrides the canonical resource encoding.
	pub fn resource_encoding(mut self, encoding: ResourceEncoding) -> Self {
		self.resource_encoding = encoding;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<PresignerConfig, PresignerConfigError> {
		let config = PresignerConfig {
			issuer_endpoint: self.issuer_endpoint,
			storage_key: self.storage_key,
			cooldown: self.cooldown,
			refresh_buffer: self.refresh_buffer,
			default_expires_in: self.default_expires_in,
			default_method: self.default_method,
			output: self.output,
			resource_encoding: self.resource_encoding,
		};

		config.validate()?;

		Ok(config)
	}
}

impl PresignerConfig {
	fn validate(&self) -> Result<(), PresignerConfigError> {
		if !matches!(self.issuer_endpoint.scheme(), "http" | "https") {
			return Err(PresignerConfigError::UnsupportedIssuerScheme {
				url: self.issuer_endpoint.to_string(),
			});
		}
		if self.storage_key.trim().is_empty() {
			return Err(PresignerConfigError::EmptyStorageKey);
		}
		if self.cooldown.is_negative() {
			return Err(PresignerConfigError::NegativeDuration { field: "cooldown" });
		}
		if self.refresh_buffer.is_negative() {
			return Err(PresignerConfigError::NegativeDuration { field: "refresh_buffer" });
		}
		if self.default_expires_in == 0 {
			return Err(PresignerConfigError::NonPositiveExpiresIn);
		}
		if self.default_method.trim().is_empty() {
			return Err(PresignerConfigError::EmptyMethod);
		}

		Ok(())
	}
}
