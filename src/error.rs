//! Crate-level error types shared by the cache, the refresher, and the signer.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Persistence-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the refresher retries after its cooldown.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Resource URL handed to the signer cannot be parsed.
	#[error("Resource URL is invalid.")]
	InvalidResourceUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HMAC implementation rejected the key secret.
	#[error("Key secret cannot be used as an HMAC-SHA1 key.")]
	InvalidSigningKey,
	/// Resource URL parsed but carries no host to derive the bucket from.
	#[error("Resource URL `{url}` has no host.")]
	ResourceUrlWithoutHost {
		/// Offending URL.
		url: String,
	},
}

impl Error {
	/// HTTP status reported by the issuing endpoint, if the failure carries one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transient(e) => e.status(),
			_ => None,
		}
	}

	/// `Retry-After` hint reported by the issuing endpoint, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Transient(TransientError::IssuerEndpoint { retry_after, .. }) => *retry_after,
			_ => None,
		}
	}
}

/// Configuration failures raised while wiring transports.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Issuing endpoint answered with a non-success status.
	#[error("Issuing endpoint returned an unexpected response: {message}.")]
	IssuerEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Issuing endpoint responded with JSON that does not describe a credential.
	#[error("Issuing endpoint returned malformed JSON.")]
	CredentialParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransientError {
	/// HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::IssuerEndpoint { status, .. } | Self::CredentialParse { status, .. } => *status,
		}
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the issuing endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
