//! Secret wrapper that keeps key secrets and session tokens out of logs.

// self
use crate::_prelude::*;

/// Redacted secret wrapper for the key secret and the session token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySecret(String);
impl KeySecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped value is the empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for KeySecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for KeySecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("KeySecret").field(&"<redacted>").finish()
	}
}
impl Display for KeySecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
