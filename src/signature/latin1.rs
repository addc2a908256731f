//! Byte-preserving Latin-1 view of UTF-8 strings.

// self
use crate::_prelude::*;

/// Re-encodes `value` so every UTF-8 byte becomes one Latin-1 (ISO-8859-1) character.
///
/// ASCII input is returned unchanged and borrowed. For anything else the result has exactly one
/// `char` per UTF-8 byte of the input, with code point equal to the byte value, which is how
/// the storage provider reads signed resource paths.
pub fn latin1_reencode(value: &str) -> Cow<'_, str> {
	if value.is_ascii() {
		return Cow::Borrowed(value);
	}

	Cow::Owned(value.bytes().map(char::from).collect())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ascii_is_borrowed() {
		assert!(matches!(latin1_reencode("folder/file.txt"), Cow::Borrowed("folder/file.txt")));
	}

	#[test]
	fn multibyte_characters_become_their_utf8_bytes() {
		let original = "报告/é.pdf";
		let encoded = latin1_reencode(original);
		let codes: Vec<u32> = encoded.chars().map(u32::from).collect();
		let bytes: Vec<u32> = original.bytes().map(u32::from).collect();

		assert_eq!(codes, bytes);
		assert_eq!(encoded.chars().count(), original.len());
		assert!(encoded.chars().all(|c| u32::from(c) <= 0xFF));
	}

	#[test]
	fn latin1_supplement_is_still_expanded() {
		assert_eq!(latin1_reencode("é"), "\u{c3}\u{a9}");
	}
}
