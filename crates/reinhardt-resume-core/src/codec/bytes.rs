//! Byte array payloads
//!
//! Bytes travel as standard base64 with the trailing `=` padding stripped.

use base64::{Engine as _, engine::general_purpose};

use crate::error::Result;

/// Encode bytes as unpadded base64
pub fn encode(bytes: &[u8]) -> String {
	general_purpose::STANDARD_NO_PAD.encode(bytes)
}

/// Decode an unpadded (or padded) base64 payload
pub fn decode(payload: &str) -> Result<Vec<u8>> {
	Ok(general_purpose::STANDARD_NO_PAD.decode(payload.trim_end_matches('='))?)
}

/// Number of bytes an unpadded payload of `encoded_len` characters decodes to
pub fn decoded_len(encoded_len: usize) -> usize {
	encoded_len * 3 / 4
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(b"", "")]
	#[case(b"f", "Zg")]
	#[case(b"fo", "Zm8")]
	#[case(b"foo", "Zm9v")]
	#[case(&[0xff, 0x00, 0x10, 0x7f], "/wAQfw")]
	fn test_encode_strips_padding(#[case] bytes: &[u8], #[case] expected: &str) {
		// Act
		let encoded = encode(bytes);

		// Assert
		assert_eq!(encoded, expected);
		assert_eq!(decoded_len(encoded.len()), bytes.len());
	}

	#[rstest]
	fn test_decode_accepts_padding() {
		// Act
		let decoded = decode("Zg==").unwrap();

		// Assert
		assert_eq!(decoded, b"f");
	}

	#[rstest]
	fn test_decode_rejects_garbage() {
		// Act
		let result = decode("!!!");

		// Assert
		assert!(matches!(result, Err(crate::error::ResumeError::Base64(_))));
	}
}
