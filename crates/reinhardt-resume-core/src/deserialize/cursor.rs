//! Payload tokenizer
//!
//! Payloads are space separated tokens, optionally followed by `;`-prefixed
//! subscriber segments. A bracketed id list such as `[1 2 3]` is one token.

use std::str::FromStr;

use crate::error::{ResumeError, Result};

/// Read position over one payload
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
	text: &'a str,
	position: usize,
}

impl<'a> Cursor<'a> {
	pub(crate) fn new(text: &'a str) -> Self {
		Self { text, position: 0 }
	}

	pub(crate) fn position(&self) -> usize {
		self.position
	}

	pub(crate) fn is_eof(&self) -> bool {
		self.position >= self.text.len()
	}

	/// Unread remainder
	pub(crate) fn rest(&self) -> &'a str {
		&self.text[self.position..]
	}

	pub(crate) fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	pub(crate) fn skip_spaces(&mut self) {
		while self.peek() == Some(' ') {
			self.position += 1;
		}
	}

	/// Next token, or `None` at the end of input or at a subscriber segment.
	///
	/// Spaces and `;` inside brackets do not end a token.
	pub(crate) fn next_token(&mut self) -> Option<&'a str> {
		self.skip_spaces();
		let start = self.position;
		let mut depth = 0usize;
		let mut end = self.text.len();
		for (offset, c) in self.rest().char_indices() {
			match c {
				'[' => depth += 1,
				']' => depth = depth.saturating_sub(1),
				' ' | ';' if depth == 0 => {
					end = start + offset;
					break;
				}
				_ => {}
			}
		}
		if end == start {
			return None;
		}
		self.position = end;
		Some(&self.text[start..end])
	}

	pub(crate) fn expect_token(&mut self, what: &str) -> Result<&'a str> {
		let position = self.position;
		self.next_token()
			.ok_or_else(|| ResumeError::parse(format!("missing {what} at offset {position}")))
	}

	pub(crate) fn next_number<T: FromStr>(&mut self, what: &str) -> Result<T> {
		let token = self.expect_token(what)?;
		token
			.parse()
			.map_err(|_| ResumeError::parse(format!("invalid {what} `{token}`")))
	}

	pub(crate) fn next_id(&mut self) -> Result<usize> {
		self.next_number("root id")
	}

	/// Root id, or `None` for the `_` placeholder
	pub(crate) fn next_optional_id(&mut self) -> Result<Option<usize>> {
		let token = self.expect_token("root id")?;
		if token == "_" {
			return Ok(None);
		}
		token
			.parse()
			.map(Some)
			.map_err(|_| ResumeError::parse(format!("invalid root id `{token}`")))
	}

	/// Skip one separating space and consume everything after it
	pub(crate) fn take_rest(&mut self) -> &'a str {
		if self.peek() == Some(' ') {
			self.position += 1;
		}
		let rest = self.rest();
		self.position = self.text.len();
		rest
	}
}

/// Ids of a bracketed list token such as `[1 2 3]`
pub(crate) fn parse_id_list(token: &str) -> Result<Vec<usize>> {
	let inner = token
		.strip_prefix('[')
		.and_then(|token| token.strip_suffix(']'))
		.ok_or_else(|| ResumeError::parse(format!("expected id list, found `{token}`")))?;
	inner
		.split_whitespace()
		.map(|id| {
			id.parse()
				.map_err(|_| ResumeError::parse(format!("invalid root id `{id}`")))
		})
		.collect()
}

/// Split a trailing `[...]` group off `text`, returning the head and the
/// group's contents with the brackets
pub(crate) fn split_trailing_list(text: &str) -> Result<(&str, Option<&str>)> {
	if !text.ends_with(']') {
		return Ok((text, None));
	}
	let mut depth = 0usize;
	for (offset, c) in text.char_indices().rev() {
		match c {
			']' => depth += 1,
			'[' => {
				depth -= 1;
				if depth == 0 {
					return Ok((&text[..offset], Some(&text[offset..])));
				}
			}
			_ => {}
		}
	}
	Err(ResumeError::parse(format!("unbalanced brackets in `{text}`")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_tokens_stop_at_subscriber_segment() {
		// Arrange
		let mut cursor = Cursor::new("3 [1 2];0 _ 4");

		// Act
		let first = cursor.next_token();
		let second = cursor.next_token();
		let third = cursor.next_token();

		// Assert
		assert_eq!(first, Some("3"));
		assert_eq!(second, Some("[1 2]"));
		assert_eq!(third, None);
		assert_eq!(cursor.rest(), ";0 _ 4");
	}

	#[rstest]
	fn test_optional_id_placeholder() {
		// Arrange
		let mut cursor = Cursor::new("_ 7");

		// Act
		let first = cursor.next_optional_id().unwrap();
		let second = cursor.next_optional_id().unwrap();

		// Assert
		assert_eq!(first, None);
		assert_eq!(second, Some(7));
		assert!(cursor.is_eof());
	}

	#[rstest]
	fn test_take_rest_keeps_inner_spaces() {
		// Arrange
		let mut cursor = Cursor::new("_  two  words");
		cursor.next_optional_id().unwrap();

		// Act
		let rest = cursor.take_rest();

		// Assert
		assert_eq!(rest, " two  words");
		assert!(cursor.is_eof());
	}

	#[rstest]
	fn test_missing_token_reports_offset() {
		// Arrange
		let mut cursor = Cursor::new("1");
		cursor.next_id().unwrap();

		// Act
		let result = cursor.next_id();

		// Assert
		assert!(matches!(result, Err(ResumeError::Parse(message)) if message.contains("offset 1")));
		assert_eq!(cursor.position(), 1);
	}

	#[rstest]
	#[case("[]", vec![])]
	#[case("[4]", vec![4])]
	#[case("[1 2 3]", vec![1, 2, 3])]
	fn test_parse_id_list(#[case] token: &str, #[case] expected: Vec<usize>) {
		// Act
		let ids = parse_id_list(token).unwrap();

		// Assert
		assert_eq!(ids, expected);
	}

	#[rstest]
	#[case("./a.js#s_1[2 3]", "./a.js#s_1", Some("[2 3]"))]
	#[case("./a[1].js#s_1", "./a[1].js#s_1", None)]
	#[case("#0", "#0", None)]
	#[case("./x[y].js#s[[1] 2]", "./x[y].js#s", Some("[[1] 2]"))]
	fn test_split_trailing_list(
		#[case] text: &str,
		#[case] head: &str,
		#[case] list: Option<&str>,
	) {
		// Act
		let split = split_trailing_list(text).unwrap();

		// Assert
		assert_eq!(split, (head, list));
	}

	#[rstest]
	fn test_unbalanced_trailing_list() {
		// Act
		let result = split_trailing_list("a]");

		// Assert
		assert!(matches!(result, Err(ResumeError::Parse(_))));
	}
}
