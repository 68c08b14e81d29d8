//! Tag registry
//!
//! Every encoded value that is not a plain literal starts with one control
//! character from `0x00` to `0x1e`. The character names the kind of value and
//! decides how the rest of the string is decoded. Any string whose first
//! character is outside this range is the literal value itself.
//!
//! ```text
//! "\u00153;0 _ 5"      signal: value in root 3, one host subscriber (root 5)
//! "\u001b1 2 4"        set of roots 1, 2 and 4
//! "\u0005\u0001abc"    the literal string "\u0001abc"
//! "hello"              the literal string "hello"
//! ```
//!
//! `0x09`–`0x0d` are reserved: they are whitespace controls that would
//! otherwise be ambiguous in host documents.

use std::fmt;

/// Exclusive upper bound of the control range used for tags.
pub const LAST_TAG: u32 = 0x1f;

/// Single-character type tag of an encoded value
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
	/// `undefined`
	Undefined = 0x00,
	/// Back-reference to a root id
	Reference = 0x01,
	/// URL (href)
	Url = 0x02,
	/// Date (epoch milliseconds)
	Date = 0x03,
	/// Regular expression (`/source/flags`)
	RegExp = 0x04,
	/// Escape prefix for literal strings that start with a control character
	String = 0x05,
	/// Reference to a rendered UI element
	Element = 0x06,
	/// `NaN`, `+Infinity` or `-Infinity`
	NaN = 0x07,
	/// Arbitrary-size integer
	BigInt = 0x08,
	/// Reserved (horizontal tab)
	ReservedTab = 0x09,
	/// Reserved (line feed)
	ReservedLineFeed = 0x0a,
	/// Reserved (vertical tab)
	ReservedVerticalTab = 0x0b,
	/// Reserved (form feed)
	ReservedFormFeed = 0x0c,
	/// Reserved (carriage return)
	ReservedCarriageReturn = 0x0d,
	/// URL search parameters
	UrlSearchParams = 0x0e,
	/// Error object
	Error = 0x0f,
	/// Lazy code reference
	Qrl = 0x10,
	/// Scheduled effect / task
	Task = 0x11,
	/// Async resource (recognised, not supported)
	Resource = 0x12,
	/// Component reference
	Component = 0x13,
	/// Derived (computed) signal
	DerivedSignal = 0x14,
	/// Signal cell
	Signal = 0x15,
	/// Accessor signal reading one field of a host value
	SignalField = 0x16,
	/// Reactive store
	Store = 0x17,
	/// Form data entries
	FormData = 0x18,
	/// UI tree node
	TreeNode = 0x19,
	/// Split props container
	Props = 0x1a,
	/// Set
	Set = 0x1b,
	/// Map
	Map = 0x1c,
	/// Pending or settled async value
	Promise = 0x1d,
	/// Byte array
	Bytes = 0x1e,
}

impl Tag {
	const ALL: [Tag; 31] = [
		Tag::Undefined,
		Tag::Reference,
		Tag::Url,
		Tag::Date,
		Tag::RegExp,
		Tag::String,
		Tag::Element,
		Tag::NaN,
		Tag::BigInt,
		Tag::ReservedTab,
		Tag::ReservedLineFeed,
		Tag::ReservedVerticalTab,
		Tag::ReservedFormFeed,
		Tag::ReservedCarriageReturn,
		Tag::UrlSearchParams,
		Tag::Error,
		Tag::Qrl,
		Tag::Task,
		Tag::Resource,
		Tag::Component,
		Tag::DerivedSignal,
		Tag::Signal,
		Tag::SignalField,
		Tag::Store,
		Tag::FormData,
		Tag::TreeNode,
		Tag::Props,
		Tag::Set,
		Tag::Map,
		Tag::Promise,
		Tag::Bytes,
	];

	/// Look up the tag for a leading character.
	///
	/// Returns `None` for characters outside the control range, which means the
	/// string is a literal.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_resume_core::tag::Tag;
	///
	/// assert_eq!(Tag::from_char('\u{15}'), Some(Tag::Signal));
	/// assert_eq!(Tag::from_char('a'), None);
	/// assert_eq!(Tag::from_char('\u{1f}'), None);
	/// ```
	pub fn from_char(c: char) -> Option<Self> {
		let code = c as u32;
		if code < LAST_TAG {
			Some(Self::ALL[code as usize])
		} else {
			None
		}
	}

	/// Tag of the first character of `text`, if any.
	pub fn of(text: &str) -> Option<Self> {
		text.chars().next().and_then(Self::from_char)
	}

	/// The control character for this tag
	pub fn as_char(self) -> char {
		char::from(self as u8)
	}

	/// Numeric code of this tag
	pub fn code(self) -> u32 {
		self as u32
	}

	/// Whether the tag is kept only to hold its place in the numeric range.
	pub fn is_reserved(self) -> bool {
		matches!(
			self,
			Tag::ReservedTab
				| Tag::ReservedLineFeed
				| Tag::ReservedVerticalTab
				| Tag::ReservedFormFeed
				| Tag::ReservedCarriageReturn
		)
	}

	/// Whether decoding takes two phases: allocate an empty shell, register it,
	/// then inflate its fields.
	///
	/// Kinds whose payload refers to other roots need the shell registered first
	/// so that cycles resolve to the same instance. A store is allocated as a
	/// live wrapper over its target; inflation only replays its subscribers.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_resume_core::tag::Tag;
	///
	/// assert!(Tag::Signal.needs_inflation());
	/// assert!(!Tag::Url.needs_inflation());
	/// ```
	pub fn needs_inflation(self) -> bool {
		matches!(
			self,
			Tag::Error
				| Tag::Qrl
				| Tag::Task
				| Tag::Resource
				| Tag::Component
				| Tag::DerivedSignal
				| Tag::Signal
				| Tag::SignalField
				| Tag::Store
				| Tag::FormData
				| Tag::TreeNode
				| Tag::Props
				| Tag::Set
				| Tag::Map
				| Tag::Promise
				| Tag::Bytes
		)
	}

	/// Prefix `payload` with this tag.
	pub fn wrap(self, payload: &str) -> String {
		let mut out = String::with_capacity(payload.len() + 1);
		out.push(self.as_char());
		out.push_str(payload);
		out
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}({:#04x})", self, self.code())
	}
}

/// Whether a literal string must be escaped so it is not read back as a tag.
pub fn needs_escape(text: &str) -> bool {
	text.chars().next().is_some_and(|c| (c as u32) < LAST_TAG)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_all_codes_round_trip() {
		// Act & Assert
		for code in 0..LAST_TAG {
			let c = char::from_u32(code).unwrap();
			let tag = Tag::from_char(c).unwrap();
			assert_eq!(tag.code(), code);
			assert_eq!(tag.as_char(), c);
		}
	}

	#[rstest]
	#[case('\u{09}')]
	#[case('\u{0a}')]
	#[case('\u{0b}')]
	#[case('\u{0c}')]
	#[case('\u{0d}')]
	fn test_whitespace_controls_are_reserved(#[case] c: char) {
		// Act
		let tag = Tag::from_char(c).unwrap();

		// Assert
		assert!(tag.is_reserved());
		assert!(!tag.needs_inflation());
	}

	#[rstest]
	fn test_non_control_is_literal() {
		// Assert
		assert_eq!(Tag::of("hello"), None);
		assert_eq!(Tag::of(""), None);
		assert_eq!(Tag::of(" \u{01}"), None);
	}

	#[rstest]
	fn test_needs_escape() {
		// Assert
		assert!(needs_escape("\u{00}"));
		assert!(needs_escape("\u{1e}x"));
		assert!(!needs_escape("\u{1f}x"));
		assert!(!needs_escape("x\u{01}"));
		assert!(!needs_escape(""));
	}

	#[rstest]
	fn test_wrap_prefixes_tag() {
		// Act
		let wrapped = Tag::Set.wrap("1 2");

		// Assert
		assert_eq!(wrapped, "\u{1b}1 2");
	}
}
