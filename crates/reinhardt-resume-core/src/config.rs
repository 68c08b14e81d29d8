//! Serializer and deserializer configuration
//!
//! Both structs deserialize with missing fields falling back to their
//! defaults, so a partial settings file is enough:
//!
//! ```
//! use reinhardt_resume_core::config::SerializerConfig;
//!
//! let config: SerializerConfig = serde_json::from_str(r#"{"max_drain_passes": 8}"#).unwrap();
//! assert!(config.escape_markup());
//! assert_eq!(config.max_drain_passes(), Some(8));
//! ```

use serde::{Deserialize, Serialize};

/// Default length above which strings are tracked and shared by root id
const DEFAULT_SHARED_STRING_THRESHOLD: usize = 10;

/// Serializer configuration
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::config::SerializerConfig;
///
/// let config = SerializerConfig::default()
///     .with_escape_markup(false)
///     .with_shared_string_threshold(32);
/// assert!(!config.escape_markup());
/// assert_eq!(config.shared_string_threshold(), 32);
/// assert_eq!(config.max_drain_passes(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
	escape_markup: bool,
	shared_string_threshold: usize,
	max_drain_passes: Option<usize>,
}

impl Default for SerializerConfig {
	fn default() -> Self {
		Self {
			escape_markup: true,
			shared_string_threshold: DEFAULT_SHARED_STRING_THRESHOLD,
			max_drain_passes: None,
		}
	}
}

impl SerializerConfig {
	/// Escape `</` as `<\/` in every written string so the document can be
	/// embedded in a script element.
	pub fn escape_markup(&self) -> bool {
		self.escape_markup
	}

	/// Strings longer than this are deduplicated by content and written once
	pub fn shared_string_threshold(&self) -> usize {
		self.shared_string_threshold
	}

	/// Upper bound on async drain passes, `None` for unbounded
	pub fn max_drain_passes(&self) -> Option<usize> {
		self.max_drain_passes
	}

	/// Set whether markup-sensitive substrings are escaped
	pub fn with_escape_markup(mut self, escape: bool) -> Self {
		self.escape_markup = escape;
		self
	}

	/// Set the shared string threshold
	pub fn with_shared_string_threshold(mut self, threshold: usize) -> Self {
		self.shared_string_threshold = threshold;
		self
	}

	/// Bound the number of async drain passes
	pub fn with_max_drain_passes(mut self, passes: usize) -> Self {
		self.max_drain_passes = Some(passes);
		self
	}
}

/// Deserializer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeserializerConfig {
	derived_upgrade: bool,
}

impl Default for DeserializerConfig {
	fn default() -> Self {
		Self {
			derived_upgrade: true,
		}
	}
}

impl DeserializerConfig {
	/// Whether reading a derived field of a decoded object turns its derived
	/// siblings into read-only computed fields
	pub fn derived_upgrade(&self) -> bool {
		self.derived_upgrade
	}

	/// Enable or disable the derived field upgrade
	pub fn with_derived_upgrade(mut self, enabled: bool) -> Self {
		self.derived_upgrade = enabled;
		self
	}
}
