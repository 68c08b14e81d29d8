//! Deserialization
//!
//! Parsing a document only splits it into its root table. Nothing is decoded
//! until it is asked for: resolving a root decodes that root, and reading a
//! field of a decoded object or array decodes that field.
//!
//! Tagged kinds whose payload refers to other roots decode in two phases. An
//! empty shell is allocated and registered under its root id first, then its
//! payload is inflated. A payload that refers back to the root being decoded
//! therefore receives the shell, which is how cycles come back as cycles.
//!
//! ## Example
//!
//! ```
//! use reinhardt_resume_core::deserialize::Deserializer;
//!
//! let doc = Deserializer::default().deserialize(r#"["\u001b1 1",{}]"#).unwrap();
//! let set = doc.root(0).unwrap();
//! assert_eq!(set.as_node().unwrap().as_set().unwrap().len(), 1);
//! ```

mod allocate;
mod context;
pub(crate) mod cursor;
mod inflate;
pub(crate) mod lazy;

pub use context::DeserializationContext;

use std::rc::Rc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::codec::ClosureTable;
use crate::config::DeserializerConfig;
use crate::error::{ResumeError, Result};
use crate::host::{ElementBridge, SymbolResolver};

/// Deserializer
#[derive(Default, Clone)]
pub struct Deserializer {
	config: DeserializerConfig,
	closures: ClosureTable,
	symbols: Option<Rc<dyn SymbolResolver>>,
	elements: Option<Rc<dyn ElementBridge>>,
}

impl Deserializer {
	/// New deserializer
	pub fn new(config: DeserializerConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// Closure table produced alongside the document
	pub fn with_closures(mut self, closures: ClosureTable) -> Self {
		self.closures = closures;
		self
	}

	/// Resolver given to decoded code references
	pub fn with_symbols(mut self, symbols: Rc<dyn SymbolResolver>) -> Self {
		self.symbols = Some(symbols);
		self
	}

	/// Bridge used to look rendered elements up by id
	pub fn with_elements(mut self, elements: Rc<dyn ElementBridge>) -> Self {
		self.elements = Some(elements);
		self
	}

	/// Parse a document
	pub fn deserialize(&self, text: &str) -> Result<Rc<DeserializationContext>> {
		let JsonValue::Array(roots) = serde_json::from_str::<JsonValue>(text)? else {
			return Err(ResumeError::parse("document must be a JSON array"));
		};
		debug!(
			roots = roots.len(),
			closures = self.closures.len(),
			"deserializing"
		);
		Ok(Rc::new(DeserializationContext::new(
			roots,
			self.closures.clone(),
			self.symbols.clone(),
			self.elements.clone(),
			self.config.clone(),
		)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("{}")]
	#[case("\"\\u0001\"")]
	fn test_document_must_be_an_array(#[case] text: &str) {
		// Act
		let result = Deserializer::default().deserialize(text);

		// Assert
		assert!(matches!(result, Err(ResumeError::Parse(_))));
	}

	#[rstest]
	fn test_invalid_json() {
		// Act
		let result = Deserializer::default().deserialize("[1,");

		// Assert
		assert!(matches!(result, Err(ResumeError::Json(_))));
	}

	#[rstest]
	fn test_roots_are_decoded_on_demand() {
		// Arrange
		let doc = Deserializer::default()
			.deserialize(r#"[1,"\u001bbroken"]"#)
			.unwrap();

		// Act
		let first = doc.root(0);

		// Assert
		assert_eq!(first.unwrap().as_f64(), Some(1.0));
		assert_eq!(doc.len(), 2);
	}
}
