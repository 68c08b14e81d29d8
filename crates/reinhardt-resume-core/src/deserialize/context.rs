//! Decoding session state
//!
//! The context owns the parsed root table. Roots start out as raw JSON and are
//! decoded the first time they are resolved, either by the caller or by a
//! payload or lazy field that refers to them. Decoded roots are cached, so a
//! root id always resolves to the same instance.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value as JsonValue;
use tracing::trace;

use super::allocate::{Allocation, allocate};
use super::inflate::inflate;
use super::lazy::materialize;
use crate::codec::ClosureTable;
use crate::config::DeserializerConfig;
use crate::error::{ResumeError, Result};
use crate::host::{ElementBridge, SymbolResolver};
use crate::tag::Tag;
use crate::value::{Slot, SlotRead, Value};

/// Decoded document
pub struct DeserializationContext {
	roots: RefCell<Vec<Slot>>,
	pub(crate) closures: ClosureTable,
	pub(crate) symbols: Option<Rc<dyn SymbolResolver>>,
	pub(crate) elements: Option<Rc<dyn ElementBridge>>,
	config: DeserializerConfig,
}

impl DeserializationContext {
	pub(crate) fn new(
		roots: Vec<JsonValue>,
		closures: ClosureTable,
		symbols: Option<Rc<dyn SymbolResolver>>,
		elements: Option<Rc<dyn ElementBridge>>,
		config: DeserializerConfig,
	) -> Self {
		Self {
			roots: RefCell::new(roots.into_iter().map(Slot::Raw).collect()),
			closures,
			symbols,
			elements,
			config,
		}
	}

	/// Configuration in effect
	pub fn config(&self) -> &DeserializerConfig {
		&self.config
	}

	/// Closure table the document was decoded against
	pub fn closures(&self) -> &ClosureTable {
		&self.closures
	}

	/// Number of roots
	pub fn len(&self) -> usize {
		self.roots.borrow().len()
	}

	/// Whether the document has no roots
	pub fn is_empty(&self) -> bool {
		self.roots.borrow().is_empty()
	}

	/// Root `id`, decoding it on first access
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_resume_core::deserialize::Deserializer;
	/// use reinhardt_resume_core::value::Value;
	///
	/// let doc = Deserializer::default().deserialize(r#"[{"a":"\u00011"},[true]]"#).unwrap();
	/// let object = doc.root(0).unwrap();
	/// let list = object.as_node().unwrap().get_field("a").unwrap().unwrap();
	/// assert!(list.same(&doc.root(1).unwrap()));
	/// ```
	pub fn root(self: &Rc<Self>, id: usize) -> Result<Value> {
		self.resolve(id)
	}

	/// Every root in id order
	pub fn roots(self: &Rc<Self>) -> Result<Vec<Value>> {
		(0..self.len()).map(|id| self.resolve(id)).collect()
	}

	pub(crate) fn resolve(self: &Rc<Self>, id: usize) -> Result<Value> {
		let raw = {
			let mut roots = self.roots.borrow_mut();
			let len = roots.len();
			let slot = roots
				.get_mut(id)
				.ok_or(ResumeError::InvalidRootId { id, len })?;
			match slot.begin_read(|| format!("root {id}"))? {
				SlotRead::Ready(value) => return Ok(value),
				SlotRead::Raw(raw) => raw,
			}
		};
		trace!(id, "decoding root");
		let outcome = match raw {
			JsonValue::String(text) => self
				.decode_string_with(&text, |shell| self.register(id, shell))
				.map_err(|error| (error, JsonValue::String(text))),
			other => materialize(self, other),
		};
		let mut roots = self.roots.borrow_mut();
		roots[id].finish(outcome)
	}

	/// Decode one wire string
	pub(crate) fn decode_string(self: &Rc<Self>, text: &str) -> Result<Value> {
		self.decode_string_with(text, |_| {})
	}

	/// Decode one wire string, handing a two-phase shell to `register` before
	/// its payload is inflated
	fn decode_string_with(
		self: &Rc<Self>,
		text: &str,
		register: impl FnOnce(&Value),
	) -> Result<Value> {
		let Some(tag) = Tag::of(text) else {
			return Ok(Value::from(text));
		};
		// Tags are single byte control characters
		let payload = &text[1..];
		match allocate(self, tag, payload)? {
			Allocation::Ready(value) => Ok(value),
			Allocation::Shell(node) => {
				let value = Value::Node(node.clone());
				register(&value);
				trace!(node = %node.id(), %tag, "inflating");
				inflate(self, &node, payload)?;
				Ok(value)
			}
		}
	}

	/// Publish a root's shell so payloads that refer back to it find it
	fn register(&self, id: usize, shell: &Value) {
		if let Some(slot) = self.roots.borrow_mut().get_mut(id) {
			*slot = Slot::Ready(shell.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::deserialize::Deserializer;
	use rstest::rstest;

	fn decode(text: &str) -> Rc<DeserializationContext> {
		Deserializer::default().deserialize(text).unwrap()
	}

	#[rstest]
	fn test_root_is_cached() {
		// Arrange
		let doc = decode(r#"[{"a":1}]"#);

		// Act
		let first = doc.root(0).unwrap();
		let second = doc.root(0).unwrap();

		// Assert
		assert!(first.same(&second));
	}

	#[rstest]
	fn test_out_of_range_root() {
		// Arrange
		let doc = decode("[1]");

		// Act
		let result = doc.root(3);

		// Assert
		assert!(matches!(result, Err(ResumeError::InvalidRootId { id: 3, len: 1 })));
	}

	#[rstest]
	fn test_self_referencing_signal_resolves_to_shell() {
		// Arrange
		let doc = decode(r#"["\u00150"]"#);

		// Act
		let signal = doc.root(0).unwrap();

		// Assert
		let cell = signal.as_node().unwrap().as_signal().unwrap();
		assert!(cell.value().same(&signal));
	}

	#[rstest]
	fn test_reference_loop_is_reentrant() {
		// Arrange
		let doc = decode(r#"["\u00011","\u00010"]"#);

		// Act
		let result = doc.root(0);

		// Assert
		assert!(matches!(result, Err(ResumeError::ReentrantRead(_))));
	}

	#[rstest]
	fn test_failed_root_can_be_retried() {
		// Arrange
		let doc = decode(r#"["\u001b9"]"#);

		// Act
		let first = doc.root(0);
		let second = doc.root(0);

		// Assert
		assert!(matches!(first, Err(ResumeError::InvalidRootId { id: 9, .. })));
		assert!(matches!(second, Err(ResumeError::InvalidRootId { id: 9, .. })));
	}
}
