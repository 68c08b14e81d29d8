//! Serialization session state
//!
//! One context serializes one document. It owns the root table, the seen
//! state of every node and long string it has visited, and the closure table
//! the document's derived signals point into. Root ids are handed out in
//! append order and never change.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::codec::ClosureTable;
use crate::config::SerializerConfig;
use crate::error::{ResumeError, Result};
use crate::host::{ChunkResolver, ElementBridge};
use crate::serialize::OutputSink;
use crate::value::{NodeId, Value};

/// Visit state of a trackable value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Seen {
	/// Visited once; written inline where it is referenced
	Once,
	/// Promoted to the root with this id
	Root(usize),
}

/// Mutable state of one serialization
pub struct SerializationContext {
	pub(crate) config: SerializerConfig,
	pub(crate) roots: Vec<Value>,
	pub(crate) seen: HashMap<NodeId, Seen>,
	pub(crate) strings: HashMap<Rc<str>, Seen>,
	pub(crate) closures: ClosureTable,
	pub(crate) chunks: Option<Rc<dyn ChunkResolver>>,
	pub(crate) elements: Option<Rc<dyn ElementBridge>>,
}

impl SerializationContext {
	/// New context
	pub fn new(config: SerializerConfig) -> Self {
		Self {
			config,
			roots: Vec::new(),
			seen: HashMap::new(),
			strings: HashMap::new(),
			closures: ClosureTable::new(),
			chunks: None,
			elements: None,
		}
	}

	/// Use `chunks` to locate code references that carry no chunk
	pub fn with_chunks(mut self, chunks: Rc<dyn ChunkResolver>) -> Self {
		self.chunks = Some(chunks);
		self
	}

	/// Use `elements` to give rendered elements their ids
	pub fn with_elements(mut self, elements: Rc<dyn ElementBridge>) -> Self {
		self.elements = Some(elements);
		self
	}

	/// Configuration in effect
	pub fn config(&self) -> &SerializerConfig {
		&self.config
	}

	/// Root table in id order
	pub fn roots(&self) -> &[Value] {
		&self.roots
	}

	/// Closures collected so far
	pub fn closures(&self) -> &ClosureTable {
		&self.closures
	}

	/// Consume the context, keeping its closure table
	pub fn into_closures(self) -> ClosureTable {
		self.closures
	}

	/// Declare document roots. Each declared value takes the next id, even
	/// when it was declared before; the repeat is written as a reference to
	/// the first id.
	pub fn declare_roots(&mut self, values: &[Value]) {
		for value in values {
			let id = self.roots.len();
			self.roots.push(value.clone());
			if self.root_id_of(value).is_none() {
				self.mark(value, Seen::Root(id));
			}
		}
	}

	/// Root id of `value`, promoting it to a new root if it has none
	pub fn add_root(&mut self, value: &Value) -> usize {
		if let Some(id) = self.root_id_of(value) {
			return id;
		}
		let id = self.roots.len();
		self.roots.push(value.clone());
		self.mark(value, Seen::Root(id));
		debug!(id, kind = value.type_name(), "promoted value to root");
		id
	}

	/// Root id of a value that must already be a root
	pub fn root_id(&self, value: &Value) -> Result<usize> {
		self.root_id_of(value)
			.ok_or_else(|| ResumeError::NotRooted(value.type_name().to_string()))
	}

	/// Write the root table to `sink`
	pub fn encode<S: OutputSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		super::encoder::encode_roots(self, sink)
	}

	pub(crate) fn root_id_of(&self, value: &Value) -> Option<usize> {
		let seen = match value {
			Value::Node(node) => self.seen.get(&node.id()),
			Value::String(text) if self.is_trackable(text) => self.strings.get(text),
			_ => None,
		};
		match seen {
			Some(Seen::Root(id)) => Some(*id),
			_ => None,
		}
	}

	/// Whether a string is long enough to be shared by root id
	pub(crate) fn is_trackable(&self, text: &str) -> bool {
		text.chars().count() > self.config.shared_string_threshold()
	}

	pub(crate) fn mark(&mut self, value: &Value, seen: Seen) {
		match value {
			Value::Node(node) => {
				self.seen.insert(node.id(), seen);
			}
			Value::String(text) if self.is_trackable(text) => {
				self.strings.insert(Rc::clone(text), seen);
			}
			_ => {}
		}
	}
}

impl Default for SerializationContext {
	fn default() -> Self {
		Self::new(SerializerConfig::default())
	}
}
