//! Object literals and arrays
//!
//! Both containers store their fields as [`Slot`]s. A container built in
//! memory only ever holds `Slot::Ready`; a container produced by the decoder
//! starts out holding the raw JSON of each field and turns a slot into
//! `Slot::Ready` the first time that field is read. The materialized value is
//! written back, so every later read returns the same instance.

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::{Node, Value};
use crate::deserialize::DeserializationContext;
use crate::deserialize::lazy::materialize;
use crate::error::{ResumeError, Result};
use crate::tag::Tag;

/// Storage of one field of a container
#[derive(Debug)]
pub(crate) enum Slot {
	/// Wire value that has not been read yet
	Raw(JsonValue),
	/// The wire value is being materialized
	Inflating,
	/// Materialized value
	Ready(Value),
}

/// Outcome of starting a read on a slot
pub(crate) enum SlotRead {
	Ready(Value),
	Raw(JsonValue),
}

impl Slot {
	/// Start reading the slot.
	///
	/// A raw slot is left `Inflating` and its wire value handed to the caller,
	/// which must call [`Slot::finish`] with the outcome.
	pub(crate) fn begin_read(&mut self, label: impl FnOnce() -> String) -> Result<SlotRead> {
		match std::mem::replace(self, Slot::Inflating) {
			Slot::Ready(value) => {
				*self = Slot::Ready(value.clone());
				Ok(SlotRead::Ready(value))
			}
			Slot::Raw(raw) => Ok(SlotRead::Raw(raw)),
			Slot::Inflating => Err(ResumeError::ReentrantRead(label())),
		}
	}

	/// Store the outcome of a materialization started by [`Slot::begin_read`].
	///
	/// On failure the raw value is restored so the read can be attempted again.
	pub(crate) fn finish(
		&mut self,
		outcome: std::result::Result<Value, (ResumeError, JsonValue)>,
	) -> Result<Value> {
		match outcome {
			Ok(value) => {
				*self = Slot::Ready(value.clone());
				Ok(value)
			}
			Err((error, raw)) => {
				*self = Slot::Raw(raw);
				Err(error)
			}
		}
	}

	/// Whether the slot holds an unread derived signal
	fn is_raw_derived(&self) -> bool {
		match self {
			Slot::Raw(JsonValue::String(text)) => Tag::of(text) == Some(Tag::DerivedSignal),
			_ => false,
		}
	}

	/// The value if it is already materialized
	fn ready(&self) -> Option<&Value> {
		match self {
			Slot::Ready(value) => Some(value),
			_ => None,
		}
	}
}

fn detached(label: &str) -> ResumeError {
	ResumeError::parse(format!("field {label} holds wire data without a decoding context"))
}

/// Run a read against one slot of a container, materializing it if needed.
///
/// The container's borrow is released while the wire value is decoded, so
/// decoding is free to read other containers.
fn read_slot<C>(
	cell: &RefCell<C>,
	source: Option<&Rc<DeserializationContext>>,
	label: &str,
	locate: impl Fn(&mut C) -> Option<&mut Slot>,
) -> Result<Option<Value>> {
	let read = {
		let mut container = cell.borrow_mut();
		match locate(&mut *container) {
			Some(slot) => slot.begin_read(|| label.to_string())?,
			None => return Ok(None),
		}
	};
	let raw = match read {
		SlotRead::Ready(value) => return Ok(Some(value)),
		SlotRead::Raw(raw) => raw,
	};
	tracing::trace!(field = label, "materializing lazy field");
	let outcome = match source {
		Some(ctx) => materialize(ctx, raw),
		None => Err((detached(label), raw)),
	};
	let mut container = cell.borrow_mut();
	match locate(&mut *container) {
		Some(slot) => slot.finish(outcome).map(Some),
		// The field was removed while it was being decoded
		None => outcome.map(Some).map_err(|(error, _)| error),
	}
}

/// Object literal with ordered string keys
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::value::{PlainObject, Value};
///
/// let object = PlainObject::new();
/// object.set("count", Value::from(1)).unwrap();
/// assert_eq!(object.get("count").unwrap(), Some(Value::from(1)));
/// assert_eq!(object.get("missing").unwrap(), None);
/// ```
#[derive(Default)]
pub struct PlainObject {
	entries: RefCell<IndexMap<String, Slot>>,
	source: Option<Rc<DeserializationContext>>,
	derived: OnceCell<IndexMap<String, Node>>,
}

impl PlainObject {
	/// New empty object
	pub fn new() -> Self {
		Self::default()
	}

	/// New object with the given entries
	pub fn from_entries<K, I>(entries: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		let entries = entries
			.into_iter()
			.map(|(key, value)| (key.into(), Slot::Ready(value)))
			.collect();
		Self {
			entries: RefCell::new(entries),
			source: None,
			derived: OnceCell::new(),
		}
	}

	/// Object whose fields are decoded on first read
	pub(crate) fn lazy(
		source: Rc<DeserializationContext>,
		raw: serde_json::Map<String, JsonValue>,
	) -> Self {
		let entries = raw
			.into_iter()
			.map(|(key, value)| (key, Slot::Raw(value)))
			.collect();
		Self {
			entries: RefCell::new(entries),
			source: Some(source),
			derived: OnceCell::new(),
		}
	}

	/// Read a field.
	///
	/// Upgraded derived fields return the signal's computed value.
	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		if let Some(signal) = self.derived_signal_for_read(key)? {
			return computed(&signal).map(Some);
		}
		self.read(key)
	}

	/// Write a field, appending it if the key is new
	pub fn set(&self, key: impl Into<String>, value: Value) -> Result<()> {
		let key = key.into();
		if self.is_upgraded(&key) {
			return Err(ResumeError::ReadOnlyProperty(key));
		}
		self.entries.borrow_mut().insert(key, Slot::Ready(value));
		Ok(())
	}

	/// Remove a field, returning whether it existed
	pub fn remove(&self, key: &str) -> Result<bool> {
		if self.is_upgraded(key) {
			return Err(ResumeError::ReadOnlyProperty(key.to_string()));
		}
		Ok(self.entries.borrow_mut().shift_remove(key).is_some())
	}

	/// Whether the key is present
	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.borrow().contains_key(key)
	}

	/// Keys in insertion order
	pub fn keys(&self) -> Vec<String> {
		self.entries.borrow().keys().cloned().collect()
	}

	/// Number of fields
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Whether the object has no fields
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	/// Stored values in insertion order, materializing any that are still raw.
	///
	/// Derived fields are returned as the signal itself, not its computed value.
	pub fn entries(&self) -> Result<Vec<(String, Value)>> {
		self.keys()
			.into_iter()
			.filter_map(|key| match self.read(&key) {
				Ok(Some(value)) => Some(Ok((key, value))),
				Ok(None) => None,
				Err(error) => Some(Err(error)),
			})
			.collect()
	}

	/// The derived signal behind an upgraded field
	pub fn derived_signal(&self, key: &str) -> Option<Node> {
		self.derived.get().and_then(|fields| fields.get(key).cloned())
	}

	/// Whether the field was upgraded to a computed accessor
	pub fn is_upgraded(&self, key: &str) -> bool {
		self.derived
			.get()
			.is_some_and(|fields| fields.contains_key(key))
	}

	fn read(&self, key: &str) -> Result<Option<Value>> {
		read_slot(&self.entries, self.source.as_ref(), key, |entries| {
			entries.get_mut(key)
		})
	}

	/// Find the derived signal backing `key`, performing the one-time upgrade
	/// when `key` is the first derived field to be read.
	fn derived_signal_for_read(&self, key: &str) -> Result<Option<Node>> {
		if let Some(fields) = self.derived.get() {
			return Ok(fields.get(key).cloned());
		}
		let upgrade = self
			.source
			.as_ref()
			.is_some_and(|ctx| ctx.config().derived_upgrade())
			&& self
				.entries
				.borrow()
				.get(key)
				.is_some_and(Slot::is_raw_derived);
		if !upgrade {
			return Ok(None);
		}
		let candidates: Vec<String> = self
			.entries
			.borrow()
			.iter()
			.filter(|(_, slot)| {
				slot.is_raw_derived()
					|| slot
						.ready()
						.and_then(Value::as_node)
						.is_some_and(|node| node.as_derived().is_some())
			})
			.map(|(name, _)| name.clone())
			.collect();
		let mut fields = IndexMap::with_capacity(candidates.len());
		for name in candidates {
			if let Some(Value::Node(node)) = self.read(&name)? {
				if node.as_derived().is_some() {
					fields.insert(name, node);
				}
			}
		}
		tracing::trace!(count = fields.len(), "upgraded derived fields");
		let signal = fields.get(key).cloned();
		// A reentrant upgrade may already have filled the cell; the first one wins
		let _ = self.derived.set(fields);
		Ok(signal)
	}
}

fn computed(signal: &Node) -> Result<Value> {
	match signal.as_derived() {
		Some(derived) => derived.value(),
		None => Ok(Value::Undefined),
	}
}

/// Array
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::value::{ArrayObject, Value};
///
/// let array = ArrayObject::from_items([Value::from("a")]);
/// array.push(Value::from("b"));
/// assert_eq!(array.len(), 2);
/// assert_eq!(array.get(1).unwrap(), Some(Value::from("b")));
/// ```
#[derive(Default)]
pub struct ArrayObject {
	items: RefCell<Vec<Slot>>,
	source: Option<Rc<DeserializationContext>>,
}

impl ArrayObject {
	/// New empty array
	pub fn new() -> Self {
		Self::default()
	}

	/// New array with the given items
	pub fn from_items<I: IntoIterator<Item = Value>>(items: I) -> Self {
		Self {
			items: RefCell::new(items.into_iter().map(Slot::Ready).collect()),
			source: None,
		}
	}

	/// Array whose items are decoded on first read
	pub(crate) fn lazy(source: Rc<DeserializationContext>, raw: Vec<JsonValue>) -> Self {
		Self {
			items: RefCell::new(raw.into_iter().map(Slot::Raw).collect()),
			source: Some(source),
		}
	}

	/// Read the item at `index`
	pub fn get(&self, index: usize) -> Result<Option<Value>> {
		read_slot(
			&self.items,
			self.source.as_ref(),
			&format!("[{index}]"),
			|items| items.get_mut(index),
		)
	}

	/// Write the item at `index`, padding with `undefined` past the end
	pub fn set(&self, index: usize, value: Value) {
		let mut items = self.items.borrow_mut();
		if index >= items.len() {
			items.resize_with(index + 1, || Slot::Ready(Value::Undefined));
		}
		items[index] = Slot::Ready(value);
	}

	/// Append an item
	pub fn push(&self, value: Value) {
		self.items.borrow_mut().push(Slot::Ready(value));
	}

	/// Number of items
	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	/// Whether the array is empty
	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}

	/// All items, materializing any that are still raw
	pub fn items(&self) -> Result<Vec<Value>> {
		(0..self.len())
			.filter_map(|index| self.get(index).transpose())
			.collect()
	}
}
