//! Built-in collection and leaf kinds
//!
//! These are the kinds a host runtime provides out of the box: errors, sets,
//! maps, form data, byte arrays and regular expressions. The two-phase ones
//! use interior mutability so the decoder can allocate them empty and fill
//! them in afterwards.

use core::fmt;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::{NodeId, Value};

/// Error object
///
/// `props` holds any extra own fields of the error (for example a `cause` or
/// a status code) as an object literal.
#[derive(Default)]
pub struct ErrorObject {
	message: RefCell<String>,
	props: RefCell<Option<Value>>,
}

impl ErrorObject {
	/// New error with a message and no extra fields
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: RefCell::new(message.into()),
			props: RefCell::new(None),
		}
	}

	/// The error message
	pub fn message(&self) -> String {
		self.message.borrow().clone()
	}

	/// Extra own fields of the error
	pub fn props(&self) -> Option<Value> {
		self.props.borrow().clone()
	}

	/// Replace the message
	pub fn set_message(&self, message: impl Into<String>) {
		*self.message.borrow_mut() = message.into();
	}

	/// Replace the extra fields
	pub fn set_props(&self, props: Option<Value>) {
		*self.props.borrow_mut() = props;
	}
}

/// Hashable form of a value under same-value equality
///
/// Nodes key by identity. All `NaN`s share one key and `-0` keys as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SameValueKey {
	Undefined,
	Null,
	Bool(bool),
	Number(u64),
	BigInt(i128),
	String(Rc<str>),
	Node(NodeId),
}

impl SameValueKey {
	fn of(value: &Value) -> Self {
		match value {
			Value::Undefined => Self::Undefined,
			Value::Null => Self::Null,
			Value::Bool(b) => Self::Bool(*b),
			Value::Number(n) if n.is_nan() => Self::Number(f64::NAN.to_bits()),
			Value::Number(n) if *n == 0.0 => Self::Number(0f64.to_bits()),
			Value::Number(n) => Self::Number(n.to_bits()),
			Value::BigInt(n) => Self::BigInt(*n),
			Value::String(s) => Self::String(Rc::clone(s)),
			Value::Node(node) => Self::Node(node.id()),
		}
	}
}

/// Insertion-ordered set compared by same-value equality
#[derive(Default)]
pub struct SetObject {
	items: RefCell<IndexMap<SameValueKey, Value>>,
}

impl SetObject {
	/// New set, keeping the first occurrence of each member
	pub fn from_items<I: IntoIterator<Item = Value>>(items: I) -> Self {
		let set = Self::default();
		for item in items {
			set.add(item);
		}
		set
	}

	/// Add a member; returns `false` if it was already present
	pub fn add(&self, value: Value) -> bool {
		match self.items.borrow_mut().entry(SameValueKey::of(&value)) {
			Entry::Occupied(_) => false,
			Entry::Vacant(entry) => {
				entry.insert(value);
				true
			}
		}
	}

	/// Whether the set contains `value`
	pub fn has(&self, value: &Value) -> bool {
		self.items.borrow().contains_key(&SameValueKey::of(value))
	}

	/// Members in insertion order
	pub fn items(&self) -> Vec<Value> {
		self.items.borrow().values().cloned().collect()
	}

	/// Number of members
	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	/// Whether the set is empty
	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}
}

/// Insertion-ordered map with keys compared by same-value equality
#[derive(Default)]
pub struct MapObject {
	entries: RefCell<IndexMap<SameValueKey, (Value, Value)>>,
}

impl MapObject {
	/// New map; later duplicates overwrite earlier values in place
	pub fn from_entries<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
		let map = Self::default();
		for (key, value) in entries {
			map.insert(key, value);
		}
		map
	}

	/// Insert or overwrite an entry. A new key goes to the end.
	pub fn insert(&self, key: Value, value: Value) {
		match self.entries.borrow_mut().entry(SameValueKey::of(&key)) {
			Entry::Occupied(mut entry) => entry.get_mut().1 = value,
			Entry::Vacant(entry) => {
				entry.insert((key, value));
			}
		}
	}

	/// Look up the value for `key`
	pub fn get(&self, key: &Value) -> Option<Value> {
		self.entries
			.borrow()
			.get(&SameValueKey::of(key))
			.map(|(_, value)| value.clone())
	}

	/// Entries in insertion order
	pub fn entries(&self) -> Vec<(Value, Value)> {
		self.entries.borrow().values().cloned().collect()
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Whether the map is empty
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

/// Form data entries; keys may repeat
#[derive(Default)]
pub struct FormDataObject {
	entries: RefCell<Vec<(String, String)>>,
}

impl FormDataObject {
	/// New form data with the given entries
	pub fn from_entries<K, V, I>(entries: I) -> Self
	where
		K: Into<String>,
		V: Into<String>,
		I: IntoIterator<Item = (K, V)>,
	{
		let entries = entries
			.into_iter()
			.map(|(key, value)| (key.into(), value.into()))
			.collect();
		Self {
			entries: RefCell::new(entries),
		}
	}

	/// Append an entry
	pub fn append(&self, key: impl Into<String>, value: impl Into<String>) {
		self.entries.borrow_mut().push((key.into(), value.into()));
	}

	/// First value for `key`
	pub fn get(&self, key: &str) -> Option<String> {
		self.entries
			.borrow()
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.clone())
	}

	/// Every value for `key`
	pub fn get_all(&self, key: &str) -> Vec<String> {
		self.entries
			.borrow()
			.iter()
			.filter(|(name, _)| name == key)
			.map(|(_, value)| value.clone())
			.collect()
	}

	/// Entries in insertion order
	pub fn entries(&self) -> Vec<(String, String)> {
		self.entries.borrow().clone()
	}
}

/// Byte array
#[derive(Default)]
pub struct BytesObject {
	bytes: RefCell<Vec<u8>>,
}

impl BytesObject {
	/// Wrap a buffer
	pub fn new(bytes: Vec<u8>) -> Self {
		Self {
			bytes: RefCell::new(bytes),
		}
	}

	/// Empty buffer with room for `capacity` bytes
	pub fn with_capacity(capacity: usize) -> Self {
		Self::new(Vec::with_capacity(capacity))
	}

	/// Copy of the bytes
	pub fn to_vec(&self) -> Vec<u8> {
		self.bytes.borrow().clone()
	}

	/// Number of bytes
	pub fn len(&self) -> usize {
		self.bytes.borrow().len()
	}

	/// Whether the buffer is empty
	pub fn is_empty(&self) -> bool {
		self.bytes.borrow().is_empty()
	}

	/// Current capacity of the buffer
	pub fn capacity(&self) -> usize {
		self.bytes.borrow().capacity()
	}

	/// Replace the contents, reusing the allocation
	pub fn fill(&self, bytes: &[u8]) {
		let mut buffer = self.bytes.borrow_mut();
		buffer.clear();
		buffer.extend_from_slice(bytes);
	}
}

/// Regular expression source and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpValue {
	source: String,
	flags: String,
}

impl RegExpValue {
	/// New regular expression
	pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			flags: flags.into(),
		}
	}

	/// Parse the `/source/flags` literal form
	pub fn parse(literal: &str) -> Option<Self> {
		let body = literal.strip_prefix('/')?;
		let end = body.rfind('/')?;
		Some(Self::new(&body[..end], &body[end + 1..]))
	}

	/// Pattern source
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Flags
	pub fn flags(&self) -> &str {
		&self.flags
	}
}

impl fmt::Display for RegExpValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "/{}/{}", self.source, self.flags)
	}
}

/// Host value the engine does not know how to serialize
///
/// Reaching one of these during a walk is a fatal `UnknownType` error.
pub struct OpaqueValue {
	type_name: &'static str,
	value: Rc<dyn Any>,
}

impl OpaqueValue {
	/// Wrap a host value
	pub fn new<T: Any>(type_name: &'static str, value: T) -> Self {
		Self {
			type_name,
			value: Rc::new(value),
		}
	}

	/// Name reported in errors
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Downcast the host value
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.value.downcast_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_set_keeps_first_occurrence() {
		// Arrange
		let shared = Value::object();

		// Act
		let set = SetObject::from_items([
			Value::from(1),
			shared.clone(),
			Value::from(1),
			shared.clone(),
			Value::Number(f64::NAN),
			Value::Number(f64::NAN),
		]);

		// Assert
		assert_eq!(set.len(), 3);
		assert!(set.has(&shared));
	}

	#[rstest]
	fn test_keys_follow_same_value_equality() {
		// Arrange
		let node = Value::object();
		let map = MapObject::from_entries([
			(Value::Number(-0.0), Value::from("zero")),
			(Value::Number(f64::NAN), Value::from("nan")),
			(node.clone(), Value::from("node")),
		]);

		// Act
		map.insert(Value::Number(0.0), Value::from("zero again"));

		// Assert
		assert_eq!(map.len(), 3);
		assert_eq!(map.get(&Value::Number(0.0)), Some(Value::from("zero again")));
		assert_eq!(map.get(&Value::Number(-f64::NAN)), Some(Value::from("nan")));
		assert_eq!(map.get(&node), Some(Value::from("node")));
		assert_eq!(map.get(&Value::object()), None);
		assert_eq!(map.get(&Value::from("1")), None);
	}

	#[rstest]
	fn test_large_set_keeps_insertion_order() {
		// Arrange
		let items: Vec<Value> = (0..10_000i32).map(Value::from).collect();

		// Act
		let set = SetObject::from_items(items.iter().cloned().chain(items.iter().cloned()));

		// Assert
		assert_eq!(set.len(), 10_000);
		assert_eq!(set.items(), items);
		assert!(set.has(&Value::from(9_999)));
	}

	#[rstest]
	fn test_map_overwrite_keeps_position() {
		// Arrange
		let map = MapObject::from_entries([
			(Value::from("a"), Value::from(1)),
			(Value::from("b"), Value::from(2)),
		]);

		// Act
		map.insert(Value::from("a"), Value::from(3));

		// Assert
		let entries = map.entries();
		assert_eq!(entries[0], (Value::from("a"), Value::from(3)));
		assert_eq!(entries[1], (Value::from("b"), Value::from(2)));
	}

	#[rstest]
	fn test_form_data_repeated_keys() {
		// Arrange
		let form = FormDataObject::from_entries([("tag", "a"), ("name", "x"), ("tag", "b")]);

		// Act
		let tags = form.get_all("tag");

		// Assert
		assert_eq!(form.get("tag").as_deref(), Some("a"));
		assert_eq!(tags, vec!["a", "b"]);
	}

	#[rstest]
	#[case("/a+b/gi", Some(("a+b", "gi")))]
	#[case("/a/b/", Some(("a/b", "")))]
	#[case("//", Some(("", "")))]
	#[case("a/b", None)]
	fn test_regexp_parse(#[case] literal: &str, #[case] expected: Option<(&str, &str)>) {
		// Act
		let parsed = RegExpValue::parse(literal);

		// Assert
		assert_eq!(
			parsed.as_ref().map(|re| (re.source(), re.flags())),
			expected
		);
	}

	#[rstest]
	fn test_opaque_downcast() {
		// Arrange
		let opaque = OpaqueValue::new("Socket", 7u16);

		// Assert
		assert_eq!(opaque.type_name(), "Socket");
		assert_eq!(opaque.downcast_ref::<u16>(), Some(&7));
		assert!(opaque.downcast_ref::<u32>().is_none());
	}
}
