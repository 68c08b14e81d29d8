//! Value model
//!
//! `Value` is the closed set of things an object graph can contain. Scalars are
//! stored inline; everything with identity is a [`Node`], a reference-counted
//! handle carrying a [`NodeId`] that is unique for the lifetime of the process.
//! Identity-keyed tables in the serializer and the decoder key on that id.
//!
//! ## Example
//!
//! ```
//! use reinhardt_resume_core::value::Value;
//!
//! let shared = Value::object_from([("name", Value::from("Alice"))]);
//! let list = Value::array([shared.clone(), shared.clone()]);
//!
//! let items = list.as_node().unwrap().as_array().unwrap().items().unwrap();
//! assert!(items[0].same(&items[1]));
//! ```

mod builtin;
mod object;
mod promise;
mod tree;

pub use builtin::{
	BytesObject, ErrorObject, FormDataObject, MapObject, OpaqueValue, RegExpValue, SetObject,
};
pub use object::{ArrayObject, PlainObject};
pub(crate) use object::{Slot, SlotRead};
pub use promise::{Deferred, Promise, PromiseState, Settlement};
pub(crate) use promise::SharedSettlement;
pub use tree::{ElementRef, SplitProps, TreeNode};

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::rc::Rc;

use crate::error::Result;
use crate::qrl::{Component, Qrl, Resource, Task};
use crate::reactive::{DerivedSignal, SignalCell, SignalField, Store};

/// Unique identifier of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Every compound kind the engine knows how to walk, encode and decode
pub enum NodeKind {
	/// Object literal with ordered string keys
	Object(PlainObject),
	/// Array
	Array(ArrayObject),
	/// URL, stored as its href
	Url(String),
	/// Date as epoch milliseconds (`NaN` for an invalid date)
	Date(f64),
	/// Regular expression
	RegExp(RegExpValue),
	/// URL search parameters, stored as the query string
	UrlSearchParams(String),
	/// Error
	Error(ErrorObject),
	/// Insertion-ordered set
	Set(SetObject),
	/// Insertion-ordered map
	Map(MapObject),
	/// Form data entries
	FormData(FormDataObject),
	/// Byte array
	Bytes(BytesObject),
	/// Pending or settled async value
	Promise(Promise),
	/// Lazy code reference
	Qrl(Qrl),
	/// Component reference
	Component(Component),
	/// Scheduled task
	Task(Task),
	/// Async resource
	Resource(Resource),
	/// Signal cell
	Signal(SignalCell),
	/// Derived signal
	Derived(DerivedSignal),
	/// Accessor signal over one field of a host value
	SignalField(SignalField),
	/// Reactive store
	Store(Store),
	/// UI tree node
	TreeNode(TreeNode),
	/// Split props container
	Props(SplitProps),
	/// Rendered UI element
	Element(ElementRef),
	/// Host value with no serialization rule
	Opaque(OpaqueValue),
}

impl NodeKind {
	/// Human readable name of the kind
	pub fn type_name(&self) -> &'static str {
		match self {
			NodeKind::Object(_) => "Object",
			NodeKind::Array(_) => "Array",
			NodeKind::Url(_) => "URL",
			NodeKind::Date(_) => "Date",
			NodeKind::RegExp(_) => "RegExp",
			NodeKind::UrlSearchParams(_) => "URLSearchParams",
			NodeKind::Error(_) => "Error",
			NodeKind::Set(_) => "Set",
			NodeKind::Map(_) => "Map",
			NodeKind::FormData(_) => "FormData",
			NodeKind::Bytes(_) => "Uint8Array",
			NodeKind::Promise(_) => "Promise",
			NodeKind::Qrl(_) => "QRL",
			NodeKind::Component(_) => "Component",
			NodeKind::Task(_) => "Task",
			NodeKind::Resource(_) => "Resource",
			NodeKind::Signal(_) => "Signal",
			NodeKind::Derived(_) => "DerivedSignal",
			NodeKind::SignalField(_) => "SignalField",
			NodeKind::Store(_) => "Store",
			NodeKind::TreeNode(_) => "TreeNode",
			NodeKind::Props(_) => "Props",
			NodeKind::Element(_) => "Element",
			NodeKind::Opaque(o) => o.type_name(),
		}
	}
}

struct NodeInner {
	id: NodeId,
	kind: NodeKind,
}

/// Identity-bearing handle to a compound value
///
/// Cloning a `Node` clones the handle, not the value: both clones have the same
/// [`NodeId`] and see the same interior state.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

macro_rules! node_accessor {
	($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
		$(#[$meta])*
		pub fn $name(&self) -> Option<&$ty> {
			match self.kind() {
				NodeKind::$variant(inner) => Some(inner),
				_ => None,
			}
		}
	};
}

impl Node {
	/// Wrap a kind into a new node with a fresh identity
	pub fn new(kind: NodeKind) -> Self {
		Self(Rc::new(NodeInner {
			id: NodeId::new(),
			kind,
		}))
	}

	/// Identity of this node
	pub fn id(&self) -> NodeId {
		self.0.id
	}

	/// The node's kind and payload
	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	/// Human readable name of the node's kind
	pub fn type_name(&self) -> &'static str {
		self.kind().type_name()
	}

	/// Whether two handles point at the same node
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	node_accessor!(
		/// The object literal, if this node is one
		as_object, Object, PlainObject
	);
	node_accessor!(as_array, Array, ArrayObject);
	node_accessor!(as_error, Error, ErrorObject);
	node_accessor!(as_set, Set, SetObject);
	node_accessor!(as_map, Map, MapObject);
	node_accessor!(as_form_data, FormData, FormDataObject);
	node_accessor!(as_bytes, Bytes, BytesObject);
	node_accessor!(as_promise, Promise, Promise);
	node_accessor!(as_qrl, Qrl, Qrl);
	node_accessor!(as_component, Component, Component);
	node_accessor!(as_task, Task, Task);
	node_accessor!(as_signal, Signal, SignalCell);
	node_accessor!(as_derived, Derived, DerivedSignal);
	node_accessor!(as_signal_field, SignalField, SignalField);
	node_accessor!(as_store, Store, Store);
	node_accessor!(as_tree_node, TreeNode, TreeNode);
	node_accessor!(as_props, Props, SplitProps);
	node_accessor!(as_element, Element, ElementRef);

	/// Whether this node is an object literal or array, the two container kinds
	/// that decode lazily.
	pub fn is_container(&self) -> bool {
		matches!(self.kind(), NodeKind::Object(_) | NodeKind::Array(_))
	}

	/// Read a named field through whatever access path the kind offers.
	///
	/// Objects, stores and split props read the property, signals expose their
	/// current value as `value`, arrays accept numeric indices and `length`.
	pub fn get_field(&self, key: &str) -> Result<Option<Value>> {
		match self.kind() {
			NodeKind::Object(object) => object.get(key),
			NodeKind::Store(store) => store.get(key),
			NodeKind::Props(props) => props.get(key),
			NodeKind::Array(array) => {
				if key == "length" {
					return Ok(Some(Value::Number(array.len() as f64)));
				}
				match key.parse::<usize>() {
					Ok(index) => array.get(index),
					Err(_) => Ok(None),
				}
			}
			NodeKind::Signal(signal) if key == "value" => Ok(Some(signal.value())),
			NodeKind::Derived(derived) if key == "value" => derived.value().map(Some),
			NodeKind::SignalField(field) if key == "value" => field.value().map(Some),
			_ => Ok(None),
		}
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind() {
			NodeKind::Object(object) => f
				.debug_struct("Object")
				.field("id", &self.id())
				.field("keys", &object.keys())
				.finish(),
			NodeKind::Array(array) => f
				.debug_struct("Array")
				.field("id", &self.id())
				.field("len", &array.len())
				.finish(),
			NodeKind::Url(href) => write!(f, "URL({href})"),
			NodeKind::Date(ms) => write!(f, "Date({ms})"),
			NodeKind::RegExp(re) => write!(f, "RegExp({re})"),
			NodeKind::UrlSearchParams(query) => write!(f, "URLSearchParams({query})"),
			kind => f
				.debug_struct(kind.type_name())
				.field("id", &self.id())
				.finish_non_exhaustive(),
		}
	}
}

/// A value in an object graph
#[derive(Clone, Default)]
pub enum Value {
	/// `undefined`
	#[default]
	Undefined,
	/// `null`
	Null,
	/// Boolean
	Bool(bool),
	/// Double precision number, including `NaN` and the infinities
	Number(f64),
	/// Integer outside the double precision range
	BigInt(i128),
	/// String
	String(Rc<str>),
	/// Compound value with identity
	Node(Node),
}

impl Value {
	/// Wrap a kind into a new node value
	pub fn node(kind: NodeKind) -> Self {
		Value::Node(Node::new(kind))
	}

	/// New empty object literal
	pub fn object() -> Self {
		Self::node(NodeKind::Object(PlainObject::new()))
	}

	/// New object literal with the given entries, in order
	pub fn object_from<K, I>(entries: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Self::node(NodeKind::Object(PlainObject::from_entries(entries)))
	}

	/// New array
	pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
		Self::node(NodeKind::Array(ArrayObject::from_items(items)))
	}

	/// New URL
	pub fn url(href: impl Into<String>) -> Self {
		Self::node(NodeKind::Url(href.into()))
	}

	/// New date from epoch milliseconds
	pub fn date(epoch_ms: f64) -> Self {
		Self::node(NodeKind::Date(epoch_ms))
	}

	/// New regular expression
	pub fn regexp(source: impl Into<String>, flags: impl Into<String>) -> Self {
		Self::node(NodeKind::RegExp(RegExpValue::new(source, flags)))
	}

	/// New URL search parameters from a query string
	pub fn search_params(query: impl Into<String>) -> Self {
		Self::node(NodeKind::UrlSearchParams(query.into()))
	}

	/// New error with a message
	pub fn error(message: impl Into<String>) -> Self {
		Self::node(NodeKind::Error(ErrorObject::new(message)))
	}

	/// New set; duplicate members are kept once, first occurrence wins
	pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
		Self::node(NodeKind::Set(SetObject::from_items(items)))
	}

	/// New map; a repeated key overwrites the earlier value in place
	pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
		Self::node(NodeKind::Map(MapObject::from_entries(entries)))
	}

	/// New form data
	pub fn form_data<K, V, I>(entries: I) -> Self
	where
		K: Into<String>,
		V: Into<String>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self::node(NodeKind::FormData(FormDataObject::from_entries(entries)))
	}

	/// New byte array
	pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self::node(NodeKind::Bytes(BytesObject::new(bytes.into())))
	}

	/// The node, if this value is one
	pub fn as_node(&self) -> Option<&Node> {
		match self {
			Value::Node(node) => Some(node),
			_ => None,
		}
	}

	/// The string, if this value is one
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	/// The number, if this value is one
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// The boolean, if this value is one
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// The big integer, if this value is one
	pub fn as_bigint(&self) -> Option<i128> {
		match self {
			Value::BigInt(n) => Some(*n),
			_ => None,
		}
	}

	/// Whether this value is `undefined`
	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	/// Name of the value's runtime kind
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Undefined => "undefined",
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::BigInt(_) => "bigint",
			Value::String(_) => "string",
			Value::Node(node) => node.type_name(),
		}
	}

	/// Same-value comparison: nodes compare by identity, `NaN` equals `NaN`.
	pub fn same(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
			(Value::BigInt(a), Value::BigInt(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Text used when a value is shown to a user, e.g. as an error message
	pub fn display_text(&self) -> String {
		match self {
			Value::Undefined => "undefined".to_string(),
			Value::Null => "null".to_string(),
			Value::Bool(b) => b.to_string(),
			Value::Number(n) => crate::serialize::format_number(*n),
			Value::BigInt(n) => n.to_string(),
			Value::String(s) => s.to_string(),
			Value::Node(node) => match node.kind() {
				NodeKind::Error(error) => error.message(),
				NodeKind::Url(href) => href.clone(),
				kind => format!("[object {}]", kind.type_name()),
			},
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.same(other)
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Null => f.write_str("null"),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Number(n) => write!(f, "{n}"),
			Value::BigInt(n) => write!(f, "{n}n"),
			Value::String(s) => write!(f, "{s:?}"),
			Value::Node(node) => node.fmt(f),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Number(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Number(f64::from(value))
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Value::Number(f64::from(value))
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(Rc::from(value))
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(Rc::from(value))
	}
}

impl From<Node> for Value {
	fn from(value: Node) -> Self {
		Value::Node(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_node_ids_are_unique() {
		// Arrange
		let a = Value::object();
		let b = Value::object();

		// Act
		let id_a = a.as_node().unwrap().id();
		let id_b = b.as_node().unwrap().id();

		// Assert
		assert_ne!(id_a, id_b);
	}

	#[rstest]
	fn test_clone_shares_identity() {
		// Arrange
		let a = Value::object();

		// Act
		let b = a.clone();

		// Assert
		assert!(a.same(&b));
		assert_eq!(a.as_node().unwrap().id(), b.as_node().unwrap().id());
	}

	#[rstest]
	fn test_structurally_equal_objects_are_not_same() {
		// Arrange
		let a = Value::object_from([("x", Value::from(1))]);
		let b = Value::object_from([("x", Value::from(1))]);

		// Assert
		assert!(!a.same(&b));
	}

	#[rstest]
	#[case(Value::Number(f64::NAN), Value::Number(f64::NAN), true)]
	#[case(Value::from(1), Value::Number(1.0), true)]
	#[case(Value::from("a"), Value::from("a"), true)]
	#[case(Value::Undefined, Value::Null, false)]
	#[case(Value::BigInt(5), Value::Number(5.0), false)]
	fn test_same_value(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
		// Assert
		assert_eq!(a.same(&b), expected);
	}

	#[rstest]
	fn test_get_field_on_signal_and_array() {
		// Arrange
		let signal = SignalCell::new_value(Value::from(3));
		let array = Value::array([Value::from("a"), Value::from("b")]);

		// Act
		let signal_value = signal.as_node().unwrap().get_field("value").unwrap();
		let length = array.as_node().unwrap().get_field("length").unwrap();
		let second = array.as_node().unwrap().get_field("1").unwrap();

		// Assert
		assert_eq!(signal_value, Some(Value::from(3)));
		assert_eq!(length, Some(Value::from(2)));
		assert_eq!(second, Some(Value::from("b")));
	}

	#[rstest]
	fn test_display_text() {
		// Assert
		assert_eq!(Value::from(42).display_text(), "42");
		assert_eq!(Value::error("boom").display_text(), "boom");
		assert_eq!(Value::set([]).display_text(), "[object Set]");
	}
}
