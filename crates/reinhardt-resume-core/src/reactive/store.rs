//! Reactive stores
//!
//! A store wraps an object literal or array. It is an explicit wrapper rather
//! than a transparent proxy: reads and writes go through [`Store::get`] and
//! [`Store::set`], which operate on the unwrapped target. A recursive store
//! hands out a nested store for every container it reads; all stores of one
//! tree share a proxy map, so a given target always yields the same nested
//! store.

use core::fmt;
use core::ops::BitOr;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::SubscriptionManager;
use crate::error::{ResumeError, Result};
use crate::value::{Node, NodeId, NodeKind, Value};

/// Store behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StoreFlags(u32);

impl StoreFlags {
	/// No flags
	pub const NONE: Self = Self(0);
	/// Wrap nested containers in stores as well
	pub const RECURSIVE: Self = Self(1);
	/// Reject writes
	pub const IMMUTABLE: Self = Self(2);

	/// Raw bits
	pub fn bits(self) -> u32 {
		self.0
	}

	/// Flags from raw bits; unknown bits are dropped
	pub fn from_bits_truncate(bits: u32) -> Self {
		Self(bits & (Self::RECURSIVE.0 | Self::IMMUTABLE.0))
	}

	/// Whether every flag in `other` is set
	pub fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}
}

impl BitOr for StoreFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl fmt::Display for StoreFlags {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

type ProxyMap = Rc<RefCell<HashMap<NodeId, Node>>>;

/// Reactive store over an object literal or array
///
/// ## Example
///
/// ```
/// use reinhardt_resume_core::reactive::{Store, StoreFlags};
/// use reinhardt_resume_core::value::Value;
///
/// let inner = Value::object_from([("n", Value::from(1))]);
/// let store = Store::wrap(Value::object_from([("inner", inner)]), StoreFlags::RECURSIVE);
/// let store = store.as_node().unwrap().as_store().unwrap();
///
/// let first = store.get("inner").unwrap().unwrap();
/// let second = store.get("inner").unwrap().unwrap();
/// assert!(first.same(&second));
/// assert!(first.as_node().unwrap().as_store().is_some());
/// ```
pub struct Store {
	target: Value,
	flags: StoreFlags,
	subscriptions: SubscriptionManager,
	proxies: ProxyMap,
}

impl Store {
	/// New store over `target`
	pub fn new(target: Value, flags: StoreFlags) -> Self {
		Self {
			target: unwrap_store(target),
			flags,
			subscriptions: SubscriptionManager::new(),
			proxies: ProxyMap::default(),
		}
	}

	/// New store wrapped in a node
	pub fn wrap(target: Value, flags: StoreFlags) -> Value {
		Value::node(NodeKind::Store(Self::new(target, flags)))
	}

	/// The unwrapped target
	pub fn target(&self) -> Value {
		self.target.clone()
	}

	/// Behaviour flags
	pub fn flags(&self) -> StoreFlags {
		self.flags
	}

	/// Observers of this store
	pub fn subscriptions(&self) -> &SubscriptionManager {
		&self.subscriptions
	}

	/// Read a field of the target
	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		let Some(target) = self.target.as_node() else {
			return Ok(None);
		};
		let value = target.get_field(key)?;
		if !self.flags.contains(StoreFlags::RECURSIVE) {
			return Ok(value);
		}
		Ok(value.map(|value| match value {
			Value::Node(node) if node.is_container() => Value::Node(self.proxy_for(node)),
			other => other,
		}))
	}

	/// Write a field of the target. Stores given as values are unwrapped.
	pub fn set(&self, key: &str, value: Value) -> Result<()> {
		if self.flags.contains(StoreFlags::IMMUTABLE) {
			return Err(ResumeError::ReadOnlyProperty(key.to_string()));
		}
		let value = unwrap_store(value);
		match self.target.as_node().map(Node::kind) {
			Some(NodeKind::Object(object)) => object.set(key, value),
			Some(NodeKind::Array(array)) => {
				let index = key
					.parse::<usize>()
					.map_err(|_| ResumeError::ReadOnlyProperty(key.to_string()))?;
				array.set(index, value);
				Ok(())
			}
			_ => Err(ResumeError::ReadOnlyProperty(key.to_string())),
		}
	}

	fn proxy_for(&self, target: Node) -> Node {
		if let Some(proxy) = self.proxies.borrow().get(&target.id()) {
			return proxy.clone();
		}
		let proxy = Node::new(NodeKind::Store(Self {
			target: Value::Node(target.clone()),
			flags: self.flags,
			subscriptions: SubscriptionManager::new(),
			proxies: Rc::clone(&self.proxies),
		}));
		self.proxies.borrow_mut().insert(target.id(), proxy.clone());
		proxy
	}
}

/// The target of a store, or the value itself
pub(crate) fn unwrap_store(value: Value) -> Value {
	match value.as_node().and_then(Node::as_store) {
		Some(store) => store.target(),
		None => value,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn store_of(value: &Value) -> &Store {
		value.as_node().unwrap().as_store().unwrap()
	}

	#[rstest]
	fn test_flags_contains() {
		// Arrange
		let flags = StoreFlags::RECURSIVE | StoreFlags::IMMUTABLE;

		// Assert
		assert!(flags.contains(StoreFlags::RECURSIVE));
		assert!(flags.contains(StoreFlags::IMMUTABLE));
		assert!(!StoreFlags::NONE.contains(StoreFlags::RECURSIVE));
		assert_eq!(StoreFlags::from_bits_truncate(0xff).bits(), 3);
	}

	#[rstest]
	fn test_write_goes_to_target() {
		// Arrange
		let target = Value::object();
		let store = Store::wrap(target.clone(), StoreFlags::NONE);

		// Act
		store_of(&store).set("x", Value::from(1)).unwrap();

		// Assert
		let object = target.as_node().unwrap().as_object().unwrap();
		assert_eq!(object.get("x").unwrap(), Some(Value::from(1)));
	}

	#[rstest]
	fn test_immutable_store_rejects_writes() {
		// Arrange
		let store = Store::wrap(Value::object(), StoreFlags::IMMUTABLE);

		// Act
		let result = store_of(&store).set("x", Value::from(1));

		// Assert
		assert!(matches!(result, Err(ResumeError::ReadOnlyProperty(key)) if key == "x"));
	}

	#[rstest]
	fn test_non_recursive_store_returns_raw_containers() {
		// Arrange
		let inner = Value::array([]);
		let store = Store::wrap(Value::object_from([("list", inner.clone())]), StoreFlags::NONE);

		// Act
		let read = store_of(&store).get("list").unwrap().unwrap();

		// Assert
		assert!(read.same(&inner));
	}

	#[rstest]
	fn test_nested_proxies_share_one_map() {
		// Arrange
		let leaf = Value::object();
		let middle = Value::object_from([("leaf", leaf.clone())]);
		let store = Store::wrap(
			Value::object_from([("a", middle.clone()), ("b", leaf.clone())]),
			StoreFlags::RECURSIVE,
		);
		let root = store_of(&store);

		// Act
		let via_middle = root.get("a").unwrap().unwrap();
		let via_middle = store_of(&via_middle).get("leaf").unwrap().unwrap();
		let direct = root.get("b").unwrap().unwrap();

		// Assert
		assert!(via_middle.same(&direct));
		assert!(store_of(&direct).target().same(&leaf));
	}

	#[rstest]
	fn test_storing_a_store_stores_its_target() {
		// Arrange
		let target = Value::object();
		let outer = Value::object();
		let store = Store::wrap(outer.clone(), StoreFlags::NONE);

		// Act
		store_of(&store)
			.set("child", Store::wrap(target.clone(), StoreFlags::NONE))
			.unwrap();

		// Assert
		let stored = outer.as_node().unwrap().get_field("child").unwrap().unwrap();
		assert!(stored.same(&target));
	}
}
