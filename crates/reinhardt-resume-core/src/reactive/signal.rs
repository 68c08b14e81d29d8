//! Signal cells and field accessors

use std::cell::RefCell;

use super::SubscriptionManager;
use crate::error::Result;
use crate::value::{NodeKind, Value};

/// A reactive cell holding a current value and its observers
///
/// ## Example
///
/// ```
/// use reinhardt_resume_core::reactive::SignalCell;
/// use reinhardt_resume_core::value::Value;
///
/// let count = SignalCell::new(Value::from(0));
/// count.set(Value::from(42));
/// assert_eq!(count.value(), Value::from(42));
/// ```
#[derive(Default)]
pub struct SignalCell {
	value: RefCell<Value>,
	subscriptions: SubscriptionManager,
}

impl SignalCell {
	/// New signal cell
	pub fn new(value: Value) -> Self {
		Self {
			value: RefCell::new(value),
			subscriptions: SubscriptionManager::new(),
		}
	}

	/// New signal cell wrapped in a node
	pub fn new_value(value: Value) -> Value {
		Value::node(NodeKind::Signal(Self::new(value)))
	}

	/// Current value, without dependency tracking
	pub fn value(&self) -> Value {
		self.value.borrow().clone()
	}

	/// Replace the current value
	pub fn set(&self, value: Value) {
		*self.value.borrow_mut() = value;
	}

	/// Observers of this signal
	pub fn subscriptions(&self) -> &SubscriptionManager {
		&self.subscriptions
	}
}

/// Signal that reads one field of a host value
///
/// The host is usually a store or a props container; reading the accessor
/// reads `host[prop]` at that moment.
#[derive(Default)]
pub struct SignalField {
	host: RefCell<Value>,
	prop: RefCell<String>,
	subscriptions: SubscriptionManager,
}

impl SignalField {
	/// New accessor over `host[prop]`
	pub fn new(host: Value, prop: impl Into<String>) -> Self {
		Self {
			host: RefCell::new(host),
			prop: RefCell::new(prop.into()),
			subscriptions: SubscriptionManager::new(),
		}
	}

	/// Value read through
	pub fn host(&self) -> Value {
		self.host.borrow().clone()
	}

	/// Field name
	pub fn prop(&self) -> String {
		self.prop.borrow().clone()
	}

	/// Current value of the field, `undefined` when absent
	pub fn value(&self) -> Result<Value> {
		let host = self.host();
		let prop = self.prop();
		match host.as_node() {
			Some(node) => Ok(node.get_field(&prop)?.unwrap_or_default()),
			None => Ok(Value::Undefined),
		}
	}

	/// Observers of this accessor
	pub fn subscriptions(&self) -> &SubscriptionManager {
		&self.subscriptions
	}

	pub(crate) fn fill(&self, host: Value, prop: String) {
		*self.host.borrow_mut() = host;
		*self.prop.borrow_mut() = prop;
	}
}
