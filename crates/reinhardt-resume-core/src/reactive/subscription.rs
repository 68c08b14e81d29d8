//! Subscription manager
//!
//! Every reactive value keeps the list of observers that must be notified
//! when it changes. The engine only stores and transfers this list; it never
//! notifies anyone itself.

use std::cell::RefCell;

use crate::value::Value;

/// What an observer does with a change
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberKind {
	/// Re-render the host component
	Host = 0,
	/// Update one property of the host element
	Property = 1,
	/// Update a text node
	Text = 2,
	/// Re-run a task
	Task = 3,
}

impl SubscriberKind {
	/// Numeric code used on the wire
	pub fn code(self) -> u8 {
		self as u8
	}

	/// Kind for a wire code
	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(Self::Host),
			1 => Some(Self::Property),
			2 => Some(Self::Text),
			3 => Some(Self::Task),
			_ => None,
		}
	}
}

/// One observer tuple
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
	/// What the observer does
	pub kind: SubscriberKind,
	/// Signal the host reads through, when it is not the owner itself
	pub signal: Option<Value>,
	/// Observing host
	pub host: Value,
	/// Property of the host that is updated
	pub prop: Option<String>,
}

impl Subscriber {
	/// Observer that re-renders `host`
	pub fn host(host: Value) -> Self {
		Self {
			kind: SubscriberKind::Host,
			signal: None,
			host,
			prop: None,
		}
	}

	/// Observer that updates `prop` on `host`
	pub fn property(host: Value, prop: impl Into<String>) -> Self {
		Self {
			kind: SubscriberKind::Property,
			signal: None,
			host,
			prop: Some(prop.into()),
		}
	}

	/// Observer that updates a text node of `host`
	pub fn text(host: Value) -> Self {
		Self {
			kind: SubscriberKind::Text,
			signal: None,
			host,
			prop: None,
		}
	}

	/// Observer that re-runs the task `task`
	pub fn task(task: Value) -> Self {
		Self {
			kind: SubscriberKind::Task,
			signal: None,
			host: task,
			prop: None,
		}
	}

	/// Record the signal the host reads through
	pub fn via(mut self, signal: Value) -> Self {
		self.signal = Some(signal);
		self
	}
}

/// Observer list of one reactive value
#[derive(Debug, Default)]
pub struct SubscriptionManager {
	subscribers: RefCell<Vec<Subscriber>>,
}

impl SubscriptionManager {
	/// Empty manager
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an observer. An identical tuple is only kept once.
	pub fn add(&self, subscriber: Subscriber) {
		let mut subscribers = self.subscribers.borrow_mut();
		if !subscribers.contains(&subscriber) {
			subscribers.push(subscriber);
		}
	}

	/// Observers in registration order
	pub fn subscribers(&self) -> Vec<Subscriber> {
		self.subscribers.borrow().clone()
	}

	/// Number of observers
	pub fn len(&self) -> usize {
		self.subscribers.borrow().len()
	}

	/// Whether nobody observes the value
	pub fn is_empty(&self) -> bool {
		self.subscribers.borrow().is_empty()
	}

	/// Drop every observer
	pub fn clear(&self) {
		self.subscribers.borrow_mut().clear();
	}

	/// Values the walker must visit: every host and every via-signal
	pub(crate) fn references(&self) -> Vec<Value> {
		self.subscribers
			.borrow()
			.iter()
			.flat_map(|subscriber| subscriber.signal.iter().chain([&subscriber.host]))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(SubscriberKind::Host)]
	#[case(SubscriberKind::Property)]
	#[case(SubscriberKind::Text)]
	#[case(SubscriberKind::Task)]
	fn test_kind_code_round_trip(#[case] kind: SubscriberKind) {
		// Assert
		assert_eq!(SubscriberKind::from_code(kind.code()), Some(kind));
	}

	#[rstest]
	fn test_unknown_kind_code() {
		// Assert
		assert_eq!(SubscriberKind::from_code(9), None);
	}

	#[rstest]
	fn test_identical_subscriber_added_once() {
		// Arrange
		let manager = SubscriptionManager::new();
		let host = Value::object();

		// Act
		manager.add(Subscriber::host(host.clone()));
		manager.add(Subscriber::host(host.clone()));
		manager.add(Subscriber::property(host.clone(), "class"));

		// Assert
		assert_eq!(manager.len(), 2);
	}

	#[rstest]
	fn test_references_include_via_signal() {
		// Arrange
		let manager = SubscriptionManager::new();
		let host = Value::object();
		let signal = Value::object();
		manager.add(Subscriber::text(host.clone()).via(signal.clone()));

		// Act
		let references = manager.references();

		// Assert
		assert_eq!(references.len(), 2);
		assert!(references[0].same(&signal));
		assert!(references[1].same(&host));
	}
}
