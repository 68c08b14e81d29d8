//! Derived signals

use std::cell::RefCell;

use super::SubscriptionManager;
use crate::codec::{ClosureDescriptor, ClosureEntry, SyncFn};
use crate::error::{ResumeError, Result};
use crate::value::{NodeKind, Value};

/// Signal computed by an inline closure over captured values
///
/// The closure is called with the captured values as its arguments. Its
/// source text is what gets transferred; the callable itself is looked up
/// again on the receiving side.
///
/// ## Example
///
/// ```
/// use reinhardt_resume_core::codec::{ClosureDescriptor, sync_fn};
/// use reinhardt_resume_core::reactive::DerivedSignal;
/// use reinhardt_resume_core::value::Value;
///
/// let double = DerivedSignal::new(
///     ClosureDescriptor::expr("p0*2", 1),
///     sync_fn(|args| Ok(Value::from(args[0].as_f64().unwrap_or(0.0) * 2.0))),
///     vec![Value::from(21)],
/// );
/// assert_eq!(double.value().unwrap(), Value::from(42));
/// ```
#[derive(Default)]
pub struct DerivedSignal {
	closure: RefCell<Option<ClosureEntry>>,
	captured: RefCell<Vec<Value>>,
	subscriptions: SubscriptionManager,
}

impl DerivedSignal {
	/// New derived signal
	pub fn new(descriptor: ClosureDescriptor, func: SyncFn, captured: Vec<Value>) -> Self {
		Self {
			closure: RefCell::new(Some(ClosureEntry::new(descriptor, func))),
			captured: RefCell::new(captured),
			subscriptions: SubscriptionManager::new(),
		}
	}

	/// New derived signal wrapped in a node
	pub fn new_value(descriptor: ClosureDescriptor, func: SyncFn, captured: Vec<Value>) -> Value {
		Value::node(NodeKind::Derived(Self::new(descriptor, func, captured)))
	}

	/// Compute the current value
	pub fn value(&self) -> Result<Value> {
		let func = self
			.closure
			.borrow()
			.as_ref()
			.map(|entry| entry.func().clone())
			.ok_or_else(|| ResumeError::Closure("derived signal has no closure".to_string()))?;
		let captured = self.captured();
		func(&captured)
	}

	/// The closure, if one is attached
	pub fn closure(&self) -> Option<ClosureEntry> {
		self.closure.borrow().clone()
	}

	/// Captured values, in argument order
	pub fn captured(&self) -> Vec<Value> {
		self.captured.borrow().clone()
	}

	/// Observers of this signal
	pub fn subscriptions(&self) -> &SubscriptionManager {
		&self.subscriptions
	}

	pub(crate) fn fill(&self, closure: ClosureEntry, captured: Vec<Value>) {
		*self.closure.borrow_mut() = Some(closure);
		*self.captured.borrow_mut() = captured;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::sync_fn;
	use rstest::rstest;

	#[rstest]
	fn test_value_without_closure_fails() {
		// Arrange
		let derived = DerivedSignal::default();

		// Act
		let result = derived.value();

		// Assert
		assert!(matches!(result, Err(ResumeError::Closure(_))));
	}

	#[rstest]
	fn test_value_passes_captured_in_order() {
		// Arrange
		let derived = DerivedSignal::new(
			ClosureDescriptor::expr("p0+p1", 2),
			sync_fn(|args| {
				let joined: String = args.iter().map(Value::display_text).collect();
				Ok(Value::from(joined))
			}),
			vec![Value::from("a"), Value::from("b")],
		);

		// Act
		let value = derived.value().unwrap();

		// Assert
		assert_eq!(value, Value::from("ab"));
	}
}
