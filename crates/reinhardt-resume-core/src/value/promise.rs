//! Pending and settled async values
//!
//! A promise is a node like any other, so it can be shared and rooted. While
//! it is pending it holds a shared local future; the serializer awaits that
//! future during its drain loop and records the outcome on the node itself.
//! Decoded promises are always settled.
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use reinhardt_resume_core::value::{Promise, Value};
//!
//! let (promise, deferred) = Promise::deferred();
//! deferred.resolve(Value::from(42));
//!
//! let outcome = block_on(promise.as_node().unwrap().as_promise().unwrap().wait());
//! assert_eq!(outcome.unwrap(), Value::from(42));
//! ```

use std::cell::RefCell;
use std::future::Future;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{LocalBoxFuture, Shared};

use super::{NodeKind, Value};

/// Outcome of an async value: `Ok` when resolved, `Err` with the reason when
/// rejected
pub type Settlement = std::result::Result<Value, Value>;

pub(crate) type SharedSettlement = Shared<LocalBoxFuture<'static, Settlement>>;

/// Observable state of a promise
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
	/// Not settled yet
	Pending,
	/// Resolved with a value
	Resolved(Value),
	/// Rejected; the reason is always an error node
	Rejected(Value),
}

enum Inner {
	Pending(Option<SharedSettlement>),
	Resolved(Value),
	Rejected(Value),
}

/// Async value
pub struct Promise {
	inner: RefCell<Inner>,
}

impl Promise {
	/// Promise settled by `future`
	pub fn pending<F>(future: F) -> Value
	where
		F: Future<Output = Settlement> + 'static,
	{
		Value::node(NodeKind::Promise(Self {
			inner: RefCell::new(Inner::Pending(Some(future.boxed_local().shared()))),
		}))
	}

	/// Promise settled through the returned handle
	pub fn deferred() -> (Value, Deferred) {
		let (sender, receiver) = oneshot::channel();
		let future = receiver.map(|received| {
			received.unwrap_or_else(|_| Err(Value::error("deferred value was dropped unsettled")))
		});
		(Self::pending(future), Deferred { sender })
	}

	/// Promise already resolved with `value`
	pub fn resolved(value: Value) -> Value {
		Value::node(NodeKind::Promise(Self {
			inner: RefCell::new(Inner::Resolved(value)),
		}))
	}

	/// Promise already rejected with `reason`
	pub fn rejected(reason: Value) -> Value {
		Value::node(NodeKind::Promise(Self {
			inner: RefCell::new(Inner::Rejected(as_error(reason))),
		}))
	}

	/// Unsettled shell for the decoder
	pub(crate) fn shell() -> Self {
		Self {
			inner: RefCell::new(Inner::Pending(None)),
		}
	}

	/// Current state
	pub fn state(&self) -> PromiseState {
		match &*self.inner.borrow() {
			Inner::Pending(_) => PromiseState::Pending,
			Inner::Resolved(value) => PromiseState::Resolved(value.clone()),
			Inner::Rejected(reason) => PromiseState::Rejected(reason.clone()),
		}
	}

	/// Whether the promise has not settled yet
	pub fn is_pending(&self) -> bool {
		matches!(&*self.inner.borrow(), Inner::Pending(_))
	}

	/// The outcome, waiting for it if necessary
	pub fn wait(&self) -> LocalBoxFuture<'static, Settlement> {
		match &*self.inner.borrow() {
			Inner::Resolved(value) => futures::future::ready(Ok(value.clone())).boxed_local(),
			Inner::Rejected(reason) => futures::future::ready(Err(reason.clone())).boxed_local(),
			Inner::Pending(Some(future)) => future.clone().boxed_local(),
			Inner::Pending(None) => futures::future::ready(Err(Value::error(
				"promise shell was never inflated",
			)))
			.boxed_local(),
		}
	}

	/// Future the drain loop awaits, if the promise is still pending
	pub(crate) fn settlement(&self) -> Option<SharedSettlement> {
		match &*self.inner.borrow() {
			Inner::Pending(future) => future.clone(),
			_ => None,
		}
	}

	/// Record the outcome. Rejection reasons that are not errors are wrapped.
	pub(crate) fn settle(&self, settlement: Settlement) {
		*self.inner.borrow_mut() = match settlement {
			Ok(value) => Inner::Resolved(value),
			Err(reason) => Inner::Rejected(as_error(reason)),
		};
	}
}

/// Wrap a rejection reason in an error node unless it already is one
pub(crate) fn as_error(reason: Value) -> Value {
	let is_error = reason
		.as_node()
		.is_some_and(|node| node.as_error().is_some());
	if is_error {
		reason
	} else {
		Value::error(reason.display_text())
	}
}

/// Settling handle of a [`Promise::deferred`] promise
pub struct Deferred {
	sender: oneshot::Sender<Settlement>,
}

impl Deferred {
	/// Resolve with `value`
	pub fn resolve(self, value: Value) {
		// The receiver is gone only if the promise itself was dropped
		let _ = self.sender.send(Ok(value));
	}

	/// Reject with `reason`
	pub fn reject(self, reason: Value) {
		let _ = self.sender.send(Err(reason));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::executor::block_on;
	use rstest::rstest;

	fn promise_of(value: &Value) -> &Promise {
		value.as_node().unwrap().as_promise().unwrap()
	}

	#[rstest]
	fn test_rejected_wraps_plain_reason() {
		// Act
		let promise = Promise::rejected(Value::from("nope"));

		// Assert
		match promise_of(&promise).state() {
			PromiseState::Rejected(reason) => {
				let error = reason.as_node().unwrap().as_error().unwrap();
				assert_eq!(error.message(), "nope");
			}
			state => panic!("unexpected state {state:?}"),
		}
	}

	#[rstest]
	fn test_rejected_keeps_error_identity() {
		// Arrange
		let error = Value::error("boom");

		// Act
		let promise = Promise::rejected(error.clone());

		// Assert
		assert_eq!(promise_of(&promise).state(), PromiseState::Rejected(error));
	}

	#[rstest]
	fn test_dropped_deferred_rejects() {
		// Arrange
		let (promise, deferred) = Promise::deferred();

		// Act
		drop(deferred);
		let outcome = block_on(promise_of(&promise).wait());

		// Assert
		assert!(outcome.is_err());
	}

	#[rstest]
	fn test_settle_records_outcome() {
		// Arrange
		let (promise, _deferred) = Promise::deferred();
		let inner = promise_of(&promise);
		assert!(inner.is_pending());

		// Act
		inner.settle(Ok(Value::from(1)));

		// Assert
		assert_eq!(inner.state(), PromiseState::Resolved(Value::from(1)));
		assert!(inner.settlement().is_none());
	}
}
