//! Lazy code references and the kinds built on them
//!
//! A [`Qrl`] names a function by the chunk that exports it and its symbol,
//! together with the values it closes over. The function itself is only
//! looked up when the reference is resolved, through the [`SymbolResolver`]
//! attached to it. A synchronous reference instead carries an inline closure
//! from the closure table.
//!
//! Symbols follow the `{name}_{hash}` convention; the hash is what the
//! [`ChunkResolver`](crate::host::ChunkResolver) is asked about.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::codec::{ClosureDescriptor, ClosureEntry, SyncFn};
use crate::error::{ResumeError, Result};
use crate::host::SymbolResolver;
use crate::value::{NodeKind, Value};

/// Lazy code reference
///
/// ## Example
///
/// ```
/// use std::rc::Rc;
/// use reinhardt_resume_core::codec::sync_fn;
/// use reinhardt_resume_core::host::SymbolRegistry;
/// use reinhardt_resume_core::qrl::Qrl;
/// use reinhardt_resume_core::value::Value;
///
/// let symbols = SymbolRegistry::new().with(
///     "./counter.js",
///     "increment_a1b2",
///     sync_fn(|args| Ok(Value::from(args[0].as_f64().unwrap_or(0.0) + 1.0))),
/// );
/// let qrl = Qrl::new("increment_a1b2")
///     .with_chunk("./counter.js")
///     .with_captured(vec![Value::from(41)])
///     .with_container(Rc::new(symbols));
///
/// assert_eq!(qrl.symbol_hash(), "a1b2");
/// assert_eq!(qrl.invoke(&[]).unwrap(), Value::from(42));
/// ```
#[derive(Default)]
pub struct Qrl {
	chunk: RefCell<Option<String>>,
	symbol: RefCell<String>,
	captured: RefCell<Vec<Value>>,
	sync: RefCell<Option<ClosureEntry>>,
	container: RefCell<Option<Rc<dyn SymbolResolver>>>,
}

impl Qrl {
	/// Reference to `symbol`; the chunk is found at encode time if not given
	pub fn new(symbol: impl Into<String>) -> Self {
		Self {
			symbol: RefCell::new(symbol.into()),
			..Self::default()
		}
	}

	/// Synchronous reference to an inline closure
	pub fn sync(descriptor: ClosureDescriptor, func: SyncFn) -> Self {
		Self {
			sync: RefCell::new(Some(ClosureEntry::new(descriptor, func))),
			..Self::default()
		}
	}

	/// Set the chunk that exports the symbol
	pub fn with_chunk(self, chunk: impl Into<String>) -> Self {
		*self.chunk.borrow_mut() = Some(chunk.into());
		self
	}

	/// Set the captured values
	pub fn with_captured(self, captured: Vec<Value>) -> Self {
		*self.captured.borrow_mut() = captured;
		self
	}

	/// Set the resolver used to load the symbol
	pub fn with_container(self, container: Rc<dyn SymbolResolver>) -> Self {
		self.set_container(container);
		self
	}

	/// Wrap in a node
	pub fn into_value(self) -> Value {
		Value::node(NodeKind::Qrl(self))
	}

	/// Chunk locator, if known
	pub fn chunk(&self) -> Option<String> {
		self.chunk.borrow().clone()
	}

	/// Exported symbol name; empty for synchronous references
	pub fn symbol(&self) -> String {
		self.symbol.borrow().clone()
	}

	/// Stable hash part of the symbol
	pub fn symbol_hash(&self) -> String {
		let symbol = self.symbol.borrow();
		match symbol.rfind('_') {
			Some(index) => symbol[index + 1..].to_string(),
			None => symbol.clone(),
		}
	}

	/// Captured values
	pub fn captured(&self) -> Vec<Value> {
		self.captured.borrow().clone()
	}

	/// Whether this is a synchronous reference
	pub fn is_sync(&self) -> bool {
		self.sync.borrow().is_some()
	}

	/// Inline closure of a synchronous reference
	pub fn sync_closure(&self) -> Option<ClosureEntry> {
		self.sync.borrow().clone()
	}

	/// Attach the resolver used to load the symbol
	pub fn set_container(&self, container: Rc<dyn SymbolResolver>) {
		*self.container.borrow_mut() = Some(container);
	}

	/// Load the callable
	pub fn resolve(&self) -> Result<SyncFn> {
		if let Some(entry) = self.sync.borrow().as_ref() {
			return Ok(entry.func().clone());
		}
		let chunk = self.chunk().unwrap_or_default();
		let symbol = self.symbol();
		self.container
			.borrow()
			.as_ref()
			.and_then(|container| container.resolve_symbol(&chunk, &symbol))
			.ok_or(ResumeError::MissingSymbol { chunk, symbol })
	}

	/// Call the function with the captured values followed by `args`
	pub fn invoke(&self, args: &[Value]) -> Result<Value> {
		let func = self.resolve()?;
		let mut all = self.captured();
		all.extend_from_slice(args);
		func(&all)
	}

	pub(crate) fn fill_lazy(&self, chunk: String, symbol: String, captured: Vec<Value>) {
		*self.chunk.borrow_mut() = Some(chunk);
		*self.symbol.borrow_mut() = symbol;
		*self.captured.borrow_mut() = captured;
	}

	pub(crate) fn fill_sync(&self, closure: ClosureEntry, captured: Vec<Value>) {
		*self.sync.borrow_mut() = Some(closure);
		*self.captured.borrow_mut() = captured;
	}
}

/// Component reference: the code reference of its render function
#[derive(Default)]
pub struct Component {
	qrl: RefCell<Value>,
}

impl Component {
	/// New component
	pub fn new(qrl: Value) -> Self {
		Self {
			qrl: RefCell::new(qrl),
		}
	}

	/// Render function reference
	pub fn qrl(&self) -> Value {
		self.qrl.borrow().clone()
	}

	pub(crate) fn fill(&self, qrl: Value) {
		*self.qrl.borrow_mut() = qrl;
	}
}

/// Scheduled task
#[derive(Default)]
pub struct Task {
	flags: Cell<u32>,
	index: Cell<usize>,
	host: RefCell<Value>,
	qrl: RefCell<Value>,
	state: RefCell<Value>,
}

impl Task {
	/// Task running `qrl` on behalf of `host`
	pub fn new(host: Value, qrl: Value) -> Self {
		Self {
			host: RefCell::new(host),
			qrl: RefCell::new(qrl),
			..Self::default()
		}
	}

	/// Set the flags word
	pub fn with_flags(self, flags: u32) -> Self {
		self.flags.set(flags);
		self
	}

	/// Set the position of the task on its host
	pub fn with_index(self, index: usize) -> Self {
		self.index.set(index);
		self
	}

	/// Set the task's state value
	pub fn with_state(self, state: Value) -> Self {
		*self.state.borrow_mut() = state;
		self
	}

	/// Flags word
	pub fn flags(&self) -> u32 {
		self.flags.get()
	}

	/// Position of the task on its host
	pub fn index(&self) -> usize {
		self.index.get()
	}

	/// Owning host
	pub fn host(&self) -> Value {
		self.host.borrow().clone()
	}

	/// Task body reference
	pub fn qrl(&self) -> Value {
		self.qrl.borrow().clone()
	}

	/// State value
	pub fn state(&self) -> Value {
		self.state.borrow().clone()
	}

	pub(crate) fn fill(&self, flags: u32, index: usize, host: Value, qrl: Value, state: Value) {
		self.flags.set(flags);
		self.index.set(index);
		*self.host.borrow_mut() = host;
		*self.qrl.borrow_mut() = qrl;
		*self.state.borrow_mut() = state;
	}
}

/// Async resource
///
/// Recognised so it can be named in errors; encoding or decoding one fails
/// with `NotImplemented`.
#[derive(Default)]
pub struct Resource {
	state: RefCell<Value>,
}

impl Resource {
	/// New resource
	pub fn new(state: Value) -> Self {
		Self {
			state: RefCell::new(state),
		}
	}

	/// Resource state
	pub fn state(&self) -> Value {
		self.state.borrow().clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::sync_fn;
	use crate::host::SymbolRegistry;
	use rstest::rstest;

	#[rstest]
	#[case("handler_abc", "abc")]
	#[case("a_b_c", "c")]
	#[case("plain", "plain")]
	fn test_symbol_hash(#[case] symbol: &str, #[case] expected: &str) {
		// Act
		let hash = Qrl::new(symbol).symbol_hash();

		// Assert
		assert_eq!(hash, expected);
	}

	#[rstest]
	fn test_resolve_without_container_fails() {
		// Arrange
		let qrl = Qrl::new("s_h").with_chunk("./c.js");

		// Act
		let result = qrl.resolve();

		// Assert
		assert!(matches!(
			result,
			Err(ResumeError::MissingSymbol { chunk, symbol }) if chunk == "./c.js" && symbol == "s_h"
		));
	}

	#[rstest]
	fn test_sync_invoke_appends_args_after_captured() {
		// Arrange
		let qrl = Qrl::sync(
			ClosureDescriptor::expr("p0-p1", 2),
			sync_fn(|args| {
				let a = args[0].as_f64().unwrap_or(0.0);
				let b = args[1].as_f64().unwrap_or(0.0);
				Ok(Value::from(a - b))
			}),
		)
		.with_captured(vec![Value::from(10)]);

		// Act
		let result = qrl.invoke(&[Value::from(3)]).unwrap();

		// Assert
		assert!(qrl.is_sync());
		assert_eq!(result, Value::from(7));
	}

	#[rstest]
	fn test_container_lookup_uses_chunk_and_symbol() {
		// Arrange
		let symbols = SymbolRegistry::new().with("./c.js", "s_h", sync_fn(|_| Ok(Value::from("hit"))));
		let qrl = Qrl::new("s_h")
			.with_chunk("./c.js")
			.with_container(Rc::new(symbols));

		// Act
		let result = qrl.invoke(&[]).unwrap();

		// Assert
		assert_eq!(result, Value::from("hit"));
	}
}
