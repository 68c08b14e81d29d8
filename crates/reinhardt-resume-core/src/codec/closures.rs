//! Inline closure table
//!
//! Derived signals and synchronous code references point into one table of
//! closures shared by the whole document. Entries are deduplicated by their
//! rendered source text, so two derived signals built from the same
//! expression share an index and differ only in their captured values.
//!
//! The table travels next to the state document as a JSON array of source
//! strings. Source text cannot be executed here, so the receiving side maps
//! each string back to a callable through a [`FunctionRegistry`].

use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::error::{ResumeError, Result};
use crate::value::Value;

/// Callable behind a closure: receives the captured values, then any call
/// arguments
pub type SyncFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// Box a closure as a [`SyncFn`]
pub fn sync_fn<F>(func: F) -> SyncFn
where
	F: Fn(&[Value]) -> Result<Value> + 'static,
{
	Rc::new(func)
}

/// Source form of a closure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClosureDescriptor {
	/// Complete source text
	Source(String),
	/// Single expression over positional parameters `p0`, `p1`, ...
	Expr { body: String, arg_count: usize },
}

impl ClosureDescriptor {
	/// Descriptor from complete source text
	pub fn source(text: impl Into<String>) -> Self {
		Self::Source(text.into())
	}

	/// Descriptor from an expression body and its parameter count
	pub fn expr(body: impl Into<String>, arg_count: usize) -> Self {
		Self::Expr {
			body: body.into(),
			arg_count,
		}
	}

	/// Source text as written into the table
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_resume_core::codec::ClosureDescriptor;
	///
	/// assert_eq!(ClosureDescriptor::expr("p0+p1", 2).render(), "(p0,p1)=>p0+p1");
	/// assert_eq!(ClosureDescriptor::expr("1", 0).render(), "()=>1");
	/// assert_eq!(ClosureDescriptor::source("x=>x").render(), "x=>x");
	/// ```
	pub fn render(&self) -> String {
		match self {
			Self::Source(text) => text.clone(),
			Self::Expr { body, arg_count } => {
				let params: Vec<String> = (0..*arg_count).map(|i| format!("p{i}")).collect();
				format!("({})=>{}", params.join(","), body)
			}
		}
	}
}

impl fmt::Display for ClosureDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

/// One closure: its source form and the callable
#[derive(Clone)]
pub struct ClosureEntry {
	descriptor: ClosureDescriptor,
	func: SyncFn,
}

impl ClosureEntry {
	/// New entry
	pub fn new(descriptor: ClosureDescriptor, func: SyncFn) -> Self {
		Self { descriptor, func }
	}

	/// Source form
	pub fn descriptor(&self) -> &ClosureDescriptor {
		&self.descriptor
	}

	/// Callable
	pub fn func(&self) -> &SyncFn {
		&self.func
	}
}

impl fmt::Debug for ClosureEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClosureEntry")
			.field("source", &self.descriptor.render())
			.finish_non_exhaustive()
	}
}

/// Append-or-dedupe table of closures
#[derive(Debug, Default, Clone)]
pub struct ClosureTable {
	entries: Vec<ClosureEntry>,
	by_source: HashMap<String, usize>,
}

impl ClosureTable {
	/// Empty table
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a closure, returning the index of the existing entry when the same
	/// source text was added before
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_resume_core::codec::{ClosureDescriptor, ClosureTable, sync_fn};
	/// use reinhardt_resume_core::value::Value;
	///
	/// let mut table = ClosureTable::new();
	/// let a = table.add(ClosureDescriptor::expr("p0", 1), sync_fn(|args| Ok(args[0].clone())));
	/// let b = table.add(ClosureDescriptor::expr("p0", 1), sync_fn(|_| Ok(Value::Null)));
	/// assert_eq!(a, b);
	/// assert_eq!(table.len(), 1);
	/// ```
	pub fn add(&mut self, descriptor: ClosureDescriptor, func: SyncFn) -> usize {
		self.add_entry(ClosureEntry::new(descriptor, func))
	}

	/// Add an existing entry, deduplicating by source text
	pub fn add_entry(&mut self, entry: ClosureEntry) -> usize {
		let source = entry.descriptor.render();
		if let Some(&index) = self.by_source.get(&source) {
			return index;
		}
		let index = self.entries.len();
		self.entries.push(entry);
		self.by_source.insert(source, index);
		index
	}

	/// Entry at `index`
	pub fn get(&self, index: usize) -> Option<&ClosureEntry> {
		self.entries.get(index)
	}

	/// Entry at `index`, or `MissingClosure`
	pub(crate) fn entry(&self, index: usize) -> Result<ClosureEntry> {
		self.get(index)
			.cloned()
			.ok_or(ResumeError::MissingClosure(index))
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the table is empty
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Source texts in index order
	pub fn sources(&self) -> Vec<String> {
		self.entries
			.iter()
			.map(|entry| entry.descriptor.render())
			.collect()
	}

	/// Table as a JSON array of source strings
	pub fn to_json(&self) -> JsonValue {
		JsonValue::from(self.sources())
	}

	/// Rebuild a table from its JSON form, looking every source up in
	/// `registry`
	pub fn from_json(json: &JsonValue, registry: &FunctionRegistry) -> Result<Self> {
		let sources = json
			.as_array()
			.ok_or_else(|| ResumeError::parse("closure table must be an array"))?;
		let mut table = Self::new();
		for (index, source) in sources.iter().enumerate() {
			let source = source.as_str().ok_or_else(|| {
				ResumeError::parse(format!("closure {index} must be a source string"))
			})?;
			let func = registry.get(source).ok_or_else(|| {
				ResumeError::Closure(format!("no function registered for `{source}`"))
			})?;
			table.add(ClosureDescriptor::source(source), func);
		}
		Ok(table)
	}
}

/// Maps closure source text to the callable that implements it
#[derive(Default, Clone)]
pub struct FunctionRegistry {
	functions: HashMap<String, SyncFn>,
}

impl FunctionRegistry {
	/// Empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the callable for a descriptor's source text
	pub fn register(&mut self, descriptor: &ClosureDescriptor, func: SyncFn) {
		self.functions.insert(descriptor.render(), func);
	}

	/// Builder form of [`FunctionRegistry::register`]
	pub fn with(mut self, descriptor: &ClosureDescriptor, func: SyncFn) -> Self {
		self.register(descriptor, func);
		self
	}

	/// Callable for a source text
	pub fn get(&self, source: &str) -> Option<SyncFn> {
		self.functions.get(source).cloned()
	}
}

impl fmt::Debug for FunctionRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FunctionRegistry")
			.field("sources", &self.functions.keys().collect::<Vec<_>>())
			.finish()
	}
}
