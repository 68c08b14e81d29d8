//! Serialization
//!
//! Serializing a set of roots takes two steps on one
//! [`SerializationContext`]:
//!
//! 1. [`SerializationContext::break_cycles_and_resolve`] walks the graph,
//!    promotes shared and cyclic values to roots and awaits every reachable
//!    promise;
//! 2. [`SerializationContext::encode`] writes the root table.
//!
//! [`Serializer`] runs both and returns the document together with the
//! closure table its derived signals refer to.
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use reinhardt_resume_core::serialize::Serializer;
//! use reinhardt_resume_core::value::Value;
//!
//! let shared = Value::object_from([("n", Value::from(1))]);
//! let doc = block_on(Serializer::default().serialize(&[Value::array([shared.clone(), shared])]))
//!     .unwrap();
//! assert_eq!(doc.state, r#"[["\u00011","\u00011"],{"n":1}]"#);
//! ```

mod context;
mod encoder;
mod sink;
mod walker;

pub use context::SerializationContext;
pub use encoder::format_number;
pub use sink::{IoSink, OutputSink};

use std::rc::Rc;

use tracing::debug;

use crate::codec::ClosureTable;
use crate::config::SerializerConfig;
use crate::error::Result;
use crate::host::{ChunkResolver, ElementBridge};
use crate::value::Value;

/// A serialized document
#[derive(Debug)]
pub struct SerializedDocument {
	/// The root table as JSON text
	pub state: String,
	/// Closures referenced by the document
	pub closures: ClosureTable,
}

/// Serializer
#[derive(Default, Clone)]
pub struct Serializer {
	config: SerializerConfig,
	chunks: Option<Rc<dyn ChunkResolver>>,
	elements: Option<Rc<dyn ElementBridge>>,
}

impl Serializer {
	/// New serializer
	pub fn new(config: SerializerConfig) -> Self {
		Self {
			config,
			chunks: None,
			elements: None,
		}
	}

	/// Use `chunks` to locate code references that carry no chunk
	pub fn with_chunks(mut self, chunks: Rc<dyn ChunkResolver>) -> Self {
		self.chunks = Some(chunks);
		self
	}

	/// Use `elements` to give rendered elements their ids
	pub fn with_elements(mut self, elements: Rc<dyn ElementBridge>) -> Self {
		self.elements = Some(elements);
		self
	}

	/// Serialize `roots` into a string
	pub async fn serialize(&self, roots: &[Value]) -> Result<SerializedDocument> {
		let mut state = String::new();
		let closures = self.serialize_into(roots, &mut state).await?;
		Ok(SerializedDocument { state, closures })
	}

	/// Serialize `roots` into `sink`, returning the closure table
	///
	/// Nothing is written until every promise has settled, so a failed drain
	/// leaves the sink untouched.
	pub async fn serialize_into<S: OutputSink + ?Sized>(
		&self,
		roots: &[Value],
		sink: &mut S,
	) -> Result<ClosureTable> {
		let mut ctx = self.context();
		ctx.declare_roots(roots);
		debug!(declared = roots.len(), "serializing");
		ctx.break_cycles_and_resolve().await?;
		ctx.encode(sink)?;
		Ok(ctx.into_closures())
	}

	/// A fresh context carrying this serializer's configuration
	pub fn context(&self) -> SerializationContext {
		let mut ctx = SerializationContext::new(self.config.clone());
		if let Some(chunks) = &self.chunks {
			ctx = ctx.with_chunks(Rc::clone(chunks));
		}
		if let Some(elements) = &self.elements {
			ctx = ctx.with_elements(Rc::clone(elements));
		}
		ctx
	}
}
