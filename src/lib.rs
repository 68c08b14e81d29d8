//! # Reinhardt Resume
//!
//! Resumable state for Reinhardt pages. A page rendered on the server
//! serializes the object graph behind it (plain data, reactive signals and
//! stores, lazy code references, settled async values) into one JSON document;
//! the client decodes that document lazily and resumes where the server
//! stopped.
//!
//! This crate re-exports the engine from `reinhardt-resume-core`.
//!
//! ## Quick Example
//!
//! ```rust
//! use futures::executor::block_on;
//! use reinhardt_resume::prelude::*;
//!
//! let counter = SignalCell::new_value(Value::from(0));
//! let state = Value::object_from([("count", counter.clone()), ("again", counter)]);
//!
//! let doc = block_on(Serializer::default().serialize(&[state])).unwrap();
//! let resumed = Deserializer::default()
//!     .with_closures(doc.closures)
//!     .deserialize(&doc.state)
//!     .unwrap();
//!
//! let state = resumed.root(0).unwrap();
//! let count = state.as_node().unwrap().get_field("count").unwrap().unwrap();
//! let again = state.as_node().unwrap().get_field("again").unwrap().unwrap();
//! assert!(count.same(&again));
//! ```

pub use reinhardt_resume_core::{
	ClosureDescriptor, ClosureTable, DeserializationContext, Deserializer, DeserializerConfig,
	FunctionRegistry, Node, NodeKind, Result, ResumeError, SerializedDocument, Serializer,
	SerializerConfig, Tag, Value, deserialize, serialize, sync_fn,
};
pub use reinhardt_resume_core::{codec, config, error, host, qrl, reactive, tag, value};

/// Engine modules under their full names
pub mod engine {
	pub use reinhardt_resume_core::deserialize;
	pub use reinhardt_resume_core::serialize;
}

/// Prelude for common imports
///
/// ```rust
/// use reinhardt_resume::prelude::*;
/// ```
pub mod prelude {
	pub use crate::{
		ClosureDescriptor, ClosureTable, DeserializationContext, Deserializer, DeserializerConfig,
		FunctionRegistry, Node, NodeKind, ResumeError, SerializedDocument, Serializer,
		SerializerConfig, Value, sync_fn,
	};

	// Host collaborators
	pub use reinhardt_resume_core::host::{
		ChunkMap, ChunkResolver, ElementBridge, ElementRegistry, SymbolRegistry, SymbolResolver,
	};

	// Reactive state and code references
	pub use reinhardt_resume_core::qrl::{Component, Qrl, Task};
	pub use reinhardt_resume_core::reactive::{
		DerivedSignal, SignalCell, SignalField, Store, StoreFlags, Subscriber, SubscriberKind,
	};
	pub use reinhardt_resume_core::value::{Deferred, Promise, PromiseState};
}
