//! # Reinhardt Resume Core
//!
//! Engine that turns a live object graph into a compact JSON document and back,
//! so a page rendered on the server can pick up its state on the client without
//! recomputing it.
//!
//! The document is a single JSON array, the root table. Anything referenced from
//! more than one place (including cycles) is written once as a root and
//! referenced by id. Types JSON cannot express directly are written as strings
//! prefixed with a control character, see [`tag`].
//!
//! ## Modules
//!
//! - [`value`]: the value model (objects, arrays, builtins, promises, tree nodes)
//! - [`reactive`]: signals, derived signals, stores and their subscribers
//! - [`qrl`]: lazy code references, components and tasks
//! - [`serialize`]: graph walk, async drain and encoder
//! - [`deserialize`]: lazy two-phase decoder
//! - [`codec`]: payload helpers and the closure table
//! - [`host`]: traits the host implements to resolve chunks, symbols and elements
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use reinhardt_resume_core::value::Value;
//!
//! let shared = Value::object_from([("id", Value::from(1))]);
//! let page = Value::object_from([("a", shared.clone()), ("b", shared)]);
//!
//! let doc = block_on(reinhardt_resume_core::serialize(&[page])).unwrap();
//! let decoded = reinhardt_resume_core::deserialize(&doc.state, doc.closures).unwrap();
//!
//! let page = decoded.root(0).unwrap();
//! let page = page.as_node().unwrap();
//! let a = page.get_field("a").unwrap().unwrap();
//! let b = page.get_field("b").unwrap().unwrap();
//! assert!(a.same(&b));
//! ```

pub mod codec;
pub mod config;
pub mod deserialize;
pub mod error;
pub mod host;
pub mod qrl;
pub mod reactive;
pub mod serialize;
pub mod tag;
pub mod value;

use std::rc::Rc;

pub use codec::{ClosureDescriptor, ClosureTable, FunctionRegistry, sync_fn};
pub use config::{DeserializerConfig, SerializerConfig};
pub use deserialize::{DeserializationContext, Deserializer};
pub use error::{ResumeError, Result};
pub use serialize::{SerializedDocument, Serializer};
pub use tag::Tag;
pub use value::{Node, NodeKind, Value};

/// Serialize `roots` with the default configuration
pub async fn serialize(roots: &[Value]) -> Result<SerializedDocument> {
	Serializer::default().serialize(roots).await
}

/// Deserialize a document with the default configuration
pub fn deserialize(text: &str, closures: ClosureTable) -> Result<Rc<DeserializationContext>> {
	Deserializer::default()
		.with_closures(closures)
		.deserialize(text)
}
