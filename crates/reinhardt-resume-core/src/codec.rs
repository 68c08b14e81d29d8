//! Payload codecs shared by the encoder and the decoder
//!
//! - [`closures`]: the document-wide inline closure table
//! - [`subscriptions`]: observer lists of reactive values
//! - [`bytes`]: byte array payloads

pub mod bytes;
pub mod closures;
pub(crate) mod subscriptions;

pub use closures::{
	ClosureDescriptor, ClosureEntry, ClosureTable, FunctionRegistry, SyncFn, sync_fn,
};
