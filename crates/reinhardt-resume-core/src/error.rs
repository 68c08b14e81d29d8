//! Error types for the resume engine
//!
//! Every variant here is fatal for the operation that raised it. A corrupt or
//! truncated document fails at the first payload that cannot be parsed, and
//! an unsupported value shape fails the whole serialization; nothing is
//! retried or partially recovered.

use thiserror::Error;

/// Result type for serialization and deserialization operations
pub type Result<T> = std::result::Result<T, ResumeError>;

/// Errors raised while walking, encoding or decoding an object graph
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResumeError {
	/// A value with no serialization rule was reached during the walk or encode
	#[error("Unknown type: {0}")]
	UnknownType(String),

	/// A payload started with a control character that names no decodable kind
	#[error("Unknown tag: {0:#04x}")]
	UnknownTag(u32),

	/// A kind that is recognised but deliberately not supported
	#[error("Not implemented: {0}")]
	NotImplemented(&'static str),

	/// No chunk is known for a lazy code reference
	#[error("Missing chunk for symbol: {symbol}")]
	MissingChunk { symbol: String },

	/// The symbol resolver could not produce a callable
	#[error("Missing symbol {symbol} in chunk {chunk}")]
	MissingSymbol { chunk: String, symbol: String },

	/// A closure index that is not present in the closure table
	#[error("Missing closure at index {0}")]
	MissingClosure(usize),

	/// The element bridge could not map an element to or from an id
	#[error("Unknown element: {0}")]
	UnknownElement(String),

	/// The root id of a value that was never promoted to a root was requested
	#[error("Value is not a root: {0}")]
	NotRooted(String),

	/// A back-reference pointed outside the root table
	#[error("Invalid root id {id} (document has {len} roots)")]
	InvalidRootId { id: usize, len: usize },

	/// A payload did not match the expected grammar
	#[error("Parse error: {0}")]
	Parse(String),

	/// A lazy field was read while it was being materialized
	#[error("Reentrant read of lazy field: {0}")]
	ReentrantRead(String),

	/// A write to a property that was upgraded to a computed accessor
	#[error("Property is read-only: {0}")]
	ReadOnlyProperty(String),

	/// Pending async values kept appearing past the configured pass limit
	#[error("Async drain did not settle after {0} passes")]
	DrainLimitExceeded(usize),

	/// A derived signal or sync code reference failed while computing
	#[error("Closure failed: {0}")]
	Closure(String),

	/// Invalid JSON document
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Invalid base64 byte array payload
	#[error("Base64 error: {0}")]
	Base64(#[from] base64::DecodeError),

	/// The output sink failed
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ResumeError {
	/// Build a parse error from any displayable message
	pub(crate) fn parse(message: impl Into<String>) -> Self {
		Self::Parse(message.into())
	}
}
