//! Host collaborators
//!
//! The engine never loads code or touches rendered elements itself. It asks
//! the host through three narrow traits:
//!
//! - [`ChunkResolver`]: which chunk exports a lazy code reference's symbol
//! - [`SymbolResolver`]: the callable behind a chunk and symbol
//! - [`ElementBridge`]: the id of a rendered element, and back
//!
//! Each trait has a map-backed implementation for hosts (and tests) that know
//! everything up front.

use std::collections::HashMap;

use crate::codec::SyncFn;
use crate::value::{ElementRef, Node, NodeId, NodeKind};

/// Maps a symbol hash to the chunk that exports it
pub trait ChunkResolver {
	/// Chunk locator for `symbol_hash`, if known
	fn resolve_chunk(&self, symbol_hash: &str) -> Option<String>;
}

impl<F> ChunkResolver for F
where
	F: Fn(&str) -> Option<String>,
{
	fn resolve_chunk(&self, symbol_hash: &str) -> Option<String> {
		self(symbol_hash)
	}
}

/// Static symbol hash to chunk table
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::host::{ChunkMap, ChunkResolver};
///
/// let chunks = ChunkMap::new().with("abc123", "./chunk-a.js");
/// assert_eq!(chunks.resolve_chunk("abc123").as_deref(), Some("./chunk-a.js"));
/// assert_eq!(chunks.resolve_chunk("zzz"), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ChunkMap {
	chunks: HashMap<String, String>,
}

impl ChunkMap {
	/// Empty table
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the chunk for a symbol hash
	pub fn insert(&mut self, symbol_hash: impl Into<String>, chunk: impl Into<String>) {
		self.chunks.insert(symbol_hash.into(), chunk.into());
	}

	/// Builder form of [`ChunkMap::insert`]
	pub fn with(mut self, symbol_hash: impl Into<String>, chunk: impl Into<String>) -> Self {
		self.insert(symbol_hash, chunk);
		self
	}
}

impl ChunkResolver for ChunkMap {
	fn resolve_chunk(&self, symbol_hash: &str) -> Option<String> {
		self.chunks.get(symbol_hash).cloned()
	}
}

/// Produces the callable exported by a chunk
pub trait SymbolResolver {
	/// Callable for `symbol` in `chunk`, if it can be loaded
	fn resolve_symbol(&self, chunk: &str, symbol: &str) -> Option<SyncFn>;
}

/// Symbols registered ahead of time
#[derive(Default, Clone)]
pub struct SymbolRegistry {
	symbols: HashMap<(String, String), SyncFn>,
}

impl SymbolRegistry {
	/// Empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the callable for `symbol` in `chunk`
	pub fn register(&mut self, chunk: impl Into<String>, symbol: impl Into<String>, func: SyncFn) {
		self.symbols.insert((chunk.into(), symbol.into()), func);
	}

	/// Builder form of [`SymbolRegistry::register`]
	pub fn with(mut self, chunk: impl Into<String>, symbol: impl Into<String>, func: SyncFn) -> Self {
		self.register(chunk, symbol, func);
		self
	}
}

impl SymbolResolver for SymbolRegistry {
	fn resolve_symbol(&self, chunk: &str, symbol: &str) -> Option<SyncFn> {
		self.symbols
			.get(&(chunk.to_string(), symbol.to_string()))
			.cloned()
	}
}

/// Bridges rendered element identity to serializable ids
pub trait ElementBridge {
	/// Id of an element node
	fn element_id(&self, element: &Node) -> Option<String>;

	/// Element node for an id
	fn element_by_id(&self, id: &str) -> Option<Node>;
}

/// Elements registered ahead of time
#[derive(Default, Clone)]
pub struct ElementRegistry {
	by_id: HashMap<String, Node>,
	ids: HashMap<NodeId, String>,
}

impl ElementRegistry {
	/// Empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an element node and register it under `id`
	pub fn register(&mut self, id: impl Into<String>, element: ElementRef) -> Node {
		let node = Node::new(NodeKind::Element(element));
		self.insert(id, node.clone());
		node
	}

	/// Register an existing element node under `id`
	pub fn insert(&mut self, id: impl Into<String>, node: Node) {
		let id = id.into();
		self.ids.insert(node.id(), id.clone());
		self.by_id.insert(id, node);
	}
}

impl ElementBridge for ElementRegistry {
	fn element_id(&self, element: &Node) -> Option<String> {
		self.ids.get(&element.id()).cloned()
	}

	fn element_by_id(&self, id: &str) -> Option<Node> {
		self.by_id.get(id).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::sync_fn;
	use crate::value::Value;
	use rstest::rstest;

	#[rstest]
	fn test_closure_is_a_chunk_resolver() {
		// Arrange
		let resolver = |hash: &str| Some(format!("./{hash}.js"));

		// Act
		let chunk = resolver.resolve_chunk("h1");

		// Assert
		assert_eq!(chunk.as_deref(), Some("./h1.js"));
	}

	#[rstest]
	fn test_symbol_registry_lookup() {
		// Arrange
		let registry = SymbolRegistry::new().with("./a.js", "s_h1", sync_fn(|_| Ok(Value::from(1))));

		// Act
		let found = registry.resolve_symbol("./a.js", "s_h1");
		let missing = registry.resolve_symbol("./b.js", "s_h1");

		// Assert
		assert_eq!(found.unwrap()(&[]).unwrap(), Value::from(1));
		assert!(missing.is_none());
	}

	#[rstest]
	fn test_element_registry_maps_both_ways() {
		// Arrange
		let mut registry = ElementRegistry::new();
		let node = registry.register("e1", ElementRef::new("button"));

		// Act
		let id = registry.element_id(&node);
		let back = registry.element_by_id("e1").unwrap();

		// Assert
		assert_eq!(id.as_deref(), Some("e1"));
		assert!(back.ptr_eq(&node));
		assert_eq!(back.as_element().unwrap().name(), "button");
	}
}
