//! UI tree nodes, split props and element references
//!
//! The engine does not render anything. A tree node is carried as five
//! references (type, variable props, constant props, children, key) and a
//! flags word; an element is carried as whatever id the element bridge gives
//! it.

use std::cell::{Cell, RefCell};

use super::Value;
use crate::error::Result;

/// UI tree node
#[derive(Default)]
pub struct TreeNode {
	node_type: RefCell<Value>,
	var_props: RefCell<Value>,
	const_props: RefCell<Value>,
	children: RefCell<Value>,
	key: RefCell<Value>,
	flags: Cell<u32>,
}

impl TreeNode {
	/// New tree node
	pub fn new(node_type: Value, var_props: Value, const_props: Value, children: Value) -> Self {
		Self {
			node_type: RefCell::new(node_type),
			var_props: RefCell::new(var_props),
			const_props: RefCell::new(const_props),
			children: RefCell::new(children),
			key: RefCell::new(Value::Null),
			flags: Cell::new(0),
		}
	}

	/// Set the reconciliation key
	pub fn with_key(self, key: Value) -> Self {
		*self.key.borrow_mut() = key;
		self
	}

	/// Set the flags word
	pub fn with_flags(self, flags: u32) -> Self {
		self.flags.set(flags);
		self
	}

	/// Element name or component reference
	pub fn node_type(&self) -> Value {
		self.node_type.borrow().clone()
	}

	/// Props that may change between renders
	pub fn var_props(&self) -> Value {
		self.var_props.borrow().clone()
	}

	/// Props fixed at creation
	pub fn const_props(&self) -> Value {
		self.const_props.borrow().clone()
	}

	/// Children
	pub fn children(&self) -> Value {
		self.children.borrow().clone()
	}

	/// Reconciliation key
	pub fn key(&self) -> Value {
		self.key.borrow().clone()
	}

	/// Flags word
	pub fn flags(&self) -> u32 {
		self.flags.get()
	}

	/// References in wire order: type, variable props, constant props,
	/// children, key
	pub(crate) fn references(&self) -> [Value; 5] {
		[
			self.node_type(),
			self.var_props(),
			self.const_props(),
			self.children(),
			self.key(),
		]
	}

	pub(crate) fn fill(&self, references: [Value; 5], flags: u32) {
		let [node_type, var_props, const_props, children, key] = references;
		*self.node_type.borrow_mut() = node_type;
		*self.var_props.borrow_mut() = var_props;
		*self.const_props.borrow_mut() = const_props;
		*self.children.borrow_mut() = children;
		*self.key.borrow_mut() = key;
		self.flags.set(flags);
	}
}

/// Props split into a variable and a constant half
///
/// A read checks the constant props first, then the variable ones.
#[derive(Default)]
pub struct SplitProps {
	var_props: RefCell<Value>,
	const_props: RefCell<Value>,
}

impl SplitProps {
	/// New split props container
	pub fn new(var_props: Value, const_props: Value) -> Self {
		Self {
			var_props: RefCell::new(var_props),
			const_props: RefCell::new(const_props),
		}
	}

	/// Variable half
	pub fn var_props(&self) -> Value {
		self.var_props.borrow().clone()
	}

	/// Constant half
	pub fn const_props(&self) -> Value {
		self.const_props.borrow().clone()
	}

	/// Read a prop
	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		for half in [self.const_props(), self.var_props()] {
			if let Value::Node(node) = half {
				if let Some(value) = node.get_field(key)? {
					return Ok(Some(value));
				}
			}
		}
		Ok(None)
	}

	pub(crate) fn fill(&self, var_props: Value, const_props: Value) {
		*self.var_props.borrow_mut() = var_props;
		*self.const_props.borrow_mut() = const_props;
	}
}

/// Handle to a rendered element owned by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
	name: String,
}

impl ElementRef {
	/// New element handle
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}

	/// Element name, e.g. `div`
	pub fn name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_const_props_shadow_var_props() {
		// Arrange
		let props = SplitProps::new(
			Value::object_from([("id", Value::from("var")), ("class", Value::from("x"))]),
			Value::object_from([("id", Value::from("const"))]),
		);

		// Act
		let id = props.get("id").unwrap();
		let class = props.get("class").unwrap();
		let missing = props.get("style").unwrap();

		// Assert
		assert_eq!(id, Some(Value::from("const")));
		assert_eq!(class, Some(Value::from("x")));
		assert_eq!(missing, None);
	}

	#[rstest]
	fn test_tree_node_references_in_wire_order() {
		// Arrange
		let node = TreeNode::new(
			Value::from("div"),
			Value::Null,
			Value::Null,
			Value::array([]),
		)
		.with_key(Value::from("k"))
		.with_flags(3);

		// Act
		let references = node.references();

		// Assert
		assert_eq!(references[0], Value::from("div"));
		assert_eq!(references[4], Value::from("k"));
		assert_eq!(node.flags(), 3);
	}
}
