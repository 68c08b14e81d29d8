//! Raw JSON to values
//!
//! Object literals and arrays are not walked here: they come back as lazy
//! containers that hold their fields as raw JSON until each field is read.

use std::rc::Rc;

use serde_json::Value as JsonValue;

use super::DeserializationContext;
use crate::error::ResumeError;
use crate::value::{ArrayObject, NodeKind, PlainObject, Value};

/// Turn one raw JSON value into a value.
///
/// On failure the raw value is handed back with the error so the caller can
/// restore it.
pub(crate) fn materialize(
	ctx: &Rc<DeserializationContext>,
	raw: JsonValue,
) -> Result<Value, (ResumeError, JsonValue)> {
	match raw {
		JsonValue::Null => Ok(Value::Null),
		JsonValue::Bool(b) => Ok(Value::Bool(b)),
		JsonValue::Number(n) => match n.as_f64() {
			Some(n) => Ok(Value::Number(n)),
			None => Err((
				ResumeError::parse(format!("number out of range: {n}")),
				JsonValue::Number(n),
			)),
		},
		JsonValue::String(text) => ctx
			.decode_string(&text)
			.map_err(|error| (error, JsonValue::String(text))),
		JsonValue::Array(items) => Ok(Value::node(NodeKind::Array(ArrayObject::lazy(
			Rc::clone(ctx),
			items,
		)))),
		JsonValue::Object(fields) => Ok(Value::node(NodeKind::Object(PlainObject::lazy(
			Rc::clone(ctx),
			fields,
		)))),
	}
}

#[cfg(test)]
mod tests {
	use crate::deserialize::Deserializer;
	use crate::error::ResumeError;
	use crate::value::Value;
	use rstest::rstest;

	#[rstest]
	fn test_field_is_materialized_once() {
		// Arrange
		let doc = Deserializer::default()
			.deserialize(r#"[{"inner":{"n":1}}]"#)
			.unwrap();
		let root = doc.root(0).unwrap();
		let object = root.as_node().unwrap().as_object().unwrap();

		// Act
		let first = object.get("inner").unwrap().unwrap();
		let second = object.get("inner").unwrap().unwrap();

		// Assert
		assert!(first.as_node().unwrap().ptr_eq(second.as_node().unwrap()));
	}

	#[rstest]
	fn test_bad_field_stays_raw() {
		// Arrange
		let doc = Deserializer::default()
			.deserialize(r#"[["\u00017"]]"#)
			.unwrap();
		let root = doc.root(0).unwrap();
		let array = root.as_node().unwrap().as_array().unwrap();

		// Act
		let first = array.get(0);
		let second = array.get(0);

		// Assert
		assert!(matches!(first, Err(ResumeError::InvalidRootId { id: 7, len: 1 })));
		assert!(matches!(second, Err(ResumeError::InvalidRootId { id: 7, len: 1 })));
		assert_eq!(array.len(), 1);
	}

	#[rstest]
	fn test_escaped_string_field() {
		// Arrange
		let doc = Deserializer::default()
			.deserialize(r#"[{"s":"\u0005\u0001x"}]"#)
			.unwrap();

		// Act
		let value = doc.root(0).unwrap().as_node().unwrap().get_field("s").unwrap();

		// Assert
		assert_eq!(value, Some(Value::from("\u{01}x")));
	}
}
