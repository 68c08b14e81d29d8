//! String escaping properties
//!
//! Any string must come back unchanged, whatever its first character and
//! wherever it sits in the graph.
//!
//! # Properties Tested
//!
//! - Every leading control character survives as a root, a field and an item
//! - Arbitrary strings survive a round trip
//! - No document contains a raw `</` when markup escaping is on

use futures::executor::block_on;
use proptest::prelude::*;
use reinhardt_resume_core::{Deserializer, Value, serialize};
use rstest::rstest;

fn round_trip_string(text: &str) -> (Value, Value, Value) {
	let root = Value::from(text);
	let holder = Value::object_from([("s", Value::from(text))]);
	let list = Value::array([Value::from(text)]);
	let doc = block_on(serialize(&[root, holder, list])).unwrap();
	let decoded = Deserializer::default().deserialize(&doc.state).unwrap();
	let root = decoded.root(0).unwrap();
	let field = decoded
		.root(1)
		.unwrap()
		.as_node()
		.unwrap()
		.get_field("s")
		.unwrap()
		.unwrap();
	let item = decoded
		.root(2)
		.unwrap()
		.as_node()
		.unwrap()
		.get_field("0")
		.unwrap()
		.unwrap();
	(root, field, item)
}

#[rstest]
fn test_every_control_prefix_survives() {
	for code in 0u32..0x20 {
		// Arrange
		let c = char::from_u32(code).unwrap();
		let text = format!("{c}payload {code}");

		// Act
		let (root, field, item) = round_trip_string(&text);

		// Assert
		let expected = Value::from(text.as_str());
		assert_eq!(root, expected, "root with prefix {code:#04x}");
		assert_eq!(field, expected, "field with prefix {code:#04x}");
		assert_eq!(item, expected, "item with prefix {code:#04x}");
	}
}

#[rstest]
#[case("\u{1}")]
#[case("\u{5}")]
#[case("\u{5}\u{5}")]
fn test_bare_control_strings(#[case] text: &str) {
	// Act
	let (root, field, item) = round_trip_string(text);

	// Assert
	assert_eq!(root, Value::from(text));
	assert_eq!(field, Value::from(text));
	assert_eq!(item, Value::from(text));
}

proptest! {
	/// Property: any string decodes to itself in every position
	#[rstest]
	fn test_any_string_round_trips(text in any::<String>()) {
		let (root, field, item) = round_trip_string(&text);

		prop_assert_eq!(root, Value::from(text.as_str()));
		prop_assert_eq!(field, Value::from(text.as_str()));
		prop_assert_eq!(item, Value::from(text.as_str()));
	}

	/// Property: markup never appears unescaped in a document
	#[rstest]
	fn test_markup_is_never_raw(text in "[<>/a-z ]{0,40}") {
		let doc = block_on(serialize(&[Value::object_from([(text.clone(), Value::from(text.as_str()))])]))
			.unwrap();

		prop_assert!(!doc.state.contains("</"));
	}
}
