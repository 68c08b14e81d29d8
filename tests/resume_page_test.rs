//! Page resume scenario through the facade
//!
//! A server-side page with a counter signal, a click handler in a lazily
//! loaded chunk and data fetched asynchronously is serialized, then resumed
//! and driven on the "client".

use std::rc::Rc;

use reinhardt_resume::prelude::*;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn test_page_state_resumes() {
	// Arrange
	let counter = SignalCell::new_value(Value::from(1));
	let handler = Qrl::new("s_increment_k9").with_captured(vec![counter.clone()]);
	let button = Value::object_from([("onClick", handler.into_value())]);
	counter
		.as_node()
		.unwrap()
		.as_signal()
		.unwrap()
		.subscriptions()
		.add(Subscriber::text(button.clone()));
	let (user, deferred) = Promise::deferred();
	let page = Value::object_from([
		("counter", counter),
		("button", button),
		("user", user),
	]);
	let serializer = Serializer::default().with_chunks(Rc::new(ChunkMap::new().with("k9", "./counter.js")));

	// Act
	let roots = [page];
	let (doc, ()) = tokio::join!(serializer.serialize(&roots), async move {
		tokio::task::yield_now().await;
		deferred.resolve(Value::object_from([("name", Value::from("Ada"))]));
	});
	let doc = doc.unwrap();
	let increment = sync_fn(|args| {
		let signal = args[0].as_node().and_then(Node::as_signal);
		if let Some(signal) = signal {
			let next = signal.value().as_f64().unwrap_or(0.0) + 1.0;
			signal.set(Value::from(next));
		}
		Ok(Value::Undefined)
	});
	let resumed = Deserializer::default()
		.with_closures(doc.closures)
		.with_symbols(Rc::new(
			SymbolRegistry::new().with("./counter.js", "s_increment_k9", increment),
		))
		.deserialize(&doc.state)
		.unwrap();

	// Assert
	let page = resumed.root(0).unwrap();
	let page = page.as_node().unwrap();
	let button = page.get_field("button").unwrap().unwrap();
	let on_click = button.as_node().unwrap().get_field("onClick").unwrap().unwrap();
	on_click.as_node().unwrap().as_qrl().unwrap().invoke(&[]).unwrap();
	let counter = page.get_field("counter").unwrap().unwrap();
	let cell = counter.as_node().unwrap().as_signal().unwrap();
	assert_eq!(cell.value(), Value::from(2));
	assert!(cell.subscriptions().subscribers()[0].host.same(&button));
	let user = page.get_field("user").unwrap().unwrap();
	let PromiseState::Resolved(user) = user.as_node().unwrap().as_promise().unwrap().state() else {
		panic!("expected a resolved promise");
	};
	assert_eq!(user.as_node().unwrap().get_field("name").unwrap(), Some(Value::from("Ada")));
}
