//! Second decoding phase
//!
//! Fills a registered shell from its payload. Ids in the payload are resolved
//! through the context, so a payload that refers back to the shell's own root
//! receives the shell itself.

use std::rc::Rc;

use super::DeserializationContext;
use super::cursor::{Cursor, parse_id_list, split_trailing_list};
use crate::codec::{bytes, subscriptions};
use crate::error::{ResumeError, Result};
use crate::reactive::SubscriptionManager;
use crate::value::{Node, NodeKind, Value};

pub(crate) fn inflate(ctx: &Rc<DeserializationContext>, node: &Node, payload: &str) -> Result<()> {
	let mut cursor = Cursor::new(payload);
	match node.kind() {
		NodeKind::Error(error) => {
			let props = cursor
				.next_optional_id()?
				.map(|id| ctx.resolve(id))
				.transpose()?;
			error.set_props(props);
			error.set_message(cursor.take_rest());
		}
		NodeKind::Qrl(qrl) => {
			let (head, list) = split_trailing_list(payload)?;
			let captured = match list {
				Some(list) => resolve_all(ctx, &parse_id_list(list)?)?,
				None => Vec::new(),
			};
			let hash = head
				.rfind('#')
				.ok_or_else(|| ResumeError::parse(format!("code reference without `#`: `{head}`")))?;
			let (chunk, symbol) = (&head[..hash], &head[hash + 1..]);
			if chunk.is_empty() {
				let index = Cursor::new(symbol).next_number("closure index")?;
				qrl.fill_sync(ctx.closures.entry(index)?, captured);
			} else {
				qrl.fill_lazy(chunk.to_string(), symbol.to_string(), captured);
			}
			if let Some(symbols) = &ctx.symbols {
				qrl.set_container(Rc::clone(symbols));
			}
		}
		NodeKind::Component(component) => component.fill(ctx.resolve(cursor.next_id()?)?),
		NodeKind::Task(task) => {
			let flags = cursor.next_number("task flags")?;
			let index = cursor.next_number("task index")?;
			let host = ctx.resolve(cursor.next_id()?)?;
			let qrl = ctx.resolve(cursor.next_id()?)?;
			let state = ctx.resolve(cursor.next_id()?)?;
			task.fill(flags, index, host, qrl, state);
		}
		NodeKind::Resource(_) => return Err(ResumeError::NotImplemented("resource")),
		NodeKind::Signal(signal) => {
			signal.set(ctx.resolve(cursor.next_id()?)?);
			replay_subscribers(ctx, signal.subscriptions(), cursor.rest())?;
		}
		NodeKind::Derived(derived) => {
			let index = cursor.next_number("closure index")?;
			let captured = resolve_all(ctx, &parse_id_list(cursor.expect_token("captured ids")?)?)?;
			derived.fill(ctx.closures.entry(index)?, captured);
			replay_subscribers(ctx, derived.subscriptions(), cursor.rest())?;
		}
		NodeKind::SignalField(field) => {
			let host = ctx.resolve(cursor.next_id()?)?;
			// The name is the last field, so an empty one leaves no token
			let prop = cursor.next_token().unwrap_or_default();
			let prop = urlencoding::decode(prop)
				.map_err(|error| ResumeError::parse(format!("invalid property name: {error}")))?;
			field.fill(host, prop.into_owned());
			replay_subscribers(ctx, field.subscriptions(), cursor.rest())?;
		}
		NodeKind::Store(store) => {
			// Target and flags were consumed when the store was allocated
			cursor.expect_token("store target")?;
			cursor.expect_token("store flags")?;
			replay_subscribers(ctx, store.subscriptions(), cursor.rest())?;
		}
		NodeKind::FormData(form) => {
			for pair in resolve_rest(ctx, &mut cursor)?.chunks(2) {
				let [key, value] = pair else {
					return Err(ResumeError::parse("form data payload has an odd number of ids"));
				};
				form.append(expect_text(key)?, expect_text(value)?);
			}
		}
		NodeKind::Map(map) => {
			for pair in resolve_rest(ctx, &mut cursor)?.chunks(2) {
				let [key, value] = pair else {
					return Err(ResumeError::parse("map payload has an odd number of ids"));
				};
				map.insert(key.clone(), value.clone());
			}
		}
		NodeKind::Set(set) => {
			for item in resolve_rest(ctx, &mut cursor)? {
				set.add(item);
			}
		}
		NodeKind::TreeNode(tree) => {
			let mut references: [Value; 5] = Default::default();
			for reference in &mut references {
				*reference = ctx.resolve(cursor.next_id()?)?;
			}
			tree.fill(references, cursor.next_number("tree node flags")?);
		}
		NodeKind::Props(props) => {
			let var_props = ctx.resolve(cursor.next_id()?)?;
			let const_props = ctx.resolve(cursor.next_id()?)?;
			props.fill(var_props, const_props);
		}
		NodeKind::Promise(promise) => {
			let outcome: i64 = cursor.next_number("promise outcome")?;
			if outcome < 0 {
				promise.settle(Err(ctx.resolve(to_id(!outcome)?)?));
			} else {
				promise.settle(Ok(ctx.resolve(to_id(outcome)?)?));
			}
		}
		NodeKind::Bytes(buffer) => buffer.fill(&bytes::decode(payload)?),
		kind => {
			return Err(ResumeError::parse(format!(
				"{} is not decoded in two phases",
				kind.type_name()
			)));
		}
	}
	Ok(())
}

fn resolve_all(ctx: &Rc<DeserializationContext>, ids: &[usize]) -> Result<Vec<Value>> {
	ids.iter().map(|&id| ctx.resolve(id)).collect()
}

/// Resolve every remaining id token
fn resolve_rest(ctx: &Rc<DeserializationContext>, cursor: &mut Cursor<'_>) -> Result<Vec<Value>> {
	let mut values = Vec::new();
	while !cursor.is_eof() {
		values.push(ctx.resolve(cursor.next_id()?)?);
	}
	Ok(values)
}

fn replay_subscribers(
	ctx: &Rc<DeserializationContext>,
	manager: &SubscriptionManager,
	segments: &str,
) -> Result<()> {
	for subscriber in subscriptions::read_subscribers(segments, |id| ctx.resolve(id))? {
		manager.add(subscriber);
	}
	Ok(())
}

fn expect_text(value: &Value) -> Result<String> {
	value
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| ResumeError::parse(format!("expected a string, found {}", value.type_name())))
}

fn to_id(n: i64) -> Result<usize> {
	usize::try_from(n).map_err(|_| ResumeError::parse(format!("invalid root id `{n}`")))
}
