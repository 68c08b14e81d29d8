//! First decoding phase
//!
//! Scalars and single-phase kinds are built outright from their payload. Every
//! kind whose payload refers to other roots is allocated as an empty shell that
//! the caller registers before filling it in.

use std::rc::Rc;

use super::DeserializationContext;
use super::cursor::Cursor;
use crate::codec::bytes;
use crate::error::{ResumeError, Result};
use crate::qrl::{Component, Qrl, Task};
use crate::reactive::{DerivedSignal, SignalCell, SignalField, Store, StoreFlags};
use crate::tag::Tag;
use crate::value::{
	BytesObject, ErrorObject, FormDataObject, MapObject, Node, NodeKind, Promise, RegExpValue,
	SetObject, SplitProps, TreeNode, Value,
};

/// Result of the first phase
pub(crate) enum Allocation {
	/// Complete value
	Ready(Value),
	/// Empty shell awaiting inflation
	Shell(Node),
}

pub(crate) fn allocate(
	ctx: &Rc<DeserializationContext>,
	tag: Tag,
	payload: &str,
) -> Result<Allocation> {
	let value = match tag {
		Tag::Undefined => Value::Undefined,
		Tag::Reference => ctx.resolve(Cursor::new(payload).next_id()?)?,
		Tag::String => Value::from(payload),
		Tag::NaN => Value::Number(match payload {
			"" => f64::NAN,
			"+" => f64::INFINITY,
			"-" => f64::NEG_INFINITY,
			other => return Err(ResumeError::parse(format!("invalid non-finite number `{other}`"))),
		}),
		Tag::BigInt => Value::BigInt(
			payload
				.parse()
				.map_err(|_| ResumeError::parse(format!("invalid big integer `{payload}`")))?,
		),
		Tag::Element => {
			let node = ctx
				.elements
				.as_ref()
				.and_then(|elements| elements.element_by_id(payload))
				.ok_or_else(|| ResumeError::UnknownElement(payload.to_string()))?;
			Value::Node(node)
		}
		Tag::Url => Value::url(payload),
		Tag::Date => Value::date(
			payload
				.parse()
				.map_err(|_| ResumeError::parse(format!("invalid date `{payload}`")))?,
		),
		Tag::RegExp => {
			let regexp = RegExpValue::parse(payload)
				.ok_or_else(|| ResumeError::parse(format!("invalid regular expression `{payload}`")))?;
			Value::node(NodeKind::RegExp(regexp))
		}
		Tag::UrlSearchParams => Value::search_params(payload),
		Tag::Store => {
			let mut cursor = Cursor::new(payload);
			let target = ctx.resolve(cursor.next_id()?)?;
			let flags = StoreFlags::from_bits_truncate(cursor.next_number("store flags")?);
			return Ok(shell(NodeKind::Store(Store::new(target, flags))));
		}
		Tag::Bytes => {
			let capacity = bytes::decoded_len(payload.len());
			return Ok(shell(NodeKind::Bytes(BytesObject::with_capacity(capacity))));
		}
		Tag::Promise => return Ok(shell(NodeKind::Promise(Promise::shell()))),
		Tag::Error => return Ok(shell(NodeKind::Error(ErrorObject::default()))),
		Tag::Qrl => return Ok(shell(NodeKind::Qrl(Qrl::default()))),
		Tag::Component => return Ok(shell(NodeKind::Component(Component::default()))),
		Tag::Task => return Ok(shell(NodeKind::Task(Task::default()))),
		Tag::DerivedSignal => return Ok(shell(NodeKind::Derived(DerivedSignal::default()))),
		Tag::Signal => return Ok(shell(NodeKind::Signal(SignalCell::default()))),
		Tag::SignalField => return Ok(shell(NodeKind::SignalField(SignalField::default()))),
		Tag::FormData => return Ok(shell(NodeKind::FormData(FormDataObject::default()))),
		Tag::TreeNode => return Ok(shell(NodeKind::TreeNode(TreeNode::default()))),
		Tag::Props => return Ok(shell(NodeKind::Props(SplitProps::default()))),
		Tag::Set => return Ok(shell(NodeKind::Set(SetObject::default()))),
		Tag::Map => return Ok(shell(NodeKind::Map(MapObject::default()))),
		Tag::Resource => return Err(ResumeError::NotImplemented("resource")),
		Tag::ReservedTab
		| Tag::ReservedLineFeed
		| Tag::ReservedVerticalTab
		| Tag::ReservedFormFeed
		| Tag::ReservedCarriageReturn => return Err(ResumeError::UnknownTag(tag.code())),
	};
	Ok(Allocation::Ready(value))
}

fn shell(kind: NodeKind) -> Allocation {
	Allocation::Shell(Node::new(kind))
}
