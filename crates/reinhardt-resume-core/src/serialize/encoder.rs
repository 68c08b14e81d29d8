//! Root table encoder
//!
//! Writes the root table as one JSON array. Each root is written in full;
//! anywhere else a value that has a root id is written as a back-reference.
//! Payload fields of tagged kinds are always root ids, so writing a payload
//! may promote further values to roots. Those are appended to the table and
//! written by the same loop.

use std::fmt::Write as _;

use tracing::debug;

use super::OutputSink;
use super::context::SerializationContext;
use crate::codec::{bytes, subscriptions};
use crate::error::{ResumeError, Result};
use crate::reactive::Subscriber;
use crate::tag::{Tag, needs_escape};
use crate::value::{Node, NodeKind, PromiseState, Value};

/// Largest magnitude below which integral numbers are written without a
/// fraction or exponent (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Write a finite number the way a JavaScript runtime displays it; `NaN` and
/// the infinities get their names.
///
/// # Examples
///
/// ```
/// use reinhardt_resume_core::serialize::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(0.25), "0.25");
/// assert_eq!(format_number(1e21), "1e21");
/// assert_eq!(format_number(1.5e-7), "1.5e-7");
/// ```
pub fn format_number(n: f64) -> String {
	if n.is_nan() {
		return "NaN".to_string();
	}
	if n.is_infinite() {
		return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
	}
	if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
		return (n as i64).to_string();
	}
	if (1e-6..1e21).contains(&n.abs()) {
		n.to_string()
	} else {
		format!("{n:e}")
	}
}

pub(crate) fn encode_roots<S: OutputSink + ?Sized>(
	ctx: &mut SerializationContext,
	sink: &mut S,
) -> Result<()> {
	sink.write("[")?;
	let mut index = 0;
	while index < ctx.roots.len() {
		let value = ctx.roots[index].clone();
		let mut out = String::new();
		if index > 0 {
			out.push(',');
		}
		let mut encoder = Encoder {
			ctx: &mut *ctx,
			out: &mut out,
		};
		match encoder.ctx.root_id_of(&value) {
			Some(id) if id != index => encoder.write_reference(id)?,
			_ => encoder.write_value(&value, true)?,
		}
		sink.write(&out)?;
		index += 1;
	}
	sink.write("]")?;
	debug!(roots = ctx.roots.len(), closures = ctx.closures.len(), "encoded document");
	Ok(())
}

struct Encoder<'a> {
	ctx: &'a mut SerializationContext,
	out: &'a mut String,
}

impl Encoder<'_> {
	fn write_value(&mut self, value: &Value, top_level: bool) -> Result<()> {
		if !top_level {
			if let Some(id) = self.ctx.root_id_of(value) {
				return self.write_reference(id);
			}
		}
		match value {
			Value::Undefined => self.write_tagged(Tag::Undefined, ""),
			Value::Null => {
				self.out.push_str("null");
				Ok(())
			}
			Value::Bool(b) => {
				self.out.push_str(if *b { "true" } else { "false" });
				Ok(())
			}
			Value::Number(n) if n.is_finite() => {
				self.out.push_str(&format_number(*n));
				Ok(())
			}
			Value::Number(n) => {
				let sign = if n.is_nan() {
					""
				} else if *n > 0.0 {
					"+"
				} else {
					"-"
				};
				self.write_tagged(Tag::NaN, sign)
			}
			Value::BigInt(n) => self.write_tagged(Tag::BigInt, &n.to_string()),
			Value::String(text) if needs_escape(text) => self.write_tagged(Tag::String, text),
			Value::String(text) => self.write_string(text),
			Value::Node(node) => self.write_node(node),
		}
	}

	fn write_node(&mut self, node: &Node) -> Result<()> {
		match node.kind() {
			NodeKind::Object(object) => {
				self.out.push('{');
				for (position, (key, value)) in object.entries()?.iter().enumerate() {
					if position > 0 {
						self.out.push(',');
					}
					self.write_string(key)?;
					self.out.push(':');
					self.write_value(value, false)?;
				}
				self.out.push('}');
				Ok(())
			}
			NodeKind::Array(array) => {
				self.out.push('[');
				for (position, item) in array.items()?.iter().enumerate() {
					if position > 0 {
						self.out.push(',');
					}
					self.write_value(item, false)?;
				}
				self.out.push(']');
				Ok(())
			}
			NodeKind::Url(href) => self.write_tagged(Tag::Url, href),
			NodeKind::Date(epoch_ms) => self.write_tagged(Tag::Date, &format_number(*epoch_ms)),
			NodeKind::RegExp(regexp) => self.write_tagged(Tag::RegExp, &regexp.to_string()),
			NodeKind::UrlSearchParams(query) => self.write_tagged(Tag::UrlSearchParams, query),
			NodeKind::Error(error) => {
				let props = match error.props() {
					Some(props) => self.ctx.add_root(&props).to_string(),
					None => "_".to_string(),
				};
				self.write_tagged(Tag::Error, &format!("{props} {}", error.message()))
			}
			NodeKind::Set(set) => {
				let payload = self.id_list(&set.items());
				self.write_tagged(Tag::Set, &payload)
			}
			NodeKind::Map(map) => {
				let flat: Vec<Value> = map
					.entries()
					.into_iter()
					.flat_map(|(key, value)| [key, value])
					.collect();
				let payload = self.id_list(&flat);
				self.write_tagged(Tag::Map, &payload)
			}
			NodeKind::FormData(form) => {
				let flat: Vec<Value> = form
					.entries()
					.into_iter()
					.flat_map(|(key, value)| [Value::from(key), Value::from(value)])
					.collect();
				let payload = self.id_list(&flat);
				self.write_tagged(Tag::FormData, &payload)
			}
			NodeKind::Bytes(buffer) => self.write_tagged(Tag::Bytes, &bytes::encode(&buffer.to_vec())),
			NodeKind::Promise(promise) => {
				let payload = match promise.state() {
					PromiseState::Resolved(value) => self.ctx.add_root(&value).to_string(),
					PromiseState::Rejected(reason) => (!(self.ctx.add_root(&reason) as i64)).to_string(),
					PromiseState::Pending => {
						return Err(ResumeError::UnknownType("unsettled Promise".to_string()));
					}
				};
				self.write_tagged(Tag::Promise, &payload)
			}
			NodeKind::Qrl(qrl) => {
				let mut payload = match qrl.sync_closure() {
					Some(closure) => format!("#{}", self.ctx.closures.add_entry(closure)),
					None => {
						let symbol = qrl.symbol();
						let chunk = qrl
							.chunk()
							.or_else(|| {
								self.ctx
									.chunks
									.as_ref()
									.and_then(|chunks| chunks.resolve_chunk(&qrl.symbol_hash()))
							})
							.ok_or_else(|| ResumeError::MissingChunk {
								symbol: symbol.clone(),
							})?;
						format!("{chunk}#{symbol}")
					}
				};
				let captured = qrl.captured();
				if !captured.is_empty() {
					let _ = write!(payload, "[{}]", self.id_list(&captured));
				}
				self.write_tagged(Tag::Qrl, &payload)
			}
			NodeKind::Component(component) => {
				let payload = self.ctx.add_root(&component.qrl()).to_string();
				self.write_tagged(Tag::Component, &payload)
			}
			NodeKind::Task(task) => {
				let payload = format!(
					"{} {} {}",
					task.flags(),
					task.index(),
					self.id_list(&[task.host(), task.qrl(), task.state()])
				);
				self.write_tagged(Tag::Task, &payload)
			}
			NodeKind::Resource(_) => Err(ResumeError::NotImplemented("resource")),
			NodeKind::Signal(signal) => {
				let mut payload = self.ctx.add_root(&signal.value()).to_string();
				self.append_subscribers(&mut payload, &signal.subscriptions().subscribers())?;
				self.write_tagged(Tag::Signal, &payload)
			}
			NodeKind::Derived(derived) => {
				let closure = derived.closure().ok_or_else(|| {
					ResumeError::Closure("derived signal has no closure".to_string())
				})?;
				let index = self.ctx.closures.add_entry(closure);
				let mut payload = format!("{index} [{}]", self.id_list(&derived.captured()));
				self.append_subscribers(&mut payload, &derived.subscriptions().subscribers())?;
				self.write_tagged(Tag::DerivedSignal, &payload)
			}
			NodeKind::SignalField(field) => {
				let mut payload = format!(
					"{} {}",
					self.ctx.add_root(&field.host()),
					urlencoding::encode(&field.prop())
				);
				self.append_subscribers(&mut payload, &field.subscriptions().subscribers())?;
				self.write_tagged(Tag::SignalField, &payload)
			}
			NodeKind::Store(store) => {
				let mut payload = format!("{} {}", self.ctx.add_root(&store.target()), store.flags());
				self.append_subscribers(&mut payload, &store.subscriptions().subscribers())?;
				self.write_tagged(Tag::Store, &payload)
			}
			NodeKind::TreeNode(tree) => {
				let payload = format!("{} {}", self.id_list(&tree.references()), tree.flags());
				self.write_tagged(Tag::TreeNode, &payload)
			}
			NodeKind::Props(props) => {
				let payload = self.id_list(&[props.var_props(), props.const_props()]);
				self.write_tagged(Tag::Props, &payload)
			}
			NodeKind::Element(element) => {
				let id = self
					.ctx
					.elements
					.as_ref()
					.and_then(|elements| elements.element_id(node))
					.ok_or_else(|| ResumeError::UnknownElement(element.name().to_string()))?;
				self.write_tagged(Tag::Element, &id)
			}
			NodeKind::Opaque(opaque) => Err(ResumeError::UnknownType(opaque.type_name().to_string())),
		}
	}

	/// Space separated root ids of `values`
	fn id_list(&mut self, values: &[Value]) -> String {
		let ids: Vec<String> = values
			.iter()
			.map(|value| self.ctx.add_root(value).to_string())
			.collect();
		ids.join(" ")
	}

	fn append_subscribers(&mut self, payload: &mut String, subscribers: &[Subscriber]) -> Result<()> {
		subscriptions::write_subscribers(payload, subscribers, |value| Ok(self.ctx.add_root(value)))
	}

	fn write_reference(&mut self, id: usize) -> Result<()> {
		self.write_tagged(Tag::Reference, &id.to_string())
	}

	fn write_tagged(&mut self, tag: Tag, payload: &str) -> Result<()> {
		self.write_string(&tag.wrap(payload))
	}

	/// Write a JSON string literal, escaping `</` when configured
	fn write_string(&mut self, text: &str) -> Result<()> {
		let literal = serde_json::to_string(text)?;
		if self.ctx.config.escape_markup() {
			self.out.push_str(&literal.replace("</", "<\\/"));
		} else {
			self.out.push_str(&literal);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SerializerConfig;
	use crate::qrl::Qrl;
	use crate::reactive::{SignalCell, Subscriber};
	use futures::executor::block_on;
	use rstest::rstest;

	fn encode_with(config: SerializerConfig, roots: &[Value]) -> Result<String> {
		let mut ctx = SerializationContext::new(config);
		ctx.declare_roots(roots);
		block_on(ctx.break_cycles_and_resolve())?;
		let mut out = String::new();
		ctx.encode(&mut out)?;
		Ok(out)
	}

	fn encode(roots: &[Value]) -> Result<String> {
		encode_with(SerializerConfig::default(), roots)
	}

	#[rstest]
	#[case(0.0, "0")]
	#[case(-12.0, "-12")]
	#[case(0.1, "0.1")]
	#[case(1e20, "100000000000000000000")]
	#[case(9_007_199_254_740_993.0, "9007199254740992")]
	#[case(1e-7, "1e-7")]
	#[case(f64::NAN, "NaN")]
	#[case(f64::NEG_INFINITY, "-Infinity")]
	fn test_format_number(#[case] n: f64, #[case] expected: &str) {
		// Assert
		assert_eq!(format_number(n), expected);
	}

	#[rstest]
	fn test_scalars() {
		// Act
		let out = encode(&[
			Value::Null,
			Value::Bool(true),
			Value::from(1.5),
			Value::Undefined,
			Value::Number(f64::INFINITY),
			Value::BigInt(12345678901234567890),
		])
		.unwrap();

		// Assert
		assert_eq!(
			out,
			r#"[null,true,1.5,"\u0000","\u0007+","\b12345678901234567890"]"#
		);
	}

	#[rstest]
	fn test_control_prefixed_string_is_escaped() {
		// Act
		let out = encode(&[Value::from("\u{01}0")]).unwrap();

		// Assert
		assert_eq!(out, r#"["\u0005\u00010"]"#);
	}

	#[rstest]
	#[case(true, r#"["<\/script>"]"#)]
	#[case(false, r#"["</script>"]"#)]
	fn test_markup_escaping(#[case] escape: bool, #[case] expected: &str) {
		// Arrange
		let config = SerializerConfig::default().with_escape_markup(escape);

		// Act
		let out = encode_with(config, &[Value::from("</script>")]).unwrap();

		// Assert
		assert_eq!(out, expected);
	}

	#[rstest]
	fn test_shared_child_written_as_reference() {
		// Arrange
		let shared = Value::object_from([("v", Value::from(1))]);

		// Act
		let out = encode(&[Value::array([shared.clone(), shared])]).unwrap();

		// Assert
		assert_eq!(out, r#"[["\u00011","\u00011"],{"v":1}]"#);
	}

	#[rstest]
	fn test_repeated_declared_root_is_a_reference() {
		// Arrange
		let object = Value::object();

		// Act
		let out = encode(&[object.clone(), object]).unwrap();

		// Assert
		assert_eq!(out, r#"[{},"\u00010"]"#);
	}

	#[rstest]
	fn test_signal_payload_with_subscriber() {
		// Arrange
		let host = Value::object();
		let cell = SignalCell::new(Value::from(5));
		cell.subscriptions().add(Subscriber::host(host.clone()));
		let signal = Value::node(NodeKind::Signal(cell));

		// Act
		let out = encode(&[signal, host]).unwrap();

		// Assert
		assert_eq!(out, r#"["\u00152;0 _ 1",{},5]"#);
	}

	#[rstest]
	fn test_set_and_map_payloads() {
		// Act
		let out = encode(&[
			Value::set([Value::from(1), Value::from(2)]),
			Value::map([(Value::from("k"), Value::from(true))]),
		])
		.unwrap();

		// Assert
		assert_eq!(out, r#"["\u001b2 3","\u001c4 5",1,2,"k",true]"#);
	}

	#[rstest]
	fn test_rejected_promise_uses_complement() {
		// Arrange
		let promise = crate::value::Promise::rejected(Value::from("bad"));

		// Act
		let out = encode(&[promise]).unwrap();

		// Assert
		assert_eq!(out, r#"["\u001d-2","\u000f_ bad"]"#);
	}

	#[rstest]
	fn test_qrl_without_chunk_fails() {
		// Arrange
		let qrl = Qrl::new("handler_h1").into_value();

		// Act
		let result = encode(&[qrl]);

		// Assert
		assert!(matches!(result, Err(ResumeError::MissingChunk { symbol }) if symbol == "handler_h1"));
	}

	#[rstest]
	fn test_qrl_chunk_from_resolver() {
		// Arrange
		let qrl = Qrl::new("handler_h1")
			.with_captured(vec![Value::from(9)])
			.into_value();
		let mut ctx = SerializationContext::default()
			.with_chunks(std::rc::Rc::new(|hash: &str| Some(format!("./{hash}.js"))));
		ctx.declare_roots(&[qrl]);
		block_on(ctx.break_cycles_and_resolve()).unwrap();
		let mut out = String::new();

		// Act
		ctx.encode(&mut out).unwrap();

		// Assert
		assert_eq!(out, r#"["\u0010./h1.js#handler_h1[1]",9]"#);
	}

	#[rstest]
	fn test_resource_is_not_implemented() {
		// Arrange
		let resource = Value::node(NodeKind::Resource(crate::qrl::Resource::default()));

		// Act
		let result = encode(&[resource]);

		// Assert
		assert!(matches!(result, Err(ResumeError::NotImplemented("resource"))));
	}
}
