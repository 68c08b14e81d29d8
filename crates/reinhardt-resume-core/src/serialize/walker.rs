//! Graph walk, cycle breaking and async drain
//!
//! The walk runs before anything is written. It visits every value reachable
//! from the declared roots with an explicit stack, recording each node as
//! seen once and promoting it to a root on its second visit. A promoted node
//! is not scanned again: its children were pushed on the first visit.
//!
//! Pending promises found on the way are collected. When the stack runs dry
//! the walk awaits all of them together, records each outcome on its promise
//! and pushes the outcomes back onto the stack. Settled values may reveal
//! further pending promises, so this repeats until none are left.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, trace};

use super::context::{SerializationContext, Seen};
use crate::error::{ResumeError, Result};
use crate::value::{Node, NodeId, NodeKind, PromiseState, SharedSettlement, Value};

/// Work item: a value and whether it is a declared root
type Frame = (Value, bool);

impl SerializationContext {
	/// Walk the graph from the current roots, promoting shared and cyclic
	/// values to roots and settling every reachable promise.
	///
	/// This is the only suspension point of a serialization. A promise that
	/// never settles stalls it, unless `max_drain_passes` is configured.
	pub async fn break_cycles_and_resolve(&mut self) -> Result<()> {
		let mut stack: Vec<Frame> = self
			.roots
			.iter()
			.enumerate()
			.filter(|(index, value)| self.root_id_of(value).is_none_or(|id| id == *index))
			.map(|(_, value)| (value.clone(), true))
			.rev()
			.collect();
		let mut pending: Vec<Node> = Vec::new();
		let mut pending_ids: HashSet<NodeId> = HashSet::new();
		let mut passes = 0;

		loop {
			while let Some((value, declared)) = stack.pop() {
				self.visit(value, declared, &mut stack, &mut pending, &mut pending_ids)?;
			}
			if pending.is_empty() {
				break;
			}
			if let Some(limit) = self.config.max_drain_passes() {
				if passes >= limit {
					return Err(ResumeError::DrainLimitExceeded(limit));
				}
			}
			passes += 1;
			debug!(pass = passes, pending = pending.len(), "draining async values");

			let batch: Vec<(Node, SharedSettlement)> = std::mem::take(&mut pending)
				.into_iter()
				.filter_map(|node| {
					let settlement = node.as_promise()?.settlement()?;
					Some((node, settlement))
				})
				.collect();
			pending_ids.clear();
			let settlements = join_all(batch.iter().map(|(_, future)| future.clone())).await;
			for ((node, _), settlement) in batch.iter().zip(settlements) {
				let Some(promise) = node.as_promise() else {
					continue;
				};
				promise.settle(settlement);
				match promise.state() {
					PromiseState::Resolved(value) | PromiseState::Rejected(value) => {
						stack.push((value, false));
					}
					PromiseState::Pending => {}
				}
			}
		}
		debug!(roots = self.roots.len(), passes, "walk complete");
		Ok(())
	}

	fn visit(
		&mut self,
		value: Value,
		declared: bool,
		stack: &mut Vec<Frame>,
		pending: &mut Vec<Node>,
		pending_ids: &mut HashSet<NodeId>,
	) -> Result<()> {
		let node = match &value {
			Value::Node(node) => node.clone(),
			Value::String(text) if self.is_trackable(text) => {
				match self.strings.get(text).copied() {
					None => self.mark(&value, Seen::Once),
					Some(Seen::Once) => {
						self.add_root(&value);
					}
					Some(Seen::Root(_)) => {}
				}
				return Ok(());
			}
			_ => return Ok(()),
		};

		if !declared {
			match self.seen.get(&node.id()).copied() {
				None => {
					self.seen.insert(node.id(), Seen::Once);
				}
				Some(Seen::Once) => {
					self.add_root(&value);
					return Ok(());
				}
				Some(Seen::Root(_)) => return Ok(()),
			}
		}

		trace!(node = %node.id(), kind = node.type_name(), "scanning");
		if let NodeKind::Promise(promise) = node.kind() {
			match promise.state() {
				PromiseState::Pending => {
					if pending_ids.insert(node.id()) {
						pending.push(node.clone());
					}
				}
				PromiseState::Resolved(value) | PromiseState::Rejected(value) => {
					stack.push((value, false));
				}
			}
			return Ok(());
		}
		let children = children_of(&node)?;
		stack.extend(children.into_iter().rev().map(|child| (child, false)));
		Ok(())
	}
}

/// Values a node refers to, in the order they are written
fn children_of(node: &Node) -> Result<Vec<Value>> {
	let children: Vec<Value> = match node.kind() {
		NodeKind::Object(object) => object
			.entries()?
			.into_iter()
			.map(|(_, value)| value)
			.collect(),
		NodeKind::Array(array) => array.items()?,
		NodeKind::Url(_)
		| NodeKind::Date(_)
		| NodeKind::RegExp(_)
		| NodeKind::UrlSearchParams(_)
		| NodeKind::Bytes(_)
		| NodeKind::Element(_)
		| NodeKind::Resource(_)
		| NodeKind::Promise(_) => Vec::new(),
		NodeKind::Error(error) => error.props().into_iter().collect(),
		NodeKind::Set(set) => set.items(),
		NodeKind::Map(map) => map
			.entries()
			.into_iter()
			.flat_map(|(key, value)| [key, value])
			.collect(),
		NodeKind::FormData(form) => form
			.entries()
			.into_iter()
			.flat_map(|(key, value)| [Value::from(key), Value::from(value)])
			.collect(),
		NodeKind::Qrl(qrl) => qrl.captured(),
		NodeKind::Component(component) => vec![component.qrl()],
		NodeKind::Task(task) => vec![task.host(), task.qrl(), task.state()],
		NodeKind::Signal(signal) => {
			let mut children = vec![signal.value()];
			children.extend(signal.subscriptions().references());
			children
		}
		NodeKind::Derived(derived) => {
			let mut children = derived.captured();
			children.extend(derived.subscriptions().references());
			children
		}
		NodeKind::SignalField(field) => {
			let mut children = vec![field.host()];
			children.extend(field.subscriptions().references());
			children
		}
		NodeKind::Store(store) => {
			let mut children = vec![store.target()];
			children.extend(store.subscriptions().references());
			children
		}
		NodeKind::TreeNode(tree) => tree.references().into(),
		NodeKind::Props(props) => vec![props.var_props(), props.const_props()],
		NodeKind::Opaque(opaque) => {
			return Err(ResumeError::UnknownType(opaque.type_name().to_string()));
		}
	};
	Ok(children)
}
