//! Subscriber list payloads
//!
//! Each observer is one `;`-prefixed segment appended after a reactive
//! value's own fields:
//!
//! ```text
//! ;{kind} {signalId|_} {hostId} {=prop?}
//! ```
//!
//! Property names are percent-encoded so they never contain a separator, and
//! carry a leading `=` so an empty name is told apart from no name. Empty
//! segments are skipped when reading.

use std::fmt::Write as _;

use crate::error::{ResumeError, Result};
use crate::reactive::{Subscriber, SubscriberKind};
use crate::value::Value;

/// Append the segments for `subscribers` to `out`, mapping every referenced
/// value to its root id with `id_of`
pub(crate) fn write_subscribers(
	out: &mut String,
	subscribers: &[Subscriber],
	mut id_of: impl FnMut(&Value) -> Result<usize>,
) -> Result<()> {
	for subscriber in subscribers {
		let signal = match &subscriber.signal {
			Some(signal) => id_of(signal)?.to_string(),
			None => "_".to_string(),
		};
		let host = id_of(&subscriber.host)?;
		// Writing into a String cannot fail
		let _ = write!(out, ";{} {} {}", subscriber.kind.code(), signal, host);
		if let Some(prop) = &subscriber.prop {
			let _ = write!(out, " ={}", urlencoding::encode(prop));
		}
	}
	Ok(())
}

/// Parse the segments in `text`, resolving ids with `resolve`
pub(crate) fn read_subscribers(
	text: &str,
	mut resolve: impl FnMut(usize) -> Result<Value>,
) -> Result<Vec<Subscriber>> {
	let mut subscribers = Vec::new();
	for segment in text.split(';') {
		let mut tokens = segment.split_whitespace();
		let Some(kind) = tokens.next() else {
			continue;
		};
		let kind = kind
			.parse::<u8>()
			.ok()
			.and_then(SubscriberKind::from_code)
			.ok_or_else(|| ResumeError::parse(format!("invalid subscriber kind `{kind}`")))?;
		let signal = match tokens.next() {
			Some("_") => None,
			Some(id) => Some(resolve(parse_id(id)?)?),
			None => return Err(truncated(segment)),
		};
		let host = match tokens.next() {
			Some(id) => resolve(parse_id(id)?)?,
			None => return Err(truncated(segment)),
		};
		let prop = tokens
			.next()
			.map(|prop| {
				let prop = prop.strip_prefix('=').ok_or_else(|| {
					ResumeError::parse(format!("property name `{prop}` lacks its `=` prefix"))
				})?;
				urlencoding::decode(prop)
					.map(|decoded| decoded.into_owned())
					.map_err(|error| ResumeError::parse(format!("invalid property name: {error}")))
			})
			.transpose()?;
		subscribers.push(Subscriber {
			kind,
			signal,
			host,
			prop,
		});
	}
	Ok(subscribers)
}

fn parse_id(token: &str) -> Result<usize> {
	token
		.parse()
		.map_err(|_| ResumeError::parse(format!("invalid root id `{token}`")))
}

fn truncated(segment: &str) -> ResumeError {
	ResumeError::parse(format!("truncated subscriber segment `{segment}`"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn roots() -> Vec<Value> {
		vec![Value::from("zero"), Value::object(), Value::object()]
	}

	fn id_in(roots: &[Value], value: &Value) -> Result<usize> {
		roots
			.iter()
			.position(|root| root.same(value))
			.ok_or_else(|| ResumeError::NotRooted(value.type_name().to_string()))
	}

	#[rstest]
	fn test_write_segments() {
		// Arrange
		let roots = roots();
		let subscribers = vec![
			Subscriber::host(roots[1].clone()),
			Subscriber::property(roots[2].clone(), "aria label").via(roots[1].clone()),
		];
		let mut out = String::new();

		// Act
		write_subscribers(&mut out, &subscribers, |v| id_in(&roots, v)).unwrap();

		// Assert
		assert_eq!(out, ";0 _ 1;1 1 2 =aria%20label");
	}

	#[rstest]
	fn test_read_skips_empty_segments() {
		// Arrange
		let roots = roots();

		// Act
		let subscribers =
			read_subscribers(";;0 _ 1; ;3 _ 2", |id| Ok(roots[id].clone())).unwrap();

		// Assert
		assert_eq!(subscribers.len(), 2);
		assert_eq!(subscribers[0].kind, SubscriberKind::Host);
		assert!(subscribers[0].host.same(&roots[1]));
		assert_eq!(subscribers[1].kind, SubscriberKind::Task);
	}

	#[rstest]
	fn test_read_decodes_prop_and_signal() {
		// Arrange
		let roots = roots();

		// Act
		let subscribers =
			read_subscribers(";1 2 1 =a%3Bb", |id| Ok(roots[id].clone())).unwrap();

		// Assert
		let subscriber = &subscribers[0];
		assert_eq!(subscriber.prop.as_deref(), Some("a;b"));
		assert!(subscriber.signal.as_ref().unwrap().same(&roots[2]));
	}

	#[rstest]
	fn test_empty_prop_is_kept_apart_from_none() {
		// Arrange
		let roots = roots();
		let subscribers = vec![
			Subscriber::property(roots[1].clone(), ""),
			Subscriber::host(roots[1].clone()),
		];
		let mut out = String::new();

		// Act
		write_subscribers(&mut out, &subscribers, |v| id_in(&roots, v)).unwrap();
		let decoded = read_subscribers(&out, |id| Ok(roots[id].clone())).unwrap();

		// Assert
		assert_eq!(out, ";1 _ 1 =;0 _ 1");
		assert_eq!(decoded[0].prop.as_deref(), Some(""));
		assert_eq!(decoded[1].prop, None);
	}

	#[rstest]
	#[case(";7 _ 1")]
	#[case(";1 _ 1 name")]
	#[case(";0 _")]
	#[case(";0 x 1")]
	fn test_read_rejects_malformed(#[case] text: &str) {
		// Act
		let result = read_subscribers(text, |_| Ok(Value::Null));

		// Assert
		assert!(matches!(result, Err(ResumeError::Parse(_))));
	}
}
