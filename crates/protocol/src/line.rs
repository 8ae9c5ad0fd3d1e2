//! Line framing: inbound classification and outbound tagging.

use crate::command::{CommandEnvelope, EventNotification};
use crate::error::{ProtocolError, Result};

/// Tag prefixed to completed command lines and heartbeat acknowledgements.
pub const RESPONSE_PREFIX: &str = ">";

/// Tag prefixed to event notification lines.
pub const EVENT_PREFIX: &str = "<event>";

/// Heartbeat token the controller sends while idle.
pub const DEFAULT_HEARTBEAT_TOKEN: &str = "NOOP";

/// Classification of a single inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
	/// Blank line; nothing to do.
	Empty,
	/// The reserved heartbeat token.
	Heartbeat,
	/// Anything else is a command body to be decoded.
	Command(&'a str),
}

impl<'a> Inbound<'a> {
	/// Classifies `line` (without its trailing newline).
	pub fn classify(line: &'a str, heartbeat_token: &str) -> Self {
		let line = line.trim_end_matches(['\r', '\n']);
		if line.trim().is_empty() {
			Inbound::Empty
		} else if line == heartbeat_token {
			Inbound::Heartbeat
		} else {
			Inbound::Command(line)
		}
	}
}

/// A line written by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
	/// Completed command envelope.
	Response(CommandEnvelope),
	/// Native event forwarded to the controller.
	Event(EventNotification),
	/// Acknowledgement of the given heartbeat token.
	Heartbeat(String),
}

impl Outbound {
	/// Encodes the line, without the trailing newline.
	pub fn encode(&self) -> Result<String> {
		Ok(match self {
			Outbound::Response(cmd) => format!("{RESPONSE_PREFIX}{}", serde_json::to_string(cmd)?),
			Outbound::Event(note) => format!("{EVENT_PREFIX}{}", serde_json::to_string(note)?),
			Outbound::Heartbeat(token) => format!("{RESPONSE_PREFIX}{token}"),
		})
	}

	/// Parses a line produced by [`Outbound::encode`].
	///
	/// This is the controller-side view of the channel and is mostly useful
	/// for tests and tooling.
	pub fn parse(line: &str, heartbeat_token: &str) -> Result<Self> {
		let line = line.trim_end_matches(['\r', '\n']);
		if let Some(body) = line.strip_prefix(EVENT_PREFIX) {
			return Ok(Outbound::Event(serde_json::from_str(body)?));
		}
		match line.strip_prefix(RESPONSE_PREFIX) {
			Some(body) if body == heartbeat_token => Ok(Outbound::Heartbeat(body.to_string())),
			Some(body) => Ok(Outbound::Response(serde_json::from_str(body)?)),
			None => Err(ProtocolError::UnknownTag(line.chars().take(16).collect())),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn classify_lines() {
		assert_eq!(Inbound::classify("", "NOOP"), Inbound::Empty);
		assert_eq!(Inbound::classify("  \r\n", "NOOP"), Inbound::Empty);
		assert_eq!(Inbound::classify("NOOP", "NOOP"), Inbound::Heartbeat);
		assert_eq!(Inbound::classify("NOOP\r", "NOOP"), Inbound::Heartbeat);
		assert_eq!(
			Inbound::classify(r#"{"name":"noop"}"#, "NOOP"),
			Inbound::Command(r#"{"name":"noop"}"#)
		);
	}

	#[test]
	fn heartbeat_encodes_with_response_tag() {
		let line = Outbound::Heartbeat("NOOP".to_string()).encode().unwrap();
		assert_eq!(line, ">NOOP");
	}

	#[test]
	fn event_line_round_trip() {
		let out = Outbound::Event(EventNotification {
			target: "page$2".to_string(),
			event: "onConsoleMessage".to_string(),
			args: vec![json!("hi"), json!(3)],
		});
		let line = out.encode().unwrap();
		assert!(line.starts_with("<event>{"));
		assert_eq!(Outbound::parse(&line, "NOOP").unwrap(), out);
	}

	#[test]
	fn response_line_is_not_mistaken_for_heartbeat() {
		let cmd = CommandEnvelope {
			id: Some(json!(1)),
			name: "noop".to_string(),
			..Default::default()
		};
		let line = Outbound::Response(cmd.clone()).encode().unwrap();
		assert_eq!(Outbound::parse(&line, "NOOP").unwrap(), Outbound::Response(cmd));
		assert_eq!(
			Outbound::parse(">NOOP", "NOOP").unwrap(),
			Outbound::Heartbeat("NOOP".to_string())
		);
	}

	#[test]
	fn untagged_line_is_rejected() {
		let err = Outbound::parse("hello", "NOOP").unwrap_err();
		assert!(matches!(err, ProtocolError::UnknownTag(_)));
	}
}
