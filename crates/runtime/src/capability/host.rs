//! Channel from capability objects back to the runtime executor.

use tokio::sync::mpsc;

use crate::callable::Callable;
use crate::value::Value;

/// Work queued for the executor by a capability.
#[derive(Debug)]
pub enum HostMessage {
	/// A native event slot fired.
	Trigger {
		target: String,
		event: String,
		args: Vec<Value>,
	},
	/// Invoke a callable the capability was handed earlier.
	Call { callable: Callable, args: Vec<Value> },
	/// The object under `key` closed itself.
	Closed { key: String },
	/// Stop the bridge loop.
	Shutdown,
}

/// Receiving half owned by the bridge loop.
pub type HostReceiver = mpsc::UnboundedReceiver<HostMessage>;

/// Cloneable handle capabilities use to reach the executor.
///
/// Nothing runs inline: every message is queued and handled between
/// commands, so the object space only ever sees one writer.
#[derive(Debug, Clone)]
pub struct Host {
	tx: mpsc::UnboundedSender<HostMessage>,
}

impl Host {
	pub fn channel() -> (Host, HostReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Host { tx }, rx)
	}

	pub fn trigger(&self, target: &str, event: &str, args: Vec<Value>) {
		self.post(HostMessage::Trigger {
			target: target.to_string(),
			event: event.to_string(),
			args,
		});
	}

	pub fn call(&self, callable: Callable, args: Vec<Value>) {
		self.post(HostMessage::Call { callable, args });
	}

	pub fn closed(&self, key: &str) {
		self.post(HostMessage::Closed { key: key.to_string() });
	}

	pub fn shutdown(&self) {
		self.post(HostMessage::Shutdown);
	}

	fn post(&self, message: HostMessage) {
		if self.tx.send(message).is_err() {
			tracing::debug!(target: "bridge.host", "host message dropped: executor gone");
		}
	}
}

/// Forwarder installed into a native event slot.
#[derive(Debug, Clone)]
pub struct EventSlot {
	target: String,
	event: String,
	host: Host,
}

impl EventSlot {
	pub fn new(target: &str, event: &str, host: Host) -> Self {
		Self {
			target: target.to_string(),
			event: event.to_string(),
			host,
		}
	}

	pub fn event(&self) -> &str {
		&self.event
	}

	/// Reports that the native event fired with `args`.
	pub fn fire(&self, args: Vec<Value>) {
		self.host.trigger(&self.target, &self.event, args);
	}
}

/// Hook run when a capability closes itself.
#[derive(Debug, Clone)]
pub struct ClosingHook {
	key: String,
	host: Host,
}

impl ClosingHook {
	pub fn new(key: &str, host: Host) -> Self {
		Self {
			key: key.to_string(),
			host,
		}
	}

	pub fn fire(&self) {
		self.host.closed(&self.key);
	}
}
