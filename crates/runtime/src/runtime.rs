//! The single executor that owns all bridge state.
//!
//! [`Runtime`] holds the object space, the listener registry, and the
//! window namespace. The connection loop owns exactly one instance and
//! drives it with inbound lines and [`HostMessage`]s, so no state here is
//! ever touched from two places at once.

use std::sync::Arc;

use bridge_protocol::Outbound;
use tokio::sync::mpsc;

use crate::callable::Callable;
use crate::capability::{Capability, CapabilityFactory, Host, HostMessage};
use crate::command::Command;
use crate::config::BridgeConfig;
use crate::dispatch::{self, Completion};
use crate::error::{Error, Result};
use crate::events::Listeners;
use crate::marshal;
use crate::object_space::{Handle, ObjectSpace};
use crate::value::{Map, Value};

/// Nesting limit for remote closure calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Bridge state plus the operations handlers and closures run against it.
pub struct Runtime {
	space: ObjectSpace,
	listeners: Listeners,
	window: Arc<dyn Capability>,
	factory: Arc<dyn CapabilityFactory>,
	host: Host,
	outbound: mpsc::UnboundedSender<Outbound>,
	config: Arc<BridgeConfig>,
	depth: usize,
	shutdown: bool,
}

impl Runtime {
	/// Creates the runtime and pre-registers the process singleton.
	pub fn new(
		config: Arc<BridgeConfig>,
		factory: Arc<dyn CapabilityFactory>,
		host: Host,
		outbound: mpsc::UnboundedSender<Outbound>,
	) -> Result<Self> {
		let process = factory.create_process(host.clone())?;
		let window = factory.create_window(host.clone())?;

		let mut space = ObjectSpace::new();
		space.set(config.process_key.clone(), Handle::Capability(process));
		tracing::debug!(target: "bridge.space", key = %config.process_key, "registered process singleton");

		Ok(Self {
			space,
			listeners: Listeners::new(),
			window,
			factory,
			host,
			outbound,
			config,
			depth: 0,
			shutdown: false,
		})
	}

	pub fn space(&self) -> &ObjectSpace {
		&self.space
	}

	pub fn space_mut(&mut self) -> &mut ObjectSpace {
		&mut self.space
	}

	pub fn listeners(&self) -> &Listeners {
		&self.listeners
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn host(&self) -> &Host {
		&self.host
	}

	pub fn factory(&self) -> Arc<dyn CapabilityFactory> {
		Arc::clone(&self.factory)
	}

	pub fn window(&self) -> &Arc<dyn Capability> {
		&self.window
	}

	/// Whether a shutdown was requested since the last loop iteration.
	pub fn shutdown_requested(&self) -> bool {
		self.shutdown
	}

	/// Subscribes `listener` to (`target`, `event`), attaching the forwarder
	/// on first use.
	pub fn add_listener(&mut self, target: &str, event: &str, listener: Option<Callable>) -> Result<()> {
		let entry = self.listeners.get_or_create(&self.space, &self.host, target, event)?;
		if let Some(listener) = listener {
			entry.push(listener);
		}
		Ok(())
	}

	pub fn remove_listener(&mut self, target: &str, event: &str) -> Result<bool> {
		self.listeners.remove(&self.space, target, event)
	}

	/// Forgets every listener entry for `target`; native slots are left alone.
	pub fn drop_listeners(&mut self, target: &str) -> usize {
		self.listeners.drop_target(target)
	}

	/// Invokes `callable` with `this` bound to `receiver`.
	pub fn call(&mut self, callable: &Callable, receiver: Value, args: Vec<Value>) -> Result<Value> {
		match callable {
			Callable::Remote(closure) => {
				if self.depth >= MAX_CALL_DEPTH {
					return Err(Error::Script {
						kind: "RangeError",
						message: "Maximum call stack size exceeded".to_string(),
					});
				}
				self.depth += 1;
				let result = closure.call(self, receiver, args);
				self.depth -= 1;
				result
			}
			Callable::Bound(bound) => {
				let mut args = args;
				args.extend(bound.extra_args.iter().cloned());
				self.call(&bound.inner, bound.receiver.clone(), args)
			}
			Callable::Native(f) => f(self, args),
		}
	}

	/// Reads property `name` of the handle under `key`.
	pub fn get_property(&self, key: &str, name: &str) -> Result<Value> {
		match self.space.get(key)? {
			Handle::Capability(cap) => cap.property(name),
			Handle::Value(value) => Ok(value.get(name).cloned().unwrap_or_default()),
		}
	}

	/// Assigns property `name`; a previous value, callable or not, is replaced.
	pub fn set_property(&mut self, key: &str, name: &str, value: Value) -> Result<()> {
		match self.space.get_mut(key)? {
			Handle::Capability(cap) => cap.set_property(name, value),
			Handle::Value(Value::Object(map)) => {
				map.insert(name.to_string(), value);
				Ok(())
			}
			Handle::Value(other) => Err(Error::type_error(format!(
				"Cannot set property '{name}' of {}",
				other.type_name()
			))),
		}
	}

	/// Calls method `name` on the handle under `key`.
	///
	/// A callable property wins over a native method of the same name and
	/// runs with the handle as receiver.
	pub fn invoke_method(&mut self, key: &str, name: &str, args: Vec<Value>) -> Result<Value> {
		let handle = self.space.get(key)?.clone();
		if let Ok(Value::Callable(callable)) = self.get_property(key, name) {
			return self.call(&callable, Value::Ref(key.to_string()), args);
		}

		match handle {
			Handle::Capability(cap) => cap.invoke(name, args).map_err(|err| match err {
				Error::MethodNotFound { method, .. } => Error::MethodNotFound {
					key: key.to_string(),
					method,
				},
				other => other,
			}),
			Handle::Value(_) => Err(Error::MethodNotFound {
				key: key.to_string(),
				method: name.to_string(),
			}),
		}
	}

	/// Reads from the handle's settings namespace.
	pub fn setting(&self, key: &str, name: &str) -> Result<Value> {
		match self.space.get(key)? {
			Handle::Capability(cap) => cap.setting(name),
			Handle::Value(value) => Ok(value
				.get("settings")
				.and_then(|settings| settings.get(name))
				.cloned()
				.unwrap_or_default()),
		}
	}

	pub fn set_setting(&mut self, key: &str, name: &str, value: Value) -> Result<()> {
		match self.space.get_mut(key)? {
			Handle::Capability(cap) => cap.set_setting(name, value),
			Handle::Value(Value::Object(map)) => {
				let settings = map
					.entry("settings".to_string())
					.or_insert_with(|| Value::Object(Map::new()));
				match settings {
					Value::Object(settings) => {
						settings.insert(name.to_string(), value);
						Ok(())
					}
					_ => Err(Error::type_error("settings is not an object")),
				}
			}
			Handle::Value(other) => Err(Error::type_error(format!(
				"Cannot set setting '{name}' of {}",
				other.type_name()
			))),
		}
	}

	/// Reads a name from the process-wide window namespace.
	pub fn global(&self, name: &str) -> Result<Value> {
		self.window.property(name)
	}

	pub fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
		self.window.set_property(name, value)
	}

	/// Queues a line for the writer.
	pub fn emit(&self, line: Outbound) {
		if self.outbound.send(line).is_err() {
			tracing::warn!(target: "bridge.transport", "outbound line dropped: writer closed");
		}
	}

	/// Writes the command back as a response line.
	pub fn complete(&self, command: &Command) {
		tracing::debug!(
			target: "bridge.dispatch",
			name = %command.name,
			id = ?command.id,
			failed = command.error.is_some(),
			"command completed"
		);
		self.emit(Outbound::Response(command.to_envelope()));
	}

	/// Runs the forwarder and then every listener for (`target`, `event`).
	///
	/// Listener failures are logged; they never stop later listeners.
	pub fn trigger(&mut self, target: &str, event: &str, args: Vec<Value>) {
		let Some(entry) = self.listeners.get(target, event) else {
			tracing::debug!(target: "bridge.events", key = %target, event, "trigger without listener entry");
			return;
		};
		let notification = entry.forward(target, &args);
		let listeners = entry.listeners().to_vec();

		self.emit(Outbound::Event(notification));
		for listener in listeners {
			if let Err(err) = self.call(&listener, Value::Ref(target.to_string()), args.clone()) {
				tracing::warn!(target: "bridge.events", key = %target, event, error = %err, "listener failed");
			}
		}
	}

	/// Applies a message queued by a capability.
	pub fn handle_host(&mut self, message: HostMessage) {
		match message {
			HostMessage::Trigger { target, event, args } => self.trigger(&target, &event, args),
			HostMessage::Call { callable, args } => {
				if let Err(err) = self.call(&callable, Value::Null, args) {
					tracing::warn!(target: "bridge.dispatch", error = %err, "deferred call failed");
				}
			}
			HostMessage::Closed { key } => {
				self.space.delete(&key);
				let dropped = self.drop_listeners(&key);
				tracing::info!(target: "bridge.space", key = %key, dropped, "handle closed");
			}
			HostMessage::Shutdown => {
				tracing::info!(target: "bridge.transport", "shutdown requested");
				self.shutdown = true;
			}
		}
	}

	/// Decodes, resolves, and dispatches one command line.
	///
	/// Every failure after decoding is reported as the command's `error`.
	pub fn execute_line(&mut self, line: &str) {
		let decoded = match marshal::decode(line) {
			Ok(decoded) => decoded,
			Err(err) => {
				tracing::warn!(target: "bridge.transport", error = %err, "dropping undecodable line");
				return;
			}
		};

		let mut command = decoded.command;
		let outcome = match decoded.rejection {
			Some(err) => Err(err),
			None => self.execute(&mut command),
		};

		match outcome {
			Ok(Completion::Now) => self.complete(&command),
			Ok(Completion::Deferred) => {
				tracing::debug!(target: "bridge.dispatch", name = %command.name, id = ?command.id, "completion deferred");
			}
			Err(err) => {
				if err.is_handler_failure() {
					tracing::debug!(target: "bridge.dispatch", name = %command.name, error = %err, "handler failed");
				} else {
					tracing::warn!(target: "bridge.dispatch", name = %command.name, error = %err, "command rejected");
				}
				command.response = None;
				command.error = Some(err.to_string());
				self.complete(&command);
			}
		}
	}

	fn execute(&mut self, command: &mut Command) -> Result<Completion> {
		marshal::resolve_transforms(self, &mut command.params)?;
		dispatch::dispatch(self, command)
	}
}
