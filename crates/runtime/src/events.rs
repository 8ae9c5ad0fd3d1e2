//! Per-(target, event) listener registry.
//!
//! Each entry owns the forwarder installed into the capability's native slot
//! plus the caller-registered listeners, kept in [`IndexMap`]/[`Vec`] order so
//! triggers run in registration order. Entries are created lazily on the
//! first subscription and are the only thing ever attached to a native slot.

use std::collections::HashMap;

use bridge_protocol::EventNotification;
use indexmap::IndexMap;

use crate::callable::Callable;
use crate::capability::{EventSlot, Host};
use crate::error::Result;
use crate::object_space::ObjectSpace;
use crate::value::Value;

/// Listener record for one (target, event) pair.
pub struct ListenerEntry {
	/// Forwarder attached to the native slot; always present.
	outside: EventSlot,
	/// Caller-registered listeners, already bound to the target.
	others: Vec<Callable>,
}

impl ListenerEntry {
	/// Appends a listener; it runs after the ones already registered.
	pub fn push(&mut self, listener: Callable) {
		self.others.push(listener);
	}

	pub fn listeners(&self) -> &[Callable] {
		&self.others
	}

	/// Notification the forwarder writes to the channel.
	pub fn forward(&self, target: &str, args: &[Value]) -> EventNotification {
		EventNotification {
			target: target.to_string(),
			event: self.outside.event().to_string(),
			args: args.iter().map(Value::to_json).collect(),
		}
	}
}

/// Listener entries keyed by target, then event name.
#[derive(Default)]
pub struct Listeners {
	entries: HashMap<String, IndexMap<String, ListenerEntry>>,
}

impl Listeners {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry for (`target`, `event`), creating it on first use.
	///
	/// Creation attaches a fresh forwarder to the capability's native slot;
	/// later calls reuse the entry without touching the slot.
	pub fn get_or_create(
		&mut self,
		space: &ObjectSpace,
		host: &Host,
		target: &str,
		event: &str,
	) -> Result<&mut ListenerEntry> {
		let exists = self
			.entries
			.get(target)
			.is_some_and(|events| events.contains_key(event));

		if !exists {
			let capability = space.capability(target)?;
			let slot = EventSlot::new(target, event, host.clone());
			capability.set_event_slot(event, Some(slot.clone()))?;
			tracing::debug!(target: "bridge.events", key = %target, event, "attached forwarder");

			self.entries.entry(target.to_string()).or_default().insert(
				event.to_string(),
				ListenerEntry {
					outside: slot,
					others: Vec::new(),
				},
			);
		}

		self.entries
			.get_mut(target)
			.and_then(|events| events.get_mut(event))
			.ok_or_else(|| crate::error::Error::ObjectNotFound {
				key: format!("{target}#{event}"),
			})
	}

	pub fn get(&self, target: &str, event: &str) -> Option<&ListenerEntry> {
		self.entries.get(target).and_then(|events| events.get(event))
	}

	/// Clears bookkeeping and the native slot for (`target`, `event`).
	///
	/// Returns whether an entry existed.
	pub fn remove(&mut self, space: &ObjectSpace, target: &str, event: &str) -> Result<bool> {
		let removed = match self.entries.get_mut(target) {
			Some(events) => {
				let removed = events.shift_remove(event).is_some();
				if events.is_empty() {
					self.entries.remove(target);
				}
				removed
			}
			None => false,
		};

		if let Some(capability) = space.try_get(target).and_then(|h| h.as_capability()) {
			capability.set_event_slot(event, None)?;
		}

		tracing::debug!(target: "bridge.events", key = %target, event, removed, "detached forwarder");
		Ok(removed)
	}

	/// Drops every entry for `target` without touching native slots.
	///
	/// Used when the target closed itself and its slots are gone anyway.
	pub fn drop_target(&mut self, target: &str) -> usize {
		self.entries.remove(target).map_or(0, |events| events.len())
	}

	pub fn events_for(&self, target: &str) -> Vec<&str> {
		self.entries
			.get(target)
			.map(|events| events.keys().map(String::as_str).collect())
			.unwrap_or_default()
	}
}
