//! Keyed registry of live handles.
//!
//! Owned by the single runtime executor, so a plain [`HashMap`] suffices: all
//! access happens between reading one command and writing its reply.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::value::Value;

/// Entry stored under an object space key.
#[derive(Clone)]
pub enum Handle {
	/// Native object supplied by the capability factory.
	Capability(Arc<dyn Capability>),
	/// Caller-defined value registered by key (out-parameters).
	Value(Value),
}

impl Handle {
	pub fn as_capability(&self) -> Option<&Arc<dyn Capability>> {
		match self {
			Handle::Capability(cap) => Some(cap),
			Handle::Value(_) => None,
		}
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Handle::Capability(cap) => write!(f, "Capability({})", cap.kind().as_str()),
			Handle::Value(value) => f.debug_tuple("Value").field(value).finish(),
		}
	}
}

/// Registry of handles by key.
#[derive(Debug, Default)]
pub struct ObjectSpace {
	entries: HashMap<String, Handle>,
}

impl ObjectSpace {
	pub fn new() -> Self {
		Self::default()
	}

	/// Looks up `key`.
	pub fn get(&self, key: &str) -> Result<&Handle> {
		self.entries.get(key).ok_or_else(|| not_found(key))
	}

	pub fn get_mut(&mut self, key: &str) -> Result<&mut Handle> {
		self.entries.get_mut(key).ok_or_else(|| not_found(key))
	}

	/// Synchronous lookup without an error.
	pub fn try_get(&self, key: &str) -> Option<&Handle> {
		self.entries.get(key)
	}

	/// Returns the capability under `key`, failing for missing keys and plain values.
	pub fn capability(&self, key: &str) -> Result<Arc<dyn Capability>> {
		match self.get(key)? {
			Handle::Capability(cap) => Ok(Arc::clone(cap)),
			Handle::Value(_) => Err(Error::Capability(format!("{key} is not a native object"))),
		}
	}

	/// Registers `handle` under `key`, silently replacing any previous entry.
	pub fn set(&mut self, key: impl Into<String>, handle: Handle) -> Option<Handle> {
		let key = key.into();
		let previous = self.entries.insert(key.clone(), handle);
		if previous.is_some() {
			tracing::debug!(target: "bridge.space", key = %key, "replaced existing handle");
		}
		previous
	}

	pub fn delete(&mut self, key: &str) -> Option<Handle> {
		let removed = self.entries.remove(key);
		if removed.is_some() {
			tracing::debug!(target: "bridge.space", key = %key, "removed handle");
		}
		removed
	}

	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}
}

fn not_found(key: &str) -> Error {
	Error::ObjectNotFound {
		key: key.to_string(),
	}
}
