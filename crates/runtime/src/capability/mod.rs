//! Capability interface implemented by the automation backend.
//!
//! The runtime never knows concrete object types. Everything it needs from a
//! page, the process singleton, or the window namespace goes through
//! [`Capability`]; everything a capability needs from the runtime goes
//! through [`Host`].

mod host;

use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};

use crate::error::{Error, Result};
use crate::value::Value;

pub use host::{ClosingHook, EventSlot, Host, HostMessage, HostReceiver};

/// Closed set of native object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
	/// A browser page created by `createHandle`.
	Page,
	/// The process-wide global namespace behind `windowProperty`.
	Window,
	/// The process singleton.
	Process,
}

impl HandleKind {
	pub fn as_str(self) -> &'static str {
		match self {
			HandleKind::Page => "page",
			HandleKind::Window => "window",
			HandleKind::Process => "process",
		}
	}
}

/// Opaque native object exposed to the controller.
///
/// Implementations are shared between the runtime executor and whatever
/// background machinery drives them, so all methods take `&self`.
pub trait Capability: DowncastSync {
	fn kind(&self) -> HandleKind;

	/// Reads a named property; unknown names read as `Null`.
	fn property(&self, name: &str) -> Result<Value>;

	fn set_property(&self, name: &str, value: Value) -> Result<()>;

	/// Reads from the nested settings namespace.
	fn setting(&self, name: &str) -> Result<Value> {
		Err(Error::Capability(format!(
			"{} has no setting '{name}'",
			self.kind().as_str()
		)))
	}

	fn set_setting(&self, name: &str, _value: Value) -> Result<()> {
		Err(Error::Capability(format!(
			"{} has no setting '{name}'",
			self.kind().as_str()
		)))
	}

	/// Invokes a native method.
	fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value>;

	/// Installs or clears the forwarder for a native event slot.
	fn set_event_slot(&self, event: &str, _slot: Option<EventSlot>) -> Result<()> {
		Err(Error::Capability(format!(
			"{} has no event slot '{event}'",
			self.kind().as_str()
		)))
	}

	/// Registers a hook to run when the object closes itself.
	fn on_closing(&self, _hook: ClosingHook) {}
}

impl_downcast!(sync Capability);

/// Creates the native objects the runtime manages.
///
/// Supplied once at startup; the runtime calls it for the two singletons and
/// for every `createHandle`.
pub trait CapabilityFactory: Send + Sync {
	/// Creates a page that will live under `key`.
	fn create_page(&self, key: &str, host: Host) -> Result<Arc<dyn Capability>>;

	/// Creates the process singleton.
	fn create_process(&self, host: Host) -> Result<Arc<dyn Capability>>;

	/// Creates the global window namespace.
	fn create_window(&self, host: Host) -> Result<Arc<dyn Capability>>;
}
