use parking_lot::Mutex;

use crate::capability::{Capability, HandleKind};
use crate::error::{Error, Result};
use crate::value::{Map, Value};

/// Free-form global namespace behind `windowProperty` and closure globals.
#[derive(Default)]
pub struct MemoryWindow {
	globals: Mutex<Map>,
}

impl MemoryWindow {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Capability for MemoryWindow {
	fn kind(&self) -> HandleKind {
		HandleKind::Window
	}

	fn property(&self, name: &str) -> Result<Value> {
		Ok(self.globals.lock().get(name).cloned().unwrap_or_default())
	}

	fn set_property(&self, name: &str, value: Value) -> Result<()> {
		self.globals.lock().insert(name.to_string(), value);
		Ok(())
	}

	fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
		Err(Error::MethodNotFound {
			key: HandleKind::Window.as_str().to_string(),
			method: method.to_string(),
		})
	}
}
