//! In-memory capability backend.
//!
//! Pages keep their properties and settings in maps and raise their native
//! events synchronously from method calls, which is enough to drive every
//! bridge command end to end without a browser.

mod page;
mod process;
mod window;

use std::sync::Arc;

pub use page::MemoryPage;
pub use process::MemoryProcess;
pub use window::MemoryWindow;

use crate::capability::{Capability, CapabilityFactory, Host};
use crate::error::Result;

/// Factory producing [`MemoryPage`], [`MemoryProcess`], and [`MemoryWindow`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryFactory;

impl CapabilityFactory for MemoryFactory {
	fn create_page(&self, key: &str, host: Host) -> Result<Arc<dyn Capability>> {
		tracing::debug!(target: "bridge.memory", key = %key, "creating page");
		Ok(Arc::new(MemoryPage::new(key, host)))
	}

	fn create_process(&self, host: Host) -> Result<Arc<dyn Capability>> {
		Ok(Arc::new(MemoryProcess::new(host)))
	}

	fn create_window(&self, _host: Host) -> Result<Arc<dyn Capability>> {
		Ok(Arc::new(MemoryWindow::new()))
	}
}
