//! The `bridge` binary: stdin/stdout wired to the bridge loop.

pub mod cli;
pub mod logging;

use std::sync::Arc;

use anyhow::Context;
use bridge_runtime::{BridgeConfig, Connection, MemoryFactory, PipeTransport};

/// Serves the line protocol on stdin/stdout until input closes or the
/// controller asks the process to exit.
pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
	let transport = PipeTransport::new(tokio::io::stdin(), tokio::io::stdout());
	let connection =
		Connection::new(transport, Arc::new(MemoryFactory), config).context("failed to initialize bridge runtime")?;
	connection.run().await.context("bridge loop failed")?;
	Ok(())
}
