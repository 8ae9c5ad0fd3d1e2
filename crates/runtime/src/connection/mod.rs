//! The bridge read-execute-write loop.
//!
//! One task owns the [`Runtime`] and multiplexes three sources:
//!
//! - host messages queued by capabilities (event triggers, deferred
//!   callbacks, closings, shutdown), served first;
//! - the heartbeat pause, during which no line is read;
//! - the next inbound line.
//!
//! Every outbound line goes through a single writer task, so lines appear on
//! the channel in the order they were produced.


use std::sync::Arc;

use bridge_protocol::{Inbound, Outbound};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::capability::{CapabilityFactory, Host, HostReceiver};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::transport::{LineReceiver, LineSender, PipeTransport};

/// A bridge bound to one transport.
pub struct Connection<R, W> {
	runtime: Runtime,
	host_rx: HostReceiver,
	receiver: LineReceiver<R>,
	sender: LineSender<W>,
	outbound_rx: mpsc::UnboundedReceiver<Outbound>,
	config: Arc<BridgeConfig>,
}

impl<R, W> Connection<R, W>
where
	R: AsyncRead + Unpin + Send + 'static,
	W: AsyncWrite + Unpin + Send + 'static,
{
	/// Builds the runtime (registering the process singleton) over `transport`.
	pub fn new(
		transport: PipeTransport<R, W>,
		factory: Arc<dyn CapabilityFactory>,
		config: BridgeConfig,
	) -> Result<Self> {
		let config = Arc::new(config);
		let (sender, receiver) = transport.into_parts();
		let (host, host_rx) = Host::channel();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let runtime = Runtime::new(Arc::clone(&config), factory, host, outbound_tx)?;

		Ok(Self {
			runtime,
			host_rx,
			receiver,
			sender,
			outbound_rx,
			config,
		})
	}

	/// Access to the runtime before the loop starts (e.g. to pre-register
	/// handles).
	pub fn runtime_mut(&mut self) -> &mut Runtime {
		&mut self.runtime
	}

	/// Runs until end of input or a shutdown request, then flushes the writer.
	pub async fn run(self) -> Result<()> {
		let Self {
			mut runtime,
			mut host_rx,
			mut receiver,
			mut sender,
			mut outbound_rx,
			config,
		} = self;

		let writer = tokio::spawn(async move {
			while let Some(line) = outbound_rx.recv().await {
				if let Err(e) = sender.send(&line).await {
					tracing::error!(target: "bridge.transport", error = %e, "write failed");
					return Err(e);
				}
			}
			sender.shutdown().await
		});

		tracing::info!(target: "bridge.transport", process = %config.process_key, "bridge loop started");

		let mut resume_at: Option<Instant> = None;
		let result = loop {
			if runtime.shutdown_requested() {
				break Ok(());
			}

			tokio::select! {
				biased;

				Some(message) = host_rx.recv() => runtime.handle_host(message),

				_ = sleep_until(resume_at.unwrap_or_else(Instant::now)), if resume_at.is_some() => {
					resume_at = None;
				}

				line = receiver.next_line(), if resume_at.is_none() => match line {
					Ok(Some(line)) => match Inbound::classify(&line, &config.heartbeat_token) {
						Inbound::Empty => {}
						Inbound::Heartbeat => {
							tracing::trace!(target: "bridge.transport", "heartbeat");
							runtime.emit(Outbound::Heartbeat(config.heartbeat_token.clone()));
							resume_at = Some(Instant::now() + config.heartbeat_delay);
						}
						Inbound::Command(body) => runtime.execute_line(body),
					},
					Ok(None) => {
						tracing::info!(target: "bridge.transport", "input closed");
						break Ok(());
					}
					Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
						tracing::warn!(target: "bridge.transport", error = %e, "dropping non-UTF-8 line");
					}
					Err(e) => break Err(e),
				},
			}
		};

		// Let already-queued callbacks and events reach the channel.
		while let Ok(message) = host_rx.try_recv() {
			runtime.handle_host(message);
		}
		drop(runtime);

		match writer.await {
			Ok(Ok(())) => {}
			Ok(Err(e)) => return result.and(Err(e)),
			Err(e) => {
				tracing::error!(target: "bridge.transport", error = %e, "writer task failed");
				return result.and(Err(Error::ChannelClosed));
			}
		}
		tracing::info!(target: "bridge.transport", "bridge loop stopped");
		result
	}
}
