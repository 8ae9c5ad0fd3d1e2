//! Newline-delimited text transport over any async byte pipe.
//!
//! [`PipeTransport`] wraps a reader/writer pair (stdin/stdout in the binary,
//! duplex pipes in tests) and splits into a [`LineReceiver`] owned by the
//! connection loop and a [`LineSender`] owned by the writer task.

#[cfg(test)]
mod tests;

use bridge_protocol::Outbound;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::error::Result;

/// Reader/writer pair carrying the line protocol.
pub struct PipeTransport<R, W> {
	reader: R,
	writer: W,
}

impl<R, W> PipeTransport<R, W>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W) -> Self {
		Self { reader, writer }
	}

	/// Splits into the writing and reading halves.
	pub fn into_parts(self) -> (LineSender<W>, LineReceiver<R>) {
		(
			LineSender { writer: self.writer },
			LineReceiver {
				lines: BufReader::new(self.reader).lines(),
			},
		)
	}
}

/// Reading half: yields inbound lines without their terminator.
pub struct LineReceiver<R> {
	lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineReceiver<R> {
	/// Next line, or `None` at end of input.
	///
	/// Cancel safe: a line is never split across calls.
	pub async fn next_line(&mut self) -> Result<Option<String>> {
		Ok(self.lines.next_line().await?)
	}
}

/// Writing half: one tagged line per outbound message.
pub struct LineSender<W> {
	writer: W,
}

impl<W: AsyncWrite + Unpin> LineSender<W> {
	/// Encodes `line`, appends `\n`, and flushes.
	pub async fn send(&mut self, line: &Outbound) -> Result<()> {
		let mut encoded = line.encode()?;
		tracing::trace!(target: "bridge.transport", line = %encoded, "writing line");
		encoded.push('\n');
		self.writer.write_all(encoded.as_bytes()).await?;
		self.writer.flush().await?;
		Ok(())
	}

	pub async fn shutdown(&mut self) -> Result<()> {
		self.writer.shutdown().await?;
		Ok(())
	}
}
