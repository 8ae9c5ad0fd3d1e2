//! Wire types for the object bridge line protocol.
//!
//! The controller and the bridge exchange newline-terminated text lines over a
//! single channel (normally stdin/stdout of the worker process):
//!
//! - **Inbound**: one JSON [`CommandEnvelope`] per line, or the bare heartbeat
//!   token.
//! - **Outbound**: tagged lines, see [`Outbound`]:
//!   - `>{...}` completed command (the envelope echoed with `response`/`error`)
//!   - `<event>{...}` event notification ([`EventNotification`])
//!   - `>NOOP` heartbeat acknowledgement
//!
//! This crate only knows about JSON. Callable values and object references are
//! layered on top by `bridge-runtime`.

mod command;
mod error;
mod line;

pub use command::{CommandEnvelope, EventNotification};
pub use error::{ProtocolError, Result};
pub use line::{DEFAULT_HEARTBEAT_TOKEN, EVENT_PREFIX, Inbound, Outbound, RESPONSE_PREFIX};
