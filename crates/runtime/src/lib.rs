//! Bridge Runtime - object space, command dispatch, and event fan-out
//!
//! This crate executes the line protocol defined in `bridge-protocol` against
//! a registry of live objects supplied by a capability backend:
//!
//! - **Object space**: handles keyed by string (`page$7`, `phantom`)
//! - **Marshaling**: reviving `function (...) { ... }` strings into remote
//!   closures and resolving transform markers before dispatch
//! - **Dispatch**: the fixed table of built-in commands
//! - **Events**: per-(target, event) listener entries with a channel forwarder
//! - **Connection**: the single-owner read/execute/write loop with heartbeat
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  controller  │  writes commands, reads `>`/`<event>` lines
//! └──────┬───────┘
//!        │ stdin/stdout
//! ┌──────▼───────┐
//! │  Connection  │  select: host messages > heartbeat pause > next line
//! │  ┌────────┐  │
//! │  │Runtime │  │  object space, listeners, dispatch, closures
//! │  └───▲────┘  │
//! │      │ Host  │
//! │  ┌───┴────┐  │
//! │  │Backend │  │  CapabilityFactory (MemoryFactory by default)
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! # Decoupling via CapabilityFactory
//!
//! The runtime never sees concrete page or process types. Backends implement
//! [`Capability`] and hand results back through [`Host`], which queues work
//! for the loop instead of touching runtime state.

pub mod callable;
pub mod capability;
pub mod command;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod marshal;
pub mod memory;
pub mod object_space;
pub mod runtime;
pub mod script;
pub mod transport;
pub mod value;

// Re-export key types at crate root
pub use callable::Callable;
pub use capability::{
	Capability, CapabilityFactory, ClosingHook, EventSlot, HandleKind, Host, HostMessage, HostReceiver,
};
pub use command::Command;
pub use config::BridgeConfig;
pub use connection::Connection;
pub use dispatch::{Completion, lookup_command};
pub use error::{Error, Result};
pub use memory::MemoryFactory;
pub use object_space::{Handle, ObjectSpace};
pub use runtime::Runtime;
pub use script::RemoteClosure;
pub use transport::PipeTransport;
pub use value::{Map, Value};
