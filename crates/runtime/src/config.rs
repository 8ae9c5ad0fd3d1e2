//! Runtime configuration.

use std::time::Duration;

use bridge_protocol::DEFAULT_HEARTBEAT_TOKEN;

/// Tunables for the bridge loop and key layout.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
	/// Inbound line treated as a heartbeat rather than a command.
	pub heartbeat_token: String,
	/// Pause before reading again after a heartbeat.
	pub heartbeat_delay: Duration,
	/// Separates the type tag from the id in object space keys (`page$7`).
	pub key_separator: char,
	/// Key the process singleton is registered under.
	pub process_key: String,
	/// Type tag for handles created by `createHandle`.
	pub page_prefix: String,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			heartbeat_token: DEFAULT_HEARTBEAT_TOKEN.to_string(),
			heartbeat_delay: Duration::from_millis(100),
			key_separator: '$',
			process_key: "phantom".to_string(),
			page_prefix: "page".to_string(),
		}
	}
}

impl BridgeConfig {
	/// Builds the object space key for a page created under `id`.
	pub fn page_key(&self, id: &str) -> String {
		format!("{}{}{}", self.page_prefix, self.key_separator, id)
	}

	/// Returns the type tag of `key`, i.e. everything before the separator.
	pub fn key_type<'a>(&self, key: &'a str) -> &'a str {
		key.split(self.key_separator).next().unwrap_or(key)
	}

	/// Event slots exist only on page handles, and only for `on*` names.
	pub fn supports_event(&self, key: &str, event: &str) -> bool {
		self.key_type(key) == self.page_prefix && event.starts_with("on")
	}
}
