//! [`MemoryPage`]: a page that navigates nowhere but behaves like one.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::callable::Callable;
use crate::capability::{Capability, ClosingHook, EventSlot, HandleKind, Host};
use crate::error::{Error, Result};
use crate::value::{Map, Value};

const BLANK_URL: &str = "about:blank";
const BLANK_CONTENT: &str = "<html><head></head><body></body></html>";
const DEFAULT_USER_AGENT: &str = concat!("Mozilla/5.0 (Unknown; Linux x86_64) bridge/", env!("CARGO_PKG_VERSION"));

/// In-memory page keyed by its object space key.
pub struct MemoryPage {
	key: String,
	host: Host,
	state: Mutex<PageState>,
}

struct PageState {
	properties: Map,
	settings: Map,
	/// Forwarders installed by the listener registry.
	slots: HashMap<String, EventSlot>,
	closing: Vec<ClosingHook>,
	closed: bool,
}

impl MemoryPage {
	pub fn new(key: &str, host: Host) -> Self {
		let mut properties = Map::new();
		properties.insert("url".to_string(), Value::from(BLANK_URL));
		properties.insert("title".to_string(), Value::from(""));
		properties.insert("content".to_string(), Value::from(BLANK_CONTENT));
		properties.insert("viewportSize".to_string(), size(400, 300));
		properties.insert("zoomFactor".to_string(), Value::from(1i64));

		let mut settings = Map::new();
		settings.insert("userAgent".to_string(), Value::from(DEFAULT_USER_AGENT));
		settings.insert("javascriptEnabled".to_string(), Value::Bool(true));
		settings.insert("loadImages".to_string(), Value::Bool(true));
		settings.insert("resourceTimeout".to_string(), Value::Null);

		Self {
			key: key.to_string(),
			host,
			state: Mutex::new(PageState {
				properties,
				settings,
				slots: HashMap::new(),
				closing: Vec::new(),
				closed: false,
			}),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn url(&self) -> String {
		self.state
			.lock()
			.properties
			.get("url")
			.map(Value::to_display_string)
			.unwrap_or_default()
	}

	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}

	/// Whether a forwarder is currently attached to `event`.
	pub fn has_slot(&self, event: &str) -> bool {
		self.state.lock().slots.contains_key(event)
	}

	/// Raises a native event; without an attached forwarder nothing happens.
	pub fn fire(&self, event: &str, args: Vec<Value>) {
		let slot = self.state.lock().slots.get(event).cloned();
		match slot {
			Some(slot) => slot.fire(args),
			None => tracing::trace!(target: "bridge.memory", key = %self.key, event, "no forwarder attached"),
		}
	}

	fn set_content(&self, content: String, url: Option<String>) {
		let mut state = self.state.lock();
		let title = extract_title(&content).unwrap_or_default();
		state.properties.insert("title".to_string(), Value::from(title));
		state.properties.insert("content".to_string(), Value::from(content));
		if let Some(url) = url {
			state.properties.insert("url".to_string(), Value::from(url));
		}
	}

	fn open(&self, args: Vec<Value>) -> Result<Value> {
		let (callback, args) = split_callback(args);
		let url = args
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| Error::Capability("open: expected url".to_string()))?
			.to_string();

		self.fire("onLoadStarted", Vec::new());
		self.state
			.lock()
			.properties
			.insert("url".to_string(), Value::from(url.clone()));
		self.fire("onUrlChanged", vec![Value::from(url.clone())]);
		self.set_content(BLANK_CONTENT.to_string(), Some(url));
		self.fire("onLoadFinished", vec![Value::from("success")]);

		if let Some(callback) = callback {
			self.host.call(callback, vec![Value::from("success")]);
		}
		Ok(Value::Null)
	}

	fn close(&self) {
		let hooks = {
			let mut state = self.state.lock();
			if state.closed {
				return;
			}
			state.closed = true;
			state.slots.clear();
			std::mem::take(&mut state.closing)
		};
		tracing::debug!(target: "bridge.memory", key = %self.key, "page closing");
		for hook in hooks {
			hook.fire();
		}
	}
}

impl Capability for MemoryPage {
	fn kind(&self) -> HandleKind {
		HandleKind::Page
	}

	fn property(&self, name: &str) -> Result<Value> {
		Ok(self.state.lock().properties.get(name).cloned().unwrap_or_default())
	}

	fn set_property(&self, name: &str, value: Value) -> Result<()> {
		if name == "content" {
			self.set_content(value.to_display_string(), None);
			return Ok(());
		}
		self.state.lock().properties.insert(name.to_string(), value);
		Ok(())
	}

	fn setting(&self, name: &str) -> Result<Value> {
		Ok(self.state.lock().settings.get(name).cloned().unwrap_or_default())
	}

	fn set_setting(&self, name: &str, value: Value) -> Result<()> {
		self.state.lock().settings.insert(name.to_string(), value);
		Ok(())
	}

	fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
		match method {
			"open" => self.open(args),
			"setContent" => {
				let mut args = args.into_iter();
				let content = args.next().map(|v| v.to_display_string()).unwrap_or_default();
				let url = args.next().and_then(|v| v.as_str().map(str::to_string));
				self.set_content(content, url);
				self.fire("onLoadFinished", vec![Value::from("success")]);
				Ok(Value::Null)
			}
			"title" => self.property("title"),
			"evaluate" => {
				let mut args = args.into_iter();
				match args.next() {
					Some(Value::Callable(callable)) => {
						self.host.call(callable, args.collect());
						Ok(Value::Null)
					}
					_ => Err(Error::Capability("evaluate: expected a function".to_string())),
				}
			}
			"reload" => {
				self.fire("onLoadStarted", Vec::new());
				self.fire("onLoadFinished", vec![Value::from("success")]);
				Ok(Value::Null)
			}
			"close" => {
				self.close();
				Ok(Value::Null)
			}
			_ => Err(Error::MethodNotFound {
				key: self.key.clone(),
				method: method.to_string(),
			}),
		}
	}

	fn set_event_slot(&self, event: &str, slot: Option<EventSlot>) -> Result<()> {
		if !event.starts_with("on") {
			return Err(Error::Capability(format!("page has no event slot '{event}'")));
		}
		let mut state = self.state.lock();
		match slot {
			Some(slot) => {
				state.slots.insert(event.to_string(), slot);
			}
			None => {
				state.slots.remove(event);
			}
		}
		Ok(())
	}

	fn on_closing(&self, hook: ClosingHook) {
		self.state.lock().closing.push(hook);
	}
}

/// Splits off a trailing callable argument.
fn split_callback(mut args: Vec<Value>) -> (Option<Callable>, Vec<Value>) {
	match args.last() {
		Some(Value::Callable(_)) => match args.pop() {
			Some(Value::Callable(callback)) => (Some(callback), args),
			_ => (None, args),
		},
		_ => (None, args),
	}
}

fn extract_title(content: &str) -> Option<&str> {
	let start = content.find("<title>")? + "<title>".len();
	let end = content[start..].find("</title>")? + start;
	Some(content[start..end].trim())
}

fn size(width: i64, height: i64) -> Value {
	let mut map = Map::new();
	map.insert("width".to_string(), Value::from(width));
	map.insert("height".to_string(), Value::from(height));
	Value::Object(map)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::capability::HostMessage;

	#[test]
	fn set_content_derives_title() {
		let (host, _rx) = Host::channel();
		let page = MemoryPage::new("page$1", host);
		page.invoke(
			"setContent",
			vec![Value::from("<html><title> Hello </title></html>"), Value::from("http://local/")],
		)
		.unwrap();
		assert_eq!(page.property("title").unwrap(), Value::from("Hello"));
		assert_eq!(page.url(), "http://local/");
	}

	#[test]
	fn fire_without_slot_is_silent() {
		let (host, mut rx) = Host::channel();
		let page = MemoryPage::new("page$1", host);
		page.fire("onLoadFinished", vec![]);
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn open_fires_attached_slots_in_order() {
		let (host, mut rx) = Host::channel();
		let page = MemoryPage::new("page$1", host.clone());
		page.set_event_slot("onLoadStarted", Some(EventSlot::new("page$1", "onLoadStarted", host.clone())))
			.unwrap();
		page.set_event_slot("onLoadFinished", Some(EventSlot::new("page$1", "onLoadFinished", host)))
			.unwrap();

		page.invoke("open", vec![Value::from("http://example.test/")]).unwrap();

		let events: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
			.filter_map(|m| match m {
				HostMessage::Trigger { event, .. } => Some(event),
				_ => None,
			})
			.collect();
		assert_eq!(events, vec!["onLoadStarted", "onLoadFinished"]);
		assert_eq!(page.url(), "http://example.test/");
	}

	#[test]
	fn close_fires_hooks_once() {
		let (host, mut rx) = Host::channel();
		let page = MemoryPage::new("page$1", host.clone());
		page.on_closing(ClosingHook::new("page$1", host));

		page.invoke("close", vec![]).unwrap();
		page.invoke("close", vec![]).unwrap();

		assert!(matches!(rx.try_recv(), Ok(HostMessage::Closed { ref key }) if key == "page$1"));
		assert!(rx.try_recv().is_err());
		assert!(page.is_closed());
	}

	#[test]
	fn unknown_method_is_not_found() {
		let (host, _rx) = Host::channel();
		let page = MemoryPage::new("page$1", host);
		assert!(matches!(page.invoke("fly", vec![]), Err(Error::MethodNotFound { .. })));
	}
}
