use parking_lot::Mutex;

use crate::capability::{Capability, HandleKind, Host};
use crate::error::{Error, Result};
use crate::value::{Map, Value};

/// The process singleton: version info, a cookie jar, and `exit`.
pub struct MemoryProcess {
	host: Host,
	properties: Mutex<Map>,
}

impl MemoryProcess {
	pub fn new(host: Host) -> Self {
		let mut properties = Map::new();
		properties.insert("version".to_string(), version());
		properties.insert("cookiesEnabled".to_string(), Value::Bool(true));
		properties.insert("cookies".to_string(), Value::Array(Vec::new()));
		Self {
			host,
			properties: Mutex::new(properties),
		}
	}

	pub fn cookies(&self) -> Vec<Value> {
		self.properties
			.lock()
			.get("cookies")
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default()
	}

	fn with_cookies<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
		let mut properties = self.properties.lock();
		let cookies = properties
			.entry("cookies".to_string())
			.or_insert_with(|| Value::Array(Vec::new()));
		if !matches!(cookies, Value::Array(_)) {
			*cookies = Value::Array(Vec::new());
		}
		match cookies {
			Value::Array(items) => f(items),
			_ => f(&mut Vec::new()),
		}
	}
}

impl Capability for MemoryProcess {
	fn kind(&self) -> HandleKind {
		HandleKind::Process
	}

	fn property(&self, name: &str) -> Result<Value> {
		Ok(self.properties.lock().get(name).cloned().unwrap_or_default())
	}

	fn set_property(&self, name: &str, value: Value) -> Result<()> {
		if name == "version" {
			return Err(Error::Capability("version is read-only".to_string()));
		}
		self.properties.lock().insert(name.to_string(), value);
		Ok(())
	}

	fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
		match method {
			"addCookie" => {
				let cookie = args.into_iter().next().unwrap_or_default();
				let Some(name) = cookie.get("name").and_then(Value::as_str).map(str::to_string) else {
					return Ok(Value::Bool(false));
				};
				self.with_cookies(|cookies| {
					cookies.retain(|c| c.get("name").and_then(Value::as_str) != Some(name.as_str()));
					cookies.push(cookie);
				});
				Ok(Value::Bool(true))
			}
			"deleteCookie" => {
				let name = args.first().map(Value::to_display_string).unwrap_or_default();
				let removed = self.with_cookies(|cookies| {
					let before = cookies.len();
					cookies.retain(|c| c.get("name").and_then(Value::as_str) != Some(name.as_str()));
					before != cookies.len()
				});
				Ok(Value::Bool(removed))
			}
			"clearCookies" => {
				self.with_cookies(Vec::clear);
				Ok(Value::Null)
			}
			"exit" => {
				let code = args.first().map(Value::to_number).unwrap_or(0.0);
				tracing::info!(target: "bridge.memory", code, "exit requested");
				self.host.shutdown();
				Ok(Value::Null)
			}
			_ => Err(Error::MethodNotFound {
				key: HandleKind::Process.as_str().to_string(),
				method: method.to_string(),
			}),
		}
	}
}

fn version() -> Value {
	let mut map = Map::new();
	let mut parts = env!("CARGO_PKG_VERSION").split('.').map(|p| p.parse::<i64>().unwrap_or(0));
	for field in ["major", "minor", "patch"] {
		map.insert(field.to_string(), Value::from(parts.next().unwrap_or(0)));
	}
	Value::Object(map)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::capability::HostMessage;

	fn cookie(name: &str, value: &str) -> Value {
		let mut map = Map::new();
		map.insert("name".to_string(), Value::from(name));
		map.insert("value".to_string(), Value::from(value));
		Value::Object(map)
	}

	#[test]
	fn cookie_jar_replaces_by_name() {
		let (host, _rx) = Host::channel();
		let process = MemoryProcess::new(host);

		assert_eq!(process.invoke("addCookie", vec![cookie("a", "1")]).unwrap(), Value::Bool(true));
		process.invoke("addCookie", vec![cookie("a", "2")]).unwrap();
		process.invoke("addCookie", vec![cookie("b", "3")]).unwrap();
		assert_eq!(process.cookies(), vec![cookie("a", "2"), cookie("b", "3")]);

		assert_eq!(process.invoke("deleteCookie", vec![Value::from("a")]).unwrap(), Value::Bool(true));
		assert_eq!(process.invoke("deleteCookie", vec![Value::from("a")]).unwrap(), Value::Bool(false));
		process.invoke("clearCookies", vec![]).unwrap();
		assert!(process.cookies().is_empty());
	}

	#[test]
	fn exit_requests_shutdown() {
		let (host, mut rx) = Host::channel();
		let process = MemoryProcess::new(host);
		process.invoke("exit", vec![Value::from(0i64)]).unwrap();
		assert!(matches!(rx.try_recv(), Ok(HostMessage::Shutdown)));
	}

	#[test]
	fn version_is_read_only() {
		let (host, _rx) = Host::channel();
		let process = MemoryProcess::new(host);
		assert!(process.set_property("version", Value::Null).is_err());
		assert!(process.property("version").unwrap().get("major").is_some());
	}
}
