//! Native value model shared by the marshaler, dispatcher, and closure evaluator.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use crate::callable::Callable;

/// Ordered string-keyed map used for object values.
pub type Map = IndexMap<String, Value>;

/// A value crossing the bridge.
///
/// JSON-compatible data plus two bridge-specific kinds: callables and live
/// references to object space entries.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Number(Number),
	String(String),
	Array(Vec<Value>),
	Object(Map),
	Callable(Callable),
	/// Live reference to the object space entry under this key.
	Ref(String),
}

impl Value {
	/// Builds a number, keeping integral values in integer form.
	///
	/// Non-finite numbers have no JSON form and become `Null`.
	pub fn from_f64(n: f64) -> Value {
		if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
			return Value::Number(Number::from(n as i64));
		}
		Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn is_callable(&self) -> bool {
		matches!(self, Value::Callable(_))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_callable(&self) -> Option<&Callable> {
		match self {
			Value::Callable(c) => Some(c),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Map> {
		match self {
			Value::Object(map) => Some(map),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&Vec<Value>> {
		match self {
			Value::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Field lookup on object values; anything else has no fields.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_object().and_then(|map| map.get(key))
	}

	/// Truthiness in the closure language.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
			Value::String(s) => !s.is_empty(),
			Value::Array(_) | Value::Object(_) | Value::Callable(_) | Value::Ref(_) => true,
		}
	}

	/// Numeric coercion; `NaN` when there is no sensible number.
	pub fn to_number(&self) -> f64 {
		match self {
			Value::Null => 0.0,
			Value::Bool(b) => f64::from(u8::from(*b)),
			Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
			Value::String(s) => {
				let trimmed = s.trim();
				if trimmed.is_empty() {
					0.0
				} else {
					trimmed.parse().unwrap_or(f64::NAN)
				}
			}
			_ => f64::NAN,
		}
	}

	/// Name reported by `typeof`.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "undefined",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::String(_) => "string",
			Value::Callable(_) => "function",
			Value::Array(_) | Value::Object(_) | Value::Ref(_) => "object",
		}
	}

	/// String coercion used by `+` and `join`.
	pub fn to_display_string(&self) -> String {
		match self {
			Value::Null => "null".to_string(),
			Value::Bool(b) => b.to_string(),
			Value::Number(n) => match n.as_f64() {
				Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => format!("{}", f as i64),
				_ => n.to_string(),
			},
			Value::String(s) => s.clone(),
			Value::Array(items) => items
				.iter()
				.map(|v| if v.is_null() { String::new() } else { v.to_display_string() })
				.collect::<Vec<_>>()
				.join(","),
			Value::Object(_) => "[object Object]".to_string(),
			Value::Callable(_) => "function".to_string(),
			Value::Ref(key) => format!("[object {key}]"),
		}
	}

	/// Converts to plain JSON.
	///
	/// Callables have no JSON form and become `null`; references become
	/// `{"target": key}` so the controller can address them.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Null | Value::Callable(_) => serde_json::Value::Null,
			Value::Bool(b) => serde_json::Value::Bool(*b),
			Value::Number(n) => serde_json::Value::Number(n.clone()),
			Value::String(s) => serde_json::Value::String(s.clone()),
			Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
			Value::Object(map) => serde_json::Value::Object(
				map.iter()
					.map(|(k, v)| (k.clone(), v.to_json()))
					.collect(),
			),
			Value::Ref(key) => serde_json::json!({ "target": key }),
		}
	}
}

impl From<serde_json::Value> for Value {
	/// Plain conversion; strings stay strings. Use the marshaler to revive
	/// callables.
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(b),
			serde_json::Value::Number(n) => Value::Number(n),
			serde_json::Value::String(s) => Value::String(s),
			serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
			serde_json::Value::Object(map) => {
				Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
			}
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Number(Number::from(n))
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::from_f64(n)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::Array(items)
	}
}

impl From<Callable> for Value {
	fn from(callable: Callable) -> Self {
		Value::Callable(callable)
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Array(a), Value::Array(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => a == b,
			(Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
			(Value::Ref(a), Value::Ref(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => write!(f, "Bool({b})"),
			Value::Number(n) => write!(f, "Number({n})"),
			Value::String(s) => write!(f, "String({s:?})"),
			Value::Array(items) => f.debug_list().entries(items).finish(),
			Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
			Value::Callable(c) => fmt::Debug::fmt(c, f),
			Value::Ref(key) => write!(f, "Ref({key})"),
		}
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Value::Null | Value::Callable(_) => serializer.serialize_unit(),
			Value::Bool(b) => serializer.serialize_bool(*b),
			Value::Number(n) => n.serialize(serializer),
			Value::String(s) => serializer.serialize_str(s),
			Value::Array(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			Value::Object(map) => {
				let mut out = serializer.serialize_map(Some(map.len()))?;
				for (k, v) in map {
					out.serialize_entry(k, v)?;
				}
				out.end()
			}
			Value::Ref(key) => {
				let mut out = serializer.serialize_map(Some(1))?;
				out.serialize_entry("target", key)?;
				out.end()
			}
		}
	}
}
