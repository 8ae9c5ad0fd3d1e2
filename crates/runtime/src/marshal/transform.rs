//! Transform markers and out-parameter binding.

use crate::error::{Error, Result};
use crate::object_space::{Handle, ObjectSpace};
use crate::runtime::Runtime;
use crate::value::Value;

/// `{transform: true, parent, method, target}` found inside parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformMarker {
	pub parent: String,
	pub method: String,
	pub target: Value,
}

impl TransformMarker {
	/// Recognises a marker; objects without `transform: true` are not markers.
	pub fn from_value(value: &Value) -> Result<Option<Self>> {
		let Value::Object(map) = value else {
			return Ok(None);
		};
		if !matches!(map.get("transform"), Some(Value::Bool(true))) {
			return Ok(None);
		}

		let field = |name: &str| {
			map.get(name)
				.and_then(Value::as_str)
				.map(str::to_string)
				.ok_or_else(|| Error::invalid_params("transform", format!("marker is missing '{name}'")))
		};
		Ok(Some(Self {
			parent: field("parent")?,
			method: field("method")?,
			target: map.get("target").cloned().unwrap_or_default(),
		}))
	}
}

/// Replaces every marker in `params` with the result of its method call.
///
/// A substituted marker is not descended into. Null children are skipped
/// without cutting short the walk over their siblings.
pub fn resolve_transforms(rt: &mut Runtime, params: &mut [Value]) -> Result<()> {
	for param in params.iter_mut() {
		resolve(rt, param)?;
	}
	Ok(())
}

fn resolve(rt: &mut Runtime, value: &mut Value) -> Result<()> {
	if let Some(marker) = TransformMarker::from_value(value)? {
		tracing::debug!(
			target: "bridge.marshal",
			parent = %marker.parent,
			method = %marker.method,
			"resolving transform"
		);
		*value = rt.invoke_method(&marker.parent, &marker.method, vec![marker.target])?;
		return Ok(());
	}

	match value {
		Value::Array(items) => {
			for item in items.iter_mut().filter(|item| !item.is_null()) {
				resolve(rt, item)?;
			}
		}
		Value::Object(map) => {
			for (_, child) in map.iter_mut().filter(|(_, child)| !child.is_null()) {
				resolve(rt, child)?;
			}
		}
		_ => {}
	}
	Ok(())
}

/// Registers every object carrying a scalar `target` under that key.
///
/// Numbers and booleans are keyed by their display form (`7` becomes
/// `"7"`). Each registered object is replaced by a [`Value::Ref`] so
/// callables bound to it see later mutations made through the object space.
pub fn bind_out_params(space: &mut ObjectSpace, args: Vec<Value>) -> Vec<Value> {
	args.into_iter()
		.map(|arg| {
			let Some(key) = arg.get("target").and_then(out_param_key) else {
				return arg;
			};
			tracing::debug!(target: "bridge.space", key = %key, "registered out-parameter");
			space.set(key.clone(), Handle::Value(arg));
			Value::Ref(key)
		})
		.collect()
}

fn out_param_key(target: &Value) -> Option<String> {
	match target {
		Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(target.to_display_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn object(pairs: &[(&str, Value)]) -> Value {
		Value::Object(pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect())
	}

	#[test]
	fn recognises_markers_only_with_transform_true() {
		let marker = object(&[
			("transform", Value::Bool(true)),
			("parent", Value::from("page$7")),
			("method", Value::from("title")),
		]);
		let parsed = TransformMarker::from_value(&marker).unwrap().unwrap();
		assert_eq!(parsed.parent, "page$7");
		assert_eq!(parsed.method, "title");
		assert!(parsed.target.is_null());

		let plain = object(&[("transform", Value::from("yes")), ("parent", Value::from("page$7"))]);
		assert!(TransformMarker::from_value(&plain).unwrap().is_none());
	}

	#[test]
	fn marker_without_method_is_invalid() {
		let marker = object(&[("transform", Value::Bool(true)), ("parent", Value::from("page$7"))]);
		assert!(matches!(
			TransformMarker::from_value(&marker),
			Err(Error::InvalidParams { .. })
		));
	}

	#[test]
	fn out_params_become_references() {
		let mut space = ObjectSpace::new();
		let args = vec![object(&[("target", Value::from("out$1")), ("n", Value::from(1i64))]), Value::from(3i64)];

		let bound = bind_out_params(&mut space, args);
		assert_eq!(bound[0], Value::Ref("out$1".to_string()));
		assert_eq!(bound[1], Value::from(3i64));
		assert!(matches!(space.get("out$1").unwrap(), Handle::Value(v) if v.get("n") == Some(&Value::from(1i64))));
	}

	#[test]
	fn numeric_targets_are_keyed_by_display_form() {
		let mut space = ObjectSpace::new();
		let args = vec![
			object(&[("target", Value::from(7i64)), ("n", Value::from(1i64))]),
			object(&[("target", Value::Null)]),
		];

		let bound = bind_out_params(&mut space, args);
		assert_eq!(bound[0], Value::Ref("7".to_string()));
		assert!(matches!(bound[1], Value::Object(_)));
		assert!(space.contains("7"));
		assert_eq!(space.len(), 1);
	}
}
