//! Remote closures: callables sent over the channel as function source text.
//!
//! A closure arrives as `function [name](a, b) { body }`. It is parsed once at
//! decode time into parameter names and a statement list, then evaluated by
//! [`eval`] whenever it is called. Only the shape below is accepted; anything
//! else that claims to be a function is rejected rather than half-parsed.

mod eval;
mod lexer;
mod parser;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::value::Value;

pub(crate) use parser::Stmt;

const FUNCTION_KEYWORD: &str = "function";

/// Marker found in the source text of host-provided functions.
pub const NATIVE_CODE_MARKER: &str = "[native code]";

/// Callable reconstructed from source text.
#[derive(Debug)]
pub struct RemoteClosure {
	name: Option<String>,
	params: Vec<String>,
	body: Vec<Stmt>,
	source: String,
}

impl RemoteClosure {
	/// Returns true when `text` claims to be a function definition.
	///
	/// That is `function` followed by whitespace or `(`, without the
	/// native-code marker. Words like `functional` are plain strings.
	pub fn is_candidate(text: &str) -> bool {
		let Some(rest) = text.trim_start().strip_prefix(FUNCTION_KEYWORD) else {
			return false;
		};
		let introduces_signature = rest.starts_with('(') || rest.starts_with(char::is_whitespace);
		introduces_signature && !text.contains(NATIVE_CODE_MARKER)
	}

	/// Parses `function [name](params) { body }`.
	pub fn parse(source: &str) -> Result<Self> {
		let malformed = |reason: &str| Error::MalformedCallable {
			reason: reason.to_string(),
		};

		let text = source.trim();
		let rest = text
			.strip_prefix(FUNCTION_KEYWORD)
			.ok_or_else(|| malformed("missing 'function' keyword"))?;

		let open = rest.find('(').ok_or_else(|| malformed("missing '('"))?;
		let name = rest[..open].trim();
		if !name.is_empty() && !lexer::is_identifier(name) {
			return Err(malformed(&format!("invalid function name '{name}'")));
		}

		let close = rest[open..]
			.find(')')
			.map(|i| open + i)
			.ok_or_else(|| malformed("missing ')'"))?;
		let mut params = Vec::new();
		for param in rest[open + 1..close].split(',').map(str::trim) {
			if param.is_empty() {
				continue;
			}
			if !lexer::is_identifier(param) {
				return Err(malformed(&format!("invalid parameter '{param}'")));
			}
			params.push(param.to_string());
		}

		let tail = rest[close + 1..].trim();
		let body = tail
			.strip_prefix('{')
			.and_then(|t| t.strip_suffix('}'))
			.ok_or_else(|| malformed("body must be enclosed in braces"))?;

		let body = parser::parse_body(body).map_err(|reason| Error::MalformedCallable { reason })?;

		Ok(Self {
			name: (!name.is_empty()).then(|| name.to_string()),
			params,
			body,
			source: text.to_string(),
		})
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn params(&self) -> &[String] {
		&self.params
	}

	pub(crate) fn body(&self) -> &[Stmt] {
		&self.body
	}

	/// Original source text.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Short form used in logs, e.g. `onData(a, b)`.
	pub fn signature(&self) -> String {
		format!("{}({})", self.name().unwrap_or("anonymous"), self.params.join(", "))
	}

	/// Evaluates the body with `this` bound to `receiver`.
	pub(crate) fn call(&self, rt: &mut Runtime, receiver: Value, args: Vec<Value>) -> Result<Value> {
		eval::run(rt, self, receiver, args)
	}
}
