//! Callable values: revived remote closures, bound wrappers, and runtime natives.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::runtime::Runtime;
use crate::script::RemoteClosure;
use crate::value::Value;

/// Runtime-provided function body.
pub type NativeFn = Arc<dyn Fn(&mut Runtime, Vec<Value>) -> Result<Value> + Send + Sync>;

/// A value that can be invoked on the runtime executor.
///
/// Invocation always goes through [`Runtime::call`], which owns the object
/// space the callable may touch.
#[derive(Clone)]
pub enum Callable {
	/// Closure revived from a `function (...) { ... }` string.
	Remote(Arc<RemoteClosure>),
	/// Wrapper fixing the receiver and appending trailing arguments.
	Bound(Arc<Bound>),
	/// Function implemented by the runtime itself.
	Native(NativeFn),
}

/// Receiver and trailing arguments captured by [`Callable::bind`].
pub struct Bound {
	pub inner: Callable,
	pub receiver: Value,
	pub extra_args: Vec<Value>,
}

impl Callable {
	pub fn native<F>(f: F) -> Self
	where
		F: Fn(&mut Runtime, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
	{
		Callable::Native(Arc::new(f))
	}

	/// Wraps `self` so calls run with `receiver` as `this` and `extra_args`
	/// appended after the caller's arguments.
	pub fn bind(self, receiver: Value, extra_args: Vec<Value>) -> Self {
		Callable::Bound(Arc::new(Bound {
			inner: self,
			receiver,
			extra_args,
		}))
	}

	/// Identity comparison.
	pub fn ptr_eq(&self, other: &Callable) -> bool {
		match (self, other) {
			(Callable::Remote(a), Callable::Remote(b)) => Arc::ptr_eq(a, b),
			(Callable::Bound(a), Callable::Bound(b)) => Arc::ptr_eq(a, b),
			(Callable::Native(a), Callable::Native(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for Callable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Callable::Remote(closure) => write!(f, "Remote({})", closure.signature()),
			Callable::Bound(bound) => f
				.debug_struct("Bound")
				.field("inner", &bound.inner)
				.field("receiver", &bound.receiver)
				.field("extra_args", &bound.extra_args)
				.finish(),
			Callable::Native(_) => f.write_str("Native"),
		}
	}
}
