//! Tree-walking evaluator for remote closures.
//!
//! Handles reached through [`Value::Ref`] are read and written through the
//! runtime, so a closure mutating `this` or an out-parameter changes the
//! object space entry rather than a copy.

use std::collections::HashMap;

use super::RemoteClosure;
use super::parser::{BinaryOp, Expr, Key, Stmt, UnaryOp};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::value::{Map, Value};

/// Upper bound on sparse array growth through index assignment.
const MAX_ARRAY_GROWTH: usize = 1 << 16;

enum Flow {
	Normal,
	Return(Value),
}

struct Frame<'a> {
	rt: &'a mut Runtime,
	locals: HashMap<String, Value>,
	this: Value,
}

/// Runs `closure` with `this` bound to `receiver`.
pub(crate) fn run(rt: &mut Runtime, closure: &RemoteClosure, receiver: Value, args: Vec<Value>) -> Result<Value> {
	let mut locals = HashMap::new();
	for (i, name) in closure.params().iter().enumerate() {
		locals.insert(name.clone(), args.get(i).cloned().unwrap_or_default());
	}
	locals.entry("arguments".to_string()).or_insert(Value::Array(args));

	let mut frame = Frame {
		rt,
		locals,
		this: receiver,
	};
	match frame.block(closure.body())? {
		Flow::Return(value) => Ok(value),
		Flow::Normal => Ok(Value::Null),
	}
}

impl Frame<'_> {
	fn block(&mut self, stmts: &[Stmt]) -> Result<Flow> {
		for stmt in stmts {
			if let Flow::Return(value) = self.exec(stmt)? {
				return Ok(Flow::Return(value));
			}
		}
		Ok(Flow::Normal)
	}

	fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
		match stmt {
			Stmt::Return(expr) => {
				let value = match expr {
					Some(expr) => self.eval(expr)?,
					None => Value::Null,
				};
				Ok(Flow::Return(value))
			}
			Stmt::Let(name, init) => {
				let value = match init {
					Some(expr) => self.eval(expr)?,
					None => Value::Null,
				};
				self.locals.insert(name.clone(), value);
				Ok(Flow::Normal)
			}
			Stmt::If(cond, then, otherwise) => {
				if self.eval(cond)?.is_truthy() {
					self.exec(then)
				} else if let Some(otherwise) = otherwise {
					self.exec(otherwise)
				} else {
					Ok(Flow::Normal)
				}
			}
			Stmt::Block(stmts) => self.block(stmts),
			Stmt::Expr(expr) => {
				self.eval(expr)?;
				Ok(Flow::Normal)
			}
		}
	}

	fn eval(&mut self, expr: &Expr) -> Result<Value> {
		match expr {
			Expr::Literal(value) => Ok(value.clone()),
			Expr::This => Ok(self.this.clone()),
			Expr::Ident(name) => match self.locals.get(name) {
				Some(value) => Ok(value.clone()),
				None => self.rt.global(name),
			},
			Expr::Array(items) => {
				let values = items.iter().map(|item| self.eval(item)).collect::<Result<Vec<_>>>()?;
				Ok(Value::Array(values))
			}
			Expr::Object(props) => {
				let mut map = Map::new();
				for (key, value) in props {
					let value = self.eval(value)?;
					map.insert(key.clone(), value);
				}
				Ok(Value::Object(map))
			}
			Expr::Member(object, key) => {
				let object = self.eval(object)?;
				let name = self.key_name(key)?;
				self.member(&object, &name)
			}
			Expr::Call(callee, args) => self.call(callee, args),
			Expr::Assign(place, value) => {
				let value = self.eval(value)?;
				self.assign(place, value.clone())?;
				Ok(value)
			}
			Expr::Unary(op, operand) => {
				let value = self.eval(operand)?;
				Ok(match op {
					UnaryOp::Not => Value::Bool(!value.is_truthy()),
					UnaryOp::Neg => Value::from_f64(-value.to_number()),
					UnaryOp::TypeOf => Value::from(value.type_name()),
				})
			}
			Expr::Binary(BinaryOp::And, lhs, rhs) => {
				let lhs = self.eval(lhs)?;
				if lhs.is_truthy() { self.eval(rhs) } else { Ok(lhs) }
			}
			Expr::Binary(BinaryOp::Or, lhs, rhs) => {
				let lhs = self.eval(lhs)?;
				if lhs.is_truthy() { Ok(lhs) } else { self.eval(rhs) }
			}
			Expr::Binary(op, lhs, rhs) => {
				let lhs = self.eval(lhs)?;
				let rhs = self.eval(rhs)?;
				Ok(binary(*op, &lhs, &rhs))
			}
			Expr::Cond(cond, then, otherwise) => {
				if self.eval(cond)?.is_truthy() {
					self.eval(then)
				} else {
					self.eval(otherwise)
				}
			}
		}
	}

	fn key_name(&mut self, key: &Key) -> Result<String> {
		match key {
			Key::Name(name) => Ok(name.clone()),
			Key::Computed(expr) => Ok(self.eval(expr)?.to_display_string()),
		}
	}

	fn member(&mut self, object: &Value, name: &str) -> Result<Value> {
		match object {
			Value::Ref(key) => self.rt.get_property(key, name),
			Value::Object(map) => Ok(map.get(name).cloned().unwrap_or_default()),
			Value::Array(items) if name == "length" => Ok(Value::from(items.len() as i64)),
			Value::Array(items) => Ok(index(name)
				.and_then(|i| items.get(i))
				.cloned()
				.unwrap_or_default()),
			Value::String(s) if name == "length" => Ok(Value::from(s.chars().count() as i64)),
			Value::String(s) => Ok(index(name)
				.and_then(|i| s.chars().nth(i))
				.map(|c| Value::String(c.to_string()))
				.unwrap_or_default()),
			Value::Null => Err(Error::type_error(format!(
				"Cannot read property '{name}' of undefined"
			))),
			_ => Ok(Value::Null),
		}
	}

	fn call(&mut self, callee: &Expr, arg_exprs: &[Expr]) -> Result<Value> {
		if let Expr::Member(object_expr, key) = callee {
			let object = self.eval(object_expr)?;
			let name = self.key_name(key)?;
			let args = self.eval_args(arg_exprs)?;
			return self.call_method(object_expr, object, &name, args);
		}

		let function = self.eval(callee)?;
		let args = self.eval_args(arg_exprs)?;
		match function {
			Value::Callable(callable) => self.rt.call(&callable, Value::Null, args),
			other => Err(Error::type_error(format!("{} is not a function", other.type_name()))),
		}
	}

	fn eval_args(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
		exprs.iter().map(|expr| self.eval(expr)).collect()
	}

	fn call_method(&mut self, object_expr: &Expr, object: Value, name: &str, args: Vec<Value>) -> Result<Value> {
		match object {
			Value::Ref(key) => self.rt.invoke_method(&key, name, args),
			Value::Array(mut items) => match name {
				"push" => {
					items.extend(args);
					let len = items.len() as i64;
					self.write_back(object_expr, Value::Array(items))?;
					Ok(Value::from(len))
				}
				"join" => {
					let sep = args.first().and_then(Value::as_str).unwrap_or(",");
					let parts: Vec<String> = items
						.iter()
						.map(|item| if item.is_null() { String::new() } else { item.to_display_string() })
						.collect();
					Ok(Value::String(parts.join(sep)))
				}
				"indexOf" => {
					let needle = args.first().cloned().unwrap_or_default();
					let pos = items.iter().position(|item| *item == needle);
					Ok(Value::from(pos.map_or(-1, |p| p as i64)))
				}
				_ => Err(not_a_function(name)),
			},
			Value::String(s) => match name {
				"indexOf" => {
					let needle = args.first().map(Value::to_display_string).unwrap_or_default();
					let pos = s.find(&needle).map(|byte| s[..byte].chars().count() as i64);
					Ok(Value::from(pos.unwrap_or(-1)))
				}
				"toUpperCase" => Ok(Value::String(s.to_uppercase())),
				"toLowerCase" => Ok(Value::String(s.to_lowercase())),
				"trim" => Ok(Value::String(s.trim().to_string())),
				_ => Err(not_a_function(name)),
			},
			Value::Object(map) => match map.get(name) {
				Some(Value::Callable(callable)) => {
					let callable = callable.clone();
					self.rt.call(&callable, Value::Object(map), args)
				}
				_ => Err(not_a_function(name)),
			},
			Value::Null => Err(Error::type_error(format!(
				"Cannot read property '{name}' of undefined"
			))),
			_ => Err(not_a_function(name)),
		}
	}

	fn assign(&mut self, place: &Expr, value: Value) -> Result<()> {
		match place {
			Expr::Ident(name) => {
				if let Some(slot) = self.locals.get_mut(name) {
					*slot = value;
					Ok(())
				} else {
					self.rt.set_global(name, value)
				}
			}
			Expr::Member(object_expr, key) => {
				let object = self.eval(object_expr)?;
				let name = self.key_name(key)?;
				match object {
					Value::Ref(key) => self.rt.set_property(&key, &name, value),
					Value::Object(mut map) => {
						map.insert(name, value);
						self.write_back(object_expr, Value::Object(map))
					}
					Value::Array(mut items) => {
						let Some(i) = index(&name) else {
							return Ok(());
						};
						if i >= items.len() + MAX_ARRAY_GROWTH {
							return Err(Error::Script {
								kind: "RangeError",
								message: format!("array index {i} out of range"),
							});
						}
						if i >= items.len() {
							items.resize(i + 1, Value::Null);
						}
						items[i] = value;
						self.write_back(object_expr, Value::Array(items))
					}
					Value::Null => Err(Error::type_error(format!(
						"Cannot set property '{name}' of undefined"
					))),
					_ => Ok(()),
				}
			}
			_ => Err(Error::type_error("Invalid assignment target")),
		}
	}

	/// Stores a modified copy back where it was read from, when that is a place.
	fn write_back(&mut self, place: &Expr, value: Value) -> Result<()> {
		if place.is_place() {
			self.assign(place, value)
		} else {
			Ok(())
		}
	}
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
	match op {
		BinaryOp::Add => {
			if is_stringy(lhs) || is_stringy(rhs) {
				Value::String(lhs.to_display_string() + &rhs.to_display_string())
			} else {
				Value::from_f64(lhs.to_number() + rhs.to_number())
			}
		}
		BinaryOp::Sub => Value::from_f64(lhs.to_number() - rhs.to_number()),
		BinaryOp::Mul => Value::from_f64(lhs.to_number() * rhs.to_number()),
		BinaryOp::Div => Value::from_f64(lhs.to_number() / rhs.to_number()),
		BinaryOp::Rem => Value::from_f64(lhs.to_number() % rhs.to_number()),
		BinaryOp::StrictEq => Value::Bool(lhs == rhs),
		BinaryOp::StrictNotEq => Value::Bool(lhs != rhs),
		BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
		BinaryOp::NotEq => Value::Bool(!loose_eq(lhs, rhs)),
		BinaryOp::Lt => compare(lhs, rhs, |o| o.is_lt()),
		BinaryOp::LtEq => compare(lhs, rhs, |o| o.is_le()),
		BinaryOp::Gt => compare(lhs, rhs, |o| o.is_gt()),
		BinaryOp::GtEq => compare(lhs, rhs, |o| o.is_ge()),
		// Short-circuit operators are handled before both sides are evaluated.
		BinaryOp::And | BinaryOp::Or => Value::Null,
	}
}

fn is_stringy(value: &Value) -> bool {
	matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
	match (lhs, rhs) {
		(Value::Number(_), Value::String(_) | Value::Bool(_))
		| (Value::String(_) | Value::Bool(_), Value::Number(_))
		| (Value::Bool(_), Value::String(_))
		| (Value::String(_), Value::Bool(_)) => lhs.to_number() == rhs.to_number(),
		_ => lhs == rhs,
	}
}

fn compare(lhs: &Value, rhs: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
	let ordering = match (lhs, rhs) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		_ => lhs.to_number().partial_cmp(&rhs.to_number()),
	};
	Value::Bool(ordering.is_some_and(test))
}

fn index(name: &str) -> Option<usize> {
	name.parse().ok()
}

fn not_a_function(name: &str) -> Error {
	Error::type_error(format!("{name} is not a function"))
}
