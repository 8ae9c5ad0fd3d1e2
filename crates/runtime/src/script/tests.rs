use std::sync::Arc;

use tokio::sync::mpsc;

use super::*;
use crate::callable::Callable;
use crate::capability::Host;
use crate::config::BridgeConfig;
use crate::memory::MemoryFactory;
use crate::object_space::Handle;

fn runtime() -> Runtime {
	let (host, _host_rx) = Host::channel();
	let (outbound, _outbound_rx) = mpsc::unbounded_channel();
	Runtime::new(Arc::new(BridgeConfig::default()), Arc::new(MemoryFactory), host, outbound).unwrap()
}

fn closure(source: &str) -> Callable {
	Callable::Remote(Arc::new(RemoteClosure::parse(source).unwrap()))
}

fn eval(rt: &mut Runtime, source: &str, args: Vec<Value>) -> Result<Value> {
	rt.call(&closure(source), Value::Null, args)
}

#[test]
fn candidates_require_function_keyword_boundary() {
	assert!(RemoteClosure::is_candidate("function (a) { return a; }"));
	assert!(RemoteClosure::is_candidate("function(){}"));
	assert!(RemoteClosure::is_candidate("function named(x) {}"));
	assert!(!RemoteClosure::is_candidate("functional"));
	assert!(!RemoteClosure::is_candidate("function toString() { [native code] }"));
	assert!(!RemoteClosure::is_candidate("a function"));
}

#[test]
fn parse_extracts_name_and_params() {
	let parsed = RemoteClosure::parse("function onData(a, b) { return a + b; }").unwrap();
	assert_eq!(parsed.name(), Some("onData"));
	assert_eq!(parsed.params(), ["a".to_string(), "b".to_string()]);
	assert_eq!(parsed.signature(), "onData(a, b)");

	let anonymous = RemoteClosure::parse("function () {}").unwrap();
	assert_eq!(anonymous.name(), None);
	assert!(anonymous.params().is_empty());
}

#[test]
fn malformed_shapes_are_rejected() {
	for source in [
		"function (a { return a; }",
		"function (a) return a;",
		"function (1a) {}",
		"function (a) { return function () {}; }",
		"function (a) { return a +; }",
		"function (a) { 'unterminated }",
	] {
		assert!(
			matches!(RemoteClosure::parse(source), Err(Error::MalformedCallable { .. })),
			"accepted {source}"
		);
	}
}

#[test]
fn evaluates_arithmetic_and_concatenation() {
	let mut rt = runtime();
	assert_eq!(
		eval(&mut rt, "function (a, b) { return a * 2 + b; }", vec![Value::from(3i64), Value::from(1i64)]).unwrap(),
		Value::from(7i64)
	);
	assert_eq!(
		eval(&mut rt, "function (a) { return 'n=' + a; }", vec![Value::from(2i64)]).unwrap(),
		Value::from("n=2")
	);
	assert_eq!(
		eval(&mut rt, "function (a) { return typeof a === 'undefined' ? 'none' : a; }", vec![]).unwrap(),
		Value::from("none")
	);
}

#[test]
fn control_flow_and_locals() {
	let mut rt = runtime();
	let source = "function (n) {
		var label;
		if (n > 10) { label = 'big'; } else if (n > 5) label = 'medium'; else { label = 'small' }
		return label;
	}";
	assert_eq!(eval(&mut rt, source, vec![Value::from(12i64)]).unwrap(), Value::from("big"));
	assert_eq!(eval(&mut rt, source, vec![Value::from(7i64)]).unwrap(), Value::from("medium"));
	assert_eq!(eval(&mut rt, source, vec![Value::from(1i64)]).unwrap(), Value::from("small"));
}

#[test]
fn push_mutates_member_chain() {
	let mut rt = runtime();
	let source = "function () { var box = { items: [1] }; box.items.push(2, 3); return box.items.join('-'); }";
	assert_eq!(eval(&mut rt, source, vec![]).unwrap(), Value::from("1-2-3"));
}

#[test]
fn this_reference_writes_through_object_space() {
	let mut rt = runtime();
	let mut map = crate::value::Map::new();
	map.insert("count".to_string(), Value::from(1i64));
	rt.space_mut().set("out$1", Handle::Value(Value::Object(map)));

	let bump = closure("function (by) { this.count = this.count + by; return this.count; }");
	let result = rt.call(&bump, Value::Ref("out$1".to_string()), vec![Value::from(4i64)]).unwrap();

	assert_eq!(result, Value::from(5i64));
	assert_eq!(rt.get_property("out$1", "count").unwrap(), Value::from(5i64));
}

#[test]
fn globals_resolve_through_window() {
	let mut rt = runtime();
	rt.set_global("greeting", Value::from("hi")).unwrap();

	let source = "function (name) { seen = name; return greeting + ' ' + name; }";
	assert_eq!(eval(&mut rt, source, vec![Value::from("ada")]).unwrap(), Value::from("hi ada"));
	assert_eq!(rt.global("seen").unwrap(), Value::from("ada"));
	assert!(rt.global("missing").unwrap().is_null());
}

#[test]
fn runaway_recursion_hits_depth_limit() {
	let mut rt = runtime();
	let looping = closure("function () { return again(); }");
	rt.set_global("again", Value::Callable(looping.clone())).unwrap();

	let err = rt.call(&looping, Value::Null, vec![]).unwrap_err();
	assert!(matches!(err, Error::Script { kind: "RangeError", .. }), "got {err}");
}

#[test]
fn reading_from_undefined_is_a_type_error() {
	let mut rt = runtime();
	let err = eval(&mut rt, "function (a) { return a.b; }", vec![]).unwrap_err();
	assert!(matches!(err, Error::Script { kind: "TypeError", .. }));
}

#[test]
fn bound_callables_append_extra_args() {
	let mut rt = runtime();
	let collect = closure("function (a, b, c) { return [a, b, c].join(','); }");
	let bound = collect.bind(Value::Null, vec![Value::from("c")]);
	let result = rt.call(&bound, Value::Null, vec![Value::from("a"), Value::from("b")]).unwrap();
	assert_eq!(result, Value::from("a,b,c"));
}

fn nesting_error(source: &str) -> bool {
	matches!(
		RemoteClosure::parse(source),
		Err(Error::MalformedCallable { ref reason }) if reason.contains("nested too deeply")
	)
}

#[test]
fn deep_nesting_is_rejected_before_evaluation() {
	let parens = format!("function () {{ return {}1{}; }}", "(".repeat(5000), ")".repeat(5000));
	assert!(nesting_error(&parens));

	let negations = format!("function () {{ return {}true; }}", "!".repeat(5000));
	assert!(nesting_error(&negations));

	let blocks = format!("function () {{ {}{} }}", "{".repeat(5000), "}".repeat(5000));
	assert!(nesting_error(&blocks));
}

#[test]
fn long_chains_count_toward_nesting() {
	let sum = format!("function () {{ return 1{}; }}", "+1".repeat(10_000));
	assert!(nesting_error(&sum));

	let members = format!("function (a) {{ return a{}; }}", ".b".repeat(10_000));
	assert!(nesting_error(&members));
}

#[test]
fn moderate_nesting_still_evaluates() {
	let mut rt = runtime();
	let source = format!("function () {{ return {}1{}{}; }}", "(".repeat(40), ")".repeat(40), "+1".repeat(100));
	assert_eq!(eval(&mut rt, &source, vec![]).unwrap(), Value::from(101i64));
}
