//! End-to-end tests driving a [`Connection`] line by line over duplex pipes.

use std::sync::Arc;
use std::time::Duration;

use bridge_protocol::{EventNotification, Outbound};
use bridge_runtime::{
	BridgeConfig, Capability, CapabilityFactory, Connection, Error, HandleKind, Host, MemoryFactory, PipeTransport,
	Result, Value,
};
use parking_lot::Mutex;
use serde_json::{Value as Json, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, duplex};
use tokio::task::JoinHandle;

struct Bridge {
	input: DuplexStream,
	output: Lines<BufReader<DuplexStream>>,
	task: JoinHandle<Result<()>>,
}

impl Bridge {
	fn start(factory: Arc<dyn CapabilityFactory>) -> Self {
		let (input_read, input) = duplex(64 * 1024);
		let (output_read, output_write) = duplex(64 * 1024);
		let connection = Connection::new(
			PipeTransport::new(input_read, output_write),
			factory,
			BridgeConfig {
				heartbeat_delay: Duration::from_millis(10),
				..Default::default()
			},
		)
		.unwrap();

		Self {
			input,
			output: BufReader::new(output_read).lines(),
			task: tokio::spawn(connection.run()),
		}
	}

	async fn send(&mut self, command: Json) {
		self.send_raw(&command.to_string()).await;
	}

	async fn send_raw(&mut self, line: &str) {
		self.input.write_all(format!("{line}\n").as_bytes()).await.unwrap();
	}

	async fn next(&mut self) -> Outbound {
		let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
			.await
			.expect("timed out")
			.unwrap()
			.expect("bridge closed its output");
		Outbound::parse(&line, "NOOP").unwrap()
	}

	async fn response(&mut self) -> Json {
		match self.next().await {
			Outbound::Response(envelope) => serde_json::to_value(envelope).unwrap(),
			other => panic!("expected a response line, got {other:?}"),
		}
	}

	async fn event(&mut self) -> EventNotification {
		match self.next().await {
			Outbound::Event(note) => note,
			other => panic!("expected an event line, got {other:?}"),
		}
	}

	/// Closes input and returns whatever the bridge wrote before exiting.
	async fn close(mut self) -> Vec<Outbound> {
		drop(self.input);
		self.task.await.unwrap().unwrap();
		let mut rest = Vec::new();
		while let Some(line) = self.output.next_line().await.unwrap() {
			rest.push(Outbound::parse(&line, "NOOP").unwrap());
		}
		rest
	}
}

/// Records what it was asked so tests can see exactly which call arrived.
#[derive(Default)]
struct Recorder {
	calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Capability for Recorder {
	fn kind(&self) -> HandleKind {
		HandleKind::Page
	}

	fn property(&self, _name: &str) -> Result<Value> {
		Ok(Value::Null)
	}

	fn set_property(&self, _name: &str, _value: Value) -> Result<()> {
		Ok(())
	}

	fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
		self.calls.lock().push((method.to_string(), args.clone()));
		match method {
			"title" => Ok(Value::from(format!("title({})", args.len()))),
			"echo" => Ok(Value::Array(args)),
			_ => Err(Error::MethodNotFound {
				key: String::new(),
				method: method.to_string(),
			}),
		}
	}
}

struct RecorderFactory {
	recorder: Arc<Recorder>,
}

impl CapabilityFactory for RecorderFactory {
	fn create_page(&self, _key: &str, _host: Host) -> Result<Arc<dyn Capability>> {
		Ok(self.recorder.clone())
	}

	fn create_process(&self, host: Host) -> Result<Arc<dyn Capability>> {
		MemoryFactory.create_process(host)
	}

	fn create_window(&self, host: Host) -> Result<Arc<dyn Capability>> {
		MemoryFactory.create_window(host)
	}
}

#[tokio::test]
async fn unknown_commands_are_reported_and_the_loop_continues() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));

	bridge.send(json!({"id": 1, "name": "doesNotExist"})).await;
	let response = bridge.response().await;
	assert_eq!(response["id"], 1);
	assert!(response["error"].as_str().unwrap().contains("doesNotExist"));

	bridge.send(json!({"id": 2, "name": "noop"})).await;
	assert_eq!(bridge.response().await["id"], 2);
}

#[tokio::test]
async fn create_handle_then_setting_round_trip() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));

	bridge.send(json!({"id": "7", "name": "createHandle"})).await;
	assert_eq!(bridge.response().await["response"], json!({"pageId": "7"}));

	bridge
		.send(json!({"id": "8", "name": "setting", "target": "page$7", "params": ["loadImages", false]}))
		.await;
	bridge.response().await;

	bridge
		.send(json!({"id": "9", "name": "setting", "target": "page$7", "params": ["loadImages"]}))
		.await;
	assert_eq!(bridge.response().await["response"], json!(false));
}

#[tokio::test]
async fn property_round_trip_keeps_exact_value() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 1, "name": "createHandle"})).await;
	bridge.response().await;

	let value = json!({"width": 1024, "height": 768, "nested": [1, "two", null, true]});
	bridge
		.send(json!({"name": "property", "target": "page$1", "params": ["viewportSize", value]}))
		.await;
	bridge.response().await;

	bridge.send(json!({"name": "property", "target": "page$1", "params": ["viewportSize"]})).await;
	assert_eq!(bridge.response().await["response"], value);
}

#[tokio::test]
async fn events_reach_the_channel_before_listeners_run() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 1, "name": "createHandle"})).await;
	bridge.response().await;

	// The listener navigates again, raising a second event from inside the
	// first trigger; the first notification must already be on the wire.
	bridge
		.send(json!({
			"name": "addEvent",
			"target": "page$1",
			"params": [{"type": "onUrlChanged", "event": "function (url) { if (url === 'http://one/') this.open('http://two/'); }"}]
		}))
		.await;
	bridge.response().await;

	bridge
		.send(json!({"id": 2, "name": "invokeMethod", "target": "page$1", "params": ["open", "http://one/"]}))
		.await;

	assert_eq!(bridge.response().await["id"], 2);
	let first = bridge.event().await;
	assert_eq!(first.args, vec![json!("http://one/")]);
	let second = bridge.event().await;
	assert_eq!(second.args, vec![json!("http://two/")]);
}

#[tokio::test]
async fn removed_events_are_silent() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 1, "name": "createHandle"})).await;
	bridge.response().await;

	bridge
		.send(json!({"name": "addEvent", "target": "page$1", "params": [{"type": "onLoadFinished"}]}))
		.await;
	bridge.response().await;
	bridge
		.send(json!({"name": "removeEvent", "target": "page$1", "params": [{"type": "onLoadFinished"}]}))
		.await;
	bridge.response().await;

	bridge
		.send(json!({"id": 3, "name": "invokeMethod", "target": "page$1", "params": ["reload"]}))
		.await;
	assert_eq!(bridge.response().await["id"], 3);

	assert!(bridge.close().await.is_empty());
}

#[tokio::test]
async fn transform_markers_call_the_parent_method_with_target() {
	let recorder = Arc::new(Recorder::default());
	let mut bridge = Bridge::start(Arc::new(RecorderFactory {
		recorder: recorder.clone(),
	}));
	bridge.send(json!({"id": 7, "name": "createHandle"})).await;
	bridge.response().await;

	bridge
		.send(json!({
			"id": 8,
			"name": "invokeMethod",
			"target": "page$7",
			"params": ["echo", {"level1": {"level2": {"transform": true, "parent": "page$7", "method": "title", "target": null}}}]
		}))
		.await;

	let response = bridge.response().await;
	assert_eq!(response["response"], json!([{"level1": {"level2": "title(1)"}}]));

	let calls = recorder.calls.lock();
	assert_eq!(calls[0], ("title".to_string(), vec![Value::Null]));
	assert_eq!(calls[1].0, "echo");
}

#[tokio::test]
async fn async_method_response_follows_later_commands() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 1, "name": "createHandle"})).await;
	bridge.response().await;

	bridge
		.send(json!({"id": 2, "name": "invokeAsyncMethod", "target": "page$1", "params": ["open", "http://async/"]}))
		.await;
	let response = bridge.response().await;
	assert_eq!(response["id"], 2);
	assert_eq!(response["response"], "success");

	bridge.send(json!({"id": 3, "name": "property", "target": "page$1", "params": ["url"]})).await;
	assert_eq!(bridge.response().await["response"], "http://async/");
}

#[tokio::test]
async fn heartbeat_yields_one_acknowledgement_and_no_response() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));

	bridge.send_raw("NOOP").await;
	assert_eq!(bridge.next().await, Outbound::Heartbeat("NOOP".to_string()));
	assert!(bridge.close().await.is_empty());
}

#[tokio::test]
async fn closed_pages_disappear_from_the_space() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 4, "name": "createHandle"})).await;
	bridge.response().await;

	bridge
		.send(json!({"name": "invokeMethod", "target": "page$4", "params": ["close"]}))
		.await;
	bridge.response().await;

	bridge
		.send(json!({"id": 5, "name": "property", "target": "page$4", "params": ["url"]}))
		.await;
	assert_eq!(bridge.response().await["error"], "Object not found: page$4");
}

#[tokio::test]
async fn backend_events_can_be_raised_directly() {
	let mut bridge = Bridge::start(Arc::new(MemoryFactory));
	bridge.send(json!({"id": 1, "name": "createHandle"})).await;
	bridge.response().await;
	bridge
		.send(json!({"name": "addEvent", "target": "page$1", "params": [{"type": "onLoadFinished"}]}))
		.await;
	bridge.response().await;

	bridge
		.send(json!({"name": "invokeMethod", "target": "page$1", "params": ["setContent", "<p/>", "http://p/"]}))
		.await;
	bridge.response().await;
	let note = bridge.event().await;
	assert_eq!(note.target, "page$1");
	assert_eq!(note.event, "onLoadFinished");
	assert_eq!(note.args, vec![json!("success")]);
}
