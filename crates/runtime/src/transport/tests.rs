use bridge_protocol::{CommandEnvelope, EventNotification};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::*;

#[tokio::test]
async fn test_send_writes_tagged_lines() {
	// The transport writes into `out_write`; we read `out_read`.
	let (out_read, out_write) = tokio::io::duplex(1024);

	let transport = PipeTransport::new(tokio::io::empty(), out_write);
	let (mut sender, _receiver) = transport.into_parts();

	sender
		.send(&Outbound::Response(CommandEnvelope {
			id: Some(json!(1)),
			name: "noop".to_string(),
			..Default::default()
		}))
		.await
		.unwrap();
	sender
		.send(&Outbound::Event(EventNotification {
			target: "page$1".to_string(),
			event: "onLoadFinished".to_string(),
			args: vec![json!("success")],
		}))
		.await
		.unwrap();
	sender.send(&Outbound::Heartbeat("NOOP".to_string())).await.unwrap();
	sender.shutdown().await.unwrap();
	drop(sender);

	let mut lines = BufReader::new(out_read).lines();
	assert_eq!(lines.next_line().await.unwrap().unwrap(), r#">{"id":1,"name":"noop","params":[]}"#);
	assert_eq!(
		lines.next_line().await.unwrap().unwrap(),
		r#"<event>{"target":"page$1","type":"onLoadFinished","args":["success"]}"#
	);
	assert_eq!(lines.next_line().await.unwrap().unwrap(), ">NOOP");
	assert!(lines.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn test_receiver_yields_lines_then_eof() {
	let (in_read, mut in_write) = tokio::io::duplex(1024);
	let transport = PipeTransport::new(in_read, tokio::io::sink());
	let (_sender, mut receiver) = transport.into_parts();

	in_write.write_all(b"NOOP\n{\"name\":\"noop\"}\r\n\n").await.unwrap();
	drop(in_write);

	assert_eq!(receiver.next_line().await.unwrap().as_deref(), Some("NOOP"));
	assert_eq!(receiver.next_line().await.unwrap().as_deref(), Some(r#"{"name":"noop"}"#));
	assert_eq!(receiver.next_line().await.unwrap().as_deref(), Some(""));
	assert_eq!(receiver.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_large_line() {
	let (in_read, mut in_write) = tokio::io::duplex(1024 * 1024);
	let transport = PipeTransport::new(in_read, tokio::io::sink());
	let (_sender, mut receiver) = transport.into_parts();

	let payload = "x".repeat(200_000);
	let line = format!("{{\"name\":\"noop\",\"params\":[\"{payload}\"]}}\n");
	let writer = tokio::spawn(async move {
		in_write.write_all(line.as_bytes()).await.unwrap();
	});

	let received = receiver.next_line().await.unwrap().unwrap();
	assert!(received.len() > 200_000);
	writer.await.unwrap();
}
