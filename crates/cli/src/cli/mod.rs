
use std::time::Duration;

use bridge_protocol::DEFAULT_HEARTBEAT_TOKEN;
use bridge_runtime::BridgeConfig;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Root CLI for the bridge worker.
///
/// There are no subcommands: the process reads commands from stdin until it
/// closes or the controller calls `exit` on the process handle.
#[derive(Parser, Debug)]
#[command(name = "bridge")]
#[command(about = "Object bridge - JSON commands on stdin, tagged lines on stdout")]
#[command(version)]
#[command(styles = help_styles())]
pub struct Cli {
	/// Increase verbosity on stderr (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Pause after a heartbeat before the next read, in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 100)]
	pub heartbeat_ms: u64,

	/// Inbound line treated as a heartbeat
	#[arg(long, value_name = "TOKEN", default_value = DEFAULT_HEARTBEAT_TOKEN, value_parser = parse_token)]
	pub heartbeat_token: String,

	/// Key the process singleton is registered under
	#[arg(long, value_name = "KEY", default_value = "phantom", value_parser = parse_token)]
	pub process_key: String,
}

impl Cli {
	pub fn bridge_config(&self) -> BridgeConfig {
		BridgeConfig {
			heartbeat_token: self.heartbeat_token.clone(),
			heartbeat_delay: Duration::from_millis(self.heartbeat_ms),
			process_key: self.process_key.clone(),
			..Default::default()
		}
	}
}

/// Tokens and keys must be a single non-empty word.
fn parse_token(s: &str) -> Result<String, String> {
	if s.is_empty() || s.chars().any(char::is_whitespace) {
		return Err(format!("'{s}' must be a single non-empty word"));
	}
	Ok(s.to_string())
}

fn help_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Green.on_default())
		.placeholder(AnsiColor::Green.on_default())
}
