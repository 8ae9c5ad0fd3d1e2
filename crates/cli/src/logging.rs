use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the global subscriber. Logs always go to stderr: stdout carries
/// the protocol.
pub fn init_logging(verbosity: u8) {
	// 0 = errors only
	// 1 (-v) = info for bridge targets, warn for dependencies
	// 2+ (-vv) = debug everywhere, trace for bridge targets
	let filter = match verbosity {
		0 => "error",
		1 => "warn,bridge=info",
		_ => "debug,bridge=trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
