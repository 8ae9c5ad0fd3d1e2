use bridge_cli::{cli::Cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = bridge_cli::run(cli.bridge_config()).await {
		// stdout belongs to the protocol; report on stderr only.
		tracing::error!(target: "bridge.cli", error = ?err, "bridge exited with error");
		eprintln!("bridge: {err:#}");
		std::process::exit(1);
	}
}
