use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Logging configuration.
#[derive(Clone, Debug, clap::Args)]
pub struct Log {
	/// The log level, unless overridden by RUST_LOG.
	#[arg(id = "log-level", long = "log-level", default_value = "info", env = "ANNOTATE_LOG_LEVEL")]
	pub level: Level,
}

impl Default for Log {
	fn default() -> Self {
		Self { level: Level::INFO }
	}
}

impl Log {
	/// Install a global subscriber writing to stderr.
	///
	/// Does nothing if a subscriber is already installed.
	pub fn init(&self) {
		let filter = EnvFilter::builder()
			.with_default_directive(LevelFilter::from_level(self.level).into())
			.from_env_lossy();

		let subscriber = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_writer(std::io::stderr)
			.finish();

		if tracing::subscriber::set_global_default(subscriber).is_err() {
			tracing::debug!("tracing subscriber already installed");
		}
	}
}
