mod inspect;
mod play;

use inspect::*;
use play::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Clone)]
#[command(name = "annotate", version, about)]
pub struct Cli {
	#[command(flatten)]
	log: annotate_player::Log,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
	/// Print the overlay for a single frame as JSON.
	Inspect {
		#[command(flatten)]
		source: Source,

		#[command(flatten)]
		frame: Frame,
	},

	/// Print a summary of every entity in the payload as JSON.
	Entities {
		#[command(flatten)]
		source: Source,
	},

	/// Mount the full player on a simulated platform and log what happens.
	Play {
		#[command(flatten)]
		config: annotate_player::PlayerConfig,

		#[command(flatten)]
		simulation: Simulation,
	},
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	cli.log.init();

	match cli.command {
		Command::Inspect { source, frame } => inspect(source, frame).await,
		Command::Entities { source } => entities(source).await,
		Command::Play { config, simulation } => play(config, simulation).await,
	}
}
