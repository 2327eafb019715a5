use std::time::Duration;

use annotate::Size;
use annotate::render::Recorder;
use annotate_player::headless::{HeadlessPlatform, HeadlessVideo};
use annotate_player::{MediaElement, Player, PlayerConfig, PlayerState};
use anyhow::Context;

/// What the simulated platform supports.
#[derive(clap::Args, Clone, Debug)]
pub struct Simulation {
	/// How long to play for.
	#[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
	pub duration: Duration,

	/// Pretend the primary adaptive engine is unavailable.
	#[arg(long)]
	pub no_primary: bool,

	/// Pretend the secondary adaptive engine is unavailable.
	#[arg(long)]
	pub no_secondary: bool,

	/// Pretend the video can't play the primary manifest by itself.
	#[arg(long)]
	pub no_native: bool,

	/// The rendered size of the video.
	#[arg(long = "video-width", default_value_t = 1280)]
	pub width: u32,

	#[arg(long = "video-height", default_value_t = 720)]
	pub height: u32,
}

pub async fn play(config: PlayerConfig, simulation: Simulation) -> anyhow::Result<()> {
	let platform = HeadlessPlatform::new(!simulation.no_primary, !simulation.no_secondary);

	let size = Some(Size::new(simulation.width, simulation.height));
	let video = if simulation.no_native {
		HeadlessVideo::new(size)
	} else {
		HeadlessVideo::with_native_support(size)
	};

	let canvas = Recorder::new();
	let player = Player::new(config, platform, video.clone()).context("failed to create player")?;
	let handle = player.mount(canvas.clone());

	let mut state = handle.subscribe();
	let mut last = state.borrow_and_update().clone();

	let deadline = tokio::time::sleep(simulation.duration);
	tokio::pin!(deadline);

	loop {
		tokio::select! {
			res = state.changed() => {
				if res.is_err() {
					break;
				}

				let current = state.borrow_and_update().clone();
				report(&last, &current, &video);

				if let Some(message) = current.error() {
					anyhow::bail!("player failed: {message}");
				}

				// The headless engines only autoplay for the secondary transport.
				if current.is_ready() && !video.is_playing() {
					video.play();
				}

				last = current;
			}
			_ = &mut deadline => {
				tracing::info!(duration = ?simulation.duration, "simulation finished");
				break;
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("interrupted");
				break;
			}
		}
	}

	let frame = canvas.snapshot();
	tracing::info!(frames = frame.clears, position = video.current_time(), "stopped");

	Ok(())
}

fn report(last: &PlayerState, current: &PlayerState, video: &HeadlessVideo) {
	if last.transport != current.transport {
		if let Some(transport) = current.transport {
			tracing::info!(%transport, fallback = current.fallback, "transport changed");
		}
	}

	if last.phase != current.phase {
		tracing::info!(phase = ?current.phase, "phase changed");
	}

	if last.active != current.active {
		tracing::info!(position = video.current_time(), active = %current.active, "active entities changed");
	}
}
