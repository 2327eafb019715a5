use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use annotate::render::{Canvas, Overlay};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{Action, MediaElement, PlayerState};

/// Redraws the overlay once per frame until dropped.
///
/// Each frame reads the payload from the player state and publishes the
/// resulting active set back to it. The task stops on its own once the
/// player has failed.
#[derive(Debug)]
pub struct FrameTask {
	handle: JoinHandle<()>,
}

impl FrameTask {
	pub fn spawn<M, C>(
		overlay: Overlay,
		media: Arc<M>,
		mut canvas: C,
		state: Arc<watch::Sender<PlayerState>>,
		period: Duration,
	) -> Self
	where
		M: MediaElement,
		C: Canvas + Send + 'static,
	{
		let handle = tokio::spawn(async move {
			// tokio rejects a zero period.
			let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
			interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				interval.tick().await;

				if render_frame(&overlay, media.as_ref(), &mut canvas, &state).is_break() {
					tracing::debug!("overlay stopped");
					break;
				}
			}
		});

		Self { handle }
	}

	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}
}

impl Drop for FrameTask {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

/// Render a single frame, if there's anything to render it with.
fn render_frame<M, C>(
	overlay: &Overlay,
	media: &M,
	canvas: &mut C,
	state: &watch::Sender<PlayerState>,
) -> ControlFlow<()>
where
	M: MediaElement + ?Sized,
	C: Canvas + ?Sized,
{
	let payload = {
		let state = state.borrow();
		if state.error().is_some() {
			return ControlFlow::Break(());
		}

		match &state.annotations {
			Some(payload) => payload.clone(),
			None => return ControlFlow::Continue(()),
		}
	};

	// Not laid out yet.
	let Some(size) = media.rendered_size() else {
		return ControlFlow::Continue(());
	};

	match overlay.render(canvas, &payload, size, media.current_time()) {
		Ok(active) => {
			state.send_if_modified(|state| state.apply(Action::FrameRendered(active)));
		}
		Err(err) => tracing::warn!(%err, "failed to render overlay"),
	}

	ControlFlow::Continue(())
}
