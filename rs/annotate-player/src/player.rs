use std::sync::Arc;

use annotate::render::Canvas;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{
	Action, Error, EventSender, Fetch, FetchError, FrameTask, HttpFetcher, MediaElement, Platform, PlayerConfig,
	PlayerState, Result, Transport, TransportEvent, TransportKind, fetch,
};

type Events = (TransportKind, TransportEvent);

/// Plays a video with its annotations drawn on top.
///
/// Mounting fetches the annotation payload, starts the overlay and then picks
/// the best available transport, falling back from the primary to the
/// secondary transport once if the primary fails.
pub struct Player<P: Platform, F: Fetch = HttpFetcher> {
	config: PlayerConfig,
	platform: P,
	media: Arc<P::Media>,
	fetcher: F,
}

impl<P: Platform> Player<P> {
	pub fn new(config: PlayerConfig, platform: P, media: Arc<P::Media>) -> std::result::Result<Self, FetchError> {
		let fetcher = HttpFetcher::new(&config.origin, config.annotations_token.clone())?;
		Ok(Self::with_fetcher(config, platform, media, fetcher))
	}
}

impl<P: Platform, F: Fetch> Player<P, F> {
	pub fn with_fetcher(config: PlayerConfig, platform: P, media: Arc<P::Media>, fetcher: F) -> Self {
		Self {
			config,
			platform,
			media,
			fetcher,
		}
	}

	/// Start the player, drawing the overlay onto `canvas`.
	///
	/// Everything stops when the returned handle is dropped.
	pub fn mount<C: Canvas + Send + 'static>(self, canvas: C) -> PlayerHandle {
		let (tx, rx) = watch::channel(PlayerState::default());
		let state = Arc::new(tx);

		let span = tracing::info_span!("player", primary = %self.config.primary);
		let task = tokio::spawn(self.run(canvas, state).instrument(span));

		PlayerHandle { state: rx, task }
	}

	async fn run<C: Canvas + Send + 'static>(self, canvas: C, state: Arc<watch::Sender<PlayerState>>) {
		if let Err(err) = self.bootstrap(canvas, &state).await {
			tracing::error!(%err, "player failed");
			dispatch(&state, Action::Failed(err.to_string()));
		}
	}

	async fn bootstrap<C: Canvas + Send + 'static>(
		self,
		canvas: C,
		state: &Arc<watch::Sender<PlayerState>>,
	) -> Result<()> {
		let url = fetch::parse_source(&self.config.annotations)?;
		let payload = self.fetcher.fetch(&url).await?;
		tracing::info!(%url, entities = payload.entity_tracks().count(), "loaded annotations");

		dispatch(state, Action::AnnotationsLoaded(Arc::new(payload)));

		// Dropped on return, stopping the overlay.
		let _frames = FrameTask::spawn(
			self.config.overlay(),
			self.media.clone(),
			canvas,
			state.clone(),
			self.config.frame_period(),
		);

		let capabilities = self.platform.capabilities(&self.media, &self.config.native_mime);
		let kind = capabilities.select();
		tracing::info!(?capabilities, %kind, "selected transport");

		let (tx, mut rx) = mpsc::unbounded_channel();
		let mut active = self.start(kind, false, &tx, state)?;

		while let Some((source, event)) = rx.recv().await {
			if source != active.kind() {
				tracing::debug!(%source, ?event, "ignoring event from stale transport");
				continue;
			}

			match event {
				TransportEvent::ManifestParsed if source == TransportKind::PrimaryAdaptive => {
					tracing::info!(transport = %source, "manifest parsed");
					dispatch(state, Action::Ready);
				}
				TransportEvent::MetadataLoaded if source == TransportKind::NativeDirect => {
					tracing::info!(transport = %source, "metadata loaded");
					dispatch(state, Action::Ready);
				}
				TransportEvent::Error { fatal: false, details } => {
					tracing::warn!(transport = %source, %details, "transport error");
				}
				TransportEvent::Error { fatal: true, details } if source == TransportKind::PrimaryAdaptive => {
					tracing::warn!(%details, "primary transport failed, falling back to secondary");

					// Tear the primary down before the secondary attaches to the same video.
					drop(active);
					active = self.start(TransportKind::SecondaryAdaptive, true, &tx, state)?;
				}
				TransportEvent::Error { fatal: true, details } => {
					return Err(Error::TransportFatal { kind: source, details });
				}
				event => tracing::debug!(transport = %source, ?event, "ignoring event"),
			}
		}

		Ok(())
	}

	/// Create and start a transport of the given kind.
	fn start(
		&self,
		kind: TransportKind,
		fallback: bool,
		tx: &mpsc::UnboundedSender<Events>,
		state: &watch::Sender<PlayerState>,
	) -> Result<Active<P>> {
		let events = EventSender::new(kind, tx.clone());
		let init = |source| Error::TransportInit { kind, source };

		let active = match kind {
			TransportKind::PrimaryAdaptive => {
				let config = self.config.primary_config();
				let mut transport = self.platform.create_primary(&config, events).map_err(init)?;
				transport.load_source(&self.config.primary).map_err(init)?;
				transport.attach_media(&self.media).map_err(init)?;
				Active::Primary(transport)
			}
			TransportKind::SecondaryAdaptive => {
				let config = self.config.secondary_config();
				let mut transport = self.platform.create_secondary(&config, events).map_err(init)?;
				transport.attach_media(&self.media).map_err(init)?;
				transport.load_source(&self.config.secondary).map_err(init)?;
				Active::Secondary(transport)
			}
			TransportKind::NativeDirect => {
				self.media.set_source(&self.config.primary, events).map_err(init)?;
				Active::Native
			}
			TransportKind::Unsupported => return Err(Error::UnsupportedPlayback),
		};

		tracing::info!(transport = %kind, fallback, "started transport");
		dispatch(state, Action::TransportStarted { kind, fallback });

		// The secondary transport has no readiness event.
		if kind == TransportKind::SecondaryAdaptive {
			dispatch(state, Action::Ready);
		}

		Ok(active)
	}
}

/// The transport currently in use.
enum Active<P: Platform> {
	Primary(P::Primary),
	Secondary(P::Secondary),
	Native,
}

impl<P: Platform> Active<P> {
	fn kind(&self) -> TransportKind {
		match self {
			Self::Primary(_) => TransportKind::PrimaryAdaptive,
			Self::Secondary(_) => TransportKind::SecondaryAdaptive,
			Self::Native => TransportKind::NativeDirect,
		}
	}
}

fn dispatch(state: &watch::Sender<PlayerState>, action: Action) {
	state.send_if_modified(|state| state.apply(action));
}

/// A mounted player.
///
/// Dropping the handle tears down the transport and stops the overlay.
#[derive(Debug)]
pub struct PlayerHandle {
	state: watch::Receiver<PlayerState>,
	task: JoinHandle<()>,
}

impl PlayerHandle {
	/// A copy of the current state.
	pub fn current(&self) -> PlayerState {
		self.state.borrow().clone()
	}

	/// Watch for state changes.
	pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
		self.state.clone()
	}

	/// Wait until the player is either ready or failed.
	pub async fn settled(&self) -> PlayerState {
		let mut state = self.state.clone();
		if let Ok(settled) = state.wait_for(|state| !state.is_loading()).await {
			return settled.clone();
		}

		// The player task is gone, so this is as settled as it gets.
		state.borrow().clone()
	}

	/// Wait until the player fails, returning the error message.
	pub async fn failed(&self) -> Option<String> {
		let mut state = self.state.clone();
		let state = state.wait_for(|state| state.error().is_some()).await.ok()?;
		state.error().map(str::to_string)
	}
}

impl Drop for PlayerHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}
