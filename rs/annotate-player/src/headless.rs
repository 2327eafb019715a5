//! An in-process platform with no real decoding.
//!
//! The video advances its playback clock with [tokio::time], so it follows a
//! paused test clock. Transports report readiness as soon as they're both
//! loaded and attached, and failures can be injected from the outside.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use annotate::Size;
use tokio::time::Instant;
use url::Url;

use crate::{
	EventSender, MediaElement, Platform, PrimaryConfig, SecondaryConfig, Transport, TransportError, TransportEvent,
	TransportKind,
};

#[derive(Debug, Default)]
struct Playback {
	size: Option<Size>,
	position: f64,
	playing_since: Option<Instant>,
	source: Option<Url>,
	events: Option<EventSender>,
}

impl Playback {
	fn current_time(&self) -> f64 {
		match self.playing_since {
			Some(since) => self.position + since.elapsed().as_secs_f64(),
			None => self.position,
		}
	}
}

/// A video element that only keeps time.
#[derive(Debug)]
pub struct HeadlessVideo {
	playback: Mutex<Playback>,
	native: bool,
}

impl HeadlessVideo {
	/// Create a paused video, laid out at `size` if any.
	pub fn new(size: Option<Size>) -> Arc<Self> {
		Self::build(size, false)
	}

	/// Create a video that can play the primary manifest without an adaptive engine.
	pub fn with_native_support(size: Option<Size>) -> Arc<Self> {
		Self::build(size, true)
	}

	fn build(size: Option<Size>, native: bool) -> Arc<Self> {
		Arc::new(Self {
			playback: Mutex::new(Playback {
				size,
				..Default::default()
			}),
			native,
		})
	}

	fn lock(&self) -> MutexGuard<'_, Playback> {
		self.playback.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn play(&self) {
		let mut playback = self.lock();
		if playback.playing_since.is_none() {
			playback.playing_since = Some(Instant::now());
		}
	}

	pub fn pause(&self) {
		let mut playback = self.lock();
		playback.position = playback.current_time();
		playback.playing_since = None;
	}

	pub fn is_playing(&self) -> bool {
		self.lock().playing_since.is_some()
	}

	/// Jump to `position` seconds, keeping the play state.
	pub fn seek(&self, position: f64) {
		let mut playback = self.lock();
		playback.position = position.max(0.0);
		if playback.playing_since.is_some() {
			playback.playing_since = Some(Instant::now());
		}
	}

	pub fn set_size(&self, size: Option<Size>) {
		self.lock().size = size;
	}

	/// The source currently playing, whether assigned directly or by a transport.
	pub fn source(&self) -> Option<Url> {
		self.lock().source.clone()
	}

	/// Report an error for a directly assigned source.
	pub fn error(&self, fatal: bool, details: &str) {
		if let Some(events) = &self.lock().events {
			events.error(fatal, details);
		}
	}

	fn load(&self, url: &Url) {
		let mut playback = self.lock();
		playback.source = Some(url.clone());
		playback.position = 0.0;
	}
}

impl MediaElement for HeadlessVideo {
	fn rendered_size(&self) -> Option<Size> {
		self.lock().size
	}

	fn current_time(&self) -> f64 {
		self.lock().current_time()
	}

	fn can_play_type(&self, _mime: &str) -> bool {
		self.native
	}

	fn set_source(&self, url: &Url, events: EventSender) -> Result<(), TransportError> {
		if !self.native {
			return Err(TransportError::new("unsupported source"));
		}

		self.load(url);
		events.metadata_loaded();
		self.lock().events = Some(events);

		Ok(())
	}
}

/// A transport created by [HeadlessPlatform], with the settings it was given.
#[derive(Clone, Debug, PartialEq)]
pub enum Created {
	Primary(PrimaryConfig),
	Secondary(SecondaryConfig),
}

#[derive(Debug, Default)]
struct Registry {
	created: Vec<Created>,
	events: Vec<EventSender>,
	reject: Vec<TransportKind>,
	live: usize,
}

/// A platform with configurable engine support.
#[derive(Clone, Debug, Default)]
pub struct HeadlessPlatform {
	primary: bool,
	secondary: bool,
	registry: Arc<Mutex<Registry>>,
}

impl HeadlessPlatform {
	pub fn new(primary: bool, secondary: bool) -> Self {
		Self {
			primary,
			secondary,
			registry: Default::default(),
		}
	}

	fn lock(&self) -> MutexGuard<'_, Registry> {
		self.registry.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Fail the creation of any transport of this kind.
	pub fn reject(&self, kind: TransportKind) {
		self.lock().reject.push(kind);
	}

	/// Every transport created so far, in order.
	pub fn created(&self) -> Vec<Created> {
		self.lock().created.clone()
	}

	/// The number of transports that haven't been torn down.
	pub fn live(&self) -> usize {
		self.lock().live
	}

	/// Deliver an event as if it came from the most recent transport of this kind.
	///
	/// Returns false if no such transport was ever created.
	pub fn inject(&self, kind: TransportKind, event: TransportEvent) -> bool {
		let registry = self.lock();
		match registry.events.iter().rev().find(|events| events.kind() == kind) {
			Some(events) => {
				events.send(event);
				true
			}
			None => false,
		}
	}

	/// Inject a fatal error.
	pub fn fail(&self, kind: TransportKind, details: &str) -> bool {
		self.inject(
			kind,
			TransportEvent::Error {
				fatal: true,
				details: details.to_string(),
			},
		)
	}

	fn create(&self, created: Created, events: EventSender) -> Result<HeadlessTransport, TransportError> {
		let kind = events.kind();

		let mut registry = self.lock();
		if registry.reject.contains(&kind) {
			return Err(TransportError::new(format!("{kind} engine refused to start")));
		}

		let autoplay = matches!(&created, Created::Secondary(config) if config.autoplay);

		registry.created.push(created);
		registry.events.push(events.clone());
		registry.live += 1;

		Ok(HeadlessTransport {
			events,
			autoplay,
			source: None,
			media: None,
			registry: self.registry.clone(),
		})
	}
}

impl Platform for HeadlessPlatform {
	type Media = HeadlessVideo;
	type Primary = HeadlessTransport;
	type Secondary = HeadlessTransport;

	fn primary_supported(&self) -> bool {
		self.primary
	}

	fn secondary_supported(&self) -> bool {
		self.secondary
	}

	fn create_primary(&self, config: &PrimaryConfig, events: EventSender) -> Result<HeadlessTransport, TransportError> {
		self.create(Created::Primary(config.clone()), events)
	}

	fn create_secondary(
		&self,
		config: &SecondaryConfig,
		events: EventSender,
	) -> Result<HeadlessTransport, TransportError> {
		self.create(Created::Secondary(config.clone()), events)
	}
}

/// An adaptive engine that starts as soon as it has a source and a video.
#[derive(Debug)]
pub struct HeadlessTransport {
	events: EventSender,
	autoplay: bool,
	source: Option<Url>,
	media: Option<Arc<HeadlessVideo>>,
	registry: Arc<Mutex<Registry>>,
}

impl HeadlessTransport {
	fn start(&self) {
		let (Some(source), Some(media)) = (&self.source, &self.media) else {
			return;
		};

		media.load(source);

		if self.events.kind() == TransportKind::PrimaryAdaptive {
			self.events.manifest_parsed();
		}

		if self.autoplay {
			media.play();
		}
	}
}

impl Transport<HeadlessVideo> for HeadlessTransport {
	fn load_source(&mut self, url: &Url) -> Result<(), TransportError> {
		self.source = Some(url.clone());
		self.start();
		Ok(())
	}

	fn attach_media(&mut self, media: &Arc<HeadlessVideo>) -> Result<(), TransportError> {
		self.media = Some(media.clone());
		self.start();
		Ok(())
	}
}

impl Drop for HeadlessTransport {
	fn drop(&mut self) {
		let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
		registry.live = registry.live.saturating_sub(1);

		if let Some(media) = &self.media {
			media.pause();
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::time::Duration;

	#[tokio::test(start_paused = true)]
	async fn video_clock() {
		let video = HeadlessVideo::new(Some(Size::new(640, 360)));
		assert_eq!(video.current_time(), 0.0);

		video.play();
		tokio::time::advance(Duration::from_millis(1500)).await;
		assert_eq!(video.current_time(), 1.5);

		video.pause();
		tokio::time::advance(Duration::from_secs(10)).await;
		assert_eq!(video.current_time(), 1.5);

		video.seek(42.0);
		assert_eq!(video.current_time(), 42.0);
		assert!(!video.is_playing());
	}

	#[test]
	fn native_support() {
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		let url = Url::parse("https://cdn.example.com/manifest.m3u8").unwrap();

		let video = HeadlessVideo::new(None);
		assert!(!video.can_play_type("application/vnd.apple.mpegurl"));
		let events = EventSender::new(TransportKind::NativeDirect, tx.clone());
		assert!(video.set_source(&url, events).is_err());

		let video = HeadlessVideo::with_native_support(None);
		assert!(video.can_play_type("application/vnd.apple.mpegurl"));
		let events = EventSender::new(TransportKind::NativeDirect, tx);
		video.set_source(&url, events).unwrap();

		assert_eq!(video.source(), Some(url));
		assert_eq!(
			rx.try_recv().unwrap(),
			(TransportKind::NativeDirect, TransportEvent::MetadataLoaded)
		);
	}

	#[test]
	fn transports_track_lifetime() {
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		let platform = HeadlessPlatform::new(true, true);
		let video = HeadlessVideo::new(None);
		let url = Url::parse("https://cdn.example.com/manifest.m3u8").unwrap();

		let config = PrimaryConfig {
			enable_worker: true,
			headers: Vec::new(),
		};
		let mut primary = platform
			.create_primary(&config, EventSender::new(TransportKind::PrimaryAdaptive, tx))
			.unwrap();
		assert_eq!(platform.live(), 1);

		primary.load_source(&url).unwrap();
		assert!(rx.try_recv().is_err());

		primary.attach_media(&video).unwrap();
		assert_eq!(video.source(), Some(url));
		assert_eq!(rx.try_recv().unwrap().1, TransportEvent::ManifestParsed);

		assert!(platform.fail(TransportKind::PrimaryAdaptive, "boom"));
		assert!(!platform.fail(TransportKind::SecondaryAdaptive, "boom"));

		drop(primary);
		assert_eq!(platform.live(), 0);
		assert_eq!(platform.created(), vec![Created::Primary(config)]);
	}

	#[test]
	fn rejected_transport() {
		let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
		let platform = HeadlessPlatform::new(true, true);
		platform.reject(TransportKind::PrimaryAdaptive);

		let config = PrimaryConfig {
			enable_worker: true,
			headers: Vec::new(),
		};
		let err = platform
			.create_primary(&config, EventSender::new(TransportKind::PrimaryAdaptive, tx))
			.unwrap_err();
		assert_eq!(err.to_string(), "primary engine refused to start");
		assert!(platform.created().is_empty());
	}
}
