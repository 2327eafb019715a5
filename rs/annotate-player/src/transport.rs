//! The seams between the player and the playback engines.
//!
//! A [Platform] knows which adaptive engines are available and how to create
//! them, and a [MediaElement] is the video surface they attach to. Engines
//! report back through an [EventSender], tagged with the [TransportKind] that
//! created it so the player can ignore events from a transport it has torn down.

use std::fmt;
use std::sync::Arc;

use annotate::Size;
use tokio::sync::mpsc;
use url::Url;

use crate::{PrimaryConfig, SecondaryConfig};

/// What the environment can play, probed once per mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
	/// The primary adaptive engine (HLS) is available.
	pub primary_adaptive: bool,

	/// The secondary adaptive engine (DASH) is available.
	pub secondary_adaptive: bool,

	/// The media element can play the primary manifest by itself.
	pub native_direct: bool,
}

impl Capabilities {
	/// Pick the transport to use, in order of preference.
	pub fn select(&self) -> TransportKind {
		if self.primary_adaptive {
			TransportKind::PrimaryAdaptive
		} else if self.secondary_adaptive {
			TransportKind::SecondaryAdaptive
		} else if self.native_direct {
			TransportKind::NativeDirect
		} else {
			TransportKind::Unsupported
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
	PrimaryAdaptive,
	SecondaryAdaptive,
	NativeDirect,
	Unsupported,
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::PrimaryAdaptive => "primary",
			Self::SecondaryAdaptive => "secondary",
			Self::NativeDirect => "native",
			Self::Unsupported => "unsupported",
		};
		f.write_str(name)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
	/// The primary transport parsed its manifest and can start playback.
	ManifestParsed,

	/// The media element loaded metadata for a directly assigned source.
	MetadataLoaded,

	/// Something went wrong. Non-fatal errors are recovered from by the transport itself.
	Error { fatal: bool, details: String },
}

/// A transport failed to initialize.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
	pub fn new(details: impl Into<String>) -> Self {
		Self(details.into())
	}
}

/// Reports events for a single transport back to the player.
#[derive(Clone, Debug)]
pub struct EventSender {
	kind: TransportKind,
	tx: mpsc::UnboundedSender<(TransportKind, TransportEvent)>,
}

impl EventSender {
	pub(crate) fn new(kind: TransportKind, tx: mpsc::UnboundedSender<(TransportKind, TransportEvent)>) -> Self {
		Self { kind, tx }
	}

	pub fn kind(&self) -> TransportKind {
		self.kind
	}

	pub fn send(&self, event: TransportEvent) {
		// The player is gone, nobody cares.
		let _ = self.tx.send((self.kind, event));
	}

	pub fn manifest_parsed(&self) {
		self.send(TransportEvent::ManifestParsed)
	}

	pub fn metadata_loaded(&self) {
		self.send(TransportEvent::MetadataLoaded)
	}

	pub fn error(&self, fatal: bool, details: impl Into<String>) {
		self.send(TransportEvent::Error {
			fatal,
			details: details.into(),
		})
	}
}

/// The video surface.
pub trait MediaElement: Send + Sync + 'static {
	/// The size the video is currently rendered at, if it's laid out at all.
	fn rendered_size(&self) -> Option<Size>;

	/// The playback position in seconds.
	fn current_time(&self) -> f64;

	/// Whether the element can play the given container type without an adaptive engine.
	fn can_play_type(&self, mime: &str) -> bool;

	/// Play `url` directly, reporting [TransportEvent::MetadataLoaded] once ready.
	fn set_source(&self, url: &Url, events: EventSender) -> Result<(), TransportError>;
}

/// An adaptive playback engine.
///
/// Dropping the transport tears it down and detaches it from the media element.
pub trait Transport<M: MediaElement>: Send + 'static {
	fn load_source(&mut self, url: &Url) -> Result<(), TransportError>;
	fn attach_media(&mut self, media: &Arc<M>) -> Result<(), TransportError>;
}

/// The environment the player runs in.
pub trait Platform: Send + Sync + 'static {
	type Media: MediaElement;
	type Primary: Transport<Self::Media>;
	type Secondary: Transport<Self::Media>;

	fn primary_supported(&self) -> bool;
	fn secondary_supported(&self) -> bool;

	fn create_primary(&self, config: &PrimaryConfig, events: EventSender) -> Result<Self::Primary, TransportError>;

	fn create_secondary(
		&self,
		config: &SecondaryConfig,
		events: EventSender,
	) -> Result<Self::Secondary, TransportError>;

	fn capabilities(&self, media: &Self::Media, native_mime: &str) -> Capabilities {
		Capabilities {
			primary_adaptive: self.primary_supported(),
			secondary_adaptive: self.secondary_supported(),
			native_direct: media.can_play_type(native_mime),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn select_prefers_primary() {
		let caps = Capabilities {
			primary_adaptive: true,
			secondary_adaptive: true,
			native_direct: true,
		};
		assert_eq!(caps.select(), TransportKind::PrimaryAdaptive);
	}

	#[test]
	fn select_falls_through() {
		let caps = Capabilities {
			secondary_adaptive: true,
			native_direct: true,
			..Default::default()
		};
		assert_eq!(caps.select(), TransportKind::SecondaryAdaptive);

		let caps = Capabilities {
			native_direct: true,
			..Default::default()
		};
		assert_eq!(caps.select(), TransportKind::NativeDirect);

		assert_eq!(Capabilities::default().select(), TransportKind::Unsupported);
	}

	#[test]
	fn events_are_tagged() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let events = EventSender::new(TransportKind::PrimaryAdaptive, tx);

		events.manifest_parsed();
		events.error(true, "network");

		assert_eq!(
			rx.try_recv().unwrap(),
			(TransportKind::PrimaryAdaptive, TransportEvent::ManifestParsed)
		);
		assert_eq!(
			rx.try_recv().unwrap(),
			(
				TransportKind::PrimaryAdaptive,
				TransportEvent::Error {
					fatal: true,
					details: "network".to_string()
				}
			)
		);
	}

	#[test]
	fn send_after_close_is_ignored() {
		let (tx, rx) = mpsc::unbounded_channel();
		drop(rx);

		EventSender::new(TransportKind::NativeDirect, tx).metadata_loaded();
	}
}
