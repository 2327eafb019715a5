use crate::{FetchError, TransportError, TransportKind};

/// Why the player gave up.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("failed to fetch annotations: {0}")]
	AnnotationFetch(#[from] FetchError),

	#[error("no supported playback technology")]
	UnsupportedPlayback,

	#[error("failed to initialize {kind} transport: {source}")]
	TransportInit {
		kind: TransportKind,
		#[source]
		source: TransportError,
	},

	#[error("fatal {kind} transport error: {details}")]
	TransportFatal { kind: TransportKind, details: String },
}

pub type Result<T> = std::result::Result<T, Error>;
