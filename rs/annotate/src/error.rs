/// Errors produced while loading or interpreting an annotation payload.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid time offset: {0}")]
	InvalidOffset(#[from] crate::InvalidOffset),
}

pub type Result<T> = std::result::Result<T, Error>;
