//! # annotate: time-synchronized overlays for video playback
//!
//! `annotate` draws precomputed annotations (bounding boxes produced by an
//! offline recognizer, e.g. logo detection) on top of a playing video.
//!
//! ## Overview
//!
//! - **Model**: The annotation payload, time offsets and normalized geometry.
//! - **Sync**: Decides which observations are visible at a playback time.
//! - **Render**: Maps visible observations to pixel space and draws them onto a [render::Canvas].
//!
//! The crate does no I/O and owns no clock; the caller supplies the payload,
//! the playback time and the surface size every frame.
mod error;

pub mod model;
pub mod render;
pub mod sync;

pub use error::*;
pub use model::*;
pub use sync::{ActiveEntitySet, DEFAULT_TOLERANCE};
