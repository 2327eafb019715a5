//! Plays a video with time-synchronized annotations drawn on top.
//!
//! A [Player] fetches an [annotate::AnnotationPayload], picks the best
//! transport the [Platform] supports, and redraws the overlay every frame
//! while publishing its [PlayerState] through a watch channel. Dropping the
//! returned [PlayerHandle] tears everything down.
//!
//! The platform and video surface are traits so the player can run anywhere;
//! [headless] provides an in-process implementation.

mod config;
mod error;
mod fetch;
mod frame;
mod log;
mod player;
mod state;
mod transport;

pub mod headless;

pub use config::*;
pub use error::*;
pub use fetch::{Fetch, FetchError, HttpFetcher, parse_source};
pub use frame::*;
pub use log::*;
pub use player::*;
pub use state::*;
pub use transport::*;
