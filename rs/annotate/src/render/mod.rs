//! Drawing annotations on top of a video.
//!
//! The overlay does not own a drawing surface. It issues [DrawCommand]s to a
//! [Canvas], which a host implements on top of whatever it draws with
//! (a browser 2D context, a GPU texture, or the in-memory [Recorder]).

use serde::Serialize;
use serde_with::SerializeDisplay;
use thiserror::Error;

use crate::{Rect, Size};

mod overlay;
mod record;

pub use overlay::*;
pub use record::*;

/// Errors that can occur while drawing.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error("surface unavailable")]
	SurfaceUnavailable,

	#[error("failed to draw: {0}")]
	Draw(String),
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// A transparent 2D surface layered over the video.
pub trait Canvas {
	/// Resize the surface; this also discards its contents.
	fn resize(&mut self, size: Size) -> Result<()>;

	/// Erase everything drawn so far.
	fn clear(&mut self) -> Result<()>;

	fn draw(&mut self, command: &DrawCommand) -> Result<()>;
}

impl<C: Canvas + ?Sized> Canvas for &mut C {
	fn resize(&mut self, size: Size) -> Result<()> {
		(**self).resize(size)
	}

	fn clear(&mut self) -> Result<()> {
		(**self).clear()
	}

	fn draw(&mut self, command: &DrawCommand) -> Result<()> {
		(**self).draw(command)
	}
}

/// A single drawing primitive, in pixel space.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawCommand {
	/// Outline a rectangle.
	StrokeRect { rect: Rect, color: Color, line_width: f64 },

	/// Fill a rectangle.
	FillRect { rect: Rect, color: Color },

	/// Draw text with its baseline starting at (x, y).
	FillText {
		text: String,
		x: f64,
		y: f64,
		color: Color,
		font: String,
	},
}

/// An sRGB color with straight alpha.
///
/// Formats as a CSS color, which is what 2D canvas APIs accept.
#[derive(SerializeDisplay, Debug, Clone, Copy, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f32,
}

impl Color {
	pub const WHITE: Self = Self::rgb(255, 255, 255);
	pub const BLACK: Self = Self::rgb(0, 0, 0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
		Self { r, g, b, a }
	}
}

impl std::fmt::Display for Color {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.a >= 1.0 {
			write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
		} else {
			write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}
