use super::{Canvas, Color, DrawCommand, Result};
use crate::sync::{self, ActiveEntitySet, DEFAULT_TOLERANCE};
use crate::{AnnotationPayload, Rect, Size};

/// How a labeled bounding box is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
	pub box_color: Color,
	pub box_width: f64,

	pub label_background: Color,
	pub label_color: Color,
	pub label_font: String,

	/// The height of the label background, drawn directly above the box.
	pub label_height: f64,

	/// The label background is this wide per character of the label.
	pub label_char_width: f64,

	/// Horizontal inset of the text within the label background.
	pub label_padding: f64,

	/// Distance from the top of the box up to the text baseline.
	pub label_baseline: f64,
}

impl Default for OverlayStyle {
	fn default() -> Self {
		Self {
			box_color: Color::rgb(0x4C, 0xAF, 0x50),
			box_width: 2.0,
			label_background: Color::rgba(0, 0, 0, 0.7),
			label_color: Color::WHITE,
			label_font: "14px Arial".to_string(),
			label_height: 20.0,
			label_char_width: 8.0,
			label_padding: 4.0,
			label_baseline: 5.0,
		}
	}
}

/// Draws every observation visible at the current playback time.
///
/// Stateless between frames: each call resizes and clears the canvas, then
/// draws from scratch and returns that frame's [ActiveEntitySet].
#[derive(Debug, Clone)]
pub struct Overlay {
	style: OverlayStyle,
	tolerance: f64,
}

impl Default for Overlay {
	fn default() -> Self {
		Self::new(OverlayStyle::default(), DEFAULT_TOLERANCE)
	}
}

impl Overlay {
	pub fn new(style: OverlayStyle, tolerance: f64) -> Self {
		Self { style, tolerance }
	}

	pub fn style(&self) -> &OverlayStyle {
		&self.style
	}

	pub fn tolerance(&self) -> f64 {
		self.tolerance
	}

	/// Render a single frame.
	///
	/// `size` is the rendered size of the video and `current` its playback time in seconds.
	/// Observations with an invalid bounding box are skipped.
	pub fn render<C: Canvas + ?Sized>(
		&self,
		canvas: &mut C,
		payload: &AnnotationPayload,
		size: Size,
		current: f64,
	) -> Result<ActiveEntitySet> {
		canvas.resize(size)?;
		canvas.clear()?;

		let mut active = ActiveEntitySet::new();

		for matched in sync::visible(payload, current, self.tolerance) {
			let bbox = matched.observation.normalized_bounding_box;
			let label = matched.entity.description.as_str();

			if !bbox.is_valid() {
				tracing::debug!(entity = %label, offset = %matched.observation.time_offset, ?bbox, "skipping invalid bounding box");
				continue;
			}

			for command in self.label_box(label, bbox.to_pixels(size)) {
				canvas.draw(&command)?;
			}

			active.insert(label);
		}

		Ok(active)
	}

	/// The commands for one labeled box: the outline, the label background and the label text.
	pub fn label_box(&self, label: &str, rect: Rect) -> [DrawCommand; 3] {
		let style = &self.style;
		let chars = label.chars().count() as f64;

		[
			DrawCommand::StrokeRect {
				rect,
				color: style.box_color,
				line_width: style.box_width,
			},
			DrawCommand::FillRect {
				rect: Rect::new(
					rect.x,
					rect.y - style.label_height,
					chars * style.label_char_width,
					style.label_height,
				),
				color: style.label_background,
			},
			DrawCommand::FillText {
				text: label.to_string(),
				x: rect.x + style.label_padding,
				y: rect.y - style.label_baseline,
				color: style.label_color,
				font: style.label_font.clone(),
			},
		]
	}
}
