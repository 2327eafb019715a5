use serde::{Deserialize, Serialize};

/// The rendered size of a surface in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
	pub width: u32,
	pub height: u32,
}

impl Size {
	pub const fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}

	pub const fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}
}

impl std::fmt::Display for Size {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// A rectangle in pixel space, anchored at its top-left corner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self { x, y, width, height }
	}
}

/// A rectangle expressed as fractions of the frame's width and height.
///
/// Each coordinate is within `[0, 1]`, with `left <= right` and `top <= bottom`.
/// The producer omits coordinates that are zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct NormalizedBoundingBox {
	pub left: f64,
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
}

impl NormalizedBoundingBox {
	pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
		Self {
			left,
			top,
			right,
			bottom,
		}
	}

	/// Returns true if the box satisfies its invariants.
	pub fn is_valid(&self) -> bool {
		let unit = |v: f64| (0.0..=1.0).contains(&v);
		unit(self.left)
			&& unit(self.top)
			&& unit(self.right)
			&& unit(self.bottom)
			&& self.left <= self.right
			&& self.top <= self.bottom
	}

	/// Scale the box to a surface of the given size.
	pub fn to_pixels(&self, size: Size) -> Rect {
		let width = size.width as f64;
		let height = size.height as f64;

		Rect {
			x: self.left * width,
			y: self.top * height,
			width: (self.right - self.left) * width,
			height: (self.bottom - self.top) * height,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn to_pixels() {
		let bbox = NormalizedBoundingBox::new(0.25, 0.125, 0.75, 0.5);
		let rect = bbox.to_pixels(Size::new(640, 360));
		assert_eq!(rect, Rect::new(160.0, 45.0, 320.0, 135.0));
	}

	#[test]
	fn to_pixels_empty_surface() {
		let bbox = NormalizedBoundingBox::new(0.25, 0.1, 0.75, 0.5);
		let rect = bbox.to_pixels(Size::default());
		assert_eq!(rect, Rect::default());
	}

	#[test]
	fn validity() {
		assert!(NormalizedBoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
		assert!(NormalizedBoundingBox::new(0.5, 0.5, 0.5, 0.5).is_valid());
		assert!(!NormalizedBoundingBox::new(0.6, 0.0, 0.5, 1.0).is_valid());
		assert!(!NormalizedBoundingBox::new(0.0, 0.6, 1.0, 0.5).is_valid());
		assert!(!NormalizedBoundingBox::new(-0.1, 0.0, 1.0, 1.0).is_valid());
		assert!(!NormalizedBoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_valid());
	}

	#[test]
	fn omitted_coordinates() {
		let bbox: NormalizedBoundingBox = serde_json::from_str(r#"{ "right": 0.5, "bottom": 0.25 }"#).unwrap();
		assert_eq!(bbox, NormalizedBoundingBox::new(0.0, 0.0, 0.5, 0.25));
	}
}
