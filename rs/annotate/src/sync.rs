//! Matching observations against the playback clock.
//!
//! An observation is shown when the playback time is strictly within
//! [DEFAULT_TOLERANCE] seconds of its offset, in either direction.
//! There is no priority among overlapping matches; every match is drawn.

use std::collections::{BTreeSet, btree_set};

use serde::Serialize;

use crate::{AnnotationPayload, Entity, TimestampedObservation};

/// The default matching window in seconds.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Returns true if an observation at `offset` is visible at playback time `current`.
///
/// The boundary is excluded. A non-finite time never matches.
pub fn is_visible(current: f64, offset: f64, tolerance: f64) -> bool {
	(current - offset).abs() < tolerance
}

/// An observation that is visible at the requested time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
	pub entity: &'a Entity,
	pub observation: &'a TimestampedObservation,
}

/// Every observation visible at `current`, in payload order.
pub fn visible(payload: &AnnotationPayload, current: f64, tolerance: f64) -> impl Iterator<Item = Match<'_>> {
	payload
		.observations()
		.filter(move |(_, observation)| is_visible(current, observation.time_offset.as_secs_f64(), tolerance))
		.map(|(entity, observation)| Match { entity, observation })
}

/// The distinct entity descriptions visible in a single frame.
///
/// Built from scratch every frame and never merged with a previous frame.
/// Sorted alphabetically so the display order is stable.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct ActiveEntitySet(BTreeSet<String>);

impl ActiveEntitySet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an entity, returning false if it was already present.
	pub fn insert(&mut self, description: &str) -> bool {
		if self.0.contains(description) {
			return false;
		}

		self.0.insert(description.to_string())
	}

	pub fn contains(&self, description: &str) -> bool {
		self.0.contains(description)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl<'a> FromIterator<&'a str> for ActiveEntitySet {
	fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
		let mut set = Self::new();
		for description in iter {
			set.insert(description);
		}
		set
	}
}

impl IntoIterator for ActiveEntitySet {
	type Item = String;
	type IntoIter = btree_set::IntoIter<String>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl std::fmt::Display for ActiveEntitySet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[")?;
		for (i, description) in self.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{description}")?;
		}
		write!(f, "]")
	}
}
