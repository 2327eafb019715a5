use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

const NANOS_PER_SEC: i128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid time offset")]
pub struct InvalidOffset;

/// A position in the video timeline, relative to the start of the video.
///
/// Encoded as whole seconds plus a nanosecond fraction, the same way the annotation producer writes it.
/// Both parts carry the same sign; the producer omits zero-valued parts, so both default to zero.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeOffset {
	seconds: i64,
	nanos: i32,
}

impl TimeOffset {
	/// The start of the video.
	pub const ZERO: Self = Self { seconds: 0, nanos: 0 };

	pub const fn new(seconds: i64, nanos: i32) -> Result<Self, InvalidOffset> {
		if nanos <= -1_000_000_000 || nanos >= 1_000_000_000 {
			return Err(InvalidOffset);
		}

		if (seconds > 0 && nanos < 0) || (seconds < 0 && nanos > 0) {
			return Err(InvalidOffset);
		}

		Ok(Self { seconds, nanos })
	}

	pub const fn from_secs(seconds: i64) -> Self {
		Self { seconds, nanos: 0 }
	}

	pub const fn from_millis(millis: i64) -> Self {
		Self {
			seconds: millis / 1000,
			nanos: ((millis % 1000) * 1_000_000) as i32,
		}
	}

	pub fn from_nanos(nanos: i128) -> Result<Self, InvalidOffset> {
		let seconds = i64::try_from(nanos / NANOS_PER_SEC).map_err(|_| InvalidOffset)?;
		let nanos = (nanos % NANOS_PER_SEC) as i32;
		Ok(Self { seconds, nanos })
	}

	/// Convert from floating point seconds, rounding to the nearest nanosecond.
	pub fn from_secs_f64(seconds: f64) -> Result<Self, InvalidOffset> {
		if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
			return Err(InvalidOffset);
		}

		Self::from_nanos((seconds * 1e9).round() as i128)
	}

	pub const fn seconds(self) -> i64 {
		self.seconds
	}

	pub const fn subsec_nanos(self) -> i32 {
		self.nanos
	}

	pub const fn as_nanos(self) -> i128 {
		self.seconds as i128 * NANOS_PER_SEC + self.nanos as i128
	}

	/// The offset as a single floating point value, which is what the playback clock reports.
	pub fn as_secs_f64(self) -> f64 {
		self.seconds as f64 + self.nanos as f64 / 1e9
	}

	fn is_negative(self) -> bool {
		self.seconds < 0 || self.nanos < 0
	}
}

impl TryFrom<Duration> for TimeOffset {
	type Error = InvalidOffset;

	fn try_from(duration: Duration) -> Result<Self, Self::Error> {
		Self::from_nanos(duration.as_nanos().try_into().map_err(|_| InvalidOffset)?)
	}
}

impl FromStr for TimeOffset {
	type Err = InvalidOffset;

	/// Parse the duration string form, e.g. `5.050s` or `-1.5s`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim().strip_suffix('s').ok_or(InvalidOffset)?;
		let (negative, s) = match s.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, s),
		};

		let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
		let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
		if whole.is_empty() || !digits(whole) || !digits(fraction) || fraction.len() > 9 {
			return Err(InvalidOffset);
		}

		let seconds: i128 = whole.parse().map_err(|_| InvalidOffset)?;
		let nanos = fraction
			.bytes()
			.chain(std::iter::repeat(b'0'))
			.take(9)
			.fold(0i128, |acc, b| acc * 10 + (b - b'0') as i128);

		let total = seconds
			.checked_mul(NANOS_PER_SEC)
			.and_then(|total| total.checked_add(nanos))
			.ok_or(InvalidOffset)?;
		Self::from_nanos(if negative { -total } else { total })
	}
}

impl std::fmt::Display for TimeOffset {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let sign = if self.is_negative() { "-" } else { "" };
		let seconds = self.seconds.unsigned_abs();
		let nanos = self.nanos.unsigned_abs();

		if nanos == 0 {
			return write!(f, "{sign}{seconds}s");
		}

		let fraction = format!("{nanos:09}");
		write!(f, "{sign}{seconds}.{}s", fraction.trim_end_matches('0'))
	}
}

impl std::fmt::Debug for TimeOffset {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}

// The producer writes `{ "seconds": 5, "nanos": 50000000 }`, with int64 seconds sometimes quoted.
// The duration string form (`"5.050s"`) is accepted too.
#[serde_as]
#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
	Parts {
		#[serde(default)]
		#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
		seconds: i64,
		#[serde(default)]
		nanos: i32,
	},
	Text(#[serde_as(as = "DisplayFromStr")] TimeOffset),
}

impl<'de> Deserialize<'de> for TimeOffset {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		match Wire::deserialize(deserializer)? {
			Wire::Parts { seconds, nanos } => Self::new(seconds, nanos).map_err(serde::de::Error::custom),
			Wire::Text(offset) => Ok(offset),
		}
	}
}
