use std::time::Duration;

use annotate::render::{Overlay, OverlayStyle};
use url::Url;

/// The origin sent with annotation and segment requests.
pub const DEFAULT_ORIGIN: &str = "https://gitit.me";

/// The overlay is never redrawn more often than this per second.
pub const MAX_FRAME_RATE: u32 = 1000;

/// The container type probed for native playback of the primary manifest.
pub const NATIVE_MIME: &str = "application/vnd.apple.mpegurl";

/// Buffer policy for the secondary transport.
#[derive(Clone, Debug, PartialEq, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct StreamingSettings {
	/// How much buffered media to keep around the playhead.
	#[arg(
		id = "buffer-to-keep",
		long = "buffer-to-keep",
		env = "ANNOTATE_BUFFER_TO_KEEP",
		default_value = "30s",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub buffer_to_keep: Duration,

	/// How often buffered media outside of `buffer_to_keep` is pruned.
	#[arg(
		id = "buffer-pruning-interval",
		long = "buffer-pruning-interval",
		env = "ANNOTATE_BUFFER_PRUNING_INTERVAL",
		default_value = "30s",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub buffer_pruning_interval: Duration,

	/// Stalls shorter than this are recovered from without intervention.
	#[arg(
		id = "stall-threshold",
		long = "stall-threshold",
		env = "ANNOTATE_STALL_THRESHOLD",
		default_value = "500ms",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub stall_threshold: Duration,

	/// Replace already buffered segments when switching to a higher bitrate.
	#[arg(
		id = "fast-switch",
		long = "fast-switch",
		env = "ANNOTATE_FAST_SWITCH",
		default_value = "true",
		action = clap::ArgAction::Set,
	)]
	pub fast_switch: bool,
}

impl Default for StreamingSettings {
	fn default() -> Self {
		Self {
			buffer_to_keep: Duration::from_secs(30),
			buffer_pruning_interval: Duration::from_secs(30),
			stall_threshold: Duration::from_millis(500),
			fast_switch: true,
		}
	}
}

/// Settings handed to the primary transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryConfig {
	/// Offload demuxing to a worker when the engine supports it.
	pub enable_worker: bool,

	/// Headers added to every manifest and segment request.
	pub headers: Vec<(String, String)>,
}

/// Settings handed to the secondary transport.
#[derive(Clone, Debug, PartialEq)]
pub struct SecondaryConfig {
	pub streaming: StreamingSettings,

	/// Start playback as soon as enough media is buffered.
	pub autoplay: bool,
}

/// Configuration for the player.
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct PlayerConfig {
	/// The annotation payload, as an http(s) URL or a file path.
	#[arg(long, env = "ANNOTATE_ANNOTATIONS")]
	pub annotations: String,

	/// Optional bearer token for fetching the annotation payload.
	#[arg(long = "annotations-token", env = "ANNOTATE_ANNOTATIONS_TOKEN")]
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub annotations_token: Option<String>,

	/// The primary manifest (HLS), also used for native playback.
	#[arg(long, env = "ANNOTATE_PRIMARY")]
	pub primary: Url,

	/// The secondary manifest (DASH).
	#[arg(long, env = "ANNOTATE_SECONDARY")]
	pub secondary: Url,

	/// The origin sent with requests.
	#[arg(long, env = "ANNOTATE_ORIGIN", default_value = DEFAULT_ORIGIN)]
	#[serde(default = "default_origin")]
	pub origin: String,

	/// The container type the video element is probed with for native playback.
	#[arg(long = "native-mime", env = "ANNOTATE_NATIVE_MIME", default_value = NATIVE_MIME)]
	#[serde(default = "default_native_mime")]
	pub native_mime: String,

	/// How many times per second the overlay is redrawn.
	///
	/// Between 1 and 1000.
	#[arg(
		long = "frame-rate",
		env = "ANNOTATE_FRAME_RATE",
		default_value_t = 60,
		value_parser = clap::value_parser!(u32).range(1..=1000),
	)]
	#[serde(default = "default_frame_rate", deserialize_with = "deserialize_frame_rate")]
	pub frame_rate: u32,

	/// An observation is drawn while the playhead is closer than this to its offset.
	#[arg(
		long,
		env = "ANNOTATE_TOLERANCE",
		default_value = "100ms",
		value_parser = humantime::parse_duration,
	)]
	#[serde(default = "default_tolerance", with = "humantime_serde")]
	pub tolerance: Duration,

	#[command(flatten)]
	#[serde(default)]
	pub streaming: StreamingSettings,
}

fn default_origin() -> String {
	DEFAULT_ORIGIN.to_string()
}

fn default_native_mime() -> String {
	NATIVE_MIME.to_string()
}

fn default_frame_rate() -> u32 {
	60
}

fn deserialize_frame_rate<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
	let rate = <u32 as serde::Deserialize>::deserialize(deserializer)?;
	if !(1..=MAX_FRAME_RATE).contains(&rate) {
		return Err(serde::de::Error::custom(format!(
			"frame_rate must be between 1 and {MAX_FRAME_RATE}, got {rate}"
		)));
	}
	Ok(rate)
}

fn default_tolerance() -> Duration {
	Duration::from_millis(100)
}

impl PlayerConfig {
	pub fn new(annotations: impl Into<String>, primary: Url, secondary: Url) -> Self {
		Self {
			annotations: annotations.into(),
			annotations_token: None,
			primary,
			secondary,
			origin: default_origin(),
			native_mime: default_native_mime(),
			frame_rate: default_frame_rate(),
			tolerance: default_tolerance(),
			streaming: StreamingSettings::default(),
		}
	}

	/// The primary transport must tolerate byte-range requests and cross-origin headers.
	pub fn primary_config(&self) -> PrimaryConfig {
		PrimaryConfig {
			enable_worker: true,
			headers: vec![
				("Range".to_string(), "bytes=0-".to_string()),
				("Origin".to_string(), self.origin.clone()),
			],
		}
	}

	pub fn secondary_config(&self) -> SecondaryConfig {
		SecondaryConfig {
			streaming: self.streaming.clone(),
			autoplay: true,
		}
	}

	/// The time between overlay frames.
	pub fn frame_period(&self) -> Duration {
		Duration::from_secs(1) / self.frame_rate.clamp(1, MAX_FRAME_RATE)
	}

	pub fn overlay(&self) -> Overlay {
		Overlay::new(OverlayStyle::default(), self.tolerance.as_secs_f64())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	const REQUIRED: [&str; 7] = [
		"test",
		"--annotations",
		"annotations.json",
		"--primary",
		"https://cdn.example.com/manifest.m3u8",
		"--secondary",
		"https://cdn.example.com/manifest.mpd",
	];

	#[test]
	fn test_cli_defaults() {
		let config = PlayerConfig::parse_from(REQUIRED);
		assert_eq!(config.annotations, "annotations.json");
		assert_eq!(config.origin, DEFAULT_ORIGIN);
		assert_eq!(config.native_mime, NATIVE_MIME);
		assert_eq!(config.frame_rate, 60);
		assert_eq!(config.tolerance, Duration::from_millis(100));
		assert_eq!(config.streaming, StreamingSettings::default());
		assert_eq!(config.annotations_token, None);
	}

	#[test]
	fn test_cli_streaming_overrides() {
		let args = REQUIRED
			.into_iter()
			.chain(["--stall-threshold", "250ms", "--fast-switch", "false", "--frame-rate", "30"]);
		let config = PlayerConfig::parse_from(args);

		assert_eq!(config.streaming.stall_threshold, Duration::from_millis(250));
		assert!(!config.streaming.fast_switch);
		assert_eq!(config.streaming.buffer_to_keep, Duration::from_secs(30));
		assert_eq!(config.frame_period(), Duration::from_secs(1) / 30);
	}

	#[test]
	fn test_frame_rate_bounds() {
		for rate in ["0", "1001", "2000000000"] {
			let args = REQUIRED.into_iter().chain(["--frame-rate", rate]);
			assert!(PlayerConfig::try_parse_from(args).is_err(), "{rate}");
		}

		let config = PlayerConfig::parse_from(REQUIRED.into_iter().chain(["--frame-rate", "1000"]));
		assert_eq!(config.frame_period(), Duration::from_millis(1));

		let toml = r#"
			annotations = "annotations.json"
			primary = "https://cdn.example.com/manifest.m3u8"
			secondary = "https://cdn.example.com/manifest.mpd"
			frame_rate = 2000000000
		"#;
		assert!(toml::from_str::<PlayerConfig>(toml).is_err());

		// Set programmatically, the period is still never zero.
		let mut config = PlayerConfig::parse_from(REQUIRED);
		config.frame_rate = 2_000_000_000;
		assert_eq!(config.frame_period(), Duration::from_millis(1));
		config.frame_rate = 0;
		assert_eq!(config.frame_period(), Duration::from_secs(1));
	}

	#[test]
	fn test_cli_requires_sources() {
		assert!(PlayerConfig::try_parse_from(["test", "--annotations", "a.json"]).is_err());
	}

	#[test]
	fn test_toml_defaults() {
		let toml = r#"
			annotations = "https://storage.example.com/annotations.json"
			primary = "https://cdn.example.com/manifest.m3u8"
			secondary = "https://cdn.example.com/manifest.mpd"
		"#;

		let config: PlayerConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.origin, DEFAULT_ORIGIN);
		assert_eq!(config.tolerance, Duration::from_millis(100));
		assert_eq!(config.streaming, StreamingSettings::default());
	}

	#[test]
	fn test_toml_streaming() {
		let toml = r#"
			annotations = "annotations.json"
			primary = "https://cdn.example.com/manifest.m3u8"
			secondary = "https://cdn.example.com/manifest.mpd"
			tolerance = "50ms"

			[streaming]
			buffer_to_keep = "1m"
			fast_switch = false
		"#;

		let config: PlayerConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.tolerance, Duration::from_millis(50));
		assert_eq!(config.streaming.buffer_to_keep, Duration::from_secs(60));
		assert_eq!(config.streaming.buffer_pruning_interval, Duration::from_secs(30));
		assert!(!config.streaming.fast_switch);
	}

	#[test]
	fn test_toml_unknown_field() {
		let toml = r#"
			annotations = "annotations.json"
			primary = "https://cdn.example.com/manifest.m3u8"
			secondary = "https://cdn.example.com/manifest.mpd"
			bogus = 1
		"#;

		assert!(toml::from_str::<PlayerConfig>(toml).is_err());
	}

	#[test]
	fn test_primary_headers() {
		let config = PlayerConfig::parse_from(REQUIRED.into_iter().chain(["--origin", "https://example.org"]));
		let primary = config.primary_config();
		assert!(primary.enable_worker);
		assert_eq!(
			primary.headers,
			vec![
				("Range".to_string(), "bytes=0-".to_string()),
				("Origin".to_string(), "https://example.org".to_string()),
			]
		);
	}
}
