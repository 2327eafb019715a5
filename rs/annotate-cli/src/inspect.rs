use std::time::Duration;

use annotate::render::{Overlay, OverlayStyle, Recorder};
use annotate::{AnnotationPayload, Size};
use annotate_player::{DEFAULT_ORIGIN, Fetch, HttpFetcher};
use anyhow::Context;

/// Where to load the annotation payload from.
#[derive(clap::Args, Clone, Debug)]
pub struct Source {
	/// The annotation payload, as an http(s) URL or a file path.
	#[arg(long, env = "ANNOTATE_ANNOTATIONS")]
	pub annotations: String,

	/// Optional bearer token for fetching the payload.
	#[arg(long = "annotations-token", env = "ANNOTATE_ANNOTATIONS_TOKEN")]
	pub token: Option<String>,

	/// The origin sent with the request.
	#[arg(long, env = "ANNOTATE_ORIGIN", default_value = DEFAULT_ORIGIN)]
	pub origin: String,
}

impl Source {
	pub async fn load(&self) -> anyhow::Result<AnnotationPayload> {
		let url = annotate_player::parse_source(&self.annotations)?;
		let fetcher = HttpFetcher::new(&self.origin, self.token.clone())?;

		fetcher
			.fetch(&url)
			.await
			.with_context(|| format!("failed to load annotations from {url}"))
	}
}

#[derive(clap::Args, Clone, Debug)]
pub struct Frame {
	/// The playback time in seconds.
	#[arg(long)]
	pub at: f64,

	#[arg(long, default_value_t = 1280)]
	pub width: u32,

	#[arg(long, default_value_t = 720)]
	pub height: u32,

	/// An observation is drawn while the playback time is closer than this to its offset.
	#[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
	pub tolerance: Duration,
}

pub async fn inspect(source: Source, frame: Frame) -> anyhow::Result<()> {
	let payload = source.load().await?;
	let output = render(&payload, &frame)?;
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

/// Render a single frame, returning what was drawn as JSON.
fn render(payload: &AnnotationPayload, frame: &Frame) -> anyhow::Result<serde_json::Value> {
	let overlay = Overlay::new(OverlayStyle::default(), frame.tolerance.as_secs_f64());
	let mut canvas = Recorder::new();
	let size = Size::new(frame.width, frame.height);

	let active = overlay
		.render(&mut canvas, payload, size, frame.at)
		.context("failed to render frame")?;

	tracing::info!(at = frame.at, %size, %active, "rendered frame");

	let drawn = canvas.snapshot();
	Ok(serde_json::json!({
		"at": frame.at,
		"size": drawn.size,
		"active": active,
		"commands": drawn.commands,
	}))
}

pub async fn entities(source: Source) -> anyhow::Result<()> {
	let payload = source.load().await?;
	if payload.is_empty() {
		tracing::warn!(annotations = %source.annotations, "payload has no observations");
	}

	println!("{}", serde_json::to_string_pretty(&payload.summary())?);
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;

	const PAYLOAD: &str = r#"{
		"annotation_results": [{
			"logo_recognition_annotations": [{
				"entity": { "description": "Acme" },
				"tracks": [{ "timestamped_objects": [{
					"normalized_bounding_box": { "left": 0.25, "top": 0.5, "right": 0.75, "bottom": 0.75 },
					"time_offset": { "seconds": 5, "nanos": 50000000 }
				}] }]
			}]
		}]
	}"#;

	fn frame(at: f64) -> Frame {
		Frame {
			at,
			width: 800,
			height: 400,
			tolerance: Duration::from_millis(100),
		}
	}

	#[tokio::test]
	async fn inspect_json() {
		let path = std::env::temp_dir().join(format!("annotate-inspect-{}.json", std::process::id()));
		tokio::fs::write(&path, PAYLOAD).await.unwrap();

		let source = Source {
			annotations: path.to_str().unwrap().to_string(),
			token: None,
			origin: DEFAULT_ORIGIN.to_string(),
		};
		let payload = source.load().await.unwrap();
		tokio::fs::remove_file(&path).await.unwrap();

		let output = render(&payload, &frame(5.0)).unwrap();
		assert_eq!(
			output,
			serde_json::json!({
				"at": 5.0,
				"size": { "width": 800, "height": 400 },
				"active": ["Acme"],
				"commands": [
					{
						"kind": "strokeRect",
						"rect": { "x": 200.0, "y": 200.0, "width": 400.0, "height": 100.0 },
						"color": "#4CAF50",
						"line_width": 2.0,
					},
					{
						"kind": "fillRect",
						"rect": { "x": 200.0, "y": 180.0, "width": 32.0, "height": 20.0 },
						"color": "rgba(0, 0, 0, 0.7)",
					},
					{
						"kind": "fillText",
						"text": "Acme",
						"x": 204.0,
						"y": 195.0,
						"color": "#FFFFFF",
						"font": "14px Arial",
					},
				],
			})
		);

		let output = render(&payload, &frame(5.2)).unwrap();
		assert_eq!(output["active"], serde_json::json!([]));
		assert_eq!(output["commands"], serde_json::json!([]));
	}

	#[tokio::test]
	async fn missing_source() {
		let source = Source {
			annotations: "/definitely/not/here.json".to_string(),
			token: None,
			origin: DEFAULT_ORIGIN.to_string(),
		};

		let err = source.load().await.unwrap_err();
		assert!(err.to_string().starts_with("failed to load annotations"), "{err}");
	}
}
