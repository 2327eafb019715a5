use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

use crate::{NormalizedBoundingBox, Result, TimeOffset};

/// The output of an offline recognition job over a single video.
///
/// Loaded once and shared read-only for the lifetime of a player.
/// Keys follow the producer's snake_case output; the camelCase spelling is accepted too.
/// Missing fields take their zero value, matching how the producer omits them.
///
/// JSON example:
/// {
///   "annotation_results": [{
///     "logo_recognition_annotations": [{
///       "entity": { "description": "Acme" },
///       "tracks": [{
///         "timestamped_objects": [{
///           "normalized_bounding_box": { "left": 0.1, "top": 0.2, "right": 0.3, "bottom": 0.4 },
///           "time_offset": { "seconds": 5, "nanos": 50000000 }
///         }]
///       }]
///     }]
///   }]
/// }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AnnotationPayload {
	#[serde(alias = "annotationResults")]
	pub annotation_results: Vec<AnnotationResult>,
}

impl AnnotationPayload {
	pub fn from_slice(v: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(v)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Every entity track across every result, in payload order.
	pub fn entity_tracks(&self) -> impl Iterator<Item = &EntityTrack> {
		self.annotation_results
			.iter()
			.flat_map(|result| result.logo_recognition_annotations.iter())
	}

	/// Every observation in the payload, paired with the entity it belongs to.
	pub fn observations(&self) -> impl Iterator<Item = (&Entity, &TimestampedObservation)> {
		self.entity_tracks().flat_map(|annotation| {
			annotation
				.tracks
				.iter()
				.flat_map(|track| track.timestamped_objects.iter())
				.map(move |observation| (&annotation.entity, observation))
		})
	}

	pub fn is_empty(&self) -> bool {
		self.observations().next().is_none()
	}

	/// Summarize when each entity appears, keyed by description.
	///
	/// Entities sharing a description are merged, the same way the overlay reports them.
	pub fn summary(&self) -> Vec<EntitySummary> {
		let mut entities = BTreeMap::<&str, EntitySummary>::new();

		for (entity, observation) in self.observations() {
			let offset = observation.time_offset;
			match entities.entry(entity.description.as_str()) {
				btree_map::Entry::Vacant(entry) => {
					entry.insert(EntitySummary {
						description: entity.description.clone(),
						observations: 1,
						first: offset,
						last: offset,
					});
				}
				btree_map::Entry::Occupied(mut entry) => {
					let summary = entry.get_mut();
					summary.observations += 1;
					summary.first = summary.first.min(offset);
					summary.last = summary.last.max(offset);
				}
			}
		}

		entities.into_values().collect()
	}
}

/// The annotations produced for one input video.
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AnnotationResult {
	#[serde(alias = "inputUri")]
	pub input_uri: Option<String>,

	/// One entry per recognized entity.
	#[serde(alias = "logoRecognitionAnnotations")]
	pub logo_recognition_annotations: Vec<EntityTrack>,
}

/// Every appearance of a single recognized entity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EntityTrack {
	pub entity: Entity,

	/// Each track is one continuous appearance.
	pub tracks: Vec<Track>,
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Entity {
	#[serde(alias = "entityId")]
	pub entity_id: Option<String>,

	/// The human readable name, used as the label.
	pub description: String,

	#[serde(alias = "languageCode")]
	pub language_code: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Track {
	pub segment: Option<Segment>,

	#[serde(alias = "timestampedObjects")]
	pub timestamped_objects: Vec<TimestampedObservation>,

	pub confidence: Option<f64>,
}

/// The span of the video covered by a track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Segment {
	#[serde(alias = "startTimeOffset")]
	pub start_time_offset: TimeOffset,

	#[serde(alias = "endTimeOffset")]
	pub end_time_offset: TimeOffset,
}

/// Where an entity was seen at a single point in time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct TimestampedObservation {
	#[serde(alias = "normalizedBoundingBox")]
	pub normalized_bounding_box: NormalizedBoundingBox,

	#[serde(alias = "timeOffset")]
	pub time_offset: TimeOffset,
}

/// When an entity appears in the video.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
	pub description: String,
	pub observations: usize,
	pub first: TimeOffset,
	pub last: TimeOffset,
}

#[cfg(test)]
mod test {
	use super::*;

	const PAYLOAD: &str = r#"{
		"annotation_results": [{
			"input_uri": "/bucket/video.mp4",
			"logo_recognition_annotations": [
				{
					"entity": { "entity_id": "/m/045c7b", "description": "Acme", "language_code": "en-US" },
					"tracks": [{
						"segment": {
							"start_time_offset": { "seconds": 5 },
							"end_time_offset": { "seconds": 6, "nanos": 500000000 }
						},
						"timestamped_objects": [
							{
								"normalized_bounding_box": { "left": 0.1, "top": 0.2, "right": 0.3, "bottom": 0.4 },
								"time_offset": { "seconds": 5, "nanos": 50000000 }
							},
							{
								"normalized_bounding_box": { "left": 0.1, "top": 0.2, "right": 0.3, "bottom": 0.4 },
								"time_offset": { "seconds": 6 }
							}
						],
						"confidence": 0.92
					}]
				},
				{
					"entity": { "description": "Globex" },
					"tracks": [{
						"timestamped_objects": [{
							"normalized_bounding_box": { "right": 1, "bottom": 1 },
							"time_offset": { "nanos": 400000000 }
						}]
					}]
				}
			]
		}]
	}"#;

	#[test]
	fn parse() {
		let payload = AnnotationPayload::from_slice(PAYLOAD.as_bytes()).unwrap();
		assert_eq!(payload.annotation_results.len(), 1);

		let result = &payload.annotation_results[0];
		assert_eq!(result.input_uri.as_deref(), Some("/bucket/video.mp4"));
		assert_eq!(result.logo_recognition_annotations.len(), 2);

		let acme = &result.logo_recognition_annotations[0];
		assert_eq!(acme.entity.description, "Acme");
		assert_eq!(acme.entity.entity_id.as_deref(), Some("/m/045c7b"));

		let track = &acme.tracks[0];
		assert_eq!(track.confidence, Some(0.92));
		assert_eq!(track.segment.unwrap().start_time_offset, TimeOffset::from_secs(5));
		assert_eq!(track.timestamped_objects[0].time_offset, TimeOffset::new(5, 50_000_000).unwrap());

		let globex = &result.logo_recognition_annotations[1];
		assert_eq!(
			globex.tracks[0].timestamped_objects[0].normalized_bounding_box,
			NormalizedBoundingBox::new(0.0, 0.0, 1.0, 1.0)
		);
	}

	#[test]
	fn parse_camel_case() {
		let json = r#"{
			"annotationResults": [{
				"logoRecognitionAnnotations": [{
					"entity": { "entityId": "/m/1", "description": "Initech" },
					"tracks": [{
						"timestampedObjects": [{
							"normalizedBoundingBox": { "left": 0.5, "right": 0.75, "bottom": 0.5 },
							"timeOffset": "3.25s"
						}]
					}]
				}]
			}]
		}"#;

		let payload = AnnotationPayload::from_slice(json.as_bytes()).unwrap();
		let (entity, observation) = payload.observations().next().unwrap();
		assert_eq!(entity.description, "Initech");
		assert_eq!(observation.time_offset, TimeOffset::new(3, 250_000_000).unwrap());
	}

	#[test]
	fn empty_document() {
		let payload = AnnotationPayload::from_slice(b"{}").unwrap();
		assert!(payload.is_empty());
		assert!(payload.summary().is_empty());
	}

	#[test]
	fn malformed_document() {
		assert!(AnnotationPayload::from_slice(b"[1, 2, 3]").is_err());
		assert!(AnnotationPayload::from_slice(br#"{ "annotation_results": 5 }"#).is_err());
	}

	#[test]
	fn observations_across_results() {
		let mut payload = AnnotationPayload::from_slice(PAYLOAD.as_bytes()).unwrap();
		let copy = payload.annotation_results[0].clone();
		payload.annotation_results.push(copy);

		assert_eq!(payload.observations().count(), 6);
		assert_eq!(payload.entity_tracks().count(), 4);
	}

	#[test]
	fn summary() {
		let payload = AnnotationPayload::from_slice(PAYLOAD.as_bytes()).unwrap();
		let summary = payload.summary();

		assert_eq!(
			summary,
			vec![
				EntitySummary {
					description: "Acme".to_string(),
					observations: 2,
					first: TimeOffset::new(5, 50_000_000).unwrap(),
					last: TimeOffset::from_secs(6),
				},
				EntitySummary {
					description: "Globex".to_string(),
					observations: 1,
					first: TimeOffset::new(0, 400_000_000).unwrap(),
					last: TimeOffset::new(0, 400_000_000).unwrap(),
				},
			]
		);
	}

	#[test]
	fn round_trip_preserves_content() {
		let payload = AnnotationPayload::from_slice(PAYLOAD.as_bytes()).unwrap();
		let json = payload.to_json().unwrap();
		assert_eq!(AnnotationPayload::from_slice(json.as_bytes()).unwrap(), payload);
	}
}
