use std::sync::Arc;

use annotate::{ActiveEntitySet, AnnotationPayload};

use crate::TransportKind;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	/// Fetching annotations or waiting for the transport to become ready.
	#[default]
	Loading,

	/// Playback can start.
	Ready,

	/// Terminal. Nothing else happens after this.
	Failed { message: String },
}

/// Everything observable about a mounted player.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerState {
	pub phase: Phase,

	/// The transport currently in use, once one was started.
	pub transport: Option<TransportKind>,

	/// Set once the primary transport failed and the secondary took over.
	pub fallback: bool,

	pub annotations: Option<Arc<AnnotationPayload>>,

	/// The entities drawn in the most recent frame.
	pub active: ActiveEntitySet,
}

#[derive(Clone, Debug)]
pub enum Action {
	AnnotationsLoaded(Arc<AnnotationPayload>),
	TransportStarted { kind: TransportKind, fallback: bool },
	Ready,
	Failed(String),
	FrameRendered(ActiveEntitySet),
}

impl PlayerState {
	/// Apply an action, returning true if the state changed.
	pub fn apply(&mut self, action: Action) -> bool {
		if matches!(self.phase, Phase::Failed { .. }) {
			return false;
		}

		match action {
			Action::AnnotationsLoaded(payload) => {
				self.annotations = Some(payload);
				true
			}
			Action::TransportStarted { kind, fallback } => {
				self.transport = Some(kind);
				self.fallback |= fallback;
				self.phase = Phase::Loading;
				true
			}
			Action::Ready => {
				if self.phase == Phase::Ready {
					return false;
				}
				self.phase = Phase::Ready;
				true
			}
			Action::Failed(message) => {
				self.phase = Phase::Failed { message };
				self.active = ActiveEntitySet::new();
				true
			}
			Action::FrameRendered(active) => {
				if self.active == active {
					return false;
				}
				self.active = active;
				true
			}
		}
	}

	pub fn is_loading(&self) -> bool {
		self.phase == Phase::Loading
	}

	pub fn is_ready(&self) -> bool {
		self.phase == Phase::Ready
	}

	/// The terminal error message, if any.
	pub fn error(&self) -> Option<&str> {
		match &self.phase {
			Phase::Failed { message } => Some(message),
			_ => None,
		}
	}
}
