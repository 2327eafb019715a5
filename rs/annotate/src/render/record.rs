use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::{Canvas, DrawCommand, Result};
use crate::Size;

/// The contents of a [Recorder] at a point in time.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RecordedFrame {
	pub size: Size,

	/// The commands drawn since the last clear.
	pub commands: Vec<DrawCommand>,

	/// How many times the canvas was cleared.
	pub clears: u64,
}

/// An in-memory canvas that records draw commands instead of rasterizing them.
///
/// Clones share the same recording, so a handle can be kept while another is moved into a render task.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
	frame: Arc<Mutex<RecordedFrame>>,
}

impl Recorder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return a copy of what is currently on the canvas.
	pub fn snapshot(&self) -> RecordedFrame {
		self.frame.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	fn with<T>(&self, f: impl FnOnce(&mut RecordedFrame) -> T) -> T {
		f(&mut self.frame.lock().unwrap_or_else(PoisonError::into_inner))
	}
}

impl Canvas for Recorder {
	fn resize(&mut self, size: Size) -> Result<()> {
		self.with(|frame| frame.size = size);
		Ok(())
	}

	fn clear(&mut self) -> Result<()> {
		self.with(|frame| {
			frame.commands.clear();
			frame.clears += 1;
		});
		Ok(())
	}

	fn draw(&mut self, command: &DrawCommand) -> Result<()> {
		self.with(|frame| frame.commands.push(command.clone()));
		Ok(())
	}
}
