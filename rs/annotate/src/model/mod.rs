mod geometry;
mod offset;
mod payload;

pub use geometry::*;
pub use offset::*;
pub use payload::*;
