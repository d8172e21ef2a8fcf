//! reelgraph Project Model
//!
//! Defines the data contracts of a scene description:
//! - **Project:** canvas, duration, frame rate, background, output format
//! - **Items:** timed visual layers (video, image, GIF, text, SVG)
//! - **Audio:** timed audio clips with trim, speed, loop, and volume
//! - **Subtitles:** captions with word timings and style configuration
//!
//! Scene files are JSON with camelCase field names. Items are a tagged
//! union discriminated by the `type` field.

pub mod audio;
pub mod color;
pub mod item;
pub mod layout;
pub mod project;
pub mod subtitle;

pub use audio::*;
pub use item::*;
pub use layout::*;
pub use project::*;
pub use subtitle::*;
