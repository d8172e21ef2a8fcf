//! reelgraph Processing Core
//!
//! Prepares a loaded scene for graph compilation:
//! - **Normalization:** fills in defaults from probed media metadata and
//!   rasterized markup, applies resize/position presets, rounds values
//!   and orders items by track
//! - **Grouping:** partitions items into transition chains and singletons
//! - **Geometry:** resize, position and rotation helpers
//!
//! Only normalization performs I/O, through the [`MediaProbe`] and
//! [`RenderSurface`] seams. Grouping and geometry are pure computation.

pub mod geometry;
pub mod grouping;
pub mod normalize;
pub mod probe;

pub use grouping::{group_items, Group, GroupMember};
pub use normalize::{NormalizedProject, Normalizer};
pub use probe::{MediaInfo, MediaProbe, PrerenderedSurface, RasterImage, RenderSurface};
