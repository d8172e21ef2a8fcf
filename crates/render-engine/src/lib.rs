//! reelgraph render engine
//!
//! Compiles a normalized scene into an ffmpeg filter graph and an ASS
//! subtitle script, and drives ffmpeg to render it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! items ── group_items ──► groups ──► item chains ──► compositor ─┐
//!                                                                  │ outv-N
//! subtitle ── synthesizer ──► script.ass ──► subtitles burn-in ◄──┘
//!                                                  │ outv-subtitled
//! video audio + clips ──► audio chains ──► acopy/amix ── outa      │
//!                                                  │                │
//!                                                  ▼                ▼
//!                                       filter script ──► ffmpeg ──► <name>.<format>
//! ```
//!
//! Compilation ([`compile()`]) is synchronous and free of I/O. Rendering
//! ([`render_project`]) writes the scripts to a scratch directory, runs
//! ffmpeg and reports progress.

pub mod audio;
pub mod compile;
pub mod compositor;
pub mod export;
pub mod filtergraph;
pub mod filters;
pub mod probe;
pub mod subtitles;

pub use compile::{compile, CompileOptions, CompiledGraph};
pub use export::*;
pub use filtergraph::{FilterGraph, FilterNode, FilterOptions, GraphError};
pub use probe::FfprobeProbe;
