pub mod check;
pub mod compile;
pub mod render;
pub mod validate;

use std::path::Path;

use reelgraph_common::AppConfig;
use reelgraph_processing_core::{NormalizedProject, Normalizer, PrerenderedSurface};
use reelgraph_project_model::LoadedProject;
use reelgraph_render_engine::FfprobeProbe;

/// Load a scene file and normalize it with ffprobe.
pub async fn load_normalized(path: &Path, config: &AppConfig) -> anyhow::Result<NormalizedProject> {
    let scene =
        LoadedProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load scene: {e}"))?;

    let probe = FfprobeProbe::new(&config.render.ffprobe);
    let surface = PrerenderedSurface;
    let project = Normalizer::new(&probe, &surface)
        .normalize(scene.project)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to normalize scene: {e}"))?;
    Ok(project)
}
