//! Validate a scene file.

use std::path::PathBuf;

use reelgraph_project_model::LoadedProject;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating scene at: {}", path.display());

    let scene =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load scene: {e}"))?;
    let settings = scene
        .project
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid scene: {e}"))?;

    println!("  Name: {}", settings.name);
    println!("  Canvas: {}", settings.canvas.size());
    println!("  Duration: {}s @ {} fps", settings.duration, settings.frame_rate);
    println!("  Format: {}", settings.output_format);
    println!("  Visuals: {}", scene.project.visuals.len());
    println!("  Audios: {}", scene.project.audios.len());
    println!(
        "  Captions: {}",
        scene.project.subtitle.as_ref().map_or(0, |s| s.captions.len())
    );

    let errors = scene.validate_sources();
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nScene is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Rendering will fall back to defaults or fail.",
            errors.len()
        );
    }

    Ok(())
}
