//! Render a scene to video.

use std::path::PathBuf;

use reelgraph_common::AppConfig;
use reelgraph_render_engine::{render_project, ExportProgress, RenderJob};

pub async fn run(path: PathBuf, output: PathBuf, config: AppConfig) -> anyhow::Result<()> {
    println!("Rendering scene at: {}", path.display());

    let project = super::load_normalized(&path, &config).await?;
    let job = RenderJob::new(project, output, config.render);

    println!("  Output: {}", job.output_path().display());
    println!("  Canvas: {}", job.project.settings.canvas.size());

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:>3}% ({}/{} frames, ETA: {:.0}s)  ",
            p.percent(),
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
    });

    match render_project(job, Some(progress_cb)).await {
        Ok(outcome) => {
            println!(
                "\nRender complete: {} ({} bytes, {}s)",
                outcome.path.display(),
                outcome.file_size,
                outcome.duration_secs
            );
            Ok(())
        }
        Err(e) => {
            if let Some(diagnostics) = e.diagnostics() {
                tracing::debug!(%diagnostics, "ffmpeg output");
                let tail: Vec<&str> = diagnostics.lines().rev().take(20).collect();
                eprintln!();
                for line in tail.iter().rev() {
                    eprintln!("  {line}");
                }
            }
            Err(anyhow::anyhow!("Render failed: {e}"))
        }
    }
}
