//! Compile a scene and print its filter graph.

use std::path::PathBuf;

use anyhow::Context;
use reelgraph_common::AppConfig;
use reelgraph_render_engine::{compile, CompileOptions};

pub async fn run(
    path: PathBuf,
    graph_out: Option<PathBuf>,
    subtitles_out: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let project = super::load_normalized(&path, config).await?;

    let mut options = CompileOptions::in_dir(&config.render.work_dir);
    if let Some(out) = &subtitles_out {
        options.subtitle_script = out.clone();
    }
    let compiled = compile(&project, &options).map_err(|e| anyhow::anyhow!("Compilation failed: {e}"))?;
    let script = compiled.filter_script();

    match &graph_out {
        Some(out) => {
            std::fs::write(out, &script)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Filter graph written to {}", out.display());
        }
        None => println!("{script}"),
    }

    match (&compiled.subtitles, &subtitles_out) {
        (Some(subtitles), Some(out)) => {
            std::fs::write(out, config.render.subtitle_encoding.encode(subtitles))
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Subtitle script written to {}", out.display());
        }
        (Some(_), None) => {
            eprintln!("Scene has subtitles; pass --subtitles-out to write the script.");
        }
        (None, _) => {}
    }

    eprintln!(
        "  Nodes: {}  Video: [{}]  Audio: {}",
        compiled.graph.len(),
        compiled.video_label,
        compiled
            .audio_label
            .as_deref()
            .map_or_else(|| "none".to_string(), |a| format!("[{a}]"))
    );

    Ok(())
}
