//! Check for the external engine binaries.

use reelgraph_common::AppConfig;
use reelgraph_render_engine::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("reelgraph System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for binary in [&config.render.ffmpeg, &config.render.ffprobe] {
        if command_exists(binary) {
            println!("[OK] {binary}");
        } else {
            println!("[MISSING] {binary}");
            all_ok = false;
        }
    }
    println!("[OK] Work directory: {}", config.render.work_dir.display());
    println!("[OK] Subtitle encoding: {:?}", config.render.subtitle_encoding);

    println!();
    if all_ok {
        println!("All required binaries are available. reelgraph is ready.");
    } else {
        println!("Some binaries are missing. Install ffmpeg or set render.ffmpeg/render.ffprobe in the config.");
    }

    Ok(())
}
