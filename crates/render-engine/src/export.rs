//! Render jobs: compile a scene, hand it to ffmpeg, report progress.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use reelgraph_common::{ReelError, ReelResult, RenderDefaults};
use reelgraph_processing_core::NormalizedProject;
use reelgraph_project_model::{Item, ItemKind};

use crate::compile::{compile, CompileOptions, CompiledGraph};
use crate::filtergraph::num;

/// File name of the serialized filter graph inside the work directory.
pub const FILTER_SCRIPT_NAME: &str = "filtergraph.txt";

/// A normalized scene ready to be rendered.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub project: NormalizedProject,

    /// Directory receiving `<name>.<format>`.
    pub output_dir: PathBuf,

    /// Scratch directory for the filter and subtitle scripts.
    pub work_dir: PathBuf,

    /// Engine settings.
    pub config: RenderDefaults,
}

impl RenderJob {
    /// Job with a fresh scratch directory under `config.work_dir`.
    pub fn new(project: NormalizedProject, output_dir: impl Into<PathBuf>, config: RenderDefaults) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        let work_dir = config.work_dir.join(format!(
            "{}-{}-{nanos:08x}",
            sanitize(&project.settings.name),
            std::process::id()
        ));
        Self {
            project,
            output_dir: output_dir.into(),
            work_dir,
            config,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}.{}",
            self.project.settings.name, self.project.settings.output_format
        )
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.file_name())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// A finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub path: PathBuf,
    pub file_name: String,
    pub duration_secs: f64,
    pub file_size: u64,
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    fn at(stage: ExportStage, total_frames: u64) -> Self {
        let done = stage == ExportStage::Complete;
        Self {
            progress: if done { 1.0 } else { 0.0 },
            frames_rendered: if done { total_frames } else { 0 },
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }

    /// Progress as a whole percentage, rounded up.
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).ceil().clamp(0.0, 100.0) as u8
    }
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// A compositing engine that can render a job.
pub trait RenderBackend: Send {
    /// Execute the job.
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> ReelResult<RenderOutcome>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render a normalized scene to `<output_dir>/<name>.<format>`.
pub async fn render_project(job: RenderJob, progress: Option<ProgressCallback>) -> ReelResult<RenderOutcome> {
    tracing::info!(
        output = %job.output_path().display(),
        items = job.project.items.len(),
        audios = job.project.audios.len(),
        "Starting render"
    );

    std::fs::create_dir_all(&job.output_dir)?;

    if let Some(cb) = &progress {
        cb(ExportProgress::at(ExportStage::Preparing, 0));
    }

    let mut backend: Box<dyn RenderBackend> = Box::new(FfmpegBackend::new(&job.config.ffmpeg));
    if !backend.is_available() {
        return Err(ReelError::configuration(format!(
            "No render backend found (expected {} in PATH)",
            job.config.ffmpeg
        )));
    }
    tracing::info!(backend = backend.name(), "Using render backend");

    tokio::task::spawn_blocking(move || backend.render(&job, progress))
        .await
        .map_err(|e| ReelError::Other(anyhow::anyhow!("Render task panicked: {e}")))?
}

/// Removes the job's scratch files when dropped.
struct ScratchFiles {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ScratchFiles {
    fn new(dir: &Path) -> ReelResult<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create work directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
        })
    }

    fn write(&mut self, name: &str, contents: &[u8]) -> ReelResult<PathBuf> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.files.push(path.clone());
        Ok(path)
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for file in &self.files {
            if let Err(err) = std::fs::remove_file(file) {
                tracing::warn!(error = %err, path = %file.display(), "Failed to remove work file");
            }
        }
        // only succeeds when nothing else was left behind
        let _ = std::fs::remove_dir(&self.dir);
    }
}

#[derive(Debug, Clone)]
struct RenderPlan {
    args: Vec<String>,
    total_frames: u64,
    expected_duration_secs: f64,
}

/// Runs the `ffmpeg` binary.
pub struct FfmpegBackend {
    binary: String,
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_ffmpeg(&self, plan: &RenderPlan, progress: Option<&ProgressCallback>) -> ReelResult<()> {
        tracing::debug!(args = ?plan.args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::media_processing(format!("Failed to start {}: {e}", self.binary), None))?;

        tracing::info!(
            pid = child.id(),
            args_len = plan.args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::media_processing("Failed to capture ffmpeg stdout", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::media_processing("Failed to capture ffmpeg stderr", None))?;

        // ffmpeg blocks once the stderr pipe is full
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        let mut latest_progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                ReelError::media_processing(format!("Failed reading ffmpeg progress: {e}"), None)
            })?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest_progress.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest_progress.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest_progress.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = progress {
                cb(progress_report(
                    &latest_progress,
                    plan.total_frames,
                    plan.expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = latest_progress.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::media_processing(format!("Failed to wait on ffmpeg: {e}"), None))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelError::media_processing(
                format!("ffmpeg render failed ({status})"),
                Some(stderr_output.trim().to_string()),
            ));
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> ReelResult<RenderOutcome> {
        let started = std::time::Instant::now();
        let settings = &job.project.settings;

        let mut scratch = ScratchFiles::new(&job.work_dir)?;
        let compiled = compile(&job.project, &CompileOptions::in_dir(&job.work_dir))?;
        let filter_script = scratch.write(FILTER_SCRIPT_NAME, compiled.filter_script().as_bytes())?;
        if let Some(script) = &compiled.subtitles {
            scratch.write(
                crate::compile::SUBTITLE_SCRIPT_NAME,
                &job.config.subtitle_encoding.encode(script),
            )?;
        }

        let output_path = job.output_path();
        let args = build_args(&job.project, &compiled, &filter_script, &output_path)?;
        let plan = RenderPlan {
            args,
            total_frames: total_frames(settings.duration, settings.frame_rate),
            expected_duration_secs: settings.duration,
        };
        tracing::info!(
            nodes = compiled.graph.len(),
            total_frames = plan.total_frames,
            work_dir = %job.work_dir.display(),
            "Render plan ready"
        );

        if let Some(cb) = &progress {
            cb(ExportProgress::at(ExportStage::Preparing, plan.total_frames));
        }

        if let Err(err) = self.run_ffmpeg(&plan, progress.as_ref()) {
            if let Some(cb) = &progress {
                cb(ExportProgress::at(ExportStage::Failed, plan.total_frames));
            }
            return Err(err);
        }
        drop(scratch);

        let file_size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
        if let Some(cb) = &progress {
            cb(ExportProgress::at(ExportStage::Complete, plan.total_frames));
        }
        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            file_size,
            "Render finished"
        );

        Ok(RenderOutcome {
            path: output_path,
            file_name: job.file_name(),
            duration_secs: settings.duration,
            file_size,
        })
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Frames the engine is expected to produce, at least one.
pub fn total_frames(duration_secs: f64, frame_rate: f64) -> u64 {
    (duration_secs * frame_rate).round().max(1.0) as u64
}

/// Engine input arguments for one visual item.
fn item_input_args(item: &Item) -> ReelResult<Vec<String>> {
    let src = item.input_source().ok_or_else(|| {
        ReelError::validation(format!(
            "{} item {} has no input source",
            item.kind.name(),
            item.id().unwrap_or("<unnamed>")
        ))
    })?;

    let mut args = Vec::new();
    match &item.kind {
        ItemKind::Video(video) => {
            let end = video
                .video_end
                .or(video.video_duration)
                .unwrap_or(video.video_begin + item.exit_end() - item.base.enter_begin);
            args.extend([
                "-ss".to_string(),
                num(video.video_begin),
                "-t".to_string(),
                num((end - video.video_begin).max(0.0)),
            ]);
        }
        ItemKind::Gif(_) => {
            args.extend([
                "-ignore_loop".to_string(),
                "0".to_string(),
                "-t".to_string(),
                num(item.exit_end() - item.base.enter_begin),
                "-itsoffset".to_string(),
                num(item.base.enter_begin),
            ]);
        }
        ItemKind::Image(_) | ItemKind::Text(_) | ItemKind::Svg(_) => {
            args.extend(["-loop".to_string(), "1".to_string()]);
        }
    }
    args.extend(["-i".to_string(), src.to_string()]);
    Ok(args)
}

/// Full ffmpeg command line for a compiled scene.
///
/// Input order matches the indices the graph refers to: background, then
/// visual items, then the thumbnail, then audio clips.
pub fn build_args(
    project: &NormalizedProject,
    compiled: &CompiledGraph,
    filter_script: &Path,
    output_path: &Path,
) -> ReelResult<Vec<String>> {
    let settings = &project.settings;
    let mut args: Vec<String> = ["-y", "-hide_banner", "-nostats", "-progress", "pipe:1"]
        .into_iter()
        .map(String::from)
        .collect();

    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c={}:s={}:r={}:d={}",
            settings.background_color,
            settings.canvas.size(),
            num(settings.frame_rate),
            num(settings.duration)
        ),
    ]);

    for item in &project.items {
        args.extend(item_input_args(item)?);
    }

    if let Some(thumbnail) = &settings.thumbnail {
        args.extend(["-i".to_string(), thumbnail.clone()]);
    }

    for audio in &project.audios {
        args.extend([
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-ss".to_string(),
            num(audio.audio_begin),
            "-i".to_string(),
            audio.src.clone(),
        ]);
    }

    args.extend([
        "-filter_complex_script".to_string(),
        filter_script.display().to_string(),
        "-map".to_string(),
        format!("[{}]", compiled.video_label),
        "-t".to_string(),
        num(settings.duration),
    ]);

    if let Some(audio) = &compiled.audio_label {
        args.extend(["-map".to_string(), format!("[{audio}]")]);
    }

    if let Some(index) = project.thumbnail_input() {
        args.extend([
            "-map".to_string(),
            format!("{index}:v"),
            "-c:v:1".to_string(),
            "copy".to_string(),
            "-disposition:v:1".to_string(),
            "attached_pic".to_string(),
        ]);
    }

    args.push(output_path.display().to_string());
    Ok(args)
}

/// Whether `binary` runs and answers `-version` successfully.
///
/// The binary is spawned directly, so paths with spaces or shell
/// metacharacters are taken literally.
pub fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frames: Option<u64>,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "frame" => {
                if let Ok(frames) = value.trim().parse::<u64>() {
                    self.frames = Some(frames);
                }
            }
            "out_time_ms" | "out_time_us" => {
                // both keys carry microseconds
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let by_time = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        state.out_time_secs / expected_duration_secs
    };
    let progress = match state.frames {
        Some(frames) if total_frames > 0 => frames as f64 / total_frames as f64,
        _ => by_time,
    }
    .clamp(0.0, 1.0);

    let frames_rendered = state
        .frames
        .unwrap_or_else(|| (progress * total_frames as f64).round() as u64)
        .min(total_frames);
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}
