//! Scene compilation: normalized scene in, filter graph out.

use std::path::{Path, PathBuf};

use reelgraph_common::ReelResult;
use reelgraph_processing_core::{group_items, NormalizedProject};

use crate::audio::build_audio_graph;
use crate::compositor::compose_groups;
use crate::filtergraph::FilterGraph;
use crate::subtitles::{build_script, subtitles_node, SUBTITLED_VIDEO};

/// File name of the subtitle script inside the work directory.
pub const SUBTITLE_SCRIPT_NAME: &str = "subtitles.ass";

/// Where the engine will find files the graph refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub subtitle_script: PathBuf,
    pub fonts_dir: PathBuf,
}

impl CompileOptions {
    /// Subtitle script and fonts both live in `work_dir`.
    pub fn in_dir(work_dir: &Path) -> Self {
        Self {
            subtitle_script: work_dir.join(SUBTITLE_SCRIPT_NAME),
            fonts_dir: work_dir.to_path_buf(),
        }
    }
}

/// A compiled scene.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    pub graph: FilterGraph,

    /// Label of the final video stream.
    pub video_label: String,

    /// Label of the mixed audio stream, when the scene is audible.
    pub audio_label: Option<String>,

    /// Subtitle script to write at [`CompileOptions::subtitle_script`].
    pub subtitles: Option<String>,
}

impl CompiledGraph {
    /// The graph in the engine's `filter_complex` grammar.
    pub fn filter_script(&self) -> String {
        self.graph.serialize()
    }
}

/// Compile a normalized scene.
///
/// Node order is video composition, then subtitle burn-in, then audio.
/// Compilation performs no I/O; the caller writes the subtitle script.
pub fn compile(project: &NormalizedProject, options: &CompileOptions) -> ReelResult<CompiledGraph> {
    let canvas = project.settings.canvas;
    let mut graph = FilterGraph::new();

    let groups = group_items(&project.items);
    let composition = compose_groups(&groups, canvas);
    graph.extend(composition.nodes);
    let mut video_label = composition.output;

    let mut subtitles = None;
    if let Some(subtitle) = project.subtitle.as_ref().filter(|s| !s.captions.is_empty()) {
        subtitles = Some(build_script(subtitle, canvas)?);
        graph.push(subtitles_node(
            &options.subtitle_script,
            &options.fonts_dir,
            &video_label,
        ));
        video_label = SUBTITLED_VIDEO.to_string();
    }

    let audio = build_audio_graph(&project.items, &project.audios, project.first_audio_input());
    graph.extend(audio.nodes);

    graph.check_labels()?;

    tracing::info!(
        groups = groups.len(),
        nodes = graph.len(),
        video = %video_label,
        audio = audio.output.as_deref().unwrap_or("none"),
        subtitles = subtitles.is_some(),
        "Scene compiled"
    );

    Ok(CompiledGraph {
        graph,
        video_label,
        audio_label: audio.output,
        subtitles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgraph_project_model::{
        AudioItem, Caption, Item, ItemKind, ProjectFile, Subtitle, TextProps, Word,
    };

    fn scene(items: Vec<Item>, audios: Vec<AudioItem>, subtitle: Option<Subtitle>) -> NormalizedProject {
        let settings = ProjectFile::default().settings().unwrap();
        NormalizedProject {
            settings,
            items,
            audios,
            subtitle,
        }
    }

    fn text() -> Item {
        let mut item = Item::new(ItemKind::Text(TextProps {
            text: Some("hello".into()),
            image_src: Some("/tmp/hello.png".into()),
            ..Default::default()
        }));
        item.base.width = Some(200.0);
        item.base.height = Some(50.0);
        item.base.exit_begin = Some(10.0);
        item.base.exit_end = Some(10.0);
        item
    }

    #[test]
    fn test_empty_scene_passes_background_through() {
        let compiled = compile(&scene(vec![], vec![], None), &CompileOptions::in_dir(Path::new("/w"))).unwrap();
        assert_eq!(compiled.filter_script(), "[0:v]null[outv-0]");
        assert_eq!(compiled.video_label, "outv-0");
        assert_eq!(compiled.audio_label, None);
        assert_eq!(compiled.subtitles, None);
    }

    #[test]
    fn test_subtitles_follow_video_and_precede_audio() {
        let subtitle = Subtitle {
            captions: vec![Caption {
                start: 0.0,
                end: 1.0,
                text: Some("hi".into()),
                words: vec![Word {
                    start: 0.0,
                    end: 1.0,
                    text: "hi".into(),
                }],
            }],
            ..Default::default()
        };
        let audio = AudioItem {
            src: "music.mp3".into(),
            audio_end: Some(5.0),
            ..Default::default()
        };

        let compiled = compile(
            &scene(vec![text()], vec![audio], Some(subtitle)),
            &CompileOptions::in_dir(Path::new("/work")),
        )
        .unwrap();

        let filters: Vec<&str> = compiled
            .graph
            .nodes()
            .iter()
            .map(|n| n.filter.as_str())
            .collect();
        assert_eq!(filters, vec!["null", "overlay", "subtitles", "atrim", "atrim", "volume", "adelay", "acopy"]);
        assert_eq!(compiled.video_label, "outv-subtitled");
        assert_eq!(compiled.audio_label.as_deref(), Some("outa"));
        // audio input comes after the single visual
        assert_eq!(compiled.graph.nodes()[3].inputs, vec!["2:a"]);
        assert!(compiled.filter_script().contains(
            "[outv-0]subtitles=/work/subtitles.ass:fontsdir=/work[outv-subtitled]"
        ));
        assert!(compiled.subtitles.unwrap().contains("Dialogue: 0,0:00:00.00,0:00:01.00"));
    }

    #[test]
    fn test_subtitle_without_captions_is_ignored() {
        let compiled = compile(
            &scene(vec![text()], vec![], Some(Subtitle::default())),
            &CompileOptions::in_dir(Path::new("/w")),
        )
        .unwrap();
        assert_eq!(compiled.video_label, "outv-0");
        assert!(compiled.subtitles.is_none());
    }
}
