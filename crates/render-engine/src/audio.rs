//! Audio mixer graph.
//!
//! Every audible source becomes one chain ending in `outa-<input>`:
//! the sound track of videos with a nonzero volume, then each audio clip
//! in `(track, enter)` order. All chains are combined into [`MIXED_AUDIO`].

use reelgraph_project_model::{AudioItem, Item};

use crate::filtergraph::{num, FilterNode};
use crate::filters::ChainBuilder;

/// Label of the combined audio stream.
pub const MIXED_AUDIO: &str = "outa";

/// `aloop` buffer size, large enough to hold any source window.
const LOOP_BUFFER_SAMPLES: &str = "2e+09";

/// Audio nodes and the label of the combined stream, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioGraph {
    pub nodes: Vec<FilterNode>,
    pub output: Option<String>,
}

fn stream_output(input_index: usize) -> String {
    format!("outa-{input_index}")
}

/// `adelay` takes whole milliseconds, so sub-millisecond offsets round to the nearest one.
fn delay_ms(seconds: f64) -> String {
    let ms = num((seconds * 1000.0).round());
    format!("{ms}|{ms}")
}

/// Sound track of a video item, when it has one and is audible.
pub fn video_audio_chain(item: &Item, input_index: usize) -> Option<Vec<FilterNode>> {
    let video = item.as_video()?;
    if video.volume <= 0.0 || video.has_audio != Some(true) {
        return None;
    }

    let mut chain = ChainBuilder::from_stream(input_index, format!("{input_index}:a"));
    chain.then(
        FilterNode::new("volume").args(num(video.volume)),
        "video_volume",
    );
    if video.speed != 1.0 {
        chain.then(
            FilterNode::new("atempo").args(num(video.speed)),
            "video_tempo",
        );
    }
    chain.then(
        FilterNode::new("adelay").args(delay_ms(item.base.enter_begin)),
        "video_delay",
    );
    chain.then(
        FilterNode::new("atrim").args(format!("0:{}", num(item.exit_end()))),
        "video_trim",
    );
    Some(chain.finish(&stream_output(input_index)))
}

/// Trim, retime, loop, volume and delay one audio clip.
pub fn audio_item_chain(audio: &AudioItem, input_index: usize) -> Vec<FilterNode> {
    let mut chain = ChainBuilder::from_stream(input_index, format!("{input_index}:a"));

    chain.then(
        FilterNode::new("atrim").args(format!("0:{}", num(audio.source_duration()))),
        "source_trim",
    );
    if audio.speed != 1.0 {
        chain.then(FilterNode::new("atempo").args(num(audio.speed)), "tempo");
    }
    if let Some(loops) = audio.loop_count() {
        chain.then(
            FilterNode::new("aloop").args(format!("loop={loops}:size={LOOP_BUFFER_SAMPLES}")),
            "looped_audio",
        );
    }
    chain.then(
        FilterNode::new("atrim").args(format!("0:{}", num(audio.timeline_duration()))),
        "timeline_trim",
    );
    chain.then(FilterNode::new("volume").args(num(audio.volume)), "gain");
    chain.then(
        FilterNode::new("adelay").args(delay_ms(audio.enter)),
        "audio_delay",
    );

    chain.finish(&stream_output(input_index))
}

/// Combine streams: nothing for none, a copy for one, one mix otherwise.
///
/// The mix does not normalize loudness, so each stream keeps its volume.
pub fn mix_streams(streams: &[String]) -> Option<FilterNode> {
    match streams {
        [] => None,
        [single] => Some(FilterNode::new("acopy").input(single).output(MIXED_AUDIO)),
        many => {
            let mut node = FilterNode::new("amix").args(format!("inputs={}:normalize=0", many.len()));
            for stream in many {
                node = node.input(stream);
            }
            Some(node.output(MIXED_AUDIO))
        }
    }
}

/// Build every audio chain and the final combine step.
///
/// `items[i]` reads engine input `i + 1`; `audios[j]` reads
/// `first_audio_input + j`.
pub fn build_audio_graph(items: &[Item], audios: &[AudioItem], first_audio_input: usize) -> AudioGraph {
    let mut graph = AudioGraph::default();
    let mut streams = Vec::new();

    for (position, item) in items.iter().enumerate() {
        let input_index = position + 1;
        if let Some(nodes) = video_audio_chain(item, input_index) {
            graph.nodes.extend(nodes);
            streams.push(stream_output(input_index));
        }
    }

    for (offset, audio) in audios.iter().enumerate() {
        let input_index = first_audio_input + offset;
        graph.nodes.extend(audio_item_chain(audio, input_index));
        streams.push(stream_output(input_index));
    }

    if let Some(mix) = mix_streams(&streams) {
        graph.nodes.push(mix);
        graph.output = Some(MIXED_AUDIO.to_string());
    }

    tracing::debug!(streams = streams.len(), "Audio graph built");
    graph
}
