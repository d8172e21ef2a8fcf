//! Filter graph model and its textual form.
//!
//! A graph is an ordered list of [`FilterNode`]s. Each node names one
//! engine filter, its options and the labels of the streams it consumes
//! and produces. Serialization follows the engine's `filter_complex`
//! grammar:
//!
//! ```text
//! [in1][in2]name=key=value:key=value[out1][out2];[out1]next[final]
//! ```

use std::collections::HashSet;
use std::fmt;

/// Options attached to a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterOptions {
    /// Bare filter name, no `=`.
    #[default]
    None,
    /// Pre-formatted argument string, written verbatim after `=`.
    Positional(String),
    /// `key=value` pairs joined by `:` in insertion order.
    Named(Vec<(String, String)>),
}

impl FilterOptions {
    fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Positional(args) => args.is_empty(),
            Self::Named(pairs) => pairs.is_empty(),
        }
    }
}

impl fmt::Display for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Positional(args) => f.write_str(args),
            Self::Named(pairs) => {
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    if key == "enable" {
                        write!(f, "{key}='{value}'")?;
                    } else {
                        write!(f, "{key}={value}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// One filter statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub filter: String,
    pub options: FilterOptions,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl FilterNode {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            options: FilterOptions::None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set a pre-formatted argument string.
    pub fn args(mut self, args: impl Into<String>) -> Self {
        self.options = FilterOptions::Positional(args.into());
        self
    }

    /// Append a named option.
    pub fn opt(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let pair = (key.into(), value.to_string());
        match &mut self.options {
            FilterOptions::Named(pairs) => pairs.push(pair),
            _ => self.options = FilterOptions::Named(vec![pair]),
        }
        self
    }

    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    /// Look up a named option value.
    pub fn option(&self, key: &str) -> Option<&str> {
        match &self.options {
            FilterOptions::Named(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{label}]")?;
        }
        f.write_str(&self.filter)?;
        if !self.options.is_empty() {
            write!(f, "={}", self.options)?;
        }
        for label in &self.outputs {
            write!(f, "[{label}]")?;
        }
        Ok(())
    }
}

/// Label bookkeeping failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("label [{label}] is produced more than once")]
    DuplicateOutput { label: String },

    #[error("node {filter} consumes [{label}], which no earlier node produces")]
    UnknownInput { filter: String, label: String },

    #[error("label [{label}] is consumed more than once")]
    ConsumedTwice { label: String },
}

impl From<GraphError> for reelgraph_common::ReelError {
    fn from(err: GraphError) -> Self {
        reelgraph_common::ReelError::rendering(err.to_string())
    }
}

/// An ordered list of filter nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: FilterNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes running the given filter.
    pub fn filters<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FilterNode> + 'a {
        self.nodes.iter().filter(move |node| node.filter == name)
    }

    /// Render the graph in the engine's textual grammar.
    pub fn serialize(&self) -> String {
        self.nodes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Check that labels form a well-wired graph.
    ///
    /// Every output label is unique, every input is either an engine
    /// stream (`N:v`, `N:a`) or an output of an earlier node, and no
    /// intermediate label feeds two nodes.
    pub fn check_labels(&self) -> Result<(), GraphError> {
        let mut produced = HashSet::new();
        let mut consumed = HashSet::new();

        for node in &self.nodes {
            for label in &node.inputs {
                if is_stream_specifier(label) {
                    continue;
                }
                if !produced.contains(label.as_str()) {
                    return Err(GraphError::UnknownInput {
                        filter: node.filter.clone(),
                        label: label.clone(),
                    });
                }
                if !consumed.insert(label.as_str()) {
                    return Err(GraphError::ConsumedTwice {
                        label: label.clone(),
                    });
                }
            }
            for label in &node.outputs {
                if !produced.insert(label.as_str()) {
                    return Err(GraphError::DuplicateOutput {
                        label: label.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Extend<FilterNode> for FilterGraph {
    fn extend<T: IntoIterator<Item = FilterNode>>(&mut self, iter: T) {
        self.nodes.extend(iter);
    }
}

impl From<Vec<FilterNode>> for FilterGraph {
    fn from(nodes: Vec<FilterNode>) -> Self {
        Self { nodes }
    }
}

/// Labels of one serialized statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementLabels {
    pub filter: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Recover the label adjacency of a serialized graph.
pub fn parse_statements(text: &str) -> Vec<StatementLabels> {
    text.split(';')
        .filter(|statement| !statement.trim().is_empty())
        .map(parse_statement)
        .collect()
}

fn parse_statement(statement: &str) -> StatementLabels {
    let mut rest = statement.trim();

    let mut inputs = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else {
            break;
        };
        inputs.push(stripped[..end].to_string());
        rest = &stripped[end + 1..];
    }

    let mut outputs = Vec::new();
    while rest.ends_with(']') {
        let Some(start) = rest.rfind('[') else {
            break;
        };
        outputs.push(rest[start + 1..rest.len() - 1].to_string());
        rest = &rest[..start];
    }
    outputs.reverse();

    let filter = rest.split('=').next().unwrap_or_default().to_string();

    StatementLabels {
        filter,
        inputs,
        outputs,
    }
}

/// Whether a label addresses an engine input stream such as `3:v`.
pub fn is_stream_specifier(label: &str) -> bool {
    match label.split_once(':') {
        Some((index, kind)) => {
            !index.is_empty()
                && index.bytes().all(|b| b.is_ascii_digit())
                && matches!(kind, "v" | "a")
        }
        None => false,
    }
}

/// Format a number the way the engine reads it: integral values have
/// no fractional part, `-0` and non-finite values become `0`.
pub fn num(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Round to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_forms() {
        let bare = FilterNode::new("null").input("0:v").output("outv-0");
        assert_eq!(bare.to_string(), "[0:v]null[outv-0]");

        let positional = FilterNode::new("scale")
            .args("640:360")
            .input("1:v")
            .output("scaled_1");
        assert_eq!(positional.to_string(), "[1:v]scale=640:360[scaled_1]");

        let empty = FilterNode::new("hflip").args("").input("a").output("b");
        assert_eq!(empty.to_string(), "[a]hflip[b]");

        let named = FilterNode::new("overlay")
            .opt("x", 0)
            .opt("y", "360 - overlay_h / 2")
            .opt("enable", "between(t,0,5)")
            .input("0:v")
            .input("filterd_0_0")
            .output("outv-0");
        assert_eq!(
            named.to_string(),
            "[0:v][filterd_0_0]overlay=x=0:y=360 - overlay_h / 2:enable='between(t,0,5)'[outv-0]"
        );
    }

    #[test]
    fn test_source_node_without_inputs() {
        let node = FilterNode::new("color")
            .opt("c", "#00000000")
            .opt("s", "1280x720")
            .output("base_canvas_0_1");
        assert_eq!(node.to_string(), "color=c=#00000000:s=1280x720[base_canvas_0_1]");
    }

    #[test]
    fn test_multi_output_order() {
        let node = FilterNode::new("split")
            .args("2")
            .input("fmt_1")
            .output("col_1")
            .output("a_1");
        assert_eq!(node.to_string(), "[fmt_1]split=2[col_1][a_1]");
    }

    #[test]
    fn test_serialize_joins_with_semicolons() {
        let graph = FilterGraph::from(vec![
            FilterNode::new("setpts").args("PTS*2").input("1:v").output("speed_1"),
            FilterNode::new("null").input("speed_1").output("filterd_0_0"),
        ]);
        assert_eq!(
            graph.serialize(),
            "[1:v]setpts=PTS*2[speed_1];[speed_1]null[filterd_0_0]"
        );
        assert_eq!(FilterGraph::new().serialize(), "");
    }

    #[test]
    fn test_labels_round_trip_through_text() {
        let graph = FilterGraph::from(vec![
            FilterNode::new("format").args("rgba").input("2:v").output("fmt_2"),
            FilterNode::new("split").args("2").input("fmt_2").output("col_2").output("a_2"),
            FilterNode::new("alphaextract").input("a_2").output("ap_2"),
            FilterNode::new("alphamerge").input("col_2").input("ap_2").output("styled_2"),
            FilterNode::new("color")
                .opt("c", "#00000000")
                .opt("s", "1280x720")
                .output("base_canvas_0_0"),
            FilterNode::new("overlay")
                .opt("x", 10)
                .opt("y", 20)
                .opt("enable", "between(t,0,2.5)")
                .input("base_canvas_0_0")
                .input("styled_2")
                .output("re_based_0_0"),
        ]);

        let parsed = parse_statements(&graph.serialize());
        assert_eq!(parsed.len(), graph.len());
        for (node, labels) in graph.nodes().iter().zip(&parsed) {
            assert_eq!(labels.filter, node.filter);
            assert_eq!(labels.inputs, node.inputs);
            assert_eq!(labels.outputs, node.outputs);
        }
    }

    #[test]
    fn test_check_labels() {
        let good = FilterGraph::from(vec![
            FilterNode::new("null").input("0:v").output("a"),
            FilterNode::new("null").input("a").output("b"),
        ]);
        assert_eq!(good.check_labels(), Ok(()));

        let unknown = FilterGraph::from(vec![FilterNode::new("null").input("x").output("y")]);
        assert!(matches!(
            unknown.check_labels(),
            Err(GraphError::UnknownInput { .. })
        ));

        let duplicate = FilterGraph::from(vec![
            FilterNode::new("null").input("0:v").output("a"),
            FilterNode::new("null").input("1:v").output("a"),
        ]);
        assert!(matches!(
            duplicate.check_labels(),
            Err(GraphError::DuplicateOutput { .. })
        ));

        let fanout = FilterGraph::from(vec![
            FilterNode::new("null").input("0:v").output("a"),
            FilterNode::new("null").input("a").output("b"),
            FilterNode::new("null").input("a").output("c"),
        ]);
        assert!(matches!(
            fanout.check_labels(),
            Err(GraphError::ConsumedTwice { .. })
        ));
    }

    #[test]
    fn test_stream_specifier() {
        assert!(is_stream_specifier("0:v"));
        assert!(is_stream_specifier("12:a"));
        assert!(!is_stream_specifier("outv-0"));
        assert!(!is_stream_specifier(":v"));
        assert!(!is_stream_specifier("1:s"));
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(640.0), "640");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(f64::NAN), "0");
        assert_eq!(round_to(0.123456, 4), 0.1235);
    }
}
