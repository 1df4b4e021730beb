//! Integration tests for segmix-config.
//!
//! Round-trips graph files through disk and drives the built segments.

use segmix_config::{ConfigError, GraphConfig, SegmentConfig, segment_kinds};
use segmix_core::{BufferArena, Field, MONO, Segment};
use tempfile::TempDir;

fn stereo_graph() -> GraphConfig {
    GraphConfig::new(4)
        .with_segment(SegmentConfig::source("capture", 2, 4))
        .with_segment(SegmentConfig::mixer("bus"))
        .with_segment(SegmentConfig::drain("playback", 1, 4))
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graphs").join("stereo.toml");

    let graph = stereo_graph();
    graph.save(&path).unwrap();
    assert!(path.exists(), "save should create parent directories");

    let loaded = GraphConfig::load(&path).unwrap();
    assert_eq!(loaded, graph);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = GraphConfig::load(&path).unwrap_err();
    match err {
        ConfigError::ReadFile { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

#[test]
fn load_malformed_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "block_size = \"fast\"\n").unwrap();
    assert!(matches!(
        GraphConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn built_graph_mixes_capture_to_playback() {
    let mut nodes = stereo_graph().build().unwrap();
    let mut arena = BufferArena::new();
    let [left, right, mixed] = [0, 1, 2].map(|_| arena.create(16).unwrap());

    nodes[0].set_output(Field::Buffer, 0, Some(left), &mut arena).unwrap();
    nodes[0].set_output(Field::Buffer, 1, Some(right), &mut arena).unwrap();
    nodes[1].set_input(Field::Buffer, 0, Some(left), &mut arena).unwrap();
    nodes[1].set_input(Field::Buffer, 1, Some(right), &mut arena).unwrap();
    nodes[1].set_output(Field::Buffer, MONO, Some(mixed), &mut arena).unwrap();
    nodes[2].set_input(Field::Buffer, 0, Some(mixed), &mut arena).unwrap();
    for node in &mut nodes {
        node.start(&mut arena).unwrap();
    }

    if let segmix_core::SegmentNode::Channel(source) = &mut nodes[0] {
        source
            .endpoint_mut()
            .fill(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0, 0.25, 0.75]);
    }
    for node in &mut nodes {
        node.mix(4, &mut arena).unwrap();
    }

    let segmix_core::SegmentNode::Channel(drain) = &nodes[2] else {
        panic!("playback should be a channel segment");
    };
    assert_eq!(drain.endpoint().samples(), &[0.5, 0.5, 0.0, 0.5]);
}

#[test]
fn every_registered_kind_can_be_configured() {
    let mut graph = GraphConfig::new(8);
    for kind in segment_kinds() {
        let segment = if kind.endpoint {
            let text = format!("name = \"{0}\"\nkind = \"{0}\"\nchannels = 1\nframes = 8\n", kind.id);
            toml::from_str::<SegmentConfig>(&text).unwrap()
        } else {
            let text = format!("name = \"{0}\"\nkind = \"{0}\"\n", kind.id);
            toml::from_str::<SegmentConfig>(&text).unwrap()
        };
        graph = graph.with_segment(segment);
    }
    let nodes = graph.build().unwrap();
    assert_eq!(nodes.len(), segment_kinds().len());
}
