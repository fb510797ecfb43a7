use htree_cli::commands;
use htree_cli::CliConfig;
use htree_engine::{PacingConfig, RankDir};
use htree_test_utils::{ndjson_body, record, sample_run, sse_body};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn tree_file() -> NamedTempFile {
    let records = vec![
        record("1", "0", "Root"),
        record("1.1", "1", "Costs").with_leaf(true),
        record("1.2", "1", "Prices"),
    ];
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&records).unwrap().as_bytes()).unwrap();
    file
}

fn fast_config() -> CliConfig {
    CliConfig {
        pacing: PacingConfig::new().with_arrival_interval(Duration::from_millis(1)),
        ..CliConfig::default()
    }
}

fn layout_output(config: &CliConfig, file: &NamedTempFile, json: bool) -> String {
    let mut out = Vec::new();
    commands::layout(config, file.path(), json, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

async fn replay_output(body: &[u8], json: bool) -> String {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body).unwrap();
    let mut out = Vec::new();
    commands::replay(&fast_config(), file.path(), 17, json, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

/// Node ids and edge ids of a JSON snapshot
fn graph_of(json: &str) -> (Vec<String>, Vec<String>) {
    let value: Value = serde_json::from_str(json).unwrap();
    let ids = |key: &str| -> Vec<String> {
        value[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect()
    };
    (ids("nodes"), ids("edges"))
}

#[test]
fn layout_renders_saved_tree() {
    let file = tree_file();
    let text = layout_output(&CliConfig::default(), &file, false);
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("1 Root"));
    assert!(text.contains("  1.1 Costs [leaf]"));
    assert!(text.contains("  1.2 Prices"));
}

#[test]
fn layout_json_honours_rank_dir() {
    let file = tree_file();
    let mut config = CliConfig::default();
    config.layout.rank_dir = RankDir::LeftRight;

    let json = layout_output(&config, &file, true);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);

    let child = nodes.iter().find(|n| n["id"] == "1.1").unwrap();
    assert_eq!(child["position"]["x"], 420.0);
    assert_eq!(value["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn load_session_rejects_non_tree_files() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{\"not\": \"a list\"}").unwrap();
    assert!(commands::load_session(&CliConfig::default(), file.path()).is_err());
}

#[tokio::test]
async fn replayed_recordings_build_the_same_graph() {
    let from_ndjson = graph_of(&replay_output(&ndjson_body(&sample_run()), true).await);
    let from_sse = graph_of(&replay_output(&sse_body(&sample_run()), true).await);

    let expected = (
        vec!["1".to_string(), "1.1".to_string(), "1.2".to_string()],
        vec!["e1-1.1".to_string(), "e1-1.2".to_string()],
    );
    assert_eq!(from_ndjson, expected);
    assert_eq!(from_sse, expected);
}

#[tokio::test]
async fn replay_prints_progress_then_tree() {
    let text = replay_output(&ndjson_body(&sample_run()), false).await;

    assert!(text.contains("] Step: formulate_top_hypothesis"));
    for added in ["  + 1 Margins eroded", "  + 1.1 Input costs rose", "  + 1.2 Prices were cut"] {
        assert!(text.contains(added), "missing {added:?} in:\n{text}");
    }
    let tree: Vec<&str> = text.lines().filter(|l| l.contains(" @(")).collect();
    assert_eq!(tree.len(), 3);
    assert!(tree[0].starts_with("1 Margins eroded"));
    assert!(tree[1].starts_with("  1.1 Input costs rose [leaf]"));
    assert!(tree[2].starts_with("  1.2 Prices were cut"));
}

#[tokio::test]
async fn replay_of_missing_file_fails() {
    let mut out = Vec::new();
    let result =
        commands::replay(&fast_config(), std::path::Path::new("/nonexistent.ndjson"), 64, true, &mut out).await;
    assert!(result.is_err());
}
