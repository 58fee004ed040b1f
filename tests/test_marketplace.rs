use std::path::{Path, PathBuf};

use cat_toolkit::fixer::marketplace::{sync_marketplace, MarketplaceSyncer};
use serde_json::{json, Value};

fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

struct Tree {
    _dir: tempfile::TempDir,
    plugins: PathBuf,
    index: PathBuf,
}

/// Two local plugins, an index that knows one of them with stale metadata,
/// plus a dead local entry and a remote entry.
fn drifted_tree() -> Tree {
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    let index = dir.path().join(".claude-plugin/marketplace.json");

    write_json(
        &plugins.join("alpha/.claude-plugin/plugin.json"),
        &json!({
            "name": "alpha",
            "description": "Alpha   tools\nfor release work",
            "version": "2.0.0",
            "tags": ["release", "docs"]
        }),
    );
    write_json(
        &plugins.join("beta/.claude-plugin/plugin.json"),
        &json!({
            "name": "beta",
            "description": "Beta helpers",
            "author": {"name": "Beta Team"},
            "license": "MIT"
        }),
    );
    write_json(
        &index,
        &json!({
            "name": "demo-marketplace",
            "owner": {"name": "Demo"},
            "plugins": [
                {"name": "alpha", "source": "./plugins/alpha", "description": "Old text", "version": "1.0.0", "tags": ["docs"]},
                {"name": "gone", "source": "./plugins/gone", "description": "Removed"},
                {"name": "remote", "source": "https://example.com/remote.git", "description": "Hosted elsewhere"}
            ]
        }),
    );

    Tree {
        _dir: dir,
        plugins,
        index,
    }
}

fn plugin_names(index: &Value) -> Vec<String> {
    index["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn first_sync_reports_drift_missing_and_dead_entries() {
    let tree = drifted_tree();
    let outcome = sync_marketplace(&tree.plugins, &tree.index, false);

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert!(outcome.updated);
    assert_eq!(
        outcome.warnings,
        vec![
            "Drift detected in 'alpha' [description]: Local='Alpha tools for release work' vs Mkt='Old text'",
            "Drift detected in 'alpha' [version]: Local='2.0.0' vs Mkt='1.0.0'",
            "Drift detected in 'alpha' [tags]: Local='[\"release\",\"docs\"]' vs Mkt='[\"docs\"]'",
            "Missing Plugin: 'beta' exists on disk but not in marketplace.json",
            "Removed 1 dead plugin references from marketplace.json",
        ]
    );

    let index = read_json(&tree.index);
    assert_eq!(plugin_names(&index), vec!["alpha", "remote", "beta"]);
    assert_eq!(index["plugins"][0]["tags"], json!(["docs", "release"]));
    assert_eq!(index["plugins"][0]["description"], "Alpha tools for release work");
    assert_eq!(
        index["plugins"][2],
        json!({
            "name": "beta",
            "source": "./plugins/beta",
            "description": "Beta helpers",
            "version": "1.0.0",
            "strict": true,
            "author": {"name": "Beta Team"},
            "license": "MIT"
        })
    );
}

#[test]
fn second_sync_converges() {
    let tree = drifted_tree();
    sync_marketplace(&tree.plugins, &tree.index, false);
    let after_first = std::fs::read_to_string(&tree.index).unwrap();

    let outcome = sync_marketplace(&tree.plugins, &tree.index, false);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert!(!outcome.updated);
    assert_eq!(std::fs::read_to_string(&tree.index).unwrap(), after_first);
}

#[test]
fn dry_run_reports_without_writing() {
    let tree = drifted_tree();
    let before = std::fs::read_to_string(&tree.index).unwrap();

    let outcome = sync_marketplace(&tree.plugins, &tree.index, true);
    assert_eq!(outcome.warnings.len(), 5);
    assert_eq!(std::fs::read_to_string(&tree.index).unwrap(), before);
}

#[test]
fn top_level_key_order_is_preserved() {
    let tree = drifted_tree();
    sync_marketplace(&tree.plugins, &tree.index, false);

    let index = read_json(&tree.index);
    let keys: Vec<&String> = index.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "owner", "plugins"]);
    let entry_keys: Vec<&String> = index["plugins"][0].as_object().unwrap().keys().collect();
    assert_eq!(
        entry_keys,
        vec!["name", "source", "description", "version", "tags"]
    );
}

#[test]
fn missing_index_is_a_warning() {
    let tree = drifted_tree();
    std::fs::remove_file(&tree.index).unwrap();

    let outcome = sync_marketplace(&tree.plugins, &tree.index, false);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("No marketplace.json found at "));
    assert!(!tree.index.exists());
}

#[test]
fn malformed_index_is_an_error() {
    let tree = drifted_tree();
    std::fs::write(&tree.index, "{\"plugins\": {}}").unwrap();

    let outcome = sync_marketplace(&tree.plugins, &tree.index, false);
    assert_eq!(
        outcome.errors,
        vec!["Error synchronizing marketplace: 'plugins' is not an array"]
    );
}

#[test]
fn syncer_sanitizes_manifests() {
    let tree = drifted_tree();
    let alpha = tree.plugins.join("alpha/.claude-plugin/plugin.json");

    let dry = MarketplaceSyncer::new(&tree.plugins, &tree.index, true).sync_all();
    assert_eq!(dry.plugins_checked, 2);
    assert_eq!(dry.plugins_synced, 1);
    assert_eq!(read_json(&alpha)["description"], "Alpha   tools\nfor release work");

    let live = MarketplaceSyncer::new(&tree.plugins, &tree.index, false).sync_all();
    assert!(live.errors.is_empty());
    assert_eq!(live.sanitized.len(), 1);
    assert_eq!(live.sanitized[0].0, alpha);
    assert_eq!(live.sanitized[0].1, vec!["Cleaned 'description' field"]);
    assert_eq!(read_json(&alpha)["description"], "Alpha tools for release work");
}
