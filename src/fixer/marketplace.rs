//! Marketplace index reconciliation.
//!
//! Each plugin's `.claude-plugin/plugin.json` is the local authority; the
//! root `.claude-plugin/marketplace.json` is a compiled index of them.
//! [`sync_marketplace`] pulls local metadata into the index, appends
//! plugins the index is missing and prunes entries for plugins that no
//! longer exist. [`MarketplaceSyncer`] runs that and then sanitizes every
//! manifest's string fields.

use super::write_atomic;
use crate::common::plugin_manifests;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Manifest fields mirrored into the index when set locally.
const SYNCED_FIELDS: &[&str] = &["description", "version", "author", "license", "tags", "category"];

/// Fields copied into a newly appended index entry when present.
const NEW_ENTRY_FIELDS: &[&str] = &["author", "license", "tags", "category"];

const REMOTE_SOURCE_PREFIXES: &[&str] = &["http", "git", "github:"];

/// Collapses whitespace runs in a string to single spaces and trims it.
pub fn clean_json_str(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`clean_json_str`] applied to every string inside `value`.
pub fn clean_json_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_json_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(clean_json_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), clean_json_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Cleans every string field of `map` in place, recursing into nested
/// objects and arrays. Returns one change line per cleaned field.
pub fn sanitize_json_fields(map: &mut Map<String, Value>) -> Vec<String> {
    let mut changes = Vec::new();
    for (key, value) in map.iter_mut() {
        match value {
            Value::String(s) => {
                let cleaned = clean_json_str(s);
                if cleaned != *s {
                    *s = cleaned;
                    changes.push(format!("Cleaned '{key}' field"));
                }
            }
            Value::Object(inner) => {
                changes.extend(
                    sanitize_json_fields(inner)
                        .into_iter()
                        .map(|c| format!("  - {c}")),
                );
            }
            Value::Array(items) => {
                let before = items.clone();
                for item in items.iter_mut() {
                    *item = clean_json_value(item);
                }
                if *items != before {
                    changes.push(format!("Cleaned '{key}' field"));
                }
            }
            _ => {}
        }
    }
    changes
}

fn is_remote_source(source: Option<&Value>) -> bool {
    match source {
        Some(Value::String(s)) => REMOTE_SOURCE_PREFIXES.iter().any(|p| s.starts_with(p)),
        Some(Value::Object(_)) => true,
        _ => false,
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Renders a JSON value for a drift message; strings are shown bare.
fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

fn read_json(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

fn write_json(path: &Path, value: &Value) -> Result<(), String> {
    let mut out = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    out.push('\n');
    write_atomic(path, &out).map_err(|e| e.to_string())
}

/// Warnings and errors from one [`sync_marketplace`] call.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// `true` when the index differs from what is on disk.
    pub updated: bool,
}

/// Plugin directories holding a manifest: `(directory, manifest path)`.
fn local_plugins(plugins_dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut plugins = Vec::new();
    for entry in std::fs::read_dir(plugins_dir)? {
        let entry = entry?;
        let dir_name = entry.file_name().to_string_lossy().to_string();
        if dir_name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        let manifest = entry.path().join(".claude-plugin").join("plugin.json");
        if manifest.is_file() {
            plugins.push((dir_name, manifest));
        }
    }
    plugins.sort();
    Ok(plugins)
}

/// Reconciles `marketplace_path` with the manifests under `plugins_dir`.
///
/// Drift in a synced field is reported as a warning. Outside dry-run the
/// local value is written to the index; tags are merged instead, keeping
/// the index order and appending missing local tags.
pub fn sync_marketplace(plugins_dir: &Path, marketplace_path: &Path, dry_run: bool) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    if !marketplace_path.exists() {
        outcome.warnings.push(format!(
            "No marketplace.json found at {}",
            marketplace_path.display()
        ));
        return outcome;
    }

    let mut index = match read_json(marketplace_path) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            outcome
                .errors
                .push("Error synchronizing marketplace: marketplace.json is not an object".to_string());
            return outcome;
        }
        Err(e) => {
            outcome
                .errors
                .push(format!("Error synchronizing marketplace: {e}"));
            return outcome;
        }
    };

    let plugins_value = index
        .entry("plugins")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(entries) = plugins_value else {
        outcome
            .errors
            .push("Error synchronizing marketplace: 'plugins' is not an array".to_string());
        return outcome;
    };

    let local = match local_plugins(plugins_dir) {
        Ok(local) => local,
        Err(e) => {
            outcome
                .errors
                .push(format!("Error synchronizing marketplace: {e}"));
            return outcome;
        }
    };

    let mut local_names: BTreeSet<String> = BTreeSet::new();
    for (dir_name, manifest_path) in &local {
        local_names.insert(dir_name.clone());

        let manifest = match read_json(manifest_path) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                outcome
                    .errors
                    .push(format!("Error processing {dir_name}: plugin.json is not an object"));
                continue;
            }
            Err(e) => {
                outcome.errors.push(format!("Error processing {dir_name}: {e}"));
                continue;
            }
        };

        let plugin_name = manifest
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(dir_name)
            .to_string();
        local_names.insert(plugin_name.clone());

        let existing = entries
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|e| e.get("name").and_then(Value::as_str) == Some(plugin_name.as_str()));

        match existing {
            Some(entry) => {
                if sync_entry(&plugin_name, &manifest, entry, dry_run, &mut outcome.warnings) {
                    outcome.updated = true;
                }
            }
            None => {
                outcome.warnings.push(format!(
                    "Missing Plugin: '{plugin_name}' exists on disk but not in marketplace.json"
                ));
                if !dry_run {
                    entries.push(Value::Object(new_entry(&plugin_name, dir_name, &manifest)));
                    outcome.updated = true;
                }
            }
        }
    }

    let before = entries.len();
    entries.retain(|entry| {
        let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
        local_names.contains(name) || is_remote_source(entry.get("source"))
    });
    let removed = before - entries.len();
    if removed > 0 {
        outcome.warnings.push(format!(
            "Removed {removed} dead plugin references from marketplace.json"
        ));
        outcome.updated = true;
    }

    if outcome.updated {
        if dry_run {
            tracing::info!("Marketplace changes ready (DRY RUN - not saved)");
        } else {
            match write_json(marketplace_path, &Value::Object(index)) {
                Ok(()) => tracing::info!("Marketplace synchronized and saved"),
                Err(e) => outcome
                    .errors
                    .push(format!("Error writing {}: {e}", marketplace_path.display())),
            }
        }
    }

    outcome
}

/// Compares the synced fields of one index entry with its manifest.
/// Returns `true` if the entry was modified.
fn sync_entry(
    plugin_name: &str,
    manifest: &Map<String, Value>,
    entry: &mut Map<String, Value>,
    dry_run: bool,
    warnings: &mut Vec<String>,
) -> bool {
    let mut modified = false;
    for &field in SYNCED_FIELDS {
        let Some(local) = manifest.get(field).filter(|v| !is_unset(v)) else {
            continue;
        };
        let local = clean_json_value(local);
        let indexed = entry.get(field).map(clean_json_value);

        if field == "tags" {
            if let Value::Array(local_tags) = &local {
                let indexed_tags = match &indexed {
                    Some(Value::Array(tags)) => tags.clone(),
                    _ => Vec::new(),
                };
                let missing: Vec<Value> = local_tags
                    .iter()
                    .filter(|t| !indexed_tags.contains(t))
                    .fold(Vec::new(), |mut acc, t| {
                        if !acc.contains(t) {
                            acc.push(t.clone());
                        }
                        acc
                    });
                if missing.is_empty() {
                    continue;
                }
                warnings.push(format!(
                    "Drift detected in '{plugin_name}' [tags]: Local='{}' vs Mkt='{}'",
                    local,
                    display_value(indexed.as_ref())
                ));
                if !dry_run {
                    let mut merged = indexed_tags;
                    merged.extend(missing);
                    entry.insert(field.to_string(), Value::Array(merged));
                    modified = true;
                }
                continue;
            }
        }

        if indexed.as_ref() == Some(&local) {
            continue;
        }
        warnings.push(format!(
            "Drift detected in '{plugin_name}' [{field}]: Local='{}' vs Mkt='{}'",
            display_value(Some(&local)),
            display_value(indexed.as_ref())
        ));
        if !dry_run {
            entry.insert(field.to_string(), local);
            modified = true;
        }
    }
    modified
}

fn new_entry(plugin_name: &str, dir_name: &str, manifest: &Map<String, Value>) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("name".to_string(), Value::from(plugin_name));
    entry.insert(
        "source".to_string(),
        Value::from(format!("./plugins/{dir_name}")),
    );
    let description = manifest
        .get("description")
        .and_then(Value::as_str)
        .map(clean_json_str)
        .unwrap_or_default();
    entry.insert("description".to_string(), Value::from(description));
    entry.insert(
        "version".to_string(),
        manifest
            .get("version")
            .cloned()
            .unwrap_or_else(|| Value::from("1.0.0")),
    );
    entry.insert("strict".to_string(), Value::Bool(true));
    for &field in NEW_ENTRY_FIELDS {
        if let Some(value) = manifest.get(field) {
            entry.insert(field.to_string(), clean_json_value(value));
        }
    }
    entry
}

/// Totals of a [`MarketplaceSyncer::sync_all`] run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SyncReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub plugins_checked: usize,
    /// Manifests whose string fields were (or would be) cleaned.
    pub plugins_synced: usize,
    /// Per-manifest change lines from sanitization.
    pub sanitized: Vec<(PathBuf, Vec<String>)>,
}

pub struct MarketplaceSyncer {
    plugins_dir: PathBuf,
    marketplace_path: PathBuf,
    dry_run: bool,
}

impl MarketplaceSyncer {
    pub fn new(plugins_dir: &Path, marketplace_path: &Path, dry_run: bool) -> Self {
        MarketplaceSyncer {
            plugins_dir: plugins_dir.to_path_buf(),
            marketplace_path: marketplace_path.to_path_buf(),
            dry_run,
        }
    }

    /// Synchronizes the index, then sanitizes every plugin manifest.
    pub fn sync_all(&self) -> SyncReport {
        let mut report = SyncReport::default();

        tracing::info!("Phase 1: Synchronizing marketplace.json with plugin.json...");
        let outcome = sync_marketplace(&self.plugins_dir, &self.marketplace_path, self.dry_run);
        report.warnings = outcome.warnings;
        report.errors = outcome.errors;

        tracing::info!("Phase 2: Linting and sanitizing plugin.json files...");
        let manifests = plugin_manifests(&self.plugins_dir);
        report.plugins_checked = manifests.len();

        for path in manifests {
            let mut manifest = match read_json(&path) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    report.errors.push(format!(
                        "Error processing {}: plugin.json is not an object",
                        path.display()
                    ));
                    continue;
                }
                Err(e) => {
                    report
                        .errors
                        .push(format!("Error processing {}: {e}", path.display()));
                    continue;
                }
            };

            let changes = sanitize_json_fields(&mut manifest);
            if changes.is_empty() {
                continue;
            }
            report.plugins_synced += 1;
            if self.dry_run {
                tracing::info!("Would sanitize: {}", path.display());
            } else {
                if let Err(e) = write_json(&path, &Value::Object(manifest)) {
                    report
                        .errors
                        .push(format!("Error writing {}: {e}", path.display()));
                    continue;
                }
                tracing::info!("Sanitized: {}", path.display());
            }
            report.sanitized.push((path, changes));
        }

        tracing::info!(
            "Marketplace sync: {} manifests checked, {} updated, {} warnings, {} errors",
            report.plugins_checked,
            report.plugins_synced,
            report.warnings.len(),
            report.errors.len()
        );
        report
    }
}
