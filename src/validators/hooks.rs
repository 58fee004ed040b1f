//! `hooks/hooks.json` structure.
//!
//! ```json
//! { "hooks": { "PreToolUse": [ { "matcher": "Bash",
//!     "hooks": [ { "type": "command", "command": "./check.sh", "timeout": 30 } ] } ] } }
//! ```

use super::{ValidationContext, Validator};
use crate::common::walk_files;
use crate::finding::{Finding, Severity, ValidationResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const KNOWN_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "PermissionRequest",
    "UserPromptSubmit",
    "Notification",
    "Stop",
    "SubagentStart",
    "SubagentStop",
    "PreCompact",
    "SessionStart",
    "SessionEnd",
];

fn hook_files(plugins_dir: &Path) -> Vec<PathBuf> {
    walk_files(plugins_dir, |p| {
        p.file_name().is_some_and(|n| n == "hooks.json")
            && p.parent()
                .and_then(|d| d.file_name())
                .is_some_and(|n| n == "hooks")
    })
}

/// Problems in a parsed hooks document.
pub fn check_hooks(doc: &Value) -> Vec<(Severity, String)> {
    let mut out = Vec::new();
    let Some(events) = doc.get("hooks").and_then(Value::as_object) else {
        out.push((Severity::Error, "Missing top-level 'hooks' object".to_string()));
        return out;
    };

    for (event, groups) in events {
        if !KNOWN_EVENTS.contains(&event.as_str()) {
            out.push((Severity::Warning, format!("Unknown hook event '{event}'")));
        }
        let Some(groups) = groups.as_array() else {
            out.push((Severity::Error, format!("Event '{event}' must map to an array of hook groups")));
            continue;
        };
        for (g, group) in groups.iter().enumerate() {
            let Some(hooks) = group.get("hooks").and_then(Value::as_array) else {
                out.push((Severity::Error, format!("{event}[{g}]: missing 'hooks' array")));
                continue;
            };
            for (h, hook) in hooks.iter().enumerate() {
                let at = format!("{event}[{g}].hooks[{h}]");
                match hook.get("type").and_then(Value::as_str) {
                    Some(kind @ ("command" | "prompt")) => {
                        let has_body = hook
                            .get(kind)
                            .and_then(Value::as_str)
                            .is_some_and(|s| !s.trim().is_empty());
                        if !has_body {
                            out.push((Severity::Error, format!("{at}: type '{kind}' requires a non-empty '{kind}' string")));
                        }
                    }
                    Some(other) => out.push((
                        Severity::Error,
                        format!("{at}: unsupported hook type '{other}' (expected 'command' or 'prompt')"),
                    )),
                    None => out.push((Severity::Error, format!("{at}: missing 'type'"))),
                }
                if let Some(timeout) = hook.get("timeout") {
                    if !timeout.as_u64().is_some_and(|t| t > 0) {
                        out.push((Severity::Error, format!("{at}: 'timeout' must be a positive integer")));
                    }
                }
            }
        }
    }
    out
}

pub struct HooksValidator;

impl Validator for HooksValidator {
    fn id(&self) -> &'static str {
        "hooks"
    }

    fn name(&self) -> &'static str {
        "Hooks Configuration Validation"
    }

    fn description(&self) -> &'static str {
        "hooks.json events, groups and hook entries"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for path in hook_files(ctx.plugins_dir()) {
            let doc: Value = match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str(&c).map_err(|e| format!("Invalid JSON: {e}")))
            {
                Ok(doc) => doc,
                Err(e) => {
                    result.error(Finding::at(&path, e));
                    continue;
                }
            };
            for (severity, message) in check_hooks(&doc) {
                result.push(severity, Finding::at(&path, message));
            }
        }

        result
    }
}
