//! Shared constants, naming rules and pure string helpers.
//!
//! Everything here is used by both the [validators](crate::validators) and
//! the [fixer](crate::fixer): the naming regex, the tool catalogue, the set
//! of excluded directories, the file walkers, and the sanitizers that the
//! fixer applies and the validators implicitly expect.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
pub const MAX_COMPATIBILITY_LENGTH: usize = 500;

/// Lowercase alphanumerics and single inner hyphens. The host loader rejects
/// anything else at load time.
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").unwrap());

/// `mcp__plugin_<namespace>__<tool>`
pub static MCP_TOOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mcp__plugin_[a-zA-Z0-9_-]+__[a-zA-Z0-9_-]+$").unwrap());

/// Deprecated `Tool[arg1,arg2]` restriction syntax.
static BRACKET_TOOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\[([^\]]+)\]$").unwrap());

pub const VALID_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "Glob",
    "Grep",
    "Bash",
    "Task",
    "AskUserQuestion",
    "Skill",
];

pub const KNOWN_CUSTOM_TOOLS: &[&str] = &[
    "WebFetch",
    "WebSearch",
    "TodoWrite",
    "ExitPlanMode",
    "EnterPlanMode",
];

/// Directories skipped by every recursive walk. `.claude/` is a local
/// workspace folder and never part of the marketplace.
pub const EXCLUDED_DIRS: &[&str] = &[".claude", ".attic", ".git", "__pycache__", "node_modules"];

/// Returns `true` if any component of `path` is an excluded directory.
pub fn is_excluded(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| EXCLUDED_DIRS.contains(&s))
    })
}

/// Recursively collects regular files under `root` accepted by `keep`,
/// skipping excluded directories. The result is sorted.
pub fn walk_files(root: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|n| EXCLUDED_DIRS.contains(&n))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| keep(p))
        .collect();
    files.sort();
    files.dedup();
    files
}

fn file_name_is(path: &Path, names: &[&str]) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| names.contains(&n))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn parent_dir_is(path: &Path, name: &str) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == name)
}

/// Every `SKILL.md` / `skill.md` below `root`.
pub fn skill_files(root: &Path) -> Vec<PathBuf> {
    walk_files(root, |p| file_name_is(p, &["SKILL.md", "skill.md"]))
}

/// Every `agents/*.md` below `root`.
pub fn agent_files(root: &Path) -> Vec<PathBuf> {
    walk_files(root, |p| has_extension(p, "md") && parent_dir_is(p, "agents"))
}

/// Every `commands/*.md` below `root`.
pub fn command_files(root: &Path) -> Vec<PathBuf> {
    walk_files(root, |p| has_extension(p, "md") && parent_dir_is(p, "commands"))
}

/// Every markdown file below `root`.
pub fn markdown_files(root: &Path) -> Vec<PathBuf> {
    walk_files(root, |p| has_extension(p, "md"))
}

/// Every file with extension `ext` below `root`.
pub fn files_with_extension(root: &Path, ext: &str) -> Vec<PathBuf> {
    walk_files(root, |p| has_extension(p, ext))
}

/// Every `.claude-plugin/plugin.json` manifest below `root`.
pub fn plugin_manifests(root: &Path) -> Vec<PathBuf> {
    walk_files(root, |p| {
        file_name_is(p, &["plugin.json"]) && parent_dir_is(p, ".claude-plugin")
    })
}

/// Returns `true` for characters that are kept in a sanitized description.
fn is_printable(ch: char) -> bool {
    !ch.is_control()
        && !matches!(
            ch,
            '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
        )
}

/// Sanitizes a description into one tight line.
///
/// Newlines and tabs become spaces, invisible and control characters are
/// dropped, whitespace runs collapse to a single space, and a terminal `.` is
/// appended unless the text already ends in `.`, `!` or `?`. Clean input is
/// returned unchanged.
pub fn clean_description_text(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .filter(|c| is_printable(*c))
        .collect();

    let mut out = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if !out.is_empty() && !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

/// Lowercases and converts underscores to hyphens.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

/// Rewrites `Tool[a,b]` entries as `Tool(a:*)`, `Tool(b:*)`. Parameters that
/// already carry a `:` scope are kept as-is; other entries pass through.
pub fn normalize_tool_syntax(tools: &[String]) -> Vec<String> {
    let mut normalized = Vec::with_capacity(tools.len());
    for tool in tools {
        match BRACKET_TOOL.captures(tool.trim()) {
            Some(caps) => {
                let name = &caps[1];
                for param in caps[2].split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    if param.contains(':') {
                        normalized.push(format!("{name}({param})"));
                    } else {
                        normalized.push(format!("{name}({param}:*)"));
                    }
                }
            }
            None => normalized.push(tool.clone()),
        }
    }
    normalized
}

/// Returns `true` if `tool` uses the deprecated bracket restriction syntax.
pub fn is_bracket_tool(tool: &str) -> bool {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+\[[^\]]+\]").unwrap());
    RE.is_match(tool)
}

/// Splits the inside of a flow sequence on commas that are not nested in
/// parentheses or brackets.
///
/// `Bash(find,ls), Bash[python,node]` → `["Bash(find,ls)", "Bash[python,node]"]`
pub fn split_flow_sequence(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        items.push(last);
    }
    items.retain(|s| !s.is_empty());
    items
}

/// Strips one layer of matching single or double quotes.
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_description_collapses_and_punctuates() {
        assert_eq!(
            clean_description_text("Builds  things\n\tfast"),
            "Builds things fast."
        );
    }

    #[test]
    fn clean_description_is_noop_on_clean_text() {
        let clean = "Validates plugins. Use when editing skills.";
        assert_eq!(clean_description_text(clean), clean);
        assert_eq!(clean_description_text("Done!"), "Done!");
    }

    #[test]
    fn clean_description_drops_invisible_characters() {
        assert_eq!(clean_description_text("a\u{200B}b\u{0007}c?"), "abc?");
        assert_eq!(clean_description_text(""), "");
        assert_eq!(clean_description_text("   "), "");
    }

    #[test]
    fn normalize_name_lowercases_and_hyphenates() {
        assert_eq!(normalize_name("Foo_Bar"), "foo-bar");
        assert_eq!(normalize_name("already-fine"), "already-fine");
    }

    #[test]
    fn bracket_tools_expand_per_parameter() {
        let tools = vec!["Bash[python,node]".to_string(), "Read".to_string()];
        assert_eq!(
            normalize_tool_syntax(&tools),
            vec!["Bash(python:*)", "Bash(node:*)", "Read"]
        );
    }

    #[test]
    fn paren_tools_are_untouched() {
        let tools = vec!["Bash(git:*)".to_string(), "Skill(foo)".to_string()];
        assert_eq!(normalize_tool_syntax(&tools), tools);
    }

    #[test]
    fn scoped_bracket_parameter_keeps_scope() {
        let tools = vec!["Bash[git:status]".to_string()];
        assert_eq!(normalize_tool_syntax(&tools), vec!["Bash(git:status)"]);
    }

    #[test]
    fn flow_sequence_respects_nesting() {
        assert_eq!(
            split_flow_sequence("Bash(find,ls), Bash[python,node] , Write"),
            vec!["Bash(find,ls)", "Bash[python,node]", "Write"]
        );
    }

    #[test]
    fn name_pattern_rules() {
        for ok in ["a", "foo-bar", "x1-y2"] {
            assert!(NAME_PATTERN.is_match(ok), "{ok}");
        }
        for bad in ["-a", "a-", "Foo", "foo_bar", ""] {
            assert!(!NAME_PATTERN.is_match(bad), "{bad}");
        }
    }
}
