//! Relative markdown links and backtick resource paths.
//!
//! A skill is a self-contained directory: every link it makes must resolve
//! inside its own root. Paths starting with `scripts/`, `assets/` or
//! `references/` are resolved from the skill root, anything else from the
//! linking file's directory.

use super::{MarkdownFile, ValidationContext, Validator};
use crate::common::markdown_files;
use crate::finding::{Finding, ValidationResult};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

static BACKTICK_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(?:references|assets|scripts)/[^`]+`").unwrap());

static CROSS_SKILL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\./[^/\s]+/skill").unwrap());

const SKIPPED_SCHEMES: &[&str] = &["http://", "https://", "#", "file://", "$", "mailto:"];

const SKILL_ROOTED_DIRS: &[&str] = &["scripts", "assets", "references"];

/// The closest ancestor of `file_dir` holding a `SKILL.md`, without
/// climbing past `plugins_dir` or `root_dir`. Falls back to `file_dir`.
pub fn find_skill_root(file_dir: &Path, plugins_dir: &Path, root_dir: &Path) -> PathBuf {
    let mut dir = file_dir;
    loop {
        if dir.join("SKILL.md").is_file() || dir.join("skill.md").is_file() {
            return dir.to_path_buf();
        }
        if dir == plugins_dir || dir == root_dir {
            break;
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }
    file_dir.to_path_buf()
}

/// Resolves `link` (already stripped of any `#fragment`).
pub fn resolve_link(link: &str, skill_root: &Path, file_dir: &Path) -> PathBuf {
    let path = Path::new(link);
    let rooted = path
        .components()
        .find(|c| !matches!(c, Component::CurDir))
        .and_then(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .is_some_and(|first| SKILL_ROOTED_DIRS.contains(&first));
    if rooted {
        skill_root.join(path)
    } else {
        file_dir.join(path)
    }
}

fn is_within(target: &Path, skill_root: &Path) -> bool {
    match (target.canonicalize(), skill_root.canonicalize()) {
        (Ok(t), Ok(root)) => t.starts_with(root),
        _ => false,
    }
}

fn is_readme(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| matches!(n.to_lowercase().as_str(), "readme.md" | "readme"))
}

fn path_contains(path: &Path, needle: &str) -> bool {
    path.to_string_lossy().contains(needle)
}

/// Strips an optional `"title"` and `#fragment` from a link target.
fn link_target(raw: &str) -> &str {
    let target = raw.split_whitespace().next().unwrap_or_default();
    let target = target.trim_start_matches('<').trim_end_matches('>');
    target.split('#').next().unwrap_or_default()
}

fn check_file(file: &MarkdownFile, ctx: &ValidationContext, result: &mut ValidationResult) {
    let path = file.path.as_path();
    let file_dir = path.parent().unwrap_or(Path::new("."));
    let skill_root = find_skill_root(file_dir, ctx.plugins_dir(), ctx.root_dir());
    let readme = is_readme(path);

    for caps in MARKDOWN_LINK.captures_iter(&file.content) {
        let link = caps[2].trim();
        if link.is_empty() || SKIPPED_SCHEMES.iter().any(|s| link.starts_with(s)) {
            continue;
        }
        let target_link = link_target(link);
        if target_link.is_empty() {
            continue;
        }
        let target = resolve_link(target_link, &skill_root, file_dir);
        if !target.exists() {
            result.error(Finding::at(path, format!("Broken link -> {link}")));
        } else if !readme && !is_within(&target, &skill_root) {
            result.error(Finding::at(path, format!("Cross-skill link detected -> {link}")));
        }
    }

    let is_template = path_contains(path, "templates") || path_contains(path, "assets");
    for m in BACKTICK_PATH.find_iter(&file.content) {
        let reference = m.as_str().trim_matches('`');
        let target = resolve_link(link_target(reference), &skill_root, file_dir);
        if target.exists() {
            continue;
        }
        if is_template {
            result.warning(Finding::at(path, format!("Optional reference -> {reference}")));
        } else {
            result.error(Finding::at(path, format!("Backtick path not found -> {reference}")));
        }
    }

    if !readme {
        for m in CROSS_SKILL_REFERENCE.find_iter(&file.content) {
            result.error(Finding::at(
                path,
                format!("Cross-skill reference found -> {}", m.as_str()),
            ));
        }
    }

    if file.content.contains("@[") && !path_contains(path, "commands") {
        result.warning(Finding::at(
            path,
            "@[file] syntax found (only valid in commands)",
        ));
    }
}

pub struct LinkValidator;

impl Validator for LinkValidator {
    fn id(&self) -> &'static str {
        "links"
    }

    fn name(&self) -> &'static str {
        "Link Validation"
    }

    fn description(&self) -> &'static str {
        "Relative links and resource paths resolve inside their skill"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let files = markdown_files(ctx.plugins_dir());
        tracing::debug!("checking {} markdown files", files.len());

        for path in &files {
            match MarkdownFile::load(path) {
                Ok(file) => check_file(&file, ctx, &mut result),
                Err(finding) => result.error(finding),
            }
        }
        result
    }
}
