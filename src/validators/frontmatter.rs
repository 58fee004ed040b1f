//! Frontmatter validation for skills, agents and commands.
//!
//! The host loader crashes on a malformed frontmatter block, so most of
//! these findings are errors. Checks per file:
//!
//! | Check | Severity |
//! |-------|----------|
//! | Missing opening or closing `---` | error |
//! | YAML invalid or not a mapping | error |
//! | Skill `description: \|` / `>` block scalar | error |
//! | Keys outside the kind's allowed set (one finding, sorted) | error |
//! | Missing required field | error |
//! | Name length > 64 / > 30 | error / warning |
//! | Name characters, case, hyphens, underscores | error |
//! | Skill name differs from its directory | error |
//! | Description > 1024 / > 500, multi-line | error / warning, error |
//! | Skill description lacks or starts with `Use when` | error |
//! | `compatibility` not a string or > 500 | error |
//! | `context` other than `fork`; `agent` without `context` | error; warning |
//! | Unknown tool in the tool list | warning |

use super::{tool_base, MarkdownFile, ValidationContext, Validator};
use crate::common::{
    agent_files, command_files, skill_files, KNOWN_CUSTOM_TOOLS, MAX_COMPATIBILITY_LENGTH,
    MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MCP_TOOL_PATTERN, NAME_PATTERN, VALID_TOOLS,
};
use crate::finding::{Finding, Severity, ValidationResult};
use crate::frontmatter::{self, ComponentKind, Frontmatter};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static BLOCK_SCALAR_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^description:\s*[|>]").unwrap());

const PREFERRED_NAME_LENGTH: usize = 30;
const PREFERRED_DIR_NAME_LENGTH: usize = 50;
const PREFERRED_DESCRIPTION_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

/// Checks a component name. `dir_name` is the enclosing directory for
/// skills, whose name must match it.
pub fn check_name(name: &str, dir_name: Option<&str>) -> Vec<(Severity, String)> {
    let mut out = Vec::new();
    let name: String = name.trim().nfkc().collect();

    if name.is_empty() {
        out.push((
            Severity::Error,
            "CRITICAL: Field 'name' is empty. Code will crash.".to_string(),
        ));
        return out;
    }

    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        out.push((
            Severity::Error,
            format!("Name '{name}' exceeds {MAX_NAME_LENGTH} characters ({len})"),
        ));
    } else if len > PREFERRED_NAME_LENGTH {
        out.push((
            Severity::Warning,
            format!("Name '{name}' is {len} characters. Prefer {PREFERRED_NAME_LENGTH} or fewer."),
        ));
    }

    // Targeted messages replace the generic character error.
    let mut targeted = Vec::new();
    if name != name.to_lowercase() {
        targeted.push(format!(
            "CRITICAL: Name '{name}' must be lowercase only. Code will crash."
        ));
    }
    if name.starts_with('-') {
        targeted.push(format!(
            "CRITICAL: Name '{name}' cannot start with a hyphen. Code will crash."
        ));
    }
    if name.ends_with('-') {
        targeted.push(format!(
            "CRITICAL: Name '{name}' cannot end with a hyphen. Code will crash."
        ));
    }
    if name.contains("--") {
        targeted.push(format!(
            "CRITICAL: Name '{name}' cannot contain consecutive hyphens (--). Code will crash."
        ));
    }
    if name.contains('_') {
        targeted.push(format!(
            "CRITICAL: Name '{name}' contains invalid character '_' (underscore). Use hyphens (-) only. Code will crash."
        ));
    }
    if targeted.is_empty() && !NAME_PATTERN.is_match(&name) {
        targeted.push(format!(
            "CRITICAL: Name '{name}' contains invalid characters. Use lowercase letters, digits and single hyphens only. Code will crash."
        ));
    }
    out.extend(targeted.into_iter().map(|m| (Severity::Error, m)));

    if let Some(dir) = dir_name {
        let dir: String = dir.nfkc().collect();
        if name != dir {
            out.push((
                Severity::Error,
                format!(
                    "CRITICAL: Skill name '{name}' MUST match directory name '{dir}'. Code will crash."
                ),
            ));
        } else if len > PREFERRED_DIR_NAME_LENGTH {
            out.push((
                Severity::Warning,
                format!("Skill directory name '{dir}' is {len} characters. Prefer {PREFERRED_DIR_NAME_LENGTH} or fewer."),
            ));
        }
    }

    out
}

/// Checks a component description.
pub fn check_description(description: &str, kind: ComponentKind) -> Vec<(Severity, String)> {
    let mut out = Vec::new();
    let trimmed = description.trim();

    if trimmed.is_empty() {
        out.push((
            Severity::Error,
            "CRITICAL: Field 'description' is empty. Code will crash.".to_string(),
        ));
        return out;
    }

    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        out.push((
            Severity::Error,
            format!("Description exceeds {MAX_DESCRIPTION_LENGTH} characters ({len})"),
        ));
    } else if len > PREFERRED_DESCRIPTION_LENGTH {
        out.push((
            Severity::Warning,
            format!("Description is {len} characters. Keep it under {PREFERRED_DESCRIPTION_LENGTH} for efficient discovery."),
        ));
    }

    if trimmed.contains('\n') {
        out.push((
            Severity::Error,
            "Description must be a single line (found line breaks). Run --fix to sanitize."
                .to_string(),
        ));
    }

    if kind == ComponentKind::Skill {
        let lower = trimmed.to_lowercase();
        if !lower.contains("use when") {
            out.push((
                Severity::Error,
                "Skill description must contain a 'Use when' trigger clause.".to_string(),
            ));
        }
        let first_line = lower.lines().next().unwrap_or_default();
        if first_line
            .trim_start_matches(['"', '\''])
            .trim_start()
            .starts_with("use when")
        {
            out.push((
                Severity::Error,
                "Skill description must start with what the skill does, not with 'Use when'."
                    .to_string(),
            ));
        }
    }

    out
}

/// Warns about tool entries that are neither built-in, known custom, MCP
/// nor `Skill(...)` calls.
pub fn check_tools(tools: &[String], field: &str) -> Vec<(Severity, String)> {
    tools
        .iter()
        .filter(|tool| !tool.trim().is_empty() && !tool.contains("Skill("))
        .filter_map(|tool| {
            let base = tool_base(tool);
            let known = VALID_TOOLS.contains(&base)
                || KNOWN_CUSTOM_TOOLS.contains(&base)
                || MCP_TOOL_PATTERN.is_match(base);
            (!known).then(|| {
                (
                    Severity::Warning,
                    format!("Unknown tool '{}' in {field} (base: {base})", tool.trim()),
                )
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-file validation
// ---------------------------------------------------------------------------

fn validate_file(path: &Path, kind: ComponentKind, result: &mut ValidationResult) {
    let file = match MarkdownFile::load(path) {
        Ok(f) => f,
        Err(finding) => {
            result.error(finding);
            return;
        }
    };
    let mut emit = |severity: Severity, message: String| {
        result.push(severity, Finding::at(path, message));
    };

    let parts = match frontmatter::split(&file.content) {
        Ok(parts) => parts,
        Err(e) => {
            emit(Severity::Error, e.to_string());
            return;
        }
    };

    if kind == ComponentKind::Skill && BLOCK_SCALAR_DESCRIPTION.is_match(parts.yaml) {
        emit(
            Severity::Error,
            "Multi-line description (block scalar | or >) detected. Use a single-line quoted string."
                .to_string(),
        );
    }

    let fm = match Frontmatter::from_yaml(parts.yaml) {
        Ok(fm) => fm,
        Err(e) => {
            emit(Severity::Error, e.to_string());
            return;
        }
    };

    let unexpected = kind.unexpected_fields(&fm);
    if !unexpected.is_empty() {
        emit(
            Severity::Error,
            format!(
                "Unexpected fields in frontmatter: {}. For {kind}, only {} are allowed.",
                unexpected.join(", "),
                kind.allowed_fields().join(", ")
            ),
        );
    }

    for field in kind.required_fields() {
        if !fm.contains(field) {
            emit(Severity::Error, format!("Missing required field '{field}'"));
        }
    }

    if fm.contains("name") {
        match fm.get_str("name") {
            Some(name) => {
                let dir_name = (kind == ComponentKind::Skill)
                    .then(|| path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()))
                    .flatten();
                for (severity, message) in check_name(name, dir_name) {
                    emit(severity, message);
                }
            }
            None => emit(
                Severity::Error,
                "CRITICAL: Field 'name' must be a string. Code will crash.".to_string(),
            ),
        }
    }

    if fm.contains("description") {
        match fm.get_str("description") {
            Some(description) => {
                for (severity, message) in check_description(description, kind) {
                    emit(severity, message);
                }
            }
            None => emit(
                Severity::Error,
                "CRITICAL: Field 'description' must be a string. Code will crash.".to_string(),
            ),
        }
    }

    if let Some(value) = fm.get("compatibility") {
        match value.as_str() {
            Some(compat) if compat.chars().count() > MAX_COMPATIBILITY_LENGTH => emit(
                Severity::Error,
                format!("Field 'compatibility' exceeds {MAX_COMPATIBILITY_LENGTH} characters"),
            ),
            Some(_) => {}
            None => emit(
                Severity::Error,
                "Field 'compatibility' must be a string".to_string(),
            ),
        }
    }

    if kind == ComponentKind::Skill {
        if let Some(context) = fm.get("context") {
            if context.as_str() != Some("fork") {
                emit(
                    Severity::Error,
                    "Invalid 'context' value. Only 'fork' is supported.".to_string(),
                );
            }
        }
        if fm.contains("agent") && !fm.contains("context") {
            emit(
                Severity::Warning,
                "Field 'agent' has no effect without 'context: fork'".to_string(),
            );
        }
    }

    let field = kind.tools_field();
    if let Some(tools) = fm.list(field) {
        for (severity, message) in check_tools(&tools, field) {
            emit(severity, message);
        }
    }
}

pub struct FrontmatterValidator;

impl Validator for FrontmatterValidator {
    fn id(&self) -> &'static str {
        "frontmatter"
    }

    fn name(&self) -> &'static str {
        "Frontmatter Validation"
    }

    fn description(&self) -> &'static str {
        "Frontmatter structure, allowed fields, names and descriptions"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let plugins_dir = ctx.plugins_dir();

        let skills = skill_files(plugins_dir);
        if skills.is_empty() {
            result.warning(Finding::new("No SKILL.md files found"));
        }
        for path in &skills {
            validate_file(path, ComponentKind::Skill, &mut result);
        }
        for path in agent_files(plugins_dir) {
            validate_file(&path, ComponentKind::Agent, &mut result);
        }
        for path in command_files(plugins_dir) {
            validate_file(&path, ComponentKind::Command, &mut result);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(findings: &[(Severity, String)]) -> Vec<&str> {
        findings
            .iter()
            .filter(|(s, _)| *s == Severity::Error)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    #[test]
    fn underscore_name_gets_targeted_error_only() {
        let findings = check_name("foo_bar", Some("foo-bar"));
        let errs = errors(&findings);
        assert_eq!(errs.len(), 2, "{errs:?}");
        assert!(errs[0].contains("underscore"));
        assert!(errs[1].contains("'foo_bar'") && errs[1].contains("'foo-bar'"));
    }

    #[test]
    fn generic_error_only_without_targeted_message() {
        let errs = check_name("foo bar", None);
        assert_eq!(errors(&errs).len(), 1);
        assert!(errs[0].1.contains("invalid characters"));
    }

    #[test]
    fn consecutive_hyphens_are_rejected() {
        assert_eq!(errors(&check_name("a--b", None)).len(), 1);
    }

    #[test]
    fn long_names() {
        let long = "a".repeat(65);
        assert_eq!(errors(&check_name(&long, None)).len(), 1);
        let medium = "a".repeat(31);
        let findings = check_name(&medium, None);
        assert!(errors(&findings).is_empty());
        assert_eq!(findings[0].0, Severity::Warning);
    }

    #[test]
    fn nfkc_normalizes_before_comparing() {
        // Fullwidth letters fold to ASCII.
        assert!(check_name("\u{FF41}bc", Some("abc")).is_empty());
    }

    #[test]
    fn skill_description_needs_use_when_clause() {
        let errs = check_description("Builds things.", ComponentKind::Skill);
        assert_eq!(errors(&errs).len(), 1);
        let errs = check_description("Use when building. Builds.", ComponentKind::Skill);
        assert_eq!(errors(&errs).len(), 1);
        assert!(check_description("Builds things. Use when building.", ComponentKind::Skill)
            .is_empty());
        assert!(check_description("Builds things.", ComponentKind::Agent).is_empty());
    }

    #[test]
    fn description_length_boundaries() {
        let at_limit = format!("{}. Use when x.", "a".repeat(1011));
        assert_eq!(at_limit.chars().count(), 1024);
        let findings = check_description(&at_limit, ComponentKind::Skill);
        assert!(errors(&findings).is_empty());
        assert_eq!(findings.len(), 1);
        let over = format!("{at_limit}x");
        assert_eq!(errors(&check_description(&over, ComponentKind::Skill)).len(), 1);
    }

    #[test]
    fn tool_catalogue() {
        let tools: Vec<String> = [
            "Read",
            "Bash(git:*)",
            "Skill(foo)",
            "WebFetch",
            "mcp__plugin_ns__tool",
            "Teleport",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let findings = check_tools(&tools, "allowed-tools");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].1.contains("Teleport"));
    }
}
