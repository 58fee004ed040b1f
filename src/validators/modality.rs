//! Description modality per plugin tier.
//!
//! Standard pattern: `{capability}. Use when {triggers}.`
//! Enhanced pattern: `{capability}. MUST|PROACTIVELY|SHOULD Use when {triggers}.`
//!
//! Infrastructure plugins are expected to use the enhanced pattern; every
//! other plugin should stick to the standard one.

use super::{for_each_parsed, ValidationContext, Validator};
use crate::common::skill_files;
use crate::finding::{Finding, ValidationResult};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static ENHANCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.\s*(MUST|PROACTIVELY|SHOULD)\s+Use when").unwrap());

static STANDARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.\s*Use when").unwrap());

pub const TIER_GUIDANCE: &[(&str, &str)] = &[
    ("sys-core", "Enhanced Pattern (MUST/PROACTIVELY/SHOULD) recommended for internal standards"),
    ("sys-builder", "Enhanced Pattern (PROACTIVELY/MUST) recommended for orchestration"),
    ("sys-cognition", "Standard Pattern (Use when) or Enhanced (SHOULD)"),
    ("sys-research", "Standard Pattern (Use when) recommended"),
    ("sys-meta", "Enhanced Pattern (SHOULD) recommended for best practices"),
    ("sys-multimodal", "Standard Pattern (Use when) recommended"),
    ("sys-edge", "Standard Pattern (Use when) recommended"),
    ("llm-application-dev", "Standard Pattern (Use when) recommended"),
];

pub const INFRASTRUCTURE_PLUGINS: &[&str] = &["sys-core", "sys-builder", "sys-meta"];

/// First path component of `path` below `plugins_dir`.
fn plugin_of<'a>(path: &'a Path, plugins_dir: &Path) -> Option<&'a str> {
    path.strip_prefix(plugins_dir)
        .ok()?
        .components()
        .next()?
        .as_os_str()
        .to_str()
}

pub struct ModalityValidator;

impl Validator for ModalityValidator {
    fn id(&self) -> &'static str {
        "modality"
    }

    fn name(&self) -> &'static str {
        "Description Modality Validation"
    }

    fn description(&self) -> &'static str {
        "Standard vs enhanced description pattern per plugin tier"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let plugins_dir = ctx.plugins_dir();

        for_each_parsed(&skill_files(plugins_dir), &mut result, |file, fm, _, result| {
            let Some(description) = fm.get_str("description").filter(|d| !d.is_empty()) else {
                return;
            };
            let Some((plugin, guidance)) = plugin_of(&file.path, plugins_dir)
                .and_then(|p| TIER_GUIDANCE.iter().find(|(tier, _)| *tier == p))
            else {
                return;
            };
            let skill = fm.get_str("name").unwrap_or_default();
            let enhanced = ENHANCED.is_match(description);
            let standard = !enhanced && STANDARD.is_match(description);
            let infrastructure = INFRASTRUCTURE_PLUGINS.contains(plugin);

            if enhanced && !infrastructure {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Skill '{skill}' uses Enhanced Pattern but '{plugin}' is not an infrastructure plugin. Consider Standard Pattern for portability. Guidance: {guidance}"
                    ),
                ));
            }
            if standard && infrastructure {
                result.note(Finding::at(
                    &file.path,
                    format!(
                        "Skill '{skill}' in '{plugin}' uses Standard Pattern. Consider Enhanced Pattern (MUST/PROACTIVELY/SHOULD) for internal standards. Guidance: {guidance}"
                    ),
                ));
            }
        });

        result
    }
}
