use super::{for_each_parsed, ValidationContext, Validator};
use crate::common::{agent_files, command_files, skill_files};
use crate::finding::{Finding, ValidationResult};

/// `permissionMode` belongs to agents only; agents should carry an explicit
/// `tools` allowlist.
pub struct PermissionValidator;

impl Validator for PermissionValidator {
    fn id(&self) -> &'static str {
        "permissions"
    }

    fn name(&self) -> &'static str {
        "Permission Leakage Validation"
    }

    fn description(&self) -> &'static str {
        "permissionMode outside agents and agents without a tools allowlist"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let plugins_dir = ctx.plugins_dir();

        for (files, kind, note) in [
            (skill_files(plugins_dir), "Skills", "Remove it from the frontmatter."),
            (
                command_files(plugins_dir),
                "Commands",
                "Commands inherit permissions from the calling context.",
            ),
        ] {
            for_each_parsed(&files, &mut result, |file, fm, _, result| {
                if fm.contains("permissionMode") {
                    result.error(Finding::at(
                        &file.path,
                        format!(
                            "CRITICAL - {kind} cannot define 'permissionMode'. This is an agent-only field. {note}"
                        ),
                    ));
                }
            });
        }

        for_each_parsed(&agent_files(plugins_dir), &mut result, |file, fm, _, result| {
            if !fm.contains("tools") {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Agent '{}' missing 'tools' allowlist. It inherits ALL tools from its parent.",
                        file.stem()
                    ),
                ));
            }
        });

        result
    }
}
