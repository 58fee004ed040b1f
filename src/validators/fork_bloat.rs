use super::{for_each_parsed, has_tool, ValidationContext, Validator};
use crate::common::skill_files;
use crate::finding::{Finding, ValidationResult};

/// Flags skills that fork a context without delegating (`Task`), reading at
/// volume (`Read`, `Grep`) or naming an `agent`.
pub struct ForkBloatValidator;

impl Validator for ForkBloatValidator {
    fn id(&self) -> &'static str {
        "fork_bloat"
    }

    fn name(&self) -> &'static str {
        "Fork-Bloat Validation"
    }

    fn description(&self) -> &'static str {
        "Skills using context: fork without a reason to isolate"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let exempt = &ctx.config.fork.exempt_skills;

        for_each_parsed(&skill_files(ctx.plugins_dir()), &mut result, |file, fm, _, result| {
            if fm.get_str("context") != Some("fork") {
                return;
            }
            let name = fm.get_str("name").unwrap_or("unknown");
            let tools = fm.list("allowed-tools").unwrap_or_default();
            let justified = fm.contains("agent")
                || exempt.iter().any(|e| e == name)
                || ["Task", "Read", "Grep"].iter().any(|t| has_tool(&tools, t));
            if !justified {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Skill '{name}' has 'context: fork' but no 'Task', 'Read', or 'Grep' tools. Forked skills should either isolate delegation (Task) or process volume (Read/Grep)."
                    ),
                ));
            }
        });

        result
    }
}
