use super::{for_each_parsed, ValidationContext, Validator};
use crate::common::command_files;
use crate::finding::{Finding, ValidationResult};

/// Commands that wrap a skill should opt out of model invocation so their
/// own text never enters the context.
pub struct ZeroTokenValidator;

impl Validator for ZeroTokenValidator {
    fn id(&self) -> &'static str {
        "zero_token"
    }

    fn name(&self) -> &'static str {
        "Zero-Token Retention Check"
    }

    fn description(&self) -> &'static str {
        "Skill-wrapping commands set disable-model-invocation"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for_each_parsed(&command_files(ctx.plugins_dir()), &mut result, |file, fm, _, result| {
            let wraps_skill = fm
                .list("allowed-tools")
                .unwrap_or_default()
                .iter()
                .any(|t| t.contains("Skill("));
            if wraps_skill && !fm.is_true("disable-model-invocation") {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Command '{}' wraps a Skill but is missing 'disable-model-invocation: true'. Add it to keep the command out of context.",
                        file.stem()
                    ),
                ));
            }
        });

        result
    }
}
