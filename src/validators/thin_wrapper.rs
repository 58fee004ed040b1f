use super::{for_each_parsed, ValidationContext, Validator};
use crate::common::command_files;
use crate::finding::{Finding, ValidationResult};
use regex::Regex;
use std::sync::LazyLock;

static USE_THE_SKILL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)use the \w+ skill").unwrap());

static SKILL_INVOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)Skill\(['"]"#).unwrap());

const MIN_CONTENT_LINES: usize = 5;

/// Content lines of a body: non-empty and not headings.
fn content_lines(body: &str) -> usize {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .count()
}

/// Commands that only point at a skill add nothing: skills are
/// discoverable on their own.
pub struct ThinWrapperValidator;

impl Validator for ThinWrapperValidator {
    fn id(&self) -> &'static str {
        "thin_wrapper"
    }

    fn name(&self) -> &'static str {
        "Thin Wrapper Detection"
    }

    fn description(&self) -> &'static str {
        "Commands that add nothing beyond invoking a skill"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for_each_parsed(&command_files(ctx.plugins_dir()), &mut result, |file, _, parts, result| {
            let body = parts.body;
            let names_skill = USE_THE_SKILL.is_match(body) || SKILL_INVOCATION.is_match(body);
            let injects = body.contains("!`") || body.contains('$');
            let interactive = body.contains("AskUserQuestion");

            if names_skill && content_lines(body) < MIN_CONTENT_LINES && !injects && !interactive {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Command '{}' appears to be a thin skill wrapper. Commands should add unique value (bash injection, interactivity, batch processing). Consider deleting it; the skill is auto-discoverable.",
                        file.stem()
                    ),
                ));
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_blank_lines_are_not_content() {
        assert_eq!(content_lines("# Title\n\nUse the foo skill.\n## More\nok\n"), 2);
    }
}
