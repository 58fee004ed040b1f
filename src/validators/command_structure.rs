//! Command structure.
//!
//! Commands should guide their user (`argument-hint`), orchestrate skills
//! explicitly, and use the `Tool(arg:*)` restriction syntax.

use super::{MarkdownFile, ValidationContext, Validator};
use crate::common::{command_files, is_bracket_tool};
use crate::finding::{Finding, ValidationResult};
use crate::frontmatter::document::FrontmatterDocument;
use crate::frontmatter::FrontmatterError;
use regex::Regex;
use std::sync::LazyLock;

static ORCHESTRATION_IN_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Skill\(|@[\w-]+|/[\w-]+").unwrap());

fn bracket_error(file: &MarkdownFile) -> Finding {
    Finding::at(
        &file.path,
        format!(
            "CRITICAL - Command '{}' uses square bracket tool restriction syntax (e.g. Bash[python]). Use parentheses syntax: Bash(python:*). Run --fix to migrate.",
            file.stem()
        ),
    )
}

fn check_command(file: &MarkdownFile, result: &mut ValidationResult) {
    let command = file.stem();
    let (fm, parts) = match file.parse() {
        Ok(parsed) => parsed,
        // Bracket syntax is not valid YAML inside a flow list, so read the
        // raw lines to still report it.
        Err(FrontmatterError::InvalidYaml(_)) => {
            let brackets = FrontmatterDocument::parse(&file.content)
                .ok()
                .and_then(|doc| doc.list("allowed-tools"))
                .is_some_and(|(tools, _)| tools.iter().any(|t| is_bracket_tool(t)));
            if brackets {
                result.error(bracket_error(file));
            }
            return;
        }
        Err(_) => return,
    };

    if fm.get_str("argument-hint").map_or(true, str::is_empty) {
        result.warning(Finding::at(
            &file.path,
            format!("Command '{command}' missing 'argument-hint'. Always include one for user guidance."),
        ));
    }

    let tools = fm.list("allowed-tools").unwrap_or_default();
    let lists_skill = tools.iter().any(|t| t.contains("Skill("));
    if !lists_skill && !ORCHESTRATION_IN_BODY.is_match(parts.body) {
        result.warning(Finding::at(
            &file.path,
            format!(
                "Command '{command}' has no explicit skill orchestration. List skills in allowed-tools or reference them by name in the body."
            ),
        ));
    }

    if tools.iter().any(|t| is_bracket_tool(t)) {
        result.error(bracket_error(file));
    }
}

pub struct CommandStructureValidator;

impl Validator for CommandStructureValidator {
    fn id(&self) -> &'static str {
        "command_structure"
    }

    fn name(&self) -> &'static str {
        "Command Structure Validation"
    }

    fn description(&self) -> &'static str {
        "Argument hints, explicit orchestration and tool restriction syntax"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        for path in command_files(ctx.plugins_dir()) {
            match MarkdownFile::load(&path) {
                Ok(file) => check_command(&file, &mut result),
                Err(finding) => result.error(finding),
            }
        }
        result
    }
}
