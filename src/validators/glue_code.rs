//! Glue code detection.
//!
//! Commands should orchestrate skills rather than carry logic of their own,
//! and agents that mostly fan out `Task(...)` calls are thin wrappers.

use super::{MarkdownFile, ValidationContext, Validator};
use crate::common::{agent_files, command_files, files_with_extension};
use crate::finding::{Finding, ValidationResult};
use regex::Regex;
use std::sync::LazyLock;

static QUOTED_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)description:\s*["'](.*?)["']"#).unwrap());

const MAX_COMMAND_LINES: usize = 50;
const MAX_COMMAND_DESCRIPTION: usize = 200;
const MAX_TASK_CALLS: usize = 5;
const MIN_AGENT_LINES: usize = 50;

fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

fn check_command(file: &MarkdownFile, result: &mut ValidationResult) {
    if line_count(&file.content) > MAX_COMMAND_LINES && !file.content.contains("Skill(") {
        result.warning(Finding::at(
            &file.path,
            format!(
                "Large command detected (>{MAX_COMMAND_LINES} lines). Commands should orchestrate skills and agents, not contain heavy logic."
            ),
        ));
    }

    if let Some(caps) = QUOTED_DESCRIPTION.captures(&file.content) {
        if caps[1].chars().count() > MAX_COMMAND_DESCRIPTION {
            result.warning(Finding::at(
                &file.path,
                format!(
                    "Description is too long (>{MAX_COMMAND_DESCRIPTION} chars). Keep command descriptions terse for routing."
                ),
            ));
        }
    }
}

fn check_agent(file: &MarkdownFile, result: &mut ValidationResult) {
    let task_calls = file.content.matches("Task(").count();
    if task_calls <= MAX_TASK_CALLS {
        return;
    }
    result.warning(Finding::at(
        &file.path,
        format!("High delegation pattern ({task_calls} Task calls)"),
    ));
    if line_count(&file.content) < MIN_AGENT_LINES {
        result.warning(Finding::at(
            &file.path,
            "Potential wrapper agent (high delegation, minimal content)",
        ));
    }
}

pub struct GlueCodeValidator;

impl Validator for GlueCodeValidator {
    fn id(&self) -> &'static str {
        "glue_code"
    }

    fn name(&self) -> &'static str {
        "Glue Code & Standard Detection"
    }

    fn description(&self) -> &'static str {
        "Oversized commands, wrapper agents and cross-plugin script coupling"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let plugins_dir = ctx.plugins_dir();

        for path in command_files(plugins_dir) {
            match MarkdownFile::load(&path) {
                Ok(file) => check_command(&file, &mut result),
                Err(finding) => result.error(finding),
            }
        }

        for path in agent_files(plugins_dir) {
            match MarkdownFile::load(&path) {
                Ok(file) => check_agent(&file, &mut result),
                Err(finding) => result.error(finding),
            }
        }

        // Unreadable scripts are not worth a finding.
        for path in files_with_extension(plugins_dir, "py") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if content.contains("../../") {
                    result.warning(Finding::at(&path, "Cross-plugin coupling detected"));
                }
            }
        }

        result
    }
}
