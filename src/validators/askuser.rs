//! Autonomous agents must not stop to ask the user questions.

use super::{for_each_parsed, has_tool, ValidationContext, Validator};
use crate::common::agent_files;
use crate::finding::{Finding, ValidationResult};

const ASK_USER: &str = "AskUserQuestion";
const AUTONOMOUS_MODES: &[&str] = &["acceptEdits", "bypassPermissions"];
const COORDINATOR_MARKERS: &[&str] = &["director", "coordinator", "planner"];

pub struct AskUserValidator;

impl Validator for AskUserValidator {
    fn id(&self) -> &'static str {
        "askuser"
    }

    fn name(&self) -> &'static str {
        "AskUser-Leakage Validation"
    }

    fn description(&self) -> &'static str {
        "AskUserQuestion in autonomous or worker agents"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for_each_parsed(&agent_files(ctx.plugins_dir()), &mut result, |file, fm, _, result| {
            let agent = file.stem();
            let tools = fm.list("tools").unwrap_or_default();
            let asks_user = has_tool(&tools, ASK_USER);
            let description = fm.get_str("description").unwrap_or_default().to_lowercase();
            let name = agent.to_lowercase();
            let mentions = |marker: &str| name.contains(marker) || description.contains(marker);

            if let Some(mode) = fm.get_str("permissionMode") {
                if AUTONOMOUS_MODES.contains(&mode) {
                    if asks_user {
                        result.error(Finding::at(
                            &file.path,
                            format!(
                                "Agent '{agent}' has 'permissionMode: {mode}' with '{ASK_USER}' in tools. Autonomous agents MUST NOT ask the user."
                            ),
                        ));
                    }
                    if tools.is_empty() && mode == "acceptEdits" {
                        result.warning(Finding::at(
                            &file.path,
                            format!(
                                "Agent '{agent}' has 'permissionMode: acceptEdits' but no 'tools' allowlist. It inherits every tool including '{ASK_USER}'."
                            ),
                        ));
                    }
                }
            }

            if mentions("worker") && asks_user {
                result.error(Finding::at(
                    &file.path,
                    format!(
                        "Agent '{agent}' is a worker but has '{ASK_USER}' in tools. Workers execute without user interaction."
                    ),
                ));
            }

            if COORDINATOR_MARKERS.iter().any(|m| mentions(*m)) {
                result.note(Finding::at(
                    &file.path,
                    format!("Coordinator-type agent found. {ASK_USER} is acceptable here."),
                ));
            }
        });

        result
    }
}
