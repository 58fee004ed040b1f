use super::{for_each_parsed, has_tool, ValidationContext, Validator};
use crate::common::agent_files;
use crate::finding::{Finding, ValidationResult};

const WRITE_TOOLS: &[&str] = &["Write", "Edit", "Bash"];

/// Agents must declare a tool boundary, and agents that describe themselves
/// as read-only must enforce it.
pub struct AgentSecurityValidator;

impl Validator for AgentSecurityValidator {
    fn id(&self) -> &'static str {
        "agent_security"
    }

    fn name(&self) -> &'static str {
        "Agent Security Validation"
    }

    fn description(&self) -> &'static str {
        "Explicit tool boundaries and enforced read-only claims"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        for_each_parsed(&agent_files(ctx.plugins_dir()), &mut result, |file, fm, parts, result| {
            let agent = fm.get_str("name").unwrap_or(file.stem());
            let tools = fm.list("tools");
            let has_disallowed = fm.contains("disallowedTools");

            match &tools {
                None if !has_disallowed => result.error(Finding::at(
                    &file.path,
                    format!(
                        "Agent '{agent}' lacks explicit security boundaries and inherits ALL tools from its parent. Specify a 'tools' allowlist or a 'disallowedTools' blocklist."
                    ),
                )),
                Some(list) if list.is_empty() => result.error(Finding::at(
                    &file.path,
                    format!(
                        "Agent '{agent}' has an empty 'tools' allowlist, so no tools are available. Specify explicit tools or use disallowedTools."
                    ),
                )),
                _ => {}
            }

            let body = parts.body.to_lowercase();
            if body.contains("read-only") || body.contains("read only") {
                let restricted = has_disallowed
                    || tools
                        .as_ref()
                        .is_some_and(|list| WRITE_TOOLS.iter().any(|t| !has_tool(list, t)));
                if !restricted {
                    result.error(Finding::at(
                        &file.path,
                        format!(
                            "Agent '{agent}' claims 'READ-ONLY' but lacks enforcement. Add 'disallowedTools: [Write, Edit, Bash]'."
                        ),
                    ));
                }
            }
        });

        result
    }
}
