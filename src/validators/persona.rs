//! Persona phrasing ("You are an expert...") in skill and agent bodies.
//!
//! Skills should read as protocols ("Follow this 3-step process"), not as
//! role-play prompts.

use super::{for_each_parsed, ValidationContext, Validator};
use crate::common::{agent_files, skill_files};
use crate::finding::{Finding, ValidationResult};
use regex::Regex;
use std::sync::LazyLock;

static PERSONA_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)You are an?\s+\w+", "You are a/an [role]"),
        (r"(?i)I am an?\s+\w+", "I am a/an [role]"),
        (r"(?i)Act as an?\s+\w+", "Act as a/an [role]"),
        (r"(?i)Your role is?", "Your role"),
        (r"(?i)You specialize in", "You specialize in"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).unwrap(), label))
    .collect()
});

static TITLED_PERSONA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"You are an?\s+\*\*[A-Z]\w+\*\*").unwrap());

/// Label of the first persona pattern found in `body`.
pub fn detect_persona(body: &str) -> Option<&'static str> {
    PERSONA_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(body))
        .map(|(_, label)| *label)
}

pub struct PersonaValidator;

impl Validator for PersonaValidator {
    fn id(&self) -> &'static str {
        "persona"
    }

    fn name(&self) -> &'static str {
        "Persona Language Detection"
    }

    fn description(&self) -> &'static str {
        "Role-play phrasing in skills and elaborate agent personas"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let plugins_dir = ctx.plugins_dir();

        for_each_parsed(&skill_files(plugins_dir), &mut result, |file, _, parts, result| {
            if let Some(label) = detect_persona(parts.body) {
                result.warning(Finding::at(
                    &file.path,
                    format!(
                        "Detected persona language ({label}). Use protocol format ('Follow this X-step process') instead of persona format ('You are an expert...')."
                    ),
                ));
            }
        });

        for_each_parsed(&agent_files(plugins_dir), &mut result, |file, _, parts, result| {
            if TITLED_PERSONA.is_match(parts.body) {
                result.note(Finding::at(
                    &file.path,
                    "Agent uses an elaborate persona (**Elite**, **Senior**, ...). Keep agent bodies minimal: core purpose, tool access, preloaded skills.",
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
    fn first_matching_pattern_wins() {
        assert_eq!(
            detect_persona("Act as a reviewer. You are an expert."),
            Some("You are a/an [role]")
        );
        assert_eq!(detect_persona("Follow this 3-step process."), None);
    }
}
