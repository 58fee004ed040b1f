use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static INLINE_SKILLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)skills:\s*\[(.*?)\]").unwrap());

static INLINE_ALLOWED_TOOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)allowed-tools:\s*\[(.*?)\]").unwrap());

static SKILL_CALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Skill\(([^)]+)\)").unwrap());

static EXTERNAL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"references/([\w-]+)/([\w-]+)").unwrap());

/// Pulls reference tokens out of a component's raw text.
///
/// Tokens are `skill:<name>` for references by bare skill name and
/// `external:<plugin>:<name>` for references into another plugin.
pub trait ReferenceExtractor {
    fn extract(&self, content: &str, own_plugin: &str) -> BTreeSet<String>;
}

/// Best-effort textual extraction. Only inline (flow) lists are recognized;
/// block-style `skills:` lists are not.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexReferenceExtractor;

impl ReferenceExtractor for RegexReferenceExtractor {
    fn extract(&self, content: &str, own_plugin: &str) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();

        if let Some(caps) = INLINE_SKILLS.captures(content) {
            for skill in caps[1].split(',') {
                let skill = skill.trim().trim_matches(['"', '\'']).trim();
                if !skill.is_empty() {
                    refs.insert(format!("skill:{skill}"));
                }
            }
        }

        if let Some(caps) = INLINE_ALLOWED_TOOLS.captures(content) {
            for call in SKILL_CALL.captures_iter(&caps[1]) {
                let skill = call[1].trim().trim_matches(['"', '\'']).trim();
                if !skill.is_empty() {
                    refs.insert(format!("skill:{skill}"));
                }
            }
        }

        for caps in EXTERNAL_REFERENCE.captures_iter(content) {
            if &caps[1] != own_plugin {
                refs.insert(format!("external:{}:{}", &caps[1], &caps[2]));
            }
        }

        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<String> {
        RegexReferenceExtractor
            .extract(content, "own")
            .into_iter()
            .collect()
    }

    #[test]
    fn inline_skills_list() {
        assert_eq!(
            extract("---\nskills: [alpha, \"beta\"]\n---\n"),
            vec!["skill:alpha", "skill:beta"]
        );
    }

    #[test]
    fn skill_calls_in_allowed_tools() {
        assert_eq!(
            extract("---\nallowed-tools: [Read, Skill(gamma), Skill('delta')]\n---\n"),
            vec!["skill:delta", "skill:gamma"]
        );
    }

    #[test]
    fn external_references_skip_own_plugin() {
        assert_eq!(
            extract("See references/other/tool-x and references/own/local."),
            vec!["external:other:tool-x"]
        );
    }

    #[test]
    fn block_lists_are_not_recognized() {
        assert!(extract("---\nskills:\n  - alpha\n---\n").is_empty());
    }
}
