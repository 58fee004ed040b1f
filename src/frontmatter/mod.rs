//! Frontmatter splitting, parsing and per-kind metadata.
//!
//! A component file is a markdown document whose first line is `---`,
//! followed by a YAML mapping, a closing `---` line and a free-text body.
//! [`split`] locates the block, [`parse`] turns it into a [`Frontmatter`]
//! mapping, and [`ComponentMeta`] gives each component kind a typed view
//! with its allowed and required fields declared as data.

pub mod document;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::sync::LazyLock;

static CLOSING_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---\r?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Missing YAML frontmatter")]
    MissingOpening,
    #[error("Missing closing frontmatter marker")]
    MissingClosing,
    #[error("Invalid YAML frontmatter: {0}")]
    InvalidYaml(String),
    #[error("Invalid YAML frontmatter: frontmatter is not a mapping")]
    NotAMapping,
}

/// A markdown document split at its frontmatter markers.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    /// Raw YAML between the markers (starting right after the opening `---`).
    pub yaml: &'a str,
    /// Everything after the closing marker line.
    pub body: &'a str,
    /// 1-indexed line number on which the body starts.
    pub body_line: usize,
}

/// Locates the frontmatter block of `content`.
pub fn split(content: &str) -> Result<Split<'_>, FrontmatterError> {
    if !content.starts_with("---") {
        return Err(FrontmatterError::MissingOpening);
    }
    let rest = &content[3..];
    let m = CLOSING_MARKER
        .find(rest)
        .ok_or(FrontmatterError::MissingClosing)?;
    let yaml = &rest[..m.start()];
    let mut body = &rest[m.end()..];
    body = body.strip_prefix('\n').unwrap_or(body);
    let body_line = content[..content.len() - body.len()].lines().count() + 1;
    Ok(Split {
        yaml,
        body,
        body_line,
    })
}

/// Parses the frontmatter block of `content` and returns it with the body.
pub fn parse(content: &str) -> Result<(Frontmatter, Split<'_>), FrontmatterError> {
    let parts = split(content)?;
    let fm = Frontmatter::from_yaml(parts.yaml)?;
    Ok((fm, parts))
}

/// A parsed frontmatter mapping with lenient typed accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    map: Mapping,
}

impl Frontmatter {
    pub fn from_yaml(yaml: &str) -> Result<Self, FrontmatterError> {
        if yaml.trim().is_empty() {
            return Err(FrontmatterError::NotAMapping);
        }
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;
        match value {
            Value::Mapping(map) => Ok(Frontmatter { map }),
            _ => Err(FrontmatterError::NotAMapping),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// All keys rendered as strings, in document order.
    pub fn keys(&self) -> Vec<String> {
        self.map.keys().map(scalar_to_string).collect()
    }

    /// String value of `key`; non-string scalars are treated as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Length in characters of the scalar value of `key` rendered as text.
    pub fn text_len(&self, key: &str) -> usize {
        match self.get(key) {
            Some(Value::Null) | None => 0,
            Some(v) => scalar_to_string(v).chars().count(),
        }
    }

    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// Tool-style list: a YAML sequence or a comma-separated string.
    ///
    /// Returns `None` when the key is absent.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::Sequence(items) => Some(items.iter().map(scalar_to_string).collect()),
            Value::String(s) => Some(
                crate::common::split_flow_sequence(s)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            Value::Null => Some(vec![]),
            other => Some(vec![scalar_to_string(other)]),
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// The four kinds of plugin component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Skill,
    Agent,
    Command,
    Hook,
}

const BASE_FIELDS: &[&str] = &[
    "name",
    "description",
    "license",
    "compatibility",
    "version",
    "author",
];

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Skill => "skill",
            ComponentKind::Agent => "agent",
            ComponentKind::Command => "command",
            ComponentKind::Hook => "hook",
        }
    }

    /// Frontmatter keys accepted for this kind, beyond [`BASE_FIELDS`].
    fn extra_fields(&self) -> &'static [&'static str] {
        match self {
            ComponentKind::Skill => &[
                "allowed-tools",
                "context",
                "user-invocable",
                "disable-model-invocation",
                "agent",
            ],
            ComponentKind::Agent => &[
                "tools",
                "disallowedTools",
                "skills",
                "agent",
                "permissionMode",
                "model",
                "color",
            ],
            ComponentKind::Command => &[
                "allowed-tools",
                "disable-model-invocation",
                "argument-hint",
                "model",
            ],
            ComponentKind::Hook => &[],
        }
    }

    pub fn allowed_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = BASE_FIELDS
            .iter()
            .chain(self.extra_fields())
            .copied()
            .collect();
        fields.sort_unstable();
        fields
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ComponentKind::Skill | ComponentKind::Agent => &["name", "description"],
            ComponentKind::Command => &["description"],
            ComponentKind::Hook => &[],
        }
    }

    /// The frontmatter key holding this kind's tool list.
    pub fn tools_field(&self) -> &'static str {
        match self {
            ComponentKind::Agent => "tools",
            _ => "allowed-tools",
        }
    }

    /// Keys present in `fm` that this kind does not allow, sorted and unique.
    pub fn unexpected_fields(&self, fm: &Frontmatter) -> Vec<String> {
        let allowed = self.allowed_fields();
        let mut extra: Vec<String> = fm
            .keys()
            .into_iter()
            .filter(|k| !allowed.contains(&k.as_str()))
            .collect();
        extra.sort();
        extra.dedup();
        extra
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub allowed_tools: Option<Vec<String>>,
    pub context: Option<String>,
    pub agent: Option<String>,
    pub compatibility: Option<String>,
    pub permission_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tools: Option<Vec<String>>,
    pub disallowed_tools: Option<Vec<String>>,
    pub permission_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub allowed_tools: Option<Vec<String>>,
    pub argument_hint: Option<String>,
    pub disable_model_invocation: bool,
    pub permission_mode: Option<String>,
}

/// Typed, per-kind view over a frontmatter mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentMeta {
    Skill(SkillMeta),
    Agent(AgentMeta),
    Command(CommandMeta),
}

fn owned(fm: &Frontmatter, key: &str) -> Option<String> {
    fm.get_str(key).map(str::to_string)
}

impl ComponentMeta {
    /// Extracts the typed view for `kind`. Returns `None` for hooks, which
    /// carry no frontmatter.
    pub fn from_frontmatter(kind: ComponentKind, fm: &Frontmatter) -> Option<Self> {
        let meta = match kind {
            ComponentKind::Skill => ComponentMeta::Skill(SkillMeta {
                name: owned(fm, "name"),
                description: owned(fm, "description"),
                allowed_tools: fm.list("allowed-tools"),
                context: fm.get("context").map(scalar_to_string),
                agent: fm.get("agent").map(scalar_to_string),
                compatibility: owned(fm, "compatibility"),
                permission_mode: owned(fm, "permissionMode"),
            }),
            ComponentKind::Agent => ComponentMeta::Agent(AgentMeta {
                name: owned(fm, "name"),
                description: owned(fm, "description"),
                tools: fm.list("tools"),
                disallowed_tools: fm.list("disallowedTools"),
                permission_mode: owned(fm, "permissionMode"),
            }),
            ComponentKind::Command => ComponentMeta::Command(CommandMeta {
                name: owned(fm, "name"),
                description: owned(fm, "description"),
                allowed_tools: fm.list("allowed-tools"),
                argument_hint: owned(fm, "argument-hint"),
                disable_model_invocation: fm.is_true("disable-model-invocation"),
                permission_mode: owned(fm, "permissionMode"),
            }),
            ComponentKind::Hook => return None,
        };
        Some(meta)
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentMeta::Skill(_) => ComponentKind::Skill,
            ComponentMeta::Agent(_) => ComponentKind::Agent,
            ComponentMeta::Command(_) => ComponentKind::Command,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ComponentMeta::Skill(m) => m.name.as_deref(),
            ComponentMeta::Agent(m) => m.name.as_deref(),
            ComponentMeta::Command(m) => m.name.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ComponentMeta::Skill(m) => m.description.as_deref(),
            ComponentMeta::Agent(m) => m.description.as_deref(),
            ComponentMeta::Command(m) => m.description.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_finds_body_after_closing_marker() {
        let content = "---\nname: a\n---\n# Body\nline\n";
        let parts = split(content).unwrap();
        assert_eq!(parts.yaml, "\nname: a\n");
        assert_eq!(parts.body, "# Body\nline\n");
        assert_eq!(parts.body_line, 4);
    }

    #[test]
    fn split_reports_missing_markers() {
        assert_eq!(split("# no fm").unwrap_err(), FrontmatterError::MissingOpening);
        assert_eq!(
            split("---\nname: a\n").unwrap_err(),
            FrontmatterError::MissingClosing
        );
    }

    #[test]
    fn scalar_frontmatter_is_not_a_mapping() {
        let err = parse("---\njust text\n---\n").unwrap_err();
        assert_eq!(err, FrontmatterError::NotAMapping);
    }

    #[test]
    fn list_accepts_sequence_and_comma_string() {
        let (fm, _) = parse("---\ntools: [Read, Grep]\nallowed-tools: Bash(git:*), Read\n---\n").unwrap();
        assert_eq!(fm.list("tools").unwrap(), vec!["Read", "Grep"]);
        assert_eq!(fm.list("allowed-tools").unwrap(), vec!["Bash(git:*)", "Read"]);
        assert!(fm.list("missing").is_none());
    }

    #[test]
    fn unexpected_fields_are_sorted_and_unique() {
        let (fm, _) = parse("---\nname: a\nzeta: 1\nalpha: 2\n---\n").unwrap();
        assert_eq!(
            ComponentKind::Skill.unexpected_fields(&fm),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }

    #[test]
    fn permission_mode_is_agent_only() {
        assert!(ComponentKind::Agent.allowed_fields().contains(&"permissionMode"));
        assert!(!ComponentKind::Skill.allowed_fields().contains(&"permissionMode"));
        assert!(!ComponentKind::Command.allowed_fields().contains(&"permissionMode"));
    }
}
