//! Line-preserving frontmatter editor.
//!
//! The fixer must rewrite a handful of keys without disturbing anything else
//! in the file: key order, comments, quoting of untouched values, the body.
//! A YAML round-trip through `serde_yaml` would lose all of that, so the
//! document keeps the raw lines of the block and only replaces the lines that
//! belong to an edited top-level entry.
//!
//! Values are decoded through `serde_yaml` one entry at a time, which keeps
//! decoding exact for valid YAML. Entries that are not valid YAML on their
//! own (the deprecated `[Bash[python,node]]` tool syntax, for one) fall back
//! to a lenient textual reading.

use super::{FrontmatterError, CLOSING_MARKER};
use crate::common::{split_flow_sequence, unquote};
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

static SAFE_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._/-]*$").unwrap());

/// Layout of a tool list, preserved when the list is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStyle {
    /// `key: [a, b]`
    Flow,
    /// `key:` followed by item lines that share this prefix (e.g. `"  - "`).
    Block(String),
    /// `key: a, b`
    Comma,
}

/// A top-level `key: value` entry spanning `lines[start..end]`.
#[derive(Debug, Clone)]
struct Entry {
    key: String,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
pub struct FrontmatterDocument {
    /// The opening marker line including its line terminator.
    opening: String,
    /// Frontmatter lines, each with its own terminator.
    lines: Vec<String>,
    /// The closing marker and everything after it.
    tail: String,
    newline: &'static str,
}

impl FrontmatterDocument {
    pub fn parse(content: &str) -> Result<Self, FrontmatterError> {
        if !content.starts_with("---") {
            return Err(FrontmatterError::MissingOpening);
        }
        let m = CLOSING_MARKER
            .find(&content[3..])
            .ok_or(FrontmatterError::MissingClosing)?;
        let closing_start = 3 + m.start();
        let opening_end = content[..closing_start]
            .find('\n')
            .map(|i| i + 1)
            .unwrap_or(closing_start);

        let yaml = &content[opening_end..closing_start];
        let newline = if content[..opening_end].ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };

        Ok(FrontmatterDocument {
            opening: content[..opening_end].to_string(),
            lines: yaml.split_inclusive('\n').map(str::to_string).collect(),
            tail: content[closing_start..].to_string(),
            newline,
        })
    }

    /// Renders the document back to text. Untouched documents render
    /// byte-identical to their input.
    pub fn render(&self) -> String {
        let mut out = self.opening.clone();
        for line in &self.lines {
            out.push_str(line);
        }
        out.push_str(&self.tail);
        out
    }

    /// The raw YAML between the markers.
    pub fn yaml(&self) -> String {
        self.lines.concat()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    // -----------------------------------------------------------------------
    // Entry scanning
    // -----------------------------------------------------------------------

    fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut i = 0;
        while i < self.lines.len() {
            let Some(key) = top_level_key(&self.lines[i]) else {
                i += 1;
                continue;
            };
            let start = i;
            let mut end = i + 1;
            let mut j = i + 1;
            while j < self.lines.len() {
                let line = self.lines[j].trim_end_matches(['\n', '\r']);
                // Blank and comment lines belong to the entry only when more
                // of its lines follow.
                if line.trim().is_empty() || line.starts_with('#') {
                    j += 1;
                    continue;
                }
                if is_continuation(line) {
                    j += 1;
                    end = j;
                } else {
                    break;
                }
            }
            entries.push(Entry { key, start, end });
            i = end;
        }
        entries
    }

    fn entry(&self, key: &str) -> Option<Entry> {
        self.entries().into_iter().find(|e| e.key == key)
    }

    fn entry_text(&self, entry: &Entry) -> String {
        self.lines[entry.start..entry.end].concat()
    }

    /// Text after `key:` on the entry's first line, without a trailing
    /// comment, trimmed.
    fn inline_value(&self, entry: &Entry) -> String {
        let line = self.lines[entry.start].trim_end_matches(['\n', '\r']);
        line.split_once(':')
            .map(|(_, v)| split_comment(v).0.trim().to_string())
            .unwrap_or_default()
    }

    /// Trailing `# comment` on the entry's first line.
    fn inline_comment(&self, entry: &Entry) -> Option<String> {
        let line = self.lines[entry.start].trim_end_matches(['\n', '\r']);
        let (_, rest) = line.split_once(':')?;
        split_comment(rest).1.map(str::to_string)
    }

    fn continuation_lines(&self, entry: &Entry) -> Vec<&str> {
        self.lines[entry.start + 1..entry.end]
            .iter()
            .map(|l| l.trim_end_matches(['\n', '\r']))
            .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
            .collect()
    }

    fn decode(&self, entry: &Entry) -> Option<Value> {
        let text = self.entry_text(entry);
        match serde_yaml::from_str::<Value>(&text).ok()? {
            Value::Mapping(map) => map.get(entry.key.as_str()).cloned(),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Scalar value of `key` rendered as text. `None` when the key is absent
    /// or null.
    pub fn scalar(&self, key: &str) -> Option<String> {
        let entry = self.entry(key)?;
        match self.decode(&entry) {
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => None,
            None => {
                let mut parts = vec![self.inline_value(&entry)];
                parts.extend(
                    self.continuation_lines(&entry)
                        .into_iter()
                        .map(|l| l.trim().to_string()),
                );
                let joined = parts.join(" ");
                let joined = joined.trim();
                (!joined.is_empty()).then(|| unquote(joined).to_string())
            }
        }
    }

    /// `true` if `key` holds a single-line double-quoted scalar.
    pub fn is_double_quoted(&self, key: &str) -> bool {
        self.entry(key).is_some_and(|entry| {
            let inline = self.inline_value(&entry);
            entry.end == entry.start + 1
                && inline.len() >= 2
                && inline.starts_with('"')
                && inline.ends_with('"')
        })
    }

    /// Tool list under `key` and the style it is written in.
    ///
    /// Flow entries are split textually so deprecated bracket entries
    /// survive even though they are not valid YAML.
    pub fn list(&self, key: &str) -> Option<(Vec<String>, ListStyle)> {
        let entry = self.entry(key)?;
        let inline = self.inline_value(&entry);

        if inline.starts_with('[') {
            let mut flow = inline.clone();
            for line in self.continuation_lines(&entry) {
                flow.push(' ');
                flow.push_str(line.trim());
            }
            let inner = flow
                .strip_prefix('[')
                .and_then(|s| s.rfind(']').map(|i| &s[..i]))
                .unwrap_or(&flow[1..]);
            let items = split_flow_sequence(inner)
                .into_iter()
                .map(|s| unquote(s).to_string())
                .collect();
            return Some((items, ListStyle::Flow));
        }

        if inline.is_empty() {
            let lines = self.continuation_lines(&entry);
            let first = lines.iter().find(|l| l.trim_start().starts_with('-'))?;
            let indent_len = first.len() - first.trim_start().len();
            let prefix = format!("{}- ", &first[..indent_len]);
            let items = lines
                .iter()
                .filter_map(|l| l.trim_start().strip_prefix('-'))
                .map(|item| unquote(item.trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect();
            return Some((items, ListStyle::Block(prefix)));
        }

        let text = match self.decode(&entry) {
            Some(Value::String(s)) => s,
            _ => inline,
        };
        let items = split_flow_sequence(&text)
            .into_iter()
            .map(|s| unquote(s).to_string())
            .collect();
        Some((items, ListStyle::Comma))
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    fn replace_entry(&mut self, key: &str, mut rendered: Vec<String>) -> bool {
        let Some(entry) = self.entry(key) else {
            return false;
        };
        let last_has_newline = self.lines[entry.end - 1].ends_with('\n');
        if let (Some(comment), Some(first)) = (self.inline_comment(&entry), rendered.first_mut()) {
            first.push(' ');
            first.push_str(&comment);
        }
        let mut rendered: Vec<String> = rendered
            .into_iter()
            .map(|l| format!("{l}{}", self.newline))
            .collect();
        if !last_has_newline {
            if let Some(last) = rendered.last_mut() {
                let trimmed = last.trim_end_matches(['\n', '\r']).to_string();
                *last = trimmed;
            }
        }
        self.lines.splice(entry.start..entry.end, rendered);
        true
    }

    /// Writes `value` as a double-quoted scalar.
    pub fn set_double_quoted(&mut self, key: &str, value: &str) -> bool {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        self.replace_entry(key, vec![format!("{key}: \"{escaped}\"")])
    }

    /// Writes `value` keeping the quote style of the current value. Plain
    /// values that would not survive as plain YAML are double-quoted.
    pub fn set_scalar(&mut self, key: &str, value: &str) -> bool {
        let Some(entry) = self.entry(key) else {
            return false;
        };
        let inline = self.inline_value(&entry);
        if inline.starts_with('"') || !SAFE_PLAIN.is_match(value) {
            return self.set_double_quoted(key, value);
        }
        if inline.starts_with('\'') {
            let escaped = value.replace('\'', "''");
            return self.replace_entry(key, vec![format!("{key}: '{escaped}'")]);
        }
        self.replace_entry(key, vec![format!("{key}: {value}")])
    }

    pub fn set_list(&mut self, key: &str, items: &[String], style: &ListStyle) -> bool {
        let rendered = match style {
            ListStyle::Flow => vec![format!("{key}: [{}]", items.join(", "))],
            ListStyle::Comma => vec![format!("{key}: {}", items.join(", "))],
            ListStyle::Block(prefix) => {
                let mut lines = vec![format!("{key}:")];
                lines.extend(items.iter().map(|item| format!("{prefix}{item}")));
                lines
            }
        };
        self.replace_entry(key, rendered)
    }
}

/// The key of a top-level `key: value` line, if `line` is one.
fn top_level_key(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty()
        || line.starts_with(|c: char| c.is_whitespace())
        || line.starts_with(['#', '-'])
    {
        return None;
    }
    let (key, rest) = line.split_once(':')?;
    if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }
    let key = unquote(key.trim());
    (!key.is_empty()).then(|| key.to_string())
}

/// Splits a value into its content and a trailing `# comment`. Quotes open
/// only at the start of a token, and a `#` starts a comment only outside
/// quotes and after whitespace.
fn split_comment(value: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = ' ';
    for (i, c) in value.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && (prev.is_whitespace() || "[{,".contains(prev)) => {
                quote = Some(c)
            }
            None if c == '#' && prev.is_whitespace() => {
                return (value[..i].trim_end(), Some(&value[i..]));
            }
            None => {}
        }
        prev = c;
    }
    (value, None)
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) || line == "-" || line.starts_with("- ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\n# leading comment\nname: 'Foo_Bar'\ndescription: >\n  Folded text\n  over lines\nallowed-tools:\n  - Read\n  - Bash[python,node]\nextra: kept # comment\n---\n# Body\n";

    #[test]
    fn untouched_document_round_trips() {
        let doc = FrontmatterDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn reads_scalars_through_yaml() {
        let doc = FrontmatterDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.scalar("name").as_deref(), Some("Foo_Bar"));
        assert_eq!(
            doc.scalar("description").as_deref(),
            Some("Folded text over lines\n")
        );
        assert!(!doc.is_double_quoted("description"));
        assert!(doc.scalar("missing").is_none());
    }

    #[test]
    fn reads_block_lists_with_prefix() {
        let doc = FrontmatterDocument::parse(SAMPLE).unwrap();
        let (items, style) = doc.list("allowed-tools").unwrap();
        assert_eq!(items, vec!["Read", "Bash[python,node]"]);
        assert_eq!(style, ListStyle::Block("  - ".to_string()));
    }

    #[test]
    fn reads_invalid_flow_bracket_list() {
        let doc =
            FrontmatterDocument::parse("---\nallowed-tools: [Bash[python,node]]\n---\n").unwrap();
        let (items, style) = doc.list("allowed-tools").unwrap();
        assert_eq!(items, vec!["Bash[python,node]"]);
        assert_eq!(style, ListStyle::Flow);
    }

    #[test]
    fn rewrites_only_the_edited_entry() {
        let mut doc = FrontmatterDocument::parse(SAMPLE).unwrap();
        doc.set_double_quoted("description", "Folded text over lines.");
        doc.set_scalar("name", "foo-bar");
        let out = doc.render();
        assert!(out.contains("# leading comment\nname: 'foo-bar'\n"));
        assert!(out.contains("description: \"Folded text over lines.\"\nallowed-tools:\n"));
        assert!(out.contains("extra: kept # comment\n---\n# Body\n"));
    }

    #[test]
    fn list_rewrite_keeps_style() {
        let mut doc = FrontmatterDocument::parse(SAMPLE).unwrap();
        let (_, style) = doc.list("allowed-tools").unwrap();
        doc.set_list(
            "allowed-tools",
            &["Read".to_string(), "Bash(python:*)".to_string()],
            &style,
        );
        assert!(doc
            .render()
            .contains("allowed-tools:\n  - Read\n  - Bash(python:*)\nextra:"));
    }

    #[test]
    fn double_quoting_escapes() {
        let mut doc = FrontmatterDocument::parse("---\ndescription: x\n---\n").unwrap();
        doc.set_double_quoted("description", r#"say "hi" \ ok."#);
        assert_eq!(doc.render(), "---\ndescription: \"say \\\"hi\\\" \\\\ ok.\"\n---\n");
        assert_eq!(doc.scalar("description").as_deref(), Some(r#"say "hi" \ ok."#));
        assert!(doc.is_double_quoted("description"));
    }

    #[test]
    fn trailing_comment_survives_a_rewrite() {
        let mut doc =
            FrontmatterDocument::parse("---\ndescription: Does things # keep me\n---\n").unwrap();
        assert_eq!(doc.scalar("description").as_deref(), Some("Does things"));
        assert!(!doc.is_double_quoted("description"));

        doc.set_double_quoted("description", "Does things.");
        assert_eq!(doc.render(), "---\ndescription: \"Does things.\" # keep me\n---\n");
        assert!(doc.is_double_quoted("description"));
        assert_eq!(doc.scalar("description").as_deref(), Some("Does things."));
    }

    #[test]
    fn hash_inside_quotes_or_words_is_not_a_comment() {
        assert_eq!(split_comment(r#" "a # b" # c"#), (r#" "a # b""#, Some("# c")));
        assert_eq!(split_comment(" C#-style it's fine"), (" C#-style it's fine", None));
        assert_eq!(split_comment(" it's # note"), (" it's", Some("# note")));
    }

    #[test]
    fn column_zero_comment_does_not_split_a_block_list() {
        let content = "---\ntools:\n  - Read\n# grep is fine\n  - Bash[git]\nmodel: sonnet\n---\n";
        let mut doc = FrontmatterDocument::parse(content).unwrap();
        let (items, style) = doc.list("tools").unwrap();
        assert_eq!(items, vec!["Read", "Bash[git]"]);

        doc.set_list("tools", &["Read".to_string(), "Bash(git:*)".to_string()], &style);
        assert_eq!(
            doc.render(),
            "---\ntools:\n  - Read\n  - Bash(git:*)\nmodel: sonnet\n---\n"
        );
    }

    #[test]
    fn comment_between_entries_is_left_alone() {
        let mut doc =
            FrontmatterDocument::parse("---\nname: a_b\n# note\ndescription: x\n---\n").unwrap();
        doc.set_scalar("name", "a-b");
        assert_eq!(doc.render(), "---\nname: a-b\n# note\ndescription: x\n---\n");
    }
}
