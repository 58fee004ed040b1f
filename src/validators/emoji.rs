//! Decorative emoji in markdown.
//!
//! Emoji waste tokens and render inconsistently across terminals; text
//! labels (`BAD:`, `GOOD:`, `WARNING:`) say the same thing.

use super::{MarkdownFile, ValidationContext, Validator};
use crate::common::markdown_files;
use crate::finding::{Finding, ValidationResult};

/// Symbols inside the emoji blocks that read as plain text markers.
const TEXT_SAFE: &[char] = &['\u{2713}', '\u{2717}', '\u{2610}', '\u{2611}', '\u{2612}'];

const MAX_SAMPLES: usize = 5;
const MAX_DISPLAY_CHARS: usize = 80;

pub fn is_decorative_emoji(ch: char) -> bool {
    let decorative = matches!(
        ch,
        '\u{1F300}'..='\u{1F9FF}' | '\u{1F1E0}'..='\u{1F1FF}' | '\u{2600}'..='\u{27BF}'
    );
    decorative && !TEXT_SAFE.contains(&ch)
}

/// Distinct decorative emoji in `text`, in order of first appearance.
pub fn find_emoji(text: &str) -> Vec<char> {
    let mut found: Vec<char> = Vec::new();
    for ch in text.chars().filter(|c| is_decorative_emoji(*c)) {
        if !found.contains(&ch) {
            found.push(ch);
        }
    }
    found
}

fn check_file(file: &MarkdownFile, result: &mut ValidationResult) {
    let distinct = find_emoji(&file.content);
    if distinct.is_empty() {
        return;
    }

    let mut first_line = None;
    let mut samples = Vec::new();
    for (i, line) in file.content.split('\n').enumerate() {
        let on_line = find_emoji(line);
        if on_line.is_empty() {
            continue;
        }
        first_line.get_or_insert(i + 1);
        if samples.len() < MAX_SAMPLES {
            let display: String = if line.chars().count() > MAX_DISPLAY_CHARS {
                let head: String = line.chars().take(MAX_DISPLAY_CHARS).collect();
                format!("{head}...")
            } else {
                line.to_string()
            };
            let listed: Vec<String> = on_line.iter().map(char::to_string).collect();
            samples.push(format!("  Line {}: {} in '{display}'", i + 1, listed.join(", ")));
        }
    }

    let mut finding = Finding::at(
        &file.path,
        format!(
            "Contains {} decorative emoji(s). Use text labels instead (e.g. 'BAD:', 'GOOD:', 'WARNING:').\nFound at:\n{}",
            distinct.len(),
            samples.join("\n")
        ),
    );
    if let Some(line) = first_line {
        finding = finding.with_line(line);
    }
    result.error(finding);
}

pub struct EmojiValidator;

impl Validator for EmojiValidator {
    fn id(&self) -> &'static str {
        "emoji"
    }

    fn name(&self) -> &'static str {
        "Emoji Usage Validation"
    }

    fn description(&self) -> &'static str {
        "Decorative emoji in markdown files"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let files = markdown_files(ctx.plugins_dir());
        for path in &files {
            match MarkdownFile::load(path) {
                Ok(file) => check_file(&file, &mut result),
                Err(finding) => result.error(finding),
            }
        }
        tracing::debug!(
            "checked {} markdown files, {} with emoji",
            files.len(),
            result.errors.len()
        );
        result
    }
}
