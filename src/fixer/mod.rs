//! Auto-fix mode.
//!
//! [`ComponentFixer`] rewrites skill, agent and command frontmatter in place
//! and reconciles skill directory names with their frontmatter `name`.
//! [`marketplace`] reconciles the marketplace index with the per-plugin
//! manifests.
//!
//! Every edit goes through [`FrontmatterDocument`], so only the entries that
//! actually change are rewritten. A dry run computes exactly the same change
//! list as a live run and only skips the writes.

pub mod marketplace;

use crate::common::{
    agent_files, clean_description_text, command_files, normalize_name, normalize_tool_syntax,
    skill_files, NAME_PATTERN,
};
use crate::finding::FixResult;
use crate::frontmatter::document::FrontmatterDocument;
use crate::frontmatter::{ComponentKind, Frontmatter, FrontmatterError};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `contents` to a temporary file next to `path`, then renames it
/// over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub struct ComponentFixer {
    plugins_dir: PathBuf,
    dry_run: bool,
    results: Vec<FixResult>,
    /// Post-fix content of every file changed in this run, written or not.
    planned: BTreeMap<PathBuf, String>,
}

impl ComponentFixer {
    pub fn new(plugins_dir: &Path, dry_run: bool) -> Self {
        ComponentFixer {
            plugins_dir: plugins_dir.to_path_buf(),
            dry_run,
            results: Vec::new(),
            planned: BTreeMap::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn results(&self) -> &[FixResult] {
        &self.results
    }

    /// Files or directories with at least one applied (or planned) change.
    pub fn fixed_count(&self) -> usize {
        self.results.iter().filter(|r| r.fixed).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| !r.errors.is_empty()).count()
    }

    /// Fixes every component file, then synchronizes skill directory names.
    pub fn fix_all(&mut self) -> &[FixResult] {
        self.results.clear();
        self.planned.clear();
        tracing::info!(
            "Auto-fixer mode: {} ({})",
            if self.dry_run { "DRY RUN" } else { "LIVE" },
            self.plugins_dir.display()
        );

        let phases = [
            (ComponentKind::Skill, skill_files(&self.plugins_dir)),
            (ComponentKind::Agent, agent_files(&self.plugins_dir)),
            (ComponentKind::Command, command_files(&self.plugins_dir)),
        ];
        for (i, (kind, files)) in phases.into_iter().enumerate() {
            tracing::info!("Phase {}: Fixing {} {}s...", i + 1, files.len(), kind);
            for path in files {
                let result = self.fix_component_file(&path, kind);
                self.results.push(result);
            }
        }

        tracing::info!("Phase 4: Checking directory-name synchronization...");
        self.fix_directory_name_sync();

        tracing::info!(
            "Fixer finished: {} processed, {} fixed, {} with errors",
            self.results.len(),
            self.fixed_count(),
            self.error_count()
        );
        &self.results
    }

    /// Applies the frontmatter fixes to one file.
    ///
    /// Files without a frontmatter block, or whose frontmatter is not a
    /// mapping, are left alone and yield an unfixed result.
    pub fn fix_component_file(&mut self, path: &Path, kind: ComponentKind) -> FixResult {
        let mut result = FixResult::new(path);

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                result.errors.push(format!("Error: {e}"));
                return result;
            }
        };
        let mut doc = match FrontmatterDocument::parse(&content) {
            Ok(doc) => doc,
            Err(_) => return result,
        };

        let original = Frontmatter::from_yaml(&doc.yaml());
        if let Err(FrontmatterError::NotAMapping) = original {
            return result;
        }

        let changes = apply_fixes(&mut doc, kind);
        if changes.is_empty() {
            if let Err(e) = original {
                result.errors.push(format!("YAML parse error: {e}"));
            }
            return result;
        }

        // Refuse to write a block that no longer parses.
        if let Err(e) = Frontmatter::from_yaml(&doc.yaml()) {
            let prefix = if original.is_ok() {
                "Fix would produce invalid frontmatter"
            } else {
                "YAML parse error"
            };
            result.errors.push(format!("{prefix}: {e}"));
            return result;
        }

        let new_content = doc.render();
        if !self.dry_run {
            if let Err(e) = write_atomic(path, &new_content) {
                result.errors.push(format!("Error: {e}"));
                return result;
            }
        }
        tracing::debug!(file = %path.display(), changes = changes.len(), "frontmatter fixed");
        self.planned.insert(path.to_path_buf(), new_content);
        result.changes = changes;
        result.fixed = true;
        result
    }

    fn content_of(&self, path: &Path) -> std::io::Result<String> {
        match self.planned.get(path) {
            Some(content) => Ok(content.clone()),
            None => std::fs::read_to_string(path),
        }
    }

    /// Resolves skill name / directory name mismatches.
    ///
    /// A valid directory name wins and the frontmatter `name` is rewritten;
    /// otherwise a valid frontmatter name renames the directory. A mismatch
    /// where neither is valid is recorded as an error.
    pub fn fix_directory_name_sync(&mut self) {
        // Rename targets taken so far, planned or applied.
        let mut claimed: BTreeSet<PathBuf> = BTreeSet::new();
        for skill_file in skill_files(&self.plugins_dir) {
            let Some(skill_dir) = skill_file.parent() else {
                continue;
            };
            let in_skills_dir = skill_dir
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|n| n == "skills");
            let Some(dir_name) = skill_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !in_skills_dir {
                continue;
            }

            let Ok(content) = self.content_of(&skill_file) else {
                continue;
            };
            let Ok((fm, _)) = crate::frontmatter::parse(&content) else {
                continue;
            };
            let yaml_name = match fm.get_str("name") {
                Some(n) if !n.is_empty() && n != dir_name => n.to_string(),
                _ => continue,
            };

            let mut result = FixResult::new(skill_dir);
            result
                .changes
                .push(format!("Name mismatch: YAML='{yaml_name}' vs Dir='{dir_name}'"));

            if NAME_PATTERN.is_match(dir_name) {
                self.rename_in_yaml(&skill_file, &content, dir_name, &mut result);
            } else if NAME_PATTERN.is_match(&yaml_name) {
                let new_dir = skill_dir.with_file_name(&yaml_name);
                if new_dir.exists() || claimed.contains(&new_dir) {
                    result.errors.push(format!(
                        "Cannot rename directory: {} already exists",
                        new_dir.display()
                    ));
                } else if let Err(e) = self.rename_dir(skill_dir, &new_dir) {
                    result.errors.push(format!("Error: {e}"));
                } else {
                    claimed.insert(new_dir);
                    result
                        .changes
                        .push(format!("Renamed directory to match YAML: {yaml_name}"));
                    result.fixed = true;
                }
            } else {
                result.errors.push(format!(
                    "Cannot resolve mismatch: neither '{yaml_name}' nor '{dir_name}' is a valid name"
                ));
            }

            self.results.push(result);
        }
    }

    fn rename_in_yaml(
        &mut self,
        skill_file: &Path,
        content: &str,
        dir_name: &str,
        result: &mut FixResult,
    ) {
        let mut doc = match FrontmatterDocument::parse(content) {
            Ok(doc) => doc,
            Err(e) => {
                result.errors.push(format!("Error: {e}"));
                return;
            }
        };
        doc.set_scalar("name", dir_name);
        let new_content = doc.render();
        if !self.dry_run {
            if let Err(e) = write_atomic(skill_file, &new_content) {
                result.errors.push(format!("Error: {e}"));
                return;
            }
        }
        self.planned.insert(skill_file.to_path_buf(), new_content);
        result
            .changes
            .push(format!("Updated YAML name to match directory: {dir_name}"));
        result.fixed = true;
    }

    fn rename_dir(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        std::fs::rename(from, to)
    }
}

/// Runs the four frontmatter fixes in order and returns the change log.
fn apply_fixes(doc: &mut FrontmatterDocument, kind: ComponentKind) -> Vec<String> {
    let mut changes = Vec::new();

    if let Some(description) = doc.scalar("description") {
        let cleaned = clean_description_text(&description);
        if cleaned != description {
            doc.set_double_quoted("description", &cleaned);
            changes.push("Sanitized description (removed newlines/special chars)".to_string());
        }
    }

    if let Some(name) = doc.scalar("name") {
        let normalized = normalize_name(&name);
        if normalized != name {
            doc.set_scalar("name", &normalized);
            changes.push(format!("Normalized name: {name} -> {normalized}"));
        }
    }

    let field = kind.tools_field();
    if let Some((tools, style)) = doc.list(field) {
        let normalized = normalize_tool_syntax(&tools);
        if normalized != tools {
            doc.set_list(field, &normalized, &style);
            changes.push(format!("Normalized tool syntax in {field}"));
        }
    }

    if !doc.is_double_quoted("description") {
        if let Some(description) = doc.scalar("description") {
            doc.set_double_quoted("description", &description);
            changes.push("Enforced double-quoted description".to_string());
        }
    }

    changes
}
