//! Validation passes.
//!
//! Every pass implements the [`Validator`] trait and is a pure function of
//! the [`ValidationContext`]: it reads files below the plugins directory (or
//! the discovered component graph) and returns one [`ValidationResult`].
//! Per-file failures become findings; a pass never aborts the run.
//!
//! [`all_validators`] lists the passes in execution order and
//! [`run_validation`] drives them into a [`ValidatorReport`].

pub mod agent_security;
pub mod architecture;
pub mod askuser;
pub mod command_structure;
pub mod emoji;
pub mod fork_bloat;
pub mod frontmatter;
pub mod glue_code;
pub mod hooks;
pub mod links;
pub mod modality;
pub mod permissions;
pub mod persona;
pub mod plugin_validation;
pub mod thin_wrapper;
pub mod token_budget;
pub mod zero_token;

use crate::config::Config;
use crate::discovery::DiscoveryResult;
use crate::external::ExternalValidator;
use crate::finding::{Finding, ValidationResult, ValidatorReport};
use crate::frontmatter::{Frontmatter, FrontmatterError, Split};
use std::path::{Path, PathBuf};

/// Everything a pass may look at.
pub struct ValidationContext<'a> {
    pub discovery: &'a DiscoveryResult,
    pub config: &'a Config,
    pub external: &'a dyn ExternalValidator,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        discovery: &'a DiscoveryResult,
        config: &'a Config,
        external: &'a dyn ExternalValidator,
    ) -> Self {
        ValidationContext {
            discovery,
            config,
            external,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.discovery.root_dir
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.discovery.plugins_dir
    }
}

/// A single validation pass.
///
/// ```rust,ignore
/// use cat_toolkit::validators::{Validator, ValidationContext};
///
/// pub struct MyCheck;
///
/// impl Validator for MyCheck {
///     fn id(&self) -> &'static str { "my_check" }
///     fn name(&self) -> &'static str { "My Check" }
///     fn description(&self) -> &'static str { "Checks something" }
///     fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
///         ValidationResult::new(self.name())
///     }
/// }
/// ```
pub trait Validator {
    /// Identifier used for config toggles and SARIF rule ids (e.g. `"links"`).
    fn id(&self) -> &'static str;

    /// Display name, used as the result name in every report format.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult;
}

/// Every registered pass, in execution order.
pub fn all_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(frontmatter::FrontmatterValidator),
        Box::new(links::LinkValidator),
        Box::new(glue_code::GlueCodeValidator),
        Box::new(fork_bloat::ForkBloatValidator),
        Box::new(askuser::AskUserValidator),
        Box::new(token_budget::TokenBudgetValidator),
        Box::new(zero_token::ZeroTokenValidator),
        Box::new(modality::ModalityValidator),
        Box::new(permissions::PermissionValidator),
        Box::new(command_structure::CommandStructureValidator),
        Box::new(architecture::ArchitectureValidator),
        Box::new(agent_security::AgentSecurityValidator),
        Box::new(thin_wrapper::ThinWrapperValidator),
        Box::new(persona::PersonaValidator),
        Box::new(emoji::EmojiValidator),
        Box::new(hooks::HooksValidator),
        Box::new(plugin_validation::PluginValidation),
    ]
}

/// Runs every enabled pass in order.
pub fn run_validation(ctx: &ValidationContext) -> ValidatorReport {
    let mut report = ValidatorReport::default();
    let validators = all_validators();
    let total = validators.len();

    for (i, validator) in validators.iter().enumerate() {
        if !ctx.config.is_pass_enabled(validator.id()) {
            tracing::info!("Phase {}/{total}: {} (disabled)", i + 1, validator.name());
            continue;
        }
        tracing::info!("Phase {}/{total}: {}", i + 1, validator.name());
        let result = validator.validate(ctx);
        tracing::debug!(
            pass = validator.id(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            info = result.info.len(),
            "pass finished"
        );
        report.log_result(result);
    }

    report
}

// ---------------------------------------------------------------------------
// Shared file helpers
// ---------------------------------------------------------------------------

/// A markdown file read into memory.
#[derive(Debug)]
pub struct MarkdownFile {
    pub path: PathBuf,
    pub content: String,
}

impl MarkdownFile {
    /// Reads `path`; a read failure becomes an error finding.
    pub fn load(path: &Path) -> Result<Self, Finding> {
        std::fs::read_to_string(path)
            .map(|content| MarkdownFile {
                path: path.to_path_buf(),
                content,
            })
            .map_err(|e| Finding::at(path, format!("Error processing: {e}")))
    }

    pub fn parse(&self) -> Result<(Frontmatter, Split<'_>), FrontmatterError> {
        crate::frontmatter::parse(&self.content)
    }

    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Calls `check` for every file in `paths` whose frontmatter parses.
/// Unreadable files are reported as errors; files without valid
/// frontmatter are left to the frontmatter pass.
pub(crate) fn for_each_parsed(
    paths: &[PathBuf],
    result: &mut ValidationResult,
    mut check: impl FnMut(&MarkdownFile, &Frontmatter, Split<'_>, &mut ValidationResult),
) {
    for path in paths {
        let file = match MarkdownFile::load(path) {
            Ok(f) => f,
            Err(finding) => {
                result.error(finding);
                continue;
            }
        };
        let Ok((fm, parts)) = file.parse() else {
            continue;
        };
        check(&file, &fm, parts, result);
    }
}

/// `true` if any entry of `tools` is `tool` or a scoped form of it
/// (`Bash(git:*)` counts as `Bash`).
pub(crate) fn has_tool(tools: &[String], tool: &str) -> bool {
    tools.iter().any(|t| tool_base(t) == tool)
}

/// The tool name without any `(...)` or `[...]` restriction.
pub(crate) fn tool_base(tool: &str) -> &str {
    tool.split(['(', '['])
        .next()
        .unwrap_or_default()
        .trim()
}
