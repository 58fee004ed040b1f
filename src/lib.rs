//! # cat-toolkit
//!
//! Validator and auto-fixer for Claude Code plugin trees.
//!
//! `cat-toolkit` discovers the skills, agents, commands and hook groups of
//! every plugin under `plugins/`, builds the cross-plugin reference graph,
//! runs an ordered set of validation passes and reports errors, warnings and
//! info as text, JSON or [SARIF]. Its fix mode rewrites frontmatter in place,
//! keeps skill directory names in step with their `name` field and
//! reconciles the marketplace index with the plugin manifests.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use cat_toolkit::{config::Config, discovery, external::ClaudePluginValidator, output};
//! use cat_toolkit::validators::{run_validation, ValidationContext};
//!
//! let config = Config::load(None).expect("failed to load config");
//! let discovery = discovery::discover(Path::new("."));
//! let external = ClaudePluginValidator::from_config(&config.external);
//! let report = run_validation(&ValidationContext::new(&discovery, &config, &external));
//!
//! if !report.all_passed() {
//!     print!("{}", output::format_report(&report, output::OutputFormat::Text));
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **[`config`]**: load pass toggles and limits from TOML.
//! 2. **[`discovery`]**: walk the plugins directory into a [`discovery::DiscoveryResult`].
//! 3. **[`validators`]**: the [`validators::Validator`] trait and the ordered pass registry.
//! 4. **[`external`]**: the `claude plugin validate` subprocess behind a trait.
//! 5. **[`fixer`]**: frontmatter rewriting, directory sync and marketplace reconciliation.
//! 6. **[`finding`]**: report data types.
//! 7. **[`output`]**: text, JSON and SARIF rendering.
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/

pub mod common;
pub mod config;
pub mod discovery;
pub mod external;
pub mod finding;
pub mod fixer;
pub mod frontmatter;
pub mod output;
pub mod validators;
