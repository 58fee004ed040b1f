//! Schema validation of the marketplace index and plugin manifests by the
//! external `claude plugin validate` command.

use super::{ValidationContext, Validator};
use crate::common::plugin_manifests;
use crate::external::ExternalValidationError;
use crate::finding::{Finding, ValidationResult};
use std::path::Path;

/// Outcome of one external call, as seen by the loop.
enum Step {
    Continue,
    /// The validator binary is missing; stop calling it.
    Stop,
}

fn record(
    result: &mut ValidationResult,
    subject: &str,
    path: &Path,
    outcome: Result<(), ExternalValidationError>,
) -> Step {
    match outcome {
        Ok(()) => result.note(Finding::new(format!("{subject} validation passed"))),
        Err(ExternalValidationError::NotFound(program)) => {
            result.warning(Finding::new(format!(
                "'{program}' command not found - skipping plugin validation"
            )));
            return Step::Stop;
        }
        Err(e @ ExternalValidationError::Failed { .. }) | Err(e @ ExternalValidationError::TimedOut(_)) => {
            result.error(Finding::at(path, format!("{subject} {e}")));
        }
        Err(e) => result.error(Finding::at(path, format!("{subject} validation error: {e}"))),
    }
    Step::Continue
}

pub struct PluginValidation;

impl Validator for PluginValidation {
    fn id(&self) -> &'static str {
        "plugin_validation"
    }

    fn name(&self) -> &'static str {
        "Claude Plugin Validation"
    }

    fn description(&self) -> &'static str {
        "Marketplace and manifest schema checks via `claude plugin validate`"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());

        if !ctx.config.external.enabled {
            result.note(Finding::new("External plugin validation disabled"));
            return result;
        }

        let marketplace = ctx.discovery.marketplace_path();
        if marketplace.is_file() {
            tracing::info!("Validating marketplace: {}", marketplace.display());
            let outcome = ctx.external.validate(&marketplace);
            if let Step::Stop = record(&mut result, "Marketplace", &marketplace, outcome) {
                return result;
            }
        } else {
            result.warning(Finding::new(format!(
                "Marketplace not found at {}",
                marketplace.display()
            )));
        }

        for manifest in plugin_manifests(ctx.plugins_dir()) {
            let plugin = manifest
                .parent()
                .and_then(Path::parent)
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            tracing::info!("Validating plugin: {plugin}");
            let outcome = ctx.external.validate(&manifest);
            let subject = format!("Plugin '{plugin}'");
            if let Step::Stop = record(&mut result, &subject, &manifest, outcome) {
                break;
            }
        }

        result
    }
}
