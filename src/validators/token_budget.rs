//! Sum of description and argument-hint lengths across all components.
//!
//! Every component's metadata is loaded into the host's context up front,
//! so the total is capped.

use super::{ValidationContext, Validator};
use crate::discovery::DiscoveryResult;
use crate::finding::{Finding, ValidationResult};

/// Characters of always-loaded metadata across every discovered component.
pub fn metadata_size(discovery: &DiscoveryResult) -> usize {
    discovery
        .components
        .values()
        .map(|c| c.frontmatter.text_len("description") + c.frontmatter.text_len("argument-hint"))
        .sum()
}

/// `15000` → `15,000`
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct TokenBudgetValidator;

impl Validator for TokenBudgetValidator {
    fn id(&self) -> &'static str {
        "token_budget"
    }

    fn name(&self) -> &'static str {
        "Token Budget Validation"
    }

    fn description(&self) -> &'static str {
        "Total always-loaded metadata stays under the budget"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let total = metadata_size(ctx.discovery);
        let limit = ctx.config.budget.token_budget;
        tracing::info!(
            "Total metadata size: {} / {} chars",
            thousands(total),
            thousands(limit)
        );

        if total > limit {
            result.error(Finding::new(format!(
                "Token Budget Exceeded: {} chars > {} limit. This risks context truncation. Consolidate skills or shorten descriptions.",
                thousands(total),
                thousands(limit)
            )));
        } else {
            let pct = if limit == 0 {
                0.0
            } else {
                total as f64 / limit as f64 * 100.0
            };
            result.note(Finding::new(format!(
                "Token Budget Usage: {pct:.1}% ({} chars)",
                thousands(total)
            )));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(15000), "15,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
