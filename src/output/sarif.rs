use crate::finding::{Finding, Severity, ValidatorReport};
use crate::validators::all_validators;
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};

/// Rule id and description for a pass result name.
fn rule_for(name: &str) -> (String, String) {
    all_validators()
        .iter()
        .find(|v| v.name() == name)
        .map(|v| (v.id().to_string(), v.description().to_string()))
        .unwrap_or_else(|| (name.to_lowercase().replace(' ', "_"), name.to_string()))
}

fn sarif_result(finding: &Finding, rule_id: &str, rule_index: i64, severity: Severity) -> SarifResult {
    let level = match severity {
        Severity::Error => ResultLevel::Error,
        Severity::Warning => ResultLevel::Warning,
        Severity::Info => ResultLevel::Note,
    };

    let mut result = SarifResult::builder()
        .message(Message::builder().text(finding.message.clone()).build())
        .build();

    result.rule_id = Some(rule_id.to_string());
    result.level = Some(level);
    result.rule_index = Some(rule_index);

    if let Some(ref file) = finding.file {
        let uri = file.to_string_lossy().replace('\\', "/");

        let mut location = Location::builder().build();
        let mut physical = PhysicalLocation::builder().build();

        physical.artifact_location = Some(ArtifactLocation::builder().uri(uri).build());

        if let Some(line) = finding.line {
            physical.region = Some(Region::builder().start_line(line as i64).build());
        }

        location.physical_location = Some(physical);
        result.locations = Some(vec![location]);
    }

    result
}

/// Formats a [`ValidatorReport`] as SARIF 2.1.0: one rule per executed
/// pass, one result per finding.
pub fn format(report: &ValidatorReport) -> String {
    let mut rules = Vec::with_capacity(report.results.len());
    let mut results = Vec::new();

    for (index, pass) in report.results.iter().enumerate() {
        let (rule_id, description) = rule_for(&pass.name);

        let mut rule = ReportingDescriptor::builder().id(rule_id.clone()).build();
        rule.name = Some(pass.name.clone());
        rule.short_description = Some(
            MultiformatMessageString::builder()
                .text(description)
                .build(),
        );
        rules.push(rule);

        for severity in [Severity::Error, Severity::Warning, Severity::Info] {
            for finding in pass.findings(severity) {
                results.push(sarif_result(finding, &rule_id, index as i64, severity));
            }
        }
    }

    let driver = ToolComponent::builder()
        .name("cat-toolkit")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    serde_json::to_string_pretty(&sarif)
        .unwrap_or_else(|e| format!("{{\"error\": \"SARIF serialization failed: {e}\"}}"))
}
