use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use std::fmt::Write as _;

use crate::fix::{FixPlan, Outcome};
use crate::formatting::OutputFormatter;
use crate::report::Report;
use crate::rules::ResolvedCatalog;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn location(path: &str, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{path}:{line}"),
        None => path.to_string(),
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Planned => "planned",
        Outcome::Applied => "applied",
        Outcome::Unchanged => "unchanged",
        Outcome::Failed => "failed",
    }
}

pub fn render_report(report: &Report, fmt: &dyn OutputFormatter) -> String {
    let mut out = String::new();

    if report.findings.is_empty() {
        let _ = writeln!(out, "{}", fmt.success("No findings."));
    } else {
        let mut findings = new_table(&["Severity", "Rule", "Location", "Message"]);
        for finding in &report.findings {
            let mut message = finding.message.clone();
            if finding.fix.is_some() {
                message.push_str(" [fixable]");
            }
            findings.add_row(vec![
                fmt.severity(finding.severity),
                finding.rule_id.clone(),
                location(&finding.path, finding.line),
                message,
            ]);
        }
        let _ = writeln!(out, "{findings}");
    }

    let mut categories = new_table(&["Category", "Status", "Critical", "Warning", "Suggestion"]);
    for (category, summary) in &report.categories {
        categories.add_row(vec![
            category.to_string(),
            fmt.status(summary.status),
            summary.counts.critical.to_string(),
            summary.counts.warning.to_string(),
            summary.counts.suggestion.to_string(),
        ]);
    }
    let _ = writeln!(out, "\n{}", fmt.header("Categories"));
    let _ = writeln!(out, "{categories}");

    if let Some(plan) = &report.fix_plan {
        render_fix_plan(&mut out, plan, fmt);
    }

    let _ = writeln!(
        out,
        "\n{} {} ({} findings, {} fixable, catalog v{})",
        fmt.bold("Overall:"),
        fmt.status(report.overall_status),
        report.findings.len(),
        report.fixable_count(),
        report.catalog_version
    );
    out
}

fn render_fix_plan(out: &mut String, plan: &FixPlan, fmt: &dyn OutputFormatter) {
    let _ = writeln!(out, "\n{}", fmt.header("Fix plan"));
    if plan.is_empty() {
        let _ = writeln!(out, "{}", fmt.dim("Nothing to fix."));
        return;
    }
    let mut table = new_table(&["Action", "Path", "Outcome", "Reason"]);
    for mutation in &plan.mutations {
        let action = serde_json::to_value(&mutation.action)
            .ok()
            .and_then(|v| v.get("action").and_then(|a| a.as_str()).map(str::to_string))
            .unwrap_or_default();
        let outcome = match mutation.outcome {
            Outcome::Failed => fmt.error(outcome_label(mutation.outcome)),
            other => outcome_label(other).to_string(),
        };
        table.add_row(vec![
            action,
            mutation.path().to_string(),
            outcome,
            mutation.reason.clone().unwrap_or_default(),
        ]);
    }
    let _ = writeln!(out, "{table}");
}

pub fn render_catalog(catalog: &ResolvedCatalog, fmt: &dyn OutputFormatter) -> String {
    let mut table = new_table(&["Rule", "Category", "Severity", "Scope", "Fixable", "Description"]);
    for rule in catalog.rules() {
        let d = &rule.descriptor;
        table.add_row(vec![
            d.id.clone(),
            d.category.to_string(),
            fmt.severity(d.severity),
            format!("{:?}", d.scope).to_lowercase(),
            if d.fixable { "yes" } else { "no" }.to_string(),
            d.description.clone(),
        ]);
    }
    format!(
        "{}\n{table}\n{} rules\n",
        fmt.header(&format!("Catalog v{}", catalog.version)),
        catalog.len()
    )
}
