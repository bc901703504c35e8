use anyhow::Result;

use crate::report::Report;
use crate::rules::ResolvedCatalog;

/// Pretty JSON with a trailing newline. Maps are `BTreeMap`s, so the same
/// report always yields the same bytes.
pub fn render_report(report: &Report) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

#[derive(serde::Serialize)]
struct CatalogListing<'a> {
    version: &'a str,
    rules: Vec<&'a crate::rules::RuleDescriptor>,
}

pub fn render_catalog(catalog: &ResolvedCatalog) -> Result<String> {
    let listing = CatalogListing {
        version: &catalog.version,
        rules: catalog.rules().map(|r| &r.descriptor).collect(),
    };
    let mut json = serde_json::to_string_pretty(&listing)?;
    json.push('\n');
    Ok(json)
}
