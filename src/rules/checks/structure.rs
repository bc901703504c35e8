use crate::core::{FindingKind, FixDescriptor, Finding};
use crate::rules::registry::{RuleContext, RuleRegistry};

pub const FILE_UNREADABLE: &str = "structure.file-unreadable";

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn(FILE_UNREADABLE, file_unreadable);
    registry.register_fn("structure.missing-package-marker", missing_package_marker);
    registry.register_fn("structure.required-directory", required_directory);
}

fn file_unreadable(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let file = ctx.file()?;
    Ok(match file.content() {
        Ok(_) => Vec::new(),
        Err(reason) => vec![ctx
            .finding(None, format!("file could not be read: {reason}"))
            .with_kind(FindingKind::FileUnreadable)],
    })
}

fn missing_package_marker(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let marker = &ctx.config.project.package_marker;
    let source_dirs = ctx.tree.source_dirs();
    let mut findings = Vec::new();

    for root in ctx.tree.package_roots() {
        let prefix = format!("{root}/");
        for dir in source_dirs.iter().filter(|d| d.starts_with(&prefix)) {
            let marker_path = format!("{dir}/{marker}");
            if !ctx.tree.path_exists(&marker_path) {
                findings.push(
                    ctx.finding_at(
                        *dir,
                        None,
                        format!("package directory '{dir}' has no '{marker}'"),
                    )
                    .with_fix(FixDescriptor::CreateMarkerFile { path: marker_path }),
                );
            }
        }
    }
    Ok(findings)
}

fn required_directory(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for required in &ctx.config.project.required_dirs {
        let dir = required.path.trim_end_matches('/');
        if !ctx.tree.has_dir(dir) {
            findings.push(
                ctx.finding_at(dir, None, format!("required directory '{dir}' is missing"))
                    .with_fix(FixDescriptor::CreateDirectory {
                        path: dir.to_string(),
                    }),
            );
        }
        if let Some(marker) = &required.marker {
            let marker_path = format!("{dir}/{marker}");
            if !ctx.tree.path_exists(&marker_path) {
                findings.push(
                    ctx.finding_at(
                        dir,
                        None,
                        format!("required directory '{dir}' has no '{marker}'"),
                    )
                    .with_fix(FixDescriptor::CreateMarkerFile { path: marker_path }),
                );
            }
        }
    }
    Ok(findings)
}
