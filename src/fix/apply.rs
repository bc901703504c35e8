use dashmap::DashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{image_of, FixPlan, Mutation, Outcome};
use crate::cancel::CancellationToken;
use crate::core::FixDescriptor;
use crate::errors::{Error, Result};

/// Applies fix plans under one root. Mutations of the same path are
/// serialized through a per-path lock, so one applier can be shared between
/// threads.
#[derive(Debug)]
pub struct FixApplier {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FixApplier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    /// Apply every mutation in order, recording its outcome. With `dry_run`
    /// nothing is written and every mutation stays `planned`.
    pub fn apply(&self, plan: &mut FixPlan, dry_run: bool, cancel: &CancellationToken) -> Result<()> {
        if dry_run {
            info!("Dry run: {} mutations planned", plan.mutations.len());
            return Ok(());
        }
        for mutation in plan.mutations.iter_mut() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if mutation.outcome == Outcome::Failed {
                continue;
            }
            self.apply_one(mutation);
        }
        info!(
            "Fixes: {} applied, {} unchanged, {} failed",
            plan.count(Outcome::Applied),
            plan.count(Outcome::Unchanged),
            plan.count(Outcome::Failed)
        );
        Ok(())
    }

    fn lock_for(&self, path: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Apply one mutation against the current state of its path.
    pub fn apply_one(&self, mutation: &mut Mutation) {
        let lock = self.lock_for(mutation.path());
        let _guard = lock.lock();
        let target = self.root.join(mutation.path());

        let current = match image_of(&target) {
            Ok(image) => image,
            Err(e) => return mutation.fail(format!("cannot read current state: {e}")),
        };
        if current == mutation.post_image {
            debug!("{} already fixed", mutation.path());
            mutation.outcome = Outcome::Unchanged;
            return;
        }
        if current != mutation.pre_image {
            warn!("{} changed since planning; skipping", mutation.path());
            return mutation.fail(format!(
                "stale pre-image: expected {}, found {current}",
                mutation.pre_image
            ));
        }

        let written = match &mutation.action {
            FixDescriptor::CreateDirectory { .. } => fs::create_dir_all(&target),
            FixDescriptor::CreateMarkerFile { .. } => create_new_empty(&target),
            FixDescriptor::ReorderImports { .. } => match &mutation.content {
                Some(content) => write_atomically(&target, content.as_bytes()),
                None => return mutation.fail("no content planned for rewrite"),
            },
        };
        match written {
            Ok(()) => {
                debug!("Applied {:?}", mutation.action);
                mutation.outcome = Outcome::Applied;
            }
            Err(e) => mutation.fail(format!("write failed: {e}")),
        }
    }
}

fn create_new_empty(target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map(|_| ())
}

/// Write to a sibling temporary file, then rename it over `target`.
fn write_atomically(target: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.conformist-{}.tmp", std::process::id()));
    fs::write(&temp, data)?;
    fs::rename(&temp, target).inspect_err(|_| {
        let _ = fs::remove_file(&temp);
    })
}
