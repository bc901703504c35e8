//! Auto-fixer: turns fixable findings into a plan of file mutations and
//! applies it.
//!
//! Every mutation carries the hash of the state it expects to find (the
//! pre-image) and of the state it produces (the post-image). Applying checks
//! the current state against both, which makes a second `fix` run a no-op and
//! refuses to touch files that changed after planning.

mod apply;
pub mod imports;
mod plan;

pub use apply::FixApplier;
pub use plan::build_plan;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::core::FixDescriptor;

/// Image of a path that does not exist.
pub const IMAGE_ABSENT: &str = "absent";
/// Image of an existing directory.
pub const IMAGE_DIRECTORY: &str = "directory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Planned,
    Applied,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    #[serde(flatten)]
    pub action: FixDescriptor,
    pub rule_ids: Vec<String>,
    pub pre_image: String,
    pub post_image: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// New file content for rewrites
    #[serde(skip)]
    pub(crate) content: Option<String>,
}

impl Mutation {
    pub fn path(&self) -> &str {
        self.action.path()
    }

    fn fail(&mut self, reason: impl Into<String>) {
        self.outcome = Outcome::Failed;
        self.reason = Some(reason.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixPlan {
    pub mutations: Vec<Mutation>,
}

impl FixPlan {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.mutations.iter().any(|m| m.outcome == Outcome::Failed)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.mutations.iter().filter(|m| m.outcome == outcome).count()
    }
}

pub(crate) fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Current image of `path`: absent, a directory, or the content hash.
pub(crate) fn image_of(path: &Path) -> std::io::Result<String> {
    if path.is_dir() {
        return Ok(IMAGE_DIRECTORY.to_string());
    }
    match std::fs::read(path) {
        Ok(bytes) => Ok(content_hash(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IMAGE_ABSENT.to_string()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_distinguish_absent_directories_and_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        assert_eq!(image_of(&file).unwrap(), IMAGE_ABSENT);
        assert_eq!(image_of(dir.path()).unwrap(), IMAGE_DIRECTORY);
        std::fs::write(&file, "").unwrap();
        assert_eq!(image_of(&file).unwrap(), content_hash(b""));
    }

    #[test]
    fn mutations_serialize_with_flattened_action() {
        let mutation = Mutation {
            action: FixDescriptor::CreateMarkerFile {
                path: "src/app/__init__.py".into(),
            },
            rule_ids: vec!["structure.missing-package-marker".into()],
            pre_image: IMAGE_ABSENT.into(),
            post_image: content_hash(b""),
            outcome: Outcome::Planned,
            reason: None,
            content: None,
        };
        let value = serde_json::to_value(&mutation).unwrap();
        assert_eq!(value["action"], "create-marker-file");
        assert_eq!(value["path"], "src/app/__init__.py");
        assert_eq!(value["outcome"], "planned");
        assert!(value.get("reason").is_none());
    }
}
