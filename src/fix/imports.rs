//! Import block re-sorting.

use crate::matchers::imports::{self, ImportRecord};
use crate::matchers::{ImportBucket, MatcherProfile, ParsedSource};

/// One import statement and the comment lines directly above it.
struct Unit<'a> {
    bucket: ImportBucket,
    lines: Vec<&'a str>,
}

/// Re-sort the leading import block of `content` by bucket.
///
/// The sort is stable, so imports keep their relative order inside a bucket.
/// Comment lines travel with the import below them, blank lines inside the
/// block are dropped and buckets are separated by exactly one blank line.
/// Returns `None` when there is nothing to move, when the block holds a
/// bucket outside `movable`, or when a leading import shares its line with
/// another statement or sits after a line that is neither blank nor a comment.
pub fn reorder_leading_block(
    path: &str,
    content: &str,
    profile: &MatcherProfile,
    movable: &[ImportBucket],
) -> Option<String> {
    let source = ParsedSource::parse(path, content);
    let facts = imports::collect(&source, profile);
    let leading: Vec<&ImportRecord> = facts.records.iter().filter(|r| r.leading).collect();
    let (first, last) = (leading.first()?, leading.last()?);
    if leading.iter().any(|r| !movable.contains(&r.bucket)) {
        return None;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let block_start = first.line - 1;
    let block_end = last.end_line;
    if block_end > lines.len() {
        return None;
    }

    let mut units = Vec::with_capacity(leading.len());
    let mut cursor = block_start;
    for record in &leading {
        // Statements sharing a physical line, or code between two imports,
        // cannot be moved without rewriting that line.
        if record.line - 1 < cursor {
            return None;
        }
        let gap = &lines[cursor..record.line - 1];
        if gap.iter().any(|l| {
            let l = l.trim_start();
            !l.is_empty() && !l.starts_with('#')
        }) {
            return None;
        }
        let mut unit_lines: Vec<&str> = lines[cursor..record.line - 1]
            .iter()
            .copied()
            .filter(|l| l.trim_start().starts_with('#'))
            .collect();
        unit_lines.extend_from_slice(&lines[record.line - 1..record.end_line]);
        units.push(Unit {
            bucket: record.bucket,
            lines: unit_lines,
        });
        cursor = record.end_line;
    }
    units.sort_by_key(|u| u.bucket);

    let mut block: Vec<&str> = Vec::new();
    let mut previous: Option<ImportBucket> = None;
    for unit in &units {
        if previous.is_some_and(|b| b != unit.bucket) {
            block.push("");
        }
        block.extend(unit.lines.iter().copied());
        previous = Some(unit.bucket);
    }

    let mut rebuilt: Vec<&str> = Vec::with_capacity(lines.len());
    rebuilt.extend_from_slice(&lines[..block_start]);
    rebuilt.extend(block);
    rebuilt.extend_from_slice(&lines[block_end..]);
    let result = rebuilt.join("\n");
    (result != content).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const ALL: [ImportBucket; 4] = [
        ImportBucket::Future,
        ImportBucket::Standard,
        ImportBucket::External,
        ImportBucket::Local,
    ];

    fn profile() -> MatcherProfile {
        MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default())
            .unwrap()
            .with_local_modules(["app".to_string()].into_iter().collect())
    }

    #[test]
    fn sorts_buckets_and_keeps_comments_attached() {
        let source = indoc! {r#"
            """Service module."""
            from app.models import User
            import requests
            # path helpers
            import os.path
            import sys

            def run() -> None:
                pass
        "#};
        let fixed = reorder_leading_block("app/service.py", source, &profile(), &ALL).unwrap();
        assert_eq!(
            fixed,
            indoc! {r#"
                """Service module."""
                # path helpers
                import os.path
                import sys

                import requests

                from app.models import User

                def run() -> None:
                    pass
            "#}
        );
    }

    #[test]
    fn multi_line_imports_move_as_one() {
        let source = "import requests\nfrom os import (\n    path,\n    sep,\n)\n\nx = path\n";
        let fixed = reorder_leading_block("pkg/mod.py", source, &profile(), &ALL).unwrap();
        assert_eq!(
            fixed,
            "from os import (\n    path,\n    sep,\n)\n\nimport requests\n\nx = path\n"
        );
    }

    #[test]
    fn sorted_block_is_left_alone() {
        let source = "import os\n\nimport requests\n";
        assert_eq!(reorder_leading_block("pkg/mod.py", source, &profile(), &ALL), None);
    }

    #[test]
    fn immovable_bucket_blocks_the_reorder() {
        let source = "import requests\nimport os\n";
        let movable = [ImportBucket::Standard, ImportBucket::Local];
        assert_eq!(reorder_leading_block("pkg/mod.py", source, &profile(), &movable), None);
    }

    #[test]
    fn unparsed_import_line_is_never_dropped() {
        let source = "import requests\nfrom app import\nimport os\n\nx = (requests, os)\n";
        assert_eq!(reorder_leading_block("app/x.py", source, &profile(), &ALL), None);
    }

    #[test]
    fn relative_imports_without_a_space_move_with_their_bucket() {
        let source = "from.orders import Order\nimport os\n\nx = (Order, os)\n";
        let fixed = reorder_leading_block("app/x.py", source, &profile(), &ALL).unwrap();
        assert_eq!(fixed, "import os\n\nfrom.orders import Order\n\nx = (Order, os)\n");
    }

    #[test]
    fn imports_sharing_a_line_are_left_alone() {
        let source = "import requests; import os\n\nx = (requests, os)\n";
        assert_eq!(reorder_leading_block("app/x.py", source, &profile(), &ALL), None);
    }

    #[test]
    fn reordering_twice_is_stable() {
        let source = "from app import core\nimport os\nimport requests\n";
        let once = reorder_leading_block("app/x.py", source, &profile(), &ALL).unwrap();
        assert_eq!(reorder_leading_block("app/x.py", &once, &profile(), &ALL), None);
    }
}
