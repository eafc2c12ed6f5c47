//! Gitignore-style exclusion rules aggregated from a directory tree.
//!
//! One walk over the root collects every `.gitignore` found at any depth;
//! their non-empty, non-comment lines are concatenated in discovery order
//! into a single pattern list evaluated against root-relative paths with
//! gitignore semantics (negation, directory anchoring, wildcard segments).
//! A pattern therefore excludes matching files no matter which
//! subdirectory its ignore file lives in. Extra glob patterns from
//! configuration are layered on top. Unreadable ignore files are logged
//! and skipped, never fatal.

use std::path::Path;

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Immutable exclusion rule set owned by one ingestion run.
pub struct IgnoreRules {
    gitignore: Gitignore,
    extra: GlobSet,
}

impl IgnoreRules {
    /// Walk `root` once, aggregating every ignore file plus `extra_globs`.
    pub fn build(root: &Path, extra_globs: &[String]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "error walking tree for ignore files");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.file_name() != std::ffi::OsStr::new(IGNORE_FILE_NAME)
            {
                continue;
            }
            add_ignore_file(&mut builder, entry.path());
        }

        let gitignore = builder.build()?;

        let mut extra_builder = GlobSetBuilder::new();
        for pattern in extra_globs {
            extra_builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            gitignore,
            extra: extra_builder.build()?,
        })
    }

    /// Whether `relative_path` (root-relative) is excluded by any rule.
    pub fn matched(&self, relative_path: &Path) -> bool {
        if self.extra.is_match(relative_path) {
            return true;
        }
        self.gitignore
            .matched_path_or_any_parents(relative_path, false)
            .is_ignore()
    }
}

/// Append one ignore file's patterns to the aggregate. Read failures and
/// bad patterns are warnings; the resolver proceeds with what it has.
fn add_ignore_file(builder: &mut GitignoreBuilder, path: &Path) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "skipping unreadable ignore file"
            );
            return;
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = builder.add_line(None, line) {
            tracing::warn!(
                path = %path.display(),
                pattern = line,
                error = %e,
                "skipping invalid ignore pattern"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn no_ignore_files_matches_nothing() {
        let tmp = TempDir::new().unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        assert!(!rules.matched(Path::new("anything.txt")));
    }

    #[test]
    fn root_ignore_file_excludes_matches() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\nbuild/\n").unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        assert!(rules.matched(Path::new("debug.log")));
        assert!(rules.matched(Path::new("build/out.txt")));
        assert!(!rules.matched(Path::new("notes.md")));
    }

    #[test]
    fn nested_ignore_file_patterns_join_the_aggregate() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("docs");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join(".gitignore"), "drafts/\n").unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        // The pattern excludes matching paths regardless of which
        // subdirectory its ignore file came from.
        assert!(rules.matched(Path::new("docs/drafts/wip.md")));
        assert!(rules.matched(Path::new("drafts/wip.md")));
        assert!(!rules.matched(Path::new("docs/final/done.md")));
    }

    #[test]
    fn negation_patterns_are_honored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\n!keep.log\n").unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        assert!(rules.matched(Path::new("debug.log")));
        assert!(!rules.matched(Path::new("keep.log")));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".gitignore"),
            "# generated artifacts\n\n*.tmp\n",
        )
        .unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        assert!(rules.matched(Path::new("scratch.tmp")));
        assert!(!rules.matched(Path::new("generated")));
    }

    #[test]
    fn extra_globs_exclude_on_top() {
        let tmp = TempDir::new().unwrap();
        let rules = IgnoreRules::build(tmp.path(), &["**/generated/**".to_string()]).unwrap();
        assert!(rules.matched(Path::new("src/generated/api.md")));
        assert!(!rules.matched(Path::new("src/api.md")));
    }

    #[test]
    fn invalid_extra_glob_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(IgnoreRules::build(tmp.path(), &["[".to_string()]).is_err());
    }
}
