//! File discovery by extension under ignore rules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::ignore_rules::IgnoreRules;

/// A candidate file found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Root-relative path; also the stable identity used in record ids.
    pub relative_path: String,
    /// Byte size at discovery time.
    pub size: u64,
}

/// Enumerate files under `root` whose lowercased extension is in
/// `extensions` (dot-prefixed or bare, e.g. `".md"` or `"md"`) and which no
/// ignore rule excludes. The result is sorted by relative path so repeated
/// runs over an unchanged tree report files in the same order.
pub fn discover(
    root: &Path,
    extensions: &[String],
    rules: &IgnoreRules,
) -> Result<Vec<DiscoveredFile>> {
    let wanted: HashSet<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let extension = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => continue,
        };
        if !wanted.contains(&extension) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if rules.matched(relative) {
            continue;
        }

        let size = entry.metadata()?.len();
        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            relative_path: relative.to_string_lossy().to_string(),
            size,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filters_by_extension_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "alpha").unwrap();
        fs::write(tmp.path().join("b.MD"), "beta").unwrap();
        fs::write(tmp.path().join("c.rs"), "gamma").unwrap();
        fs::write(tmp.path().join("noext"), "delta").unwrap();

        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        let files = discover(tmp.path(), &exts(&[".md"]), &rules).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.MD"]);
    }

    #[test]
    fn excludes_ignored_paths_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("notes");
        fs::create_dir(&sub).unwrap();
        fs::write(tmp.path().join(".gitignore"), "secret.md\n").unwrap();
        fs::write(sub.join(".gitignore"), "*.tmp.md\n").unwrap();
        fs::write(tmp.path().join("secret.md"), "hidden").unwrap();
        fs::write(sub.join("kept.md"), "visible").unwrap();
        fs::write(sub.join("draft.tmp.md"), "hidden").unwrap();

        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        let files = discover(tmp.path(), &exts(&[".md"]), &rules).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["notes/kept.md"]);
    }

    #[test]
    fn order_is_deterministic_and_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
            fs::write(tmp.path().join(name), "x").unwrap();
        }
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        let first = discover(tmp.path(), &exts(&["txt"]), &rules).unwrap();
        let second = discover(tmp.path(), &exts(&["txt"]), &rules).unwrap();
        let names: Vec<&str> = first.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["alpha.txt", "mid.txt", "zeta.txt"]);
        assert_eq!(
            names,
            second
                .iter()
                .map(|f| f.relative_path.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn records_file_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("sized.txt"), "12345").unwrap();
        let rules = IgnoreRules::build(tmp.path(), &[]).unwrap();
        let files = discover(tmp.path(), &exts(&["txt"]), &rules).unwrap();
        assert_eq!(files[0].size, 5);
    }
}
