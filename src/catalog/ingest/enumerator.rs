//! Source tree enumeration.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::catalog::core::errors::{ImportError, ImportResult};
use crate::catalog::normalize::SourceFormat;

/// Prefix of the lock files office suites leave next to open documents.
const LOCK_FILE_PREFIX: &str = "~$";

/// A file selected for import.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceItem {
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// Absolute (or root-joined) path for reading.
    pub absolute_path: PathBuf,
    /// Format declared by the extension.
    pub format: SourceFormat,
}

impl SourceItem {
    /// File name component, lossily decoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Which directories to prune and which files to keep.
#[derive(Clone, Debug)]
pub struct EnumerationRules {
    skip_dirs: Vec<Regex>,
    include_extensions: Vec<String>,
}

impl EnumerationRules {
    /// Compile skip patterns (case-insensitive) and take the extension list.
    ///
    /// An empty extension list keeps every file.
    ///
    /// # Errors
    /// Returns an error if a pattern does not compile.
    pub fn new(skip_patterns: &[String], include_extensions: &[String]) -> ImportResult<Self> {
        let skip_dirs = skip_patterns
            .iter()
            .map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            skip_dirs,
            include_extensions: include_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        })
    }

    /// Whether a directory name is pruned with its subtree.
    #[must_use]
    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|re| re.is_match(name))
    }

    /// Whether a file name is imported.
    #[must_use]
    pub fn keeps_file(&self, name: &str) -> bool {
        if name.starts_with(LOCK_FILE_PREFIX) {
            return false;
        }
        if self.include_extensions.is_empty() {
            return true;
        }
        let ext = Path::new(name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
        ext.is_some_and(|ext| self.include_extensions.contains(&ext))
    }

    fn prunes(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self.skips_dir(&entry.file_name().to_string_lossy())
    }
}

/// Walk `root` and return the files to import.
///
/// Within a directory, its own files come first by name, then each
/// subdirectory by name.
///
/// # Errors
/// Returns an error if `root` is not a directory. Unreadable entries below
/// the root are logged and skipped.
pub fn enumerate_sources(root: &Path, rules: &EnumerationRules) -> ImportResult<Vec<SourceItem>> {
    if !root.is_dir() {
        return Err(ImportError::MissingSource(root.to_path_buf()));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| !rules.prunes(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !rules.keeps_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let Ok(relative_path) = entry.path().strip_prefix(root).map(Path::to_path_buf) else {
            warn!(path = %entry.path().display(), "entry outside source root");
            continue;
        };
        items.push(SourceItem {
            format: SourceFormat::from_path(&relative_path),
            relative_path,
            absolute_path: entry.into_path(),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::catalog::core::config::{CONVERTIBLE_EXTENSIONS, DEFAULT_SKIP_PATTERNS};

    fn rules(extensions: &[&str]) -> EnumerationRules {
        let patterns: Vec<String> = DEFAULT_SKIP_PATTERNS.iter().map(ToString::to_string).collect();
        let extensions: Vec<String> = extensions.iter().map(ToString::to_string).collect();
        EnumerationRules::new(&patterns, &extensions).unwrap()
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_skip_patterns() {
        let rules = rules(&[]);
        for name in ["ZZ Archive", "z archive", "X OLD", "z old stuff", "Poss Older 2019", "!! to go thru", "archive"] {
            assert!(rules.skips_dir(name), "{name}");
        }
        for name in ["Archives", "Old Forms", "Finance"] {
            assert!(!rules.skips_dir(name), "{name}");
        }
    }

    #[test]
    fn test_keeps_file() {
        let rules = rules(&CONVERTIBLE_EXTENSIONS);
        assert!(rules.keeps_file("Plan.DOCX"));
        assert!(rules.keeps_file("old.doc"));
        assert!(!rules.keeps_file("~$Plan.docx"));
        assert!(!rules.keeps_file("scan.pdf"));
        assert!(!rules.keeps_file("README"));
        assert!(self::rules(&[]).keeps_file("README"));
    }

    #[test]
    fn test_walk_prunes_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "b.docx");
        touch(root, "a.xlsx");
        touch(root, "Finance/Budgets/2024.xlsx");
        touch(root, "Finance/zz archive/old.docx");
        touch(root, "Finance/~$lock.docx");
        touch(root, "Finance/notes.txt");
        touch(root, "Archive/ignored.docx");

        let items = enumerate_sources(root, &rules(&CONVERTIBLE_EXTENSIONS)).unwrap();
        let paths: Vec<PathBuf> = items.iter().map(|i| i.relative_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.xlsx"),
                PathBuf::from("b.docx"),
                PathBuf::from("Finance/Budgets/2024.xlsx"),
            ]
        );
        assert_eq!(items[2].format, SourceFormat::Spreadsheet);
        assert_eq!(items[1].absolute_path, root.join("b.docx"));
        assert_eq!(items[1].file_name(), "b.docx");
    }

    #[test]
    fn test_files_precede_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.docx");
        touch(root, "Zeta/x.docx");
        touch(root, "Finance/plan.docx");
        touch(root, "Finance/Budgets/b.xlsx");

        let items = enumerate_sources(root, &rules(&CONVERTIBLE_EXTENSIONS)).unwrap();
        let paths: Vec<PathBuf> = items.iter().map(|i| i.relative_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.docx"),
                PathBuf::from("Finance/plan.docx"),
                PathBuf::from("Finance/Budgets/b.xlsx"),
                PathBuf::from("Zeta/x.docx"),
            ]
        );
    }

    #[test]
    fn test_root_is_never_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("archive");
        touch(&root, "kept.docx");
        let items = enumerate_sources(&root, &rules(&[".docx"])).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = enumerate_sources(&dir.path().join("nope"), &rules(&[])).unwrap_err();
        assert!(matches!(err, ImportError::MissingSource(_)));
    }
}
