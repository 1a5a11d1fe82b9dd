//! Configuration for import runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::catalog::core::errors::{ImportError, ImportResult};
use crate::catalog::core::hierarchy::{Hierarchy, PayloadKind};

/// Extensions copied by file imports when a job does not list its own.
pub const DEFAULT_FILE_EXTENSIONS: [&str; 17] = [
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".csv", ".png", ".jpg",
    ".jpeg", ".gif", ".zip", ".rtf", ".odt", ".ods",
];

/// Extensions the content normalizer knows how to convert.
pub const CONVERTIBLE_EXTENSIONS: [&str; 3] = [".docx", ".doc", ".xlsx"];

/// Directory names pruned from every walk (case-insensitive).
pub const DEFAULT_SKIP_PATTERNS: [&str; 7] = [
    r"^zz\s*archive$",
    r"^z\s*archive$",
    r"^x\s*old$",
    r"^z\s*old\b",
    r"^poss\s*older\b",
    r"to\s+go\s+thru",
    r"^archive$",
];

/// Top-level configuration for the importer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Name cleanup settings.
    pub naming: NamingConfig,
    /// Conversion resource ceilings.
    pub limits: ConversionLimits,
    /// Named jobs runnable from the command line.
    pub jobs: BTreeMap<String, JobConfig>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let mut jobs = BTreeMap::new();
        jobs.insert(
            "documents".to_string(),
            JobConfig::Files(FileJobConfig::default()),
        );
        jobs.insert(
            "sop-files".to_string(),
            JobConfig::Files(FileJobConfig {
                source_dir: PathBuf::from("PROTOCOLS"),
                hierarchy: Hierarchy::SopFiles,
                uploads_dir: PathBuf::from("sop-uploads"),
                use_aliases: true,
                reset_existing: true,
                ..FileJobConfig::default()
            }),
        );
        jobs.insert(
            "sops".to_string(),
            JobConfig::Content(ContentJobConfig::default()),
        );
        jobs.insert(
            "webdocs".to_string(),
            JobConfig::Projection(ProjectionJobConfig::default()),
        );

        Self {
            storage: StorageConfig::default(),
            naming: NamingConfig::default(),
            limits: ConversionLimits::default(),
            jobs,
        }
    }
}

impl ImportConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> ImportResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Look up a job by name.
    ///
    /// # Errors
    /// Returns an error if no job has that name.
    pub fn job(&self, name: &str) -> ImportResult<&JobConfig> {
        self.jobs.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
            ImportError::InvalidConfig(format!(
                "unknown job '{name}' (known: {})",
                known.join(", ")
            ))
        })
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ImportResult<()> {
        if self.limits.max_input_bytes == 0 {
            return Err(ImportError::InvalidConfig(
                "limits.max_input_bytes must be > 0".to_string(),
            ));
        }

        if self.limits.max_spreadsheet_cells == 0 {
            return Err(ImportError::InvalidConfig(
                "limits.max_spreadsheet_cells must be > 0".to_string(),
            ));
        }

        for pattern in &self.naming.skip_dir_patterns {
            RegexBuilder::new(pattern).case_insensitive(true).build()?;
        }

        for (name, job) in &self.jobs {
            job.validate()
                .map_err(|msg| ImportError::InvalidConfig(format!("job '{name}': {msg}")))?;
        }

        Ok(())
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("decosop.db"),
        }
    }
}

/// Name cleanup settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Raw top-level directory name to display name.
    pub aliases: BTreeMap<String, String>,
    /// Directory names (regex, case-insensitive) pruned during enumeration.
    pub skip_dir_patterns: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            aliases: BTreeMap::new(),
            skip_dir_patterns: DEFAULT_SKIP_PATTERNS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Resource ceilings applied before and during format conversion.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionLimits {
    /// Payloads larger than this are never converted.
    pub max_input_bytes: u64,
    /// Sheets whose used range exceeds this many cells are skipped.
    pub max_spreadsheet_cells: usize,
}

impl Default for ConversionLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            max_spreadsheet_cells: 1_000_000,
        }
    }
}

/// A runnable import job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobConfig {
    /// Copy files into an uploads directory and record file references.
    Files(FileJobConfig),
    /// Convert files to HTML and store the bodies inline.
    Content(ContentJobConfig),
    /// Convert previously uploaded files into another hierarchy.
    Projection(ProjectionJobConfig),
}

impl JobConfig {
    /// Hierarchy this job writes into.
    #[must_use]
    pub const fn target(&self) -> Hierarchy {
        match self {
            Self::Files(job) => job.hierarchy,
            Self::Content(job) => job.hierarchy,
            Self::Projection(job) => job.target,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Files(job) => {
                expect_payload(job.hierarchy, PayloadKind::File)?;
                validate_extensions(&job.include_extensions)
            }
            Self::Content(job) => {
                expect_payload(job.hierarchy, PayloadKind::Html)?;
                validate_extensions(&job.include_extensions)
            }
            Self::Projection(job) => {
                expect_payload(job.source, PayloadKind::File)?;
                expect_payload(job.target, PayloadKind::Html)
            }
        }
    }
}

fn expect_payload(hierarchy: Hierarchy, expected: PayloadKind) -> Result<(), String> {
    if hierarchy.payload() == expected {
        Ok(())
    } else {
        Err(format!(
            "hierarchy {hierarchy} does not store {expected:?} documents"
        ))
    }
}

fn validate_extensions(extensions: &[String]) -> Result<(), String> {
    for ext in extensions {
        if !ext.starts_with('.') || ext.len() < 2 || ext.to_lowercase() != *ext {
            return Err(format!(
                "extension '{ext}' must be lowercase and start with '.'"
            ));
        }
    }
    Ok(())
}

/// File import job settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJobConfig {
    /// Root of the source tree.
    pub source_dir: PathBuf,
    /// Target hierarchy (file payload).
    pub hierarchy: Hierarchy,
    /// Directory receiving copied files.
    pub uploads_dir: PathBuf,
    /// Lowercase extensions to include; empty means everything.
    pub include_extensions: Vec<String>,
    /// Consult the alias table for top-level directories.
    pub use_aliases: bool,
    /// Delete the target hierarchy's rows before importing.
    pub reset_existing: bool,
}

impl Default for FileJobConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("DOCUMENTS"),
            hierarchy: Hierarchy::Documents,
            uploads_dir: PathBuf::from("uploads"),
            include_extensions: DEFAULT_FILE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            use_aliases: false,
            reset_existing: false,
        }
    }
}

/// Content import job settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentJobConfig {
    /// Root of the source tree.
    pub source_dir: PathBuf,
    /// Target hierarchy (HTML payload).
    pub hierarchy: Hierarchy,
    /// Lowercase extensions to include.
    pub include_extensions: Vec<String>,
    /// Consult the alias table for top-level directories.
    pub use_aliases: bool,
}

impl Default for ContentJobConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("PROTOCOLS"),
            hierarchy: Hierarchy::Protocols,
            include_extensions: CONVERTIBLE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            use_aliases: true,
        }
    }
}

/// Projection job settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionJobConfig {
    /// Hierarchy whose uploaded files are converted.
    pub source: Hierarchy,
    /// Hierarchy receiving the converted documents.
    pub target: Hierarchy,
    /// Directory holding the source hierarchy's stored files.
    pub uploads_dir: PathBuf,
    /// Materialize missing source categories in the target first.
    pub mirror_categories: bool,
    /// Delete the target's documents before projecting.
    pub replace_existing: bool,
}

impl Default for ProjectionJobConfig {
    fn default() -> Self {
        Self {
            source: Hierarchy::Documents,
            target: Hierarchy::WebDocs,
            uploads_dir: PathBuf::from("uploads"),
            mirror_categories: true,
            replace_existing: true,
        }
    }
}
