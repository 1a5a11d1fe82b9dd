//! Display-name cleanup for directory segments and document titles.
//!
//! File browsers sort on raw names, so source trees are full of names like
//! `"^   DENTAL  PROCEDURES"` or `"02 Budgets"`. These helpers turn them into
//! what a reader should see, without ever returning an empty string.

use std::collections::BTreeMap;

use regex::Regex;

/// Compiled name cleanup rules plus the top-level alias table.
#[derive(Clone, Debug)]
pub struct NameNormalizer {
    aliases: BTreeMap<String, String>,
    segment_decoration: Regex,
    title_decoration: Regex,
    numeric_prefix: Regex,
    whitespace: Regex,
}

impl NameNormalizer {
    /// Build a normalizer with the given alias table.
    ///
    /// # Errors
    /// Returns an error if any built-in pattern fails to compile.
    pub fn new(aliases: BTreeMap<String, String>) -> Result<Self, regex::Error> {
        Ok(Self {
            aliases,
            segment_decoration: Regex::new(r"^[~!^@]+\s*")?,
            title_decoration: Regex::new(r"^[~!^]+\s*")?,
            numeric_prefix: Regex::new(r"^\d+\s+")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Build a normalizer that never consults aliases.
    ///
    /// # Errors
    /// Returns an error if any built-in pattern fails to compile.
    pub fn without_aliases() -> Result<Self, regex::Error> {
        Self::new(BTreeMap::new())
    }

    /// Clean a directory segment into a category display name.
    ///
    /// Aliases apply only to top-level segments, and replace the cleanup
    /// entirely when they match.
    #[must_use]
    pub fn clean_segment(&self, raw: &str, is_top_level: bool) -> String {
        if is_top_level {
            if let Some(alias) = self.aliases.get(raw) {
                return alias.clone();
            }
        }

        let name = self.segment_decoration.replace(raw, "");
        let name = self.numeric_prefix.replace(&name, "");
        let name = self.collapse(&name);
        if name.is_empty() {
            raw.to_string()
        } else {
            name
        }
    }

    /// Clean a file name into a document title.
    #[must_use]
    pub fn clean_title(&self, file_name: &str) -> String {
        let stem = std::path::Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);

        let name = self.title_decoration.replace(stem, "");
        let name = name.replace('_', " ");
        let name = self.collapse(&name);
        if name.is_empty() {
            file_name.to_string()
        } else {
            name
        }
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        let mut aliases = BTreeMap::new();
        aliases.insert("FINANCE PROTOCOLs".to_string(), "Finance".to_string());
        aliases.insert(
            "^   DENTAL  PROCEDURES".to_string(),
            "Dental Procedures".to_string(),
        );
        NameNormalizer::new(aliases).unwrap()
    }

    #[test]
    fn test_alias_applies_to_top_level_only() {
        let n = normalizer();
        assert_eq!(n.clean_segment("FINANCE PROTOCOLs", true), "Finance");
        assert_eq!(n.clean_segment("FINANCE PROTOCOLs", false), "FINANCE PROTOCOLs");
        assert_eq!(
            n.clean_segment("^   DENTAL  PROCEDURES", true),
            "Dental Procedures"
        );
        assert_eq!(
            n.clean_segment("^   DENTAL  PROCEDURES", false),
            "DENTAL PROCEDURES"
        );
    }

    #[test]
    fn test_strips_decoration_and_numeric_prefix() {
        let n = NameNormalizer::without_aliases().unwrap();
        assert_eq!(n.clean_segment("@ REPORTING Protocols", true), "REPORTING Protocols");
        assert_eq!(n.clean_segment("~!^ Misc", false), "Misc");
        assert_eq!(n.clean_segment("0 Goods & Services", false), "Goods & Services");
        assert_eq!(n.clean_segment("2024", false), "2024");
        assert_eq!(n.clean_segment("  Two   spaces  ", false), "Two spaces");
    }

    #[test]
    fn test_segment_never_empty() {
        let n = NameNormalizer::without_aliases().unwrap();
        assert_eq!(n.clean_segment("~~~", false), "~~~");
        assert_eq!(n.clean_segment("@ ", false), "@ ");
    }

    #[test]
    fn test_clean_title() {
        let n = normalizer();
        assert_eq!(n.clean_title("~$ignored_draft.docx"), "$ignored draft");
        assert_eq!(n.clean_title("^ Front_Desk__Opening.docx"), "Front Desk Opening");
        assert_eq!(n.clean_title("01 Intake form.pdf"), "01 Intake form");
        assert_eq!(n.clean_title("report.v2.xlsx"), "report.v2");
        assert_eq!(n.clean_title("FINANCE PROTOCOLs.doc"), "FINANCE PROTOCOLs");
    }

    #[test]
    fn test_title_never_empty() {
        let n = NameNormalizer::without_aliases().unwrap();
        assert_eq!(n.clean_title("___.docx"), "___.docx");
        assert_eq!(n.clean_title("~.txt"), "~.txt");
    }
}
