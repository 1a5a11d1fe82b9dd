//! Content normalization: payload + declared format → canonical HTML body.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::catalog::core::config::ConversionLimits;
use crate::catalog::core::errors::ConversionError;
use crate::catalog::normalize::legacy::LegacyTextExtractor;
use crate::catalog::normalize::rich_text::{DocxHtmlConverter, RichTextConverter};
use crate::catalog::normalize::spreadsheet;

/// Converted bodies shorter than this (trimmed) count as no content.
pub const MIN_BODY_CHARS: usize = 10;

/// Declared source format, derived from the file extension.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SourceFormat {
    /// OOXML word-processing document (`.docx`).
    RichText,
    /// Legacy binary word-processing document (`.doc`).
    LegacyBinary,
    /// OOXML workbook (`.xlsx`).
    Spreadsheet,
    /// Anything else, with its lowercase extension (possibly empty).
    Unsupported(String),
}

impl SourceFormat {
    /// Declare the format of a path from its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => Self::RichText,
            "doc" => Self::LegacyBinary,
            "xlsx" => Self::Spreadsheet,
            _ => Self::Unsupported(ext),
        }
    }

    /// Whether the normalizer will attempt a conversion at all.
    #[must_use]
    pub const fn is_convertible(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RichText => f.write_str("docx"),
            Self::LegacyBinary => f.write_str("doc"),
            Self::Spreadsheet => f.write_str("xlsx"),
            Self::Unsupported(ext) if ext.is_empty() => f.write_str("(none)"),
            Self::Unsupported(ext) => f.write_str(ext),
        }
    }
}

/// Why a payload produced no usable content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The format is never converted.
    UnsupportedFormat,
    /// The payload exceeds a resource ceiling.
    TooLarge,
    /// The converter failed.
    ConversionFailed(String),
    /// Conversion succeeded but produced (almost) nothing.
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => f.write_str("unsupported format"),
            Self::TooLarge => f.write_str("input too large"),
            Self::ConversionFailed(msg) => write!(f, "conversion failed: {msg}"),
            Self::Empty => f.write_str("no usable content"),
        }
    }
}

/// Result of normalizing one payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentOutcome {
    /// Canonical HTML body.
    Html(String),
    /// Nothing worth storing.
    NoContent(SkipReason),
}

impl ContentOutcome {
    /// Apply the caller-side minimum body length.
    #[must_use]
    pub fn require_min_body(self) -> Self {
        match self {
            Self::Html(body) if body.trim().chars().count() < MIN_BODY_CHARS => {
                Self::NoContent(SkipReason::Empty)
            }
            other => other,
        }
    }
}

/// Converts payloads of known formats into canonical HTML.
pub struct ContentNormalizer {
    limits: ConversionLimits,
    rich_text: Box<dyn RichTextConverter>,
    legacy: LegacyTextExtractor,
}

impl ContentNormalizer {
    /// Create a normalizer with the bundled `.docx` converter.
    ///
    /// # Errors
    /// Returns an error if the legacy extractor pattern fails to compile.
    pub fn new(limits: ConversionLimits) -> Result<Self, regex::Error> {
        Self::with_rich_text(limits, Box::new(DocxHtmlConverter))
    }

    /// Create a normalizer with a custom rich-text converter.
    ///
    /// # Errors
    /// Returns an error if the legacy extractor pattern fails to compile.
    pub fn with_rich_text(
        limits: ConversionLimits,
        rich_text: Box<dyn RichTextConverter>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            limits,
            rich_text,
            legacy: LegacyTextExtractor::new()?,
        })
    }

    /// Configured ceilings.
    #[must_use]
    pub const fn limits(&self) -> &ConversionLimits {
        &self.limits
    }

    /// Normalize a payload of the declared format.
    ///
    /// Never fails: converter errors become [`ContentOutcome::NoContent`].
    #[must_use]
    pub fn normalize(&self, payload: &[u8], format: &SourceFormat) -> ContentOutcome {
        if !format.is_convertible() {
            return ContentOutcome::NoContent(SkipReason::UnsupportedFormat);
        }

        if u64::try_from(payload.len()).map_or(true, |len| len > self.limits.max_input_bytes) {
            debug!(format = %format, bytes = payload.len(), "payload over size ceiling");
            return ContentOutcome::NoContent(SkipReason::TooLarge);
        }

        let converted = match format {
            SourceFormat::RichText => self
                .rich_text
                .to_html(payload)
                .map(|html| Some(html).filter(|h| !h.trim().is_empty())),
            SourceFormat::LegacyBinary => Ok(self.legacy.to_html(payload)),
            SourceFormat::Spreadsheet => {
                spreadsheet::convert_xlsx(payload, self.limits.max_spreadsheet_cells)
            }
            SourceFormat::Unsupported(_) => Ok(None),
        };

        match converted {
            Ok(Some(html)) => ContentOutcome::Html(html),
            Ok(None) => ContentOutcome::NoContent(SkipReason::Empty),
            Err(ConversionError::TooLarge(msg)) => {
                debug!(format = %format, "{msg}");
                ContentOutcome::NoContent(SkipReason::TooLarge)
            }
            Err(err) => {
                warn!(format = %format, "conversion failed: {err}");
                ContentOutcome::NoContent(SkipReason::ConversionFailed(err.to_string()))
            }
        }
    }
}
