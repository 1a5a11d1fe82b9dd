//! Pure normalization: display names and document payloads.

pub mod content;
pub mod html;
pub mod legacy;
pub mod names;
pub mod rich_text;
pub mod spreadsheet;

pub use content::{ContentNormalizer, ContentOutcome, MIN_BODY_CHARS, SkipReason, SourceFormat};
pub use html::{escape_text, with_title_heading};
pub use legacy::LegacyTextExtractor;
pub use names::NameNormalizer;
pub use rich_text::{DocxHtmlConverter, RichTextConverter};
