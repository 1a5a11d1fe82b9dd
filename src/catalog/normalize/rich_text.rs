//! Rich-text (`.docx`) to HTML conversion.
//!
//! The converter sits behind [`RichTextConverter`] so the content normalizer
//! only sees "bytes in, HTML out". The bundled implementation streams
//! `word/document.xml` out of the OOXML package and maps the WordprocessingML
//! structure onto semantic HTML: paragraphs, headings, bold/italic runs, line
//! breaks and tables. Styling beyond that is dropped.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::catalog::core::errors::ConversionError;
use crate::catalog::normalize::html::escape_text;

const DOCUMENT_PART: &str = "word/document.xml";

/// Converts a rich-text document payload directly into HTML.
pub trait RichTextConverter: Send + Sync {
    /// Convert the payload.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be read as a document.
    fn to_html(&self, payload: &[u8]) -> Result<String, ConversionError>;
}

/// `.docx` converter over `zip` + `quick-xml`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocxHtmlConverter;

impl RichTextConverter for DocxHtmlConverter {
    fn to_html(&self, payload: &[u8]) -> Result<String, ConversionError> {
        let mut archive = ZipArchive::new(Cursor::new(payload))?;
        let mut xml = String::new();
        archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
        document_xml_to_html(&xml)
    }
}

/// Convert a `word/document.xml` part to HTML.
///
/// # Errors
/// Returns an error on malformed XML.
pub fn document_xml_to_html(xml: &str) -> Result<String, ConversionError> {
    let mut reader = Reader::from_str(xml);
    let mut state = WalkState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e)?,
            Event::Empty(e) => {
                state.open(&e)?;
                state.close(e.name().as_ref());
            }
            Event::End(e) => state.close(e.name().as_ref()),
            Event::Text(t) if state.in_text => {
                let text = t.unescape()?;
                state.run.push_str(&escape_text(&text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(state.out)
}

#[derive(Default)]
struct WalkState {
    out: String,
    paragraph: Option<Paragraph>,
    run: String,
    bold: bool,
    italic: bool,
    in_run: bool,
    in_run_props: bool,
    in_text: bool,
}

struct Paragraph {
    tag: &'static str,
    html: String,
}

impl WalkState {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), ConversionError> {
        match e.name().as_ref() {
            b"w:p" => {
                self.paragraph = Some(Paragraph {
                    tag: "p",
                    html: String::new(),
                });
            }
            b"w:pStyle" => {
                if let (Some(paragraph), Some(style)) =
                    (self.paragraph.as_mut(), attr_value(e, b"w:val")?)
                {
                    paragraph.tag = heading_tag(&style).unwrap_or("p");
                }
            }
            b"w:r" => {
                self.in_run = true;
                self.run.clear();
                self.bold = false;
                self.italic = false;
            }
            b"w:rPr" => self.in_run_props = true,
            b"w:b" if self.in_run_props => self.bold = toggle_on(e)?,
            b"w:i" if self.in_run_props => self.italic = toggle_on(e)?,
            b"w:t" if self.in_run => self.in_text = true,
            b"w:tab" if self.in_run && !self.in_run_props => self.run.push('\t'),
            b"w:br" if self.in_run => self.run.push_str("<br />"),
            b"w:tbl" => self.out.push_str("<table>"),
            b"w:tr" => self.out.push_str("<tr>"),
            b"w:tc" => self.out.push_str("<td>"),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:rPr" => self.in_run_props = false,
            b"w:r" => {
                self.in_run = false;
                self.flush_run();
            }
            b"w:p" => {
                if let Some(paragraph) = self.paragraph.take()
                    && !paragraph.html.trim().is_empty()
                {
                    self.out.push_str(&format!(
                        "<{tag}>{html}</{tag}>",
                        tag = paragraph.tag,
                        html = paragraph.html
                    ));
                }
            }
            b"w:tbl" => self.out.push_str("</table>"),
            b"w:tr" => self.out.push_str("</tr>"),
            b"w:tc" => self.out.push_str("</td>"),
            _ => {}
        }
    }

    fn flush_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let mut html = std::mem::take(&mut self.run);
        if self.italic {
            html = format!("<em>{html}</em>");
        }
        if self.bold {
            html = format!("<strong>{html}</strong>");
        }
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.html.push_str(&html);
        }
    }
}

/// Map a paragraph style id to a heading element.
fn heading_tag(style: &str) -> Option<&'static str> {
    let style = style.to_ascii_lowercase();
    if style == "title" {
        return Some("h1");
    }
    let level = style.strip_prefix("heading")?.trim();
    match level {
        "1" => Some("h1"),
        "2" => Some("h2"),
        "3" => Some("h3"),
        "4" => Some("h4"),
        "5" => Some("h5"),
        "6" => Some("h6"),
        _ => None,
    }
}

/// `<w:b/>` turns formatting on; `w:val="0"` / `"false"` / `"none"` turns it off.
fn toggle_on(e: &BytesStart<'_>) -> Result<bool, ConversionError> {
    Ok(match attr_value(e, b"w:val")? {
        Some(value) => !matches!(value.as_str(), "0" | "false" | "none"),
        None => true,
    })
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ConversionError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}
