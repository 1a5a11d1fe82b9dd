//! Best-effort text recovery from legacy binary word-processor files.
//!
//! There is no structured parser here. The payload is decoded as Latin-1
//! (one byte, one char, infallible) and the longest run of printable ASCII is
//! taken as the document body. This is a known-lossy approximation: headers,
//! metadata and the body compete, and the longest run wins.

use regex::Regex;

use crate::catalog::normalize::html::element;

/// Shortest run of printable characters considered at all.
pub const MIN_RUN_CHARS: usize = 20;
/// Recovered text shorter than this (after trimming) is not a document.
pub const MIN_TEXT_CHARS: usize = 50;

/// Extracts paragraph HTML from legacy binary payloads.
#[derive(Clone, Debug)]
pub struct LegacyTextExtractor {
    printable_run: Regex,
}

impl LegacyTextExtractor {
    /// Create the extractor.
    ///
    /// # Errors
    /// Returns an error if the run pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            printable_run: Regex::new(&format!(r"[\x20-\x7e\n\r\t]{{{MIN_RUN_CHARS},}}"))?,
        })
    }

    /// Longest printable run in the payload, first one on ties.
    #[must_use]
    pub fn longest_run(&self, payload: &[u8]) -> Option<String> {
        let decoded = decode_latin1(payload);
        let mut best: Option<&str> = None;
        for m in self.printable_run.find_iter(&decoded) {
            if best.is_none_or(|b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        best.map(str::to_string)
    }

    /// Convert a legacy payload to paragraph HTML, or `None` when too little
    /// text can be recovered.
    #[must_use]
    pub fn to_html(&self, payload: &[u8]) -> Option<String> {
        let text = self.longest_run(payload)?;
        let text = text.trim();
        if text.len() < MIN_TEXT_CHARS {
            return None;
        }

        let paragraphs: Vec<String> = text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| element("p", line))
            .collect();

        if paragraphs.is_empty() {
            None
        } else {
            Some(paragraphs.join("\n"))
        }
    }
}

/// Latin-1 maps every byte to the code point of the same value.
fn decode_latin1(payload: &[u8]) -> String {
    payload.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_noise(len: usize) -> Vec<u8> {
        (0..len).map(|i| if i % 2 == 0 { 0x00 } else { 0xff }).collect()
    }

    fn wrapped(text: &str) -> Vec<u8> {
        let mut payload = binary_noise(64);
        payload.extend_from_slice(text.as_bytes());
        payload.extend(binary_noise(64));
        payload
    }

    #[test]
    fn test_threshold_49_is_rejected() {
        let extractor = LegacyTextExtractor::new().unwrap();
        let text = "a".repeat(49);
        assert_eq!(extractor.longest_run(&wrapped(&text)).unwrap().len(), 49);
        assert!(extractor.to_html(&wrapped(&text)).is_none());
    }

    #[test]
    fn test_threshold_50_is_accepted() {
        let extractor = LegacyTextExtractor::new().unwrap();
        let text = "a".repeat(50);
        let html = extractor.to_html(&wrapped(&text)).unwrap();
        assert_eq!(html, format!("<p>{text}</p>"));
    }

    #[test]
    fn test_keeps_longest_run_only() {
        let extractor = LegacyTextExtractor::new().unwrap();
        let mut payload = wrapped("short header run here");
        payload.extend(wrapped(&"Body text that is clearly the longest run. ".repeat(3)));
        payload.extend(wrapped("trailing metadata block!!"));
        let run = extractor.longest_run(&payload).unwrap();
        assert!(run.starts_with("Body text"));
    }

    #[test]
    fn test_first_run_wins_ties() {
        let extractor = LegacyTextExtractor::new().unwrap();
        let mut payload = wrapped(&"x".repeat(30));
        payload.extend(wrapped(&"y".repeat(30)));
        assert_eq!(extractor.longest_run(&payload).unwrap(), "x".repeat(30));
    }

    #[test]
    fn test_lines_split_escaped_and_blank_dropped() {
        let extractor = LegacyTextExtractor::new().unwrap();
        let text = "Opening procedure for the front desk\r\n\r\n  Check <alarm> & lights  \n\tLock up";
        let html = extractor.to_html(&wrapped(text)).unwrap();
        assert_eq!(
            html,
            "<p>Opening procedure for the front desk</p>\n<p>Check &lt;alarm&gt; &amp; lights</p>\n<p>Lock up</p>"
        );
    }

    #[test]
    fn test_no_printable_run() {
        let extractor = LegacyTextExtractor::new().unwrap();
        assert!(extractor.longest_run(&binary_noise(500)).is_none());
        assert!(extractor.to_html(&[]).is_none());
    }
}
