//! Minimal HTML building helpers shared by every converter.

/// Escape the three characters that can start or break markup in text
/// content: `&`, `<`, `>`.
///
/// Input is treated as literal text, so existing entities are escaped again
/// (`&amp;` becomes `&amp;amp;`), which is what keeps literal text literal.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap escaped text in an element.
#[must_use]
pub fn element(tag: &str, text: &str) -> String {
    format!("<{tag}>{}</{tag}>", escape_text(text))
}

/// Prefix a converted body with a title heading.
#[must_use]
pub fn with_title_heading(title: &str, body: &str) -> String {
    format!("{}\n{body}", element("h1", title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_text("plain \"quotes\""), "plain \"quotes\"");
    }

    #[test]
    fn test_literal_markup_escaped_once() {
        assert_eq!(
            escape_text("<b>&amp;</b>"),
            "&lt;b&gt;&amp;amp;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_with_title_heading() {
        assert_eq!(
            with_title_heading("R&D", "<p>x</p>"),
            "<h1>R&amp;D</h1>\n<p>x</p>"
        );
    }
}
