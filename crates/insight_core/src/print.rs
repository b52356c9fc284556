//! Standalone print documents.
//!
//! Printing never touches live state: callers pass a copy of the rendered
//! markup and get back a complete HTML page that prints itself on load.

const PRINT_HEAD: &str = "<html><head><title>Report</title>\
<style>body { font-family: Arial, sans-serif; }</style>\
</head><body>";

const PRINT_TAIL: &str = "<script>window.onload = function () { window.print(); };</script>\
</body></html>";

/// Wraps `markup` in a minimal HTML document that opens the print dialog.
pub fn print_document(markup: &str) -> String {
    let mut document = String::with_capacity(PRINT_HEAD.len() + markup.len() + PRINT_TAIL.len());
    document.push_str(PRINT_HEAD);
    document.push_str(markup);
    document.push_str(PRINT_TAIL);
    document
}

/// Escapes text so it renders verbatim inside HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub(crate) fn image_markup(url: &str, alt: Option<&str>) -> String {
    match alt {
        Some(alt) => format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(url),
            escape_html(alt)
        ),
        None => format!(
            "<img src=\"{}\" style=\"max-width: 100%; margin-bottom: 20px;\">",
            escape_html(url)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_wraps_markup_between_head_and_print_script() {
        let doc = print_document("<pre>hi</pre>");
        assert!(doc.starts_with("<html><head><title>Report</title>"));
        assert!(doc.contains("font-family: Arial, sans-serif;"));
        assert!(doc.contains("<body><pre>hi</pre><script>"));
        assert!(doc.ends_with("</body></html>"));
    }

    #[test]
    fn escape_keeps_plain_text_and_quotes_markup() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
