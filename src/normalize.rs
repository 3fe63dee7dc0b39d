//! Cleans text recovered from uploaded documents before any extraction runs.

use once_cell::sync::Lazy;
use regex::Regex;

static PDF_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%PDF-[0-9.]+[^\n]*(?:\n%[^\n]*)?").expect("valid PDF header regex")
});
static PDF_EOF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%%EOF").expect("valid EOF regex"));
static STREAM_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\bstream\b.*?\bendstream\b").expect("valid stream regex"));
static OBJ_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:\b\d+\s+\d+\s+)?\bobj\b.*?\bendobj\b").expect("valid obj regex")
});

/// Drops control characters (keeping newline, carriage return and tab) and
/// invisible formatting characters that some PDF and DOC converters emit.
fn remove_non_printable(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(c, '\n' | '\r' | '\t') {
                return true;
            }
            !c.is_control()
                && !matches!(
                    c,
                    '\u{FFFD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
                )
        })
        .collect()
}

/// Removes PDF preamble, content streams and object bodies.
fn remove_document_noise(text: &str) -> String {
    let text = PDF_HEADER_RE.replace_all(text, " ");
    let text = PDF_EOF_RE.replace_all(&text, " ");
    let text = STREAM_BLOCK_RE.replace_all(&text, " ");
    OBJ_BLOCK_RE.replace_all(&text, " ").into_owned()
}

/// Cleans document text while keeping its line structure.
///
/// Each surviving line has its whitespace runs collapsed and is trimmed; blank
/// lines are dropped. Line-oriented heuristics (name guessing, keyword-scoped
/// fallbacks) run on this form.
pub(crate) fn strip_document_artifacts(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let printable = remove_non_printable(raw).replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = remove_document_noise(&printable);

    cleaned
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cleans document text and collapses all whitespace, including line breaks,
/// to single spaces. This is the form handed to the language model.
pub(crate) fn normalize_text(raw: &str) -> String {
    strip_document_artifacts(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(strip_document_artifacts(""), "");
    }

    #[test]
    fn test_strips_control_characters() {
        let raw = "John\x00 Doe\x07\nEmail:\x1b john@example.com";
        assert_eq!(normalize_text(raw), "John Doe Email: john@example.com");
    }

    #[test]
    fn test_removes_pdf_noise() {
        let raw = "%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\nstream\nx\u{9c}\u{3}binary\nendstream\nJane Smith\njane@example.com\n%%EOF";
        let normalized = normalize_text(raw);
        assert_eq!(normalized, "Jane Smith jane@example.com");
    }

    #[test]
    fn test_keeps_unmatched_keywords() {
        // Without a closing marker the word is ordinary content.
        let raw = "Built a data stream processor";
        assert_eq!(normalize_text(raw), raw);
    }

    #[test]
    fn test_preserves_lines() {
        let raw = "  John   Doe \r\n\r\n\tEmail:  john@example.com\rMobile: 912 345 678\n";
        assert_eq!(
            strip_document_artifacts(raw),
            "John Doe\nEmail: john@example.com\nMobile: 912 345 678"
        );
    }

    #[test]
    fn test_keeps_non_ascii_letters() {
        assert_eq!(normalize_text("José  Conceição"), "José Conceição");
        assert_eq!(normalize_text("ana\u{FF20}example.pt"), "ana\u{FF20}example.pt");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "%PDF-1.7\nJohn Doe\n2 0 obj << >> endobj\nphone +351 912 345 678",
            "  a \t b \n\n c ",
            "plain",
        ];
        for raw in inputs {
            let once = normalize_text(raw);
            assert_eq!(normalize_text(&once), once);
            let lines = strip_document_artifacts(raw);
            assert_eq!(strip_document_artifacts(&lines), lines);
        }
    }
}
