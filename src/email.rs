//! Finds a plausible email address in document text using an ordered cascade
//! of pattern strategies.

use once_cell::sync::Lazy;
use regex::Regex;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("valid email regex"));

static FULLWIDTH_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+[@\x{FF20}][A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("valid full-width email regex")
});

static OBFUSCATED_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[a-z0-9._%+-]+(?:\s*[\(\[]\s*at\s*[\)\]]\s*|\s+at\s+)[a-z0-9-]+(?:(?:\s*[\(\[]\s*dot\s*[\)\]]\s*|\s+dot\s+)[a-z0-9-]+)+",
    )
    .expect("valid obfuscated email regex")
});
static AT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[]\s*at\s*[\)\]]\s*|\s+at\s+").expect("valid at-token regex")
});
static DOT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[]\s*dot\s*[\)\]]\s*|\s+dot\s+").expect("valid dot-token regex")
});

const CONTEXT_KEYWORDS: &[&str] = &["email", "e-mail", "mail", "contact"];

/// One step of the email cascade.
pub(crate) struct EmailStrategy {
    pub name: &'static str,
    pub extract: fn(&str) -> Option<String>,
}

/// Strategies in the order they are tried; the first hit wins.
pub(crate) const EMAIL_STRATEGIES: &[EmailStrategy] = &[
    EmailStrategy {
        name: "standard",
        extract: standard_email,
    },
    EmailStrategy {
        name: "fullwidth_at",
        extract: fullwidth_email,
    },
    EmailStrategy {
        name: "obfuscated",
        extract: obfuscated_email,
    },
    EmailStrategy {
        name: "context_lines",
        extract: context_line_email,
    },
];

fn standard_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

fn fullwidth_email(text: &str) -> Option<String> {
    FULLWIDTH_EMAIL_RE
        .find(text)
        .map(|m| m.as_str().replace('\u{FF20}', "@"))
}

/// Rewrites `name (at) domain (dot) tld` and its bracketed or bare variants.
fn obfuscated_email(text: &str) -> Option<String> {
    let matched = OBFUSCATED_EMAIL_RE.find(text)?.as_str();
    let rewritten = AT_TOKEN_RE.replace(matched, "@");
    let rewritten = DOT_TOKEN_RE.replace_all(&rewritten, ".");
    let candidate: String = rewritten.chars().filter(|c| !c.is_whitespace()).collect();

    // The rewrite must land on the same shape the standard pattern accepts.
    EMAIL_RE
        .find(&candidate)
        .filter(|m| m.start() == 0 && m.end() == candidate.len())
        .map(|m| m.as_str().to_string())
}

fn context_line_email(text: &str) -> Option<String> {
    text.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            CONTEXT_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .find_map(standard_email)
}

/// Runs the email cascade against `text`.
///
/// Returns `None` when no strategy matches; an address is never guessed.
pub(crate) fn extract_email(text: &str) -> Option<String> {
    for strategy in EMAIL_STRATEGIES {
        if let Some(email) = (strategy.extract)(text) {
            let email = email.trim().to_string();
            if !email.is_empty() {
                tracing::debug!("Email matched by '{}' strategy", strategy.name);
                return Some(email);
            }
        }
    }
    tracing::debug!("No email strategy matched ({} chars)", text.len());
    None
}
