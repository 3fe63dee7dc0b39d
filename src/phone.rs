//! Finds a plausible phone number in document text.
//!
//! The cascade runs every pattern against the whole text first, then against
//! lines that carry a phone keyword, then falls back to raw digit runs on those
//! lines and finally to a bare Portuguese mobile shape. The result is returned
//! as matched; normalization is a separate stage (see `phone_format`).

use crate::phone_format::digit_count;
use once_cell::sync::Lazy;
use regex::Regex;

/// One pattern of the phone cascade.
pub(crate) struct PhonePattern {
    pub name: &'static str,
    pub regex: &'static Lazy<Regex>,
}

static INTERNATIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+|\b00)\d{1,4}(?:[ \t.\-]?\(?\d{1,4}\)?){1,5}")
        .expect("valid international phone regex")
});
static PORTUGAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?:\+|\b00)351[ \t.\-]?[923]\d{2}[ \t.\-]?\d{3}[ \t.\-]?\d{3}\b|\b[923]\d{2}[ \t.\-]?\d{3}[ \t.\-]?\d{3}\b)",
    )
    .expect("valid Portugal phone regex")
});
static UK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+44|\b0044|\b0)[ \t]?\(?\d{2,4}\)?[ \t.\-]?\d{3,4}[ \t.\-]?\d{3,4}\b")
        .expect("valid UK phone regex")
});
static US_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\+1|\b1)[ \t.\-]?)?(?:\(\d{3}\)|\b\d{3})[ \t.\-]?\d{3}[ \t.\-]?\d{4}\b")
        .expect("valid US phone regex")
});
static GENERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d(?:[ \t.\-]?\d){9,14}\b").expect("valid generic phone regex")
});
static PORTUGUESE_MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b9\d{8}\b").expect("valid Portuguese mobile regex"));

/// Patterns in the order they are tried.
pub(crate) static PHONE_PATTERNS: &[PhonePattern] = &[
    PhonePattern {
        name: "international",
        regex: &INTERNATIONAL_RE,
    },
    PhonePattern {
        name: "portugal",
        regex: &PORTUGAL_RE,
    },
    PhonePattern {
        name: "uk",
        regex: &UK_RE,
    },
    PhonePattern {
        name: "us_canada",
        regex: &US_RE,
    },
    PhonePattern {
        name: "generic",
        regex: &GENERIC_RE,
    },
];

const CONTEXT_KEYWORDS: &[&str] = &["mobile", "phone", "tel", "contact"];
const MIN_CONTEXT_DIGITS: usize = 9;
/// Shorter hits are version numbers or years ("C++11", "+2015"), not phones.
const MIN_PATTERN_DIGITS: usize = 7;

fn run_patterns(text: &str) -> Option<(&'static str, String)> {
    PHONE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .regex
            .find_iter(text)
            .find(|m| digit_count(m.as_str()) >= MIN_PATTERN_DIGITS)
            .map(|m| (pattern.name, m.as_str().trim().to_string()))
    })
}

fn context_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            CONTEXT_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .collect()
}

/// Keeps only digits and `+` from a keyword line.
fn raw_digit_run(line: &str) -> Option<String> {
    let kept: String = line
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    (digit_count(&kept) >= MIN_CONTEXT_DIGITS).then_some(kept)
}

/// Runs the phone cascade against `text` and returns the first match, trimmed.
pub(crate) fn extract_phone(text: &str) -> Option<String> {
    if let Some((name, phone)) = run_patterns(text) {
        tracing::debug!("Phone matched by '{}' pattern on full text", name);
        return Some(phone);
    }

    let lines = context_lines(text);
    for line in &lines {
        if let Some((name, phone)) = run_patterns(line) {
            tracing::debug!("Phone matched by '{}' pattern on keyword line", name);
            return Some(phone);
        }
    }
    for line in &lines {
        if let Some(phone) = raw_digit_run(line) {
            tracing::debug!("Phone taken from raw digits on keyword line");
            return Some(phone);
        }
    }

    if let Some(m) = PORTUGUESE_MOBILE_RE.find(text) {
        tracing::debug!("Phone matched bare Portuguese mobile shape");
        return Some(m.as_str().to_string());
    }

    tracing::debug!("No phone pattern matched ({} chars)", text.len());
    None
}
