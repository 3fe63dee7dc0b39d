//! Normalizes raw phone candidates to an international `+` form and renders
//! them for display.
//!
//! Neither stage drops digits. Normalization only rewrites a `00` prefix to
//! `+` or drops the single leading zero of a UK national number; formatting
//! only regroups.

/// Keeps digits plus a `+` when it is the first non-space character.
fn clean_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
    out
}

/// Counts ASCII digits in `s`.
pub(crate) fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Converts a raw phone candidate into `+<country><number>` where the country
/// can be inferred, otherwise returns the bare digits.
///
/// Rules, first match wins:
/// * already `+`-prefixed: kept as is
/// * `00351…`: `+351…`
/// * `351…`: `+351…`
/// * 9 digits starting with 9, 2 or 3: Portuguese, `+351…`
/// * single leading `0` with 10 or 11 digits: UK, zero dropped, `+44…`
/// * 10 digits starting with 2-9: US/Canada, `+1…`
///
/// Anything else is returned as digits with no country code asserted.
pub(crate) fn normalize_phone(raw: &str) -> String {
    let cleaned = clean_phone(raw);
    if cleaned.starts_with('+') {
        return cleaned;
    }

    let len = cleaned.len();
    let first = cleaned.chars().next();

    if let Some(rest) = cleaned.strip_prefix("00351") {
        return format!("+351{rest}");
    }
    if cleaned.starts_with("351") {
        return format!("+{cleaned}");
    }
    if len == 9 && matches!(first, Some('9' | '2' | '3')) {
        return format!("+351{cleaned}");
    }
    if !cleaned.starts_with("00") && (len == 10 || len == 11) {
        if let Some(rest) = cleaned.strip_prefix('0') {
            return format!("+44{rest}");
        }
    }
    if len == 10 && matches!(first, Some('2'..='9')) {
        return format!("+1{cleaned}");
    }

    if !cleaned.is_empty() {
        tracing::debug!("No country rule for {}-digit phone; keeping bare digits", len);
    }
    cleaned
}

/// Expected national length and digit grouping for each recognised prefix.
struct CountryLayout {
    prefix: &'static str,
    national_digits: usize,
    render: fn(&str) -> String,
}

const LAYOUTS: &[CountryLayout] = &[
    CountryLayout {
        prefix: "351",
        national_digits: 9,
        render: |n| format!("+351 {} {} {}", &n[..3], &n[3..6], &n[6..]),
    },
    CountryLayout {
        prefix: "44",
        national_digits: 10,
        render: |n| format!("+44 {} {}", &n[..4], &n[4..]),
    },
    CountryLayout {
        prefix: "1",
        national_digits: 10,
        render: |n| format!("+1 ({}) {}-{}", &n[..3], &n[3..6], &n[6..]),
    },
];

/// Regroups a normalized phone number for display.
///
/// Only `+`-prefixed numbers with a recognised country code and the exact
/// national length are regrouped; everything else is returned unchanged.
pub(crate) fn format_phone(normalized: &str) -> String {
    let trimmed = normalized.trim();
    if !trimmed.starts_with('+') {
        return normalized.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    for layout in LAYOUTS {
        if let Some(national) = digits.strip_prefix(layout.prefix) {
            if national.len() == layout.national_digits {
                return (layout.render)(national);
            }
            break;
        }
    }
    normalized.to_string()
}
