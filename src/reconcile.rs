//! Merges the regex candidate and the AI candidate into the final record.
//!
//! Precedence per field:
//! * names: AI, then regex
//! * email: whichever side holds a plausible address, regex first
//! * phone: a country-coded regex value, then a country-coded AI value, then
//!   the side with more digits (ties go to regex)
//! * skills, experience, education, summary: AI only

use crate::models::{ExtractedContactInfo, PartialContact};
use crate::phone_format::{digit_count, format_phone, normalize_phone};

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn plausible_email(value: &Option<String>) -> Option<String> {
    present(value).filter(|v| v.contains('@') && v.contains('.'))
}

fn merge_phone(regex: &Option<String>, ai: &Option<String>) -> Option<String> {
    let regex_phone = present(regex);
    let ai_phone = present(ai);

    if let Some(phone) = regex_phone.as_deref().filter(|p| p.starts_with('+')) {
        return Some(format_phone(&normalize_phone(phone)));
    }

    let ai_normalized = ai_phone.as_deref().map(normalize_phone);
    if let Some(normalized) = ai_normalized.as_deref().filter(|p| p.starts_with('+')) {
        return Some(format_phone(normalized));
    }

    let regex_digits = regex_phone.as_deref().map_or(0, digit_count);
    let ai_digits = ai_phone.as_deref().map_or(0, digit_count);
    if regex_digits == 0 && ai_digits == 0 {
        return None;
    }
    let winner = if regex_digits >= ai_digits {
        regex_phone
    } else {
        ai_phone
    };
    winner.map(|p| normalize_phone(&p))
}

fn prefer_ai<T: Clone>(ai: &[T], regex: &[T]) -> Vec<T> {
    if !ai.is_empty() {
        ai.to_vec()
    } else {
        regex.to_vec()
    }
}

/// Builds a new record from the two candidates. Neither input is modified and
/// a missing value on one side falls back to the other side or to absence.
pub(crate) fn merge(regex: &PartialContact, ai: &PartialContact) -> ExtractedContactInfo {
    ExtractedContactInfo {
        first_name: present(&ai.first_name).or_else(|| present(&regex.first_name)),
        last_name: present(&ai.last_name).or_else(|| present(&regex.last_name)),
        email: plausible_email(&regex.email).or_else(|| plausible_email(&ai.email)),
        phone: merge_phone(&regex.phone, &ai.phone),
        skills: prefer_ai(&ai.skills, &regex.skills),
        experience: prefer_ai(&ai.experience, &regex.experience),
        education: prefer_ai(&ai.education, &regex.education),
        summary: present(&ai.summary).or_else(|| present(&regex.summary)),
    }
}
