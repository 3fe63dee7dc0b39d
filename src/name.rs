//! Guesses a person's name from the leading line of a document.

use crate::models::NameGuess;

/// Takes the first non-empty line and splits it on whitespace.
///
/// Two or more tokens give a first and last name (middle tokens are dropped);
/// a single token gives a first name only.
pub(crate) fn guess_name(text: &str) -> NameGuess {
    let Some(first_line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return NameGuess::default();
    };

    let tokens: Vec<&str> = first_line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => NameGuess::default(),
        [only] => NameGuess {
            first: Some(only.to_string()),
            last: None,
        },
        [first, .., last] => NameGuess {
            first: Some(first.to_string()),
            last: Some(last.to_string()),
        },
    }
}
