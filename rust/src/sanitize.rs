//! Allow-list sanitizer for free-text values bound for a SQL Server query.
//! Apostrophes are passed through untouched; escaping them is the caller's job.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("input exceeds max length of {max}")]
    TooLong { max: usize },
    #[error("cannot sanitize an empty string")]
    Empty,
    #[error("input contained only disallowed characters")]
    OnlyDisallowed,
}

/// Apostrophe, space, and ASCII letters and digits.
pub const SQL_SERVER_ALLOWED: &[char] = &[
    '\'', ' ', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q',
    'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J',
    'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2',
    '3', '4', '5', '6', '7', '8', '9',
];

/// Drops every character of `input` that is not in `allowed`. The length
/// limit applies to the input before anything is removed.
pub fn sanitize(input: &str, max_length: usize, allowed: &[char]) -> Result<String, SanitizeError> {
    if input.chars().count() > max_length {
        return Err(SanitizeError::TooLong { max: max_length });
    }
    if input.trim().is_empty() {
        return Err(SanitizeError::Empty);
    }

    let cleaned: String = input.chars().filter(|c| allowed.contains(c)).collect();
    if cleaned.trim().is_empty() {
        return Err(SanitizeError::OnlyDisallowed);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::{sanitize, SanitizeError, SQL_SERVER_ALLOWED};

    #[test]
    fn strips_disallowed_characters() {
        let cases = [
            ("asdfASDF1234'", "asdfASDF1234'"),
            ("asdf$ASDF%1234'", "asdfASDF1234'"),
            ("asdf$A'SDF%1234'", "asdfA'SDF1234'"),
            ("drop; table", "drop table"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize(input, 100, SQL_SERVER_ALLOWED).unwrap(), expected);
        }
    }

    #[test]
    fn rejects_empty_and_fully_disallowed_input() {
        assert_eq!(sanitize("", 100, SQL_SERVER_ALLOWED), Err(SanitizeError::Empty));
        assert_eq!(sanitize("   ", 100, SQL_SERVER_ALLOWED), Err(SanitizeError::Empty));
        assert_eq!(
            sanitize("!@#$", 100, SQL_SERVER_ALLOWED),
            Err(SanitizeError::OnlyDisallowed)
        );
        assert_eq!(
            sanitize("! @", 100, SQL_SERVER_ALLOWED),
            Err(SanitizeError::OnlyDisallowed)
        );
    }

    #[test]
    fn enforces_max_length() {
        assert_eq!(
            sanitize("asdf", 1, SQL_SERVER_ALLOWED),
            Err(SanitizeError::TooLong { max: 1 })
        );
        assert!(sanitize("asdf", 4, SQL_SERVER_ALLOWED).is_ok());
    }

    #[test]
    fn honors_custom_allow_list() {
        assert_eq!(sanitize("a-b_c", 10, &['a', 'b', 'c', '-']).unwrap(), "a-bc");
    }
}
