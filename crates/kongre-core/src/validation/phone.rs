//! Turkish phone number normalization

/// Normalize a Turkish phone number to its 10 national digits.
///
/// Accepts the `+90`, `0090` and `0` prefixes and ignores spaces, dashes, dots and
/// parentheses. Returns `None` when the remainder is not 10 digits starting with a
/// non-zero digit.
pub fn normalize_turkish_phone(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }

    let national = if plus {
        digits.strip_prefix("90")?
    } else if let Some(rest) = digits.strip_prefix("0090") {
        rest
    } else if digits.len() == 12 && digits.starts_with("90") {
        &digits[2..]
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        &digits
    };

    if national.len() == 10 && !national.starts_with('0') {
        Some(national.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_formats() {
        for input in [
            "+90 532 123 45 67",
            "0532 123 45 67",
            "(0532) 123-45-67",
            "5321234567",
            "905321234567",
            "0090 532 123 4567",
        ] {
            assert_eq!(
                normalize_turkish_phone(input).as_deref(),
                Some("5321234567"),
                "{}",
                input
            );
        }
    }

    #[test]
    fn rejects_wrong_length_or_letters() {
        assert!(normalize_turkish_phone("12345").is_none());
        assert!(normalize_turkish_phone("0532 123 45 678").is_none());
        assert!(normalize_turkish_phone("+1 212 555 0100").is_none());
        assert!(normalize_turkish_phone("0532-ABC-4567").is_none());
        assert!(normalize_turkish_phone("00532 123 45 67").is_none());
    }

    #[test]
    fn digit_count_alone_is_not_enough() {
        // Right length, but no Turkish number starts like this.
        assert!(normalize_turkish_phone("1234567890").is_none());
        assert!(normalize_turkish_phone("12345678901").is_none());
        assert!(normalize_turkish_phone("0012345678").is_none());
        // Trunk-prefixed 11 digits are fine.
        assert_eq!(
            normalize_turkish_phone("05321234567").as_deref(),
            Some("5321234567")
        );
    }
}
