//! IRC case-mapping functions.
//!
//! Nicknames and channel names are compared case-insensitively with the
//! `rfc1459` mapping, where `[]\~` are the uppercase forms of `{}|^`.
//! Every key in the user table and in channel membership tables goes
//! through [`irc_to_lower`].

#[inline]
fn fold(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => c.to_ascii_lowercase(),
        _ => c,
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(fold).collect()
}

/// Compare two strings using IRC case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().zip(b.chars()).all(|(ca, cb)| fold(ca) == fold(cb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_mapping() {
        assert_eq!(irc_to_lower("Nick[Away]"), "nick{away}");
        assert_eq!(irc_to_lower("a\\b~c"), "a|b^c");
    }

    #[test]
    fn test_eq() {
        assert!(irc_eq("NICK[]", "nick{}"));
        assert!(irc_eq("#Rust", "#rust"));
        assert!(!irc_eq("nick", "nick_"));
    }
}
