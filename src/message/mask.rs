//! Message source masks (`nick!user@host`).

use std::fmt;

/// A borrowed `nick!user@host` mask.
///
/// Missing pieces are empty, never absent: `irc.example.net` parses to a
/// mask whose nickname is the server name and whose user and host are
/// empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskRef<'a> {
    pub nick: &'a str,
    pub user: &'a str,
    pub host: &'a str,
}

impl<'a> MaskRef<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.strip_prefix(':').unwrap_or(raw);

        let (rest, host) = match raw.split_once('@') {
            Some((rest, host)) => (rest, host),
            None => (raw, ""),
        };
        let (nick, user) = match rest.split_once('!') {
            Some((nick, user)) => (nick, user),
            None => (rest, ""),
        };

        Self { nick, user, host }
    }

    /// Whether this looks like a server name rather than a user.
    pub fn is_server(&self) -> bool {
        self.user.is_empty() && self.host.is_empty() && self.nick.contains('.')
    }

    pub fn to_mask(&self) -> Mask {
        Mask {
            nick: self.nick.to_owned(),
            user: self.user.to_owned(),
            host: self.host.to_owned(),
        }
    }
}

/// An owned mask, carried by events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mask {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl Mask {
    pub fn parse(raw: &str) -> Self {
        MaskRef::parse(raw).to_mask()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)?;
        if !self.user.is_empty() {
            write!(f, "!{}", self.user)?;
        }
        if !self.host.is_empty() {
            write!(f, "@{}", self.host)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mask() {
        let mask = MaskRef::parse("alice!ali@example.org");
        assert_eq!(mask.nick, "alice");
        assert_eq!(mask.user, "ali");
        assert_eq!(mask.host, "example.org");
        assert!(!mask.is_server());
    }

    #[test]
    fn test_server_name() {
        let mask = MaskRef::parse("irc.example.net");
        assert_eq!(mask.nick, "irc.example.net");
        assert!(mask.is_server());
    }

    #[test]
    fn test_partial_masks() {
        assert_eq!(Mask::parse("bob@host").to_string(), "bob@host");
        assert_eq!(Mask::parse("bob!b").to_string(), "bob!b");
        assert_eq!(Mask::parse(":carol").nick, "carol");
    }
}
