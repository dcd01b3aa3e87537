//! IRCv3 capability negotiation support.
//!
//! The client only ever asks for a fixed subset of capabilities, and only
//! for those the server actually offered in its `CAP LS` reply.
//!
//! # Reference
//! - IRCv3 Capability Negotiation: <https://ircv3.net/specs/extensions/capability-negotiation>

use std::collections::HashSet;

/// Known IRCv3 capability types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Show all user prefix modes in NAMES
    MultiPrefix,
    /// SASL authentication
    Sasl,
    /// Full nick!user@host in NAMES
    UserhostInNames,
    /// Any capability the client does not act on
    Custom(String),
}

/// The capabilities the client requests, in request order.
pub const REQUESTED: [Capability; 3] = [
    Capability::MultiPrefix,
    Capability::Sasl,
    Capability::UserhostInNames,
];

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        match self {
            Self::MultiPrefix => "multi-prefix",
            Self::Sasl => "sasl",
            Self::UserhostInNames => "userhost-in-names",
            Self::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "multi-prefix" => Self::MultiPrefix,
            "sasl" => Self::Sasl,
            "userhost-in-names" => Self::UserhostInNames,
            _ => Self::Custom(s.to_string()),
        }
    }
}

/// Parse a space-separated capability list as sent in `CAP LS`/`ACK`/`NAK`.
///
/// Values (`sasl=PLAIN,EXTERNAL`) are dropped. A leading `-` marks a
/// capability being disabled and is reported through the boolean.
pub fn parse_list(list: &str) -> Vec<(Capability, bool)> {
    list.split_ascii_whitespace()
        .map(|token| {
            let (enabled, token) = match token.strip_prefix('-') {
                Some(rest) => (false, rest),
                None => (true, token.trim_start_matches(['~', '='])),
            };
            let name = token.split_once('=').map_or(token, |(name, _)| name);
            (Capability::from(name), enabled)
        })
        .collect()
}

/// Pick what to `CAP REQ` from the offered set.
///
/// `sasl` is only requested when the client has a password to use.
pub fn select(offered: &HashSet<Capability>, want_sasl: bool) -> Vec<Capability> {
    REQUESTED
        .iter()
        .filter(|cap| offered.contains(cap))
        .filter(|cap| want_sasl || **cap != Capability::Sasl)
        .cloned()
        .collect()
}

/// Accumulates a possibly multi-line `CAP LS` reply.
#[derive(Clone, Debug, Default)]
pub struct LsAccumulator {
    offered: HashSet<Capability>,
}

impl LsAccumulator {
    /// Feed the parameters following `LS` of one `CAP` reply.
    ///
    /// Returns the complete offer once the last line has arrived. A
    /// continuation line carries `*` before the list.
    pub fn feed(&mut self, params: &[&str]) -> Option<HashSet<Capability>> {
        let (more, list) = match params {
            ["*", list, ..] => (true, *list),
            [list, ..] => (false, *list),
            [] => (false, ""),
        };
        self.offered
            .extend(parse_list(list).into_iter().map(|(cap, _)| cap));

        if more {
            None
        } else {
            Some(std::mem::take(&mut self.offered))
        }
    }

    pub fn clear(&mut self) {
        self.offered.clear();
    }
}
