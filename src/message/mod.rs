//! Parsed IRC lines.
//!
//! A line splits into an optional source, a command (a name such as
//! `PRIVMSG` or a three-digit numeric) and its parameters. Parsing never
//! fails: a malformed line simply has empty fields, and [`Message::arg`]
//! answers `""` for parameters that are not there.

mod mask;
mod nom_parser;

pub use self::mask::{Mask, MaskRef};

use self::nom_parser::ParsedMessage;
use crate::response::Response;

/// One parsed line, borrowing from the line text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message<'a> {
    /// The full line, terminator excluded.
    pub raw: &'a str,
    /// IRCv3 tags, unparsed.
    pub tags: Option<&'a str>,
    /// The source after the leading `:`, if the line had one.
    pub source: Option<&'a str>,
    /// Command name or numeric.
    pub command: &'a str,
    /// Parameters, trailing included.
    pub params: Vec<&'a str>,
}

impl<'a> Message<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim_end_matches(['\r', '\n']);
        let parsed = ParsedMessage::parse(raw);

        Message {
            raw,
            tags: parsed.tags,
            source: parsed.prefix,
            command: parsed.command,
            params: parsed.params,
        }
    }

    /// The numeric code, when the command is made of digits only.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.is_empty() || !self.command.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.command.parse().ok()
    }

    /// The numeric as a known [`Response`].
    pub fn response(&self) -> Option<Response> {
        self.numeric().and_then(Response::from_code)
    }

    /// Case-insensitive command comparison.
    pub fn is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// Parameter `index`, or `""` when absent.
    pub fn arg(&self, index: usize) -> &'a str {
        self.params.get(index).copied().unwrap_or("")
    }

    /// The last parameter, or `""` when there is none.
    pub fn trailing(&self) -> &'a str {
        self.params.last().copied().unwrap_or("")
    }

    /// The source split into nick, user and host.
    pub fn sender(&self) -> MaskRef<'a> {
        MaskRef::parse(self.source.unwrap_or(""))
    }

    /// The text after the command, as it appeared on the wire.
    pub fn remainder(&self) -> &'a str {
        let mut rest = self.raw.trim_start();
        if self.tags.is_some() {
            rest = skip_token(rest);
        }
        if self.source.is_some() {
            rest = skip_token(rest);
        }
        skip_token(rest)
    }
}

fn skip_token(s: &str) -> &str {
    s.split_once(' ')
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or("")
}
