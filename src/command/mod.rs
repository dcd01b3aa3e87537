//! Outbound IRC commands.
//!
//! Every line the client writes is built as a [`Command`] and rendered by
//! its `Display` implementation, without the CRLF terminator.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - IRCv3 capability negotiation: <https://ircv3.net/specs/extensions/capability-negotiation>

mod serialize;

/// IRC command with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `STARTTLS`
    STARTTLS,
    /// `CAP LS`
    CapLs,
    /// `CAP REQ :caps`
    CapReq(Vec<String>),
    /// `CAP END`
    CapEnd,
    /// `AUTHENTICATE data`
    AUTHENTICATE(String),
    /// `USER username local-host server-host :realname`
    USER(String, String, String, String),
    /// `NICK nickname`
    NICK(String),
    /// `JOIN channel [key]`
    JOIN(String, Option<String>),
    /// `PART channel [:message]`
    PART(String, Option<String>),
    /// `PRIVMSG target :text`
    PRIVMSG(String, String),
    /// `NOTICE target :text`
    NOTICE(String, String),
    /// `PONG token`, the token echoed exactly as the PING carried it.
    PONG(String),
    /// `QUIT :message`
    QUIT(String),
    /// A line written as-is.
    Raw(String),
}

impl Command {
    /// The command name as it appears on the wire.
    pub fn name(&self) -> &str {
        match self {
            Command::STARTTLS => "STARTTLS",
            Command::CapLs | Command::CapReq(_) | Command::CapEnd => "CAP",
            Command::AUTHENTICATE(_) => "AUTHENTICATE",
            Command::USER(..) => "USER",
            Command::NICK(_) => "NICK",
            Command::JOIN(..) => "JOIN",
            Command::PART(..) => "PART",
            Command::PRIVMSG(..) => "PRIVMSG",
            Command::NOTICE(..) => "NOTICE",
            Command::PONG(_) => "PONG",
            Command::QUIT(_) => "QUIT",
            Command::Raw(line) => line.split(' ').next().unwrap_or(""),
        }
    }

    /// Whether the rendered line carries credentials and must not be logged verbatim.
    pub fn is_sensitive(&self) -> bool {
        match self {
            Command::AUTHENTICATE(data) => data != "PLAIN" && data != "+" && data != "*",
            _ => false,
        }
    }
}
