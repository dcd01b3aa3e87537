//! Client-To-Client Protocol queries.
//!
//! A CTCP query is a PRIVMSG payload wrapped in `\x01`. `ACTION` is the
//! only one that is really a chat line; every other recognized query gets
//! an automatic NOTICE reply.
//!
//! # Reference
//! - <https://rawgit.com/DanielOaks/irc-rfcs/master/dist/draft-oakley-irc-ctcp-latest.html>

use std::fmt;

const DELIM: char = '\u{1}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action,
    ClientInfo,
    ErrMsg,
    Finger,
    Ping,
    Source,
    Time,
    UserInfo,
    Version,
    Unknown(String),
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        match command.to_uppercase().as_ref() {
            "ACTION" => Command::Action,
            "CLIENTINFO" => Command::ClientInfo,
            "ERRMSG" => Command::ErrMsg,
            "FINGER" => Command::Finger,
            "PING" => Command::Ping,
            "SOURCE" => Command::Source,
            "TIME" => Command::Time,
            "USERINFO" => Command::UserInfo,
            "VERSION" => Command::Version,
            _ => Command::Unknown(command.to_string()),
        }
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        match self {
            Command::Action => "ACTION",
            Command::ClientInfo => "CLIENTINFO",
            Command::ErrMsg => "ERRMSG",
            Command::Finger => "FINGER",
            Command::Ping => "PING",
            Command::Source => "SOURCE",
            Command::Time => "TIME",
            Command::UserInfo => "USERINFO",
            Command::Version => "VERSION",
            Command::Unknown(command) => command.as_ref(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Query<'a> {
    pub command: Command,
    pub params: Option<&'a str>,
}

pub fn is_query(text: &str) -> bool {
    text.starts_with(DELIM)
}

/// Split a `\x01COMMAND params\x01` payload. The closing delimiter is optional.
pub fn parse_query(text: &str) -> Option<Query<'_>> {
    let query = text
        .strip_prefix(DELIM)?
        .trim_end_matches(DELIM);

    let (command, params) = match query.split_once(' ') {
        Some((command, params)) => (command, Some(params)),
        None => (query, None),
    };

    Some(Query {
        command: Command::from(command),
        params,
    })
}

pub fn format(command: &Command, params: Option<impl fmt::Display>) -> String {
    match params {
        Some(params) => format!("{DELIM}{command} {params}{DELIM}"),
        None => format!("{DELIM}{command}{DELIM}"),
    }
}

/// The NOTICE payload answering `query`, or `None` for ACTION.
///
/// `realname` answers FINGER and USERINFO.
pub fn auto_reply(query: &Query<'_>, realname: &str) -> Option<String> {
    let params = query.params.unwrap_or("");
    let reply = match &query.command {
        Command::Action => return None,
        Command::Ping => format(&query.command, Some(params)),
        Command::Version => format(
            &query.command,
            Some(concat!("slirc-client ", env!("CARGO_PKG_VERSION"))),
        ),
        Command::Finger | Command::UserInfo => format(&query.command, Some(realname)),
        Command::Source => format(&query.command, Some(env!("CARGO_PKG_REPOSITORY"))),
        Command::ClientInfo => format(
            &query.command,
            Some("ACTION CLIENTINFO ERRMSG FINGER PING SOURCE TIME USERINFO VERSION"),
        ),
        Command::Time => format(&query.command, Some(chrono::Local::now().to_rfc2822())),
        Command::ErrMsg => format(&query.command, Some(format!("{params} :No error"))),
        Command::Unknown(name) => format(
            &Command::ErrMsg,
            Some(format!("{name} :Unknown query")),
        ),
    };
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let query = parse_query("\u{1}ACTION waves hello\u{1}").unwrap();
        assert_eq!(query.command, Command::Action);
        assert_eq!(query.params, Some("waves hello"));

        let query = parse_query("\u{1}version\u{1}").unwrap();
        assert_eq!(query.command, Command::Version);
        assert_eq!(query.params, None);

        assert!(parse_query("plain text").is_none());
        assert!(is_query("\u{1}PING 1"));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let query = parse_query("\u{1}PING 12345").unwrap();
        assert_eq!(query.command, Command::Ping);
        assert_eq!(query.params, Some("12345"));
    }

    #[test]
    fn test_auto_replies() {
        let ping = parse_query("\u{1}PING 12345\u{1}").unwrap();
        assert_eq!(auto_reply(&ping, "Bot").unwrap(), "\u{1}PING 12345\u{1}");

        let finger = parse_query("\u{1}FINGER\u{1}").unwrap();
        assert_eq!(auto_reply(&finger, "Bot").unwrap(), "\u{1}FINGER Bot\u{1}");

        let version = parse_query("\u{1}VERSION\u{1}").unwrap();
        assert!(auto_reply(&version, "Bot").unwrap().starts_with("\u{1}VERSION slirc-client "));

        let action = parse_query("\u{1}ACTION dances\u{1}").unwrap();
        assert!(auto_reply(&action, "Bot").is_none());
    }

    #[test]
    fn test_unknown_query_reply() {
        let query = parse_query("\u{1}FOO bar\u{1}").unwrap();
        assert_eq!(
            auto_reply(&query, "Bot").unwrap(),
            "\u{1}ERRMSG FOO :Unknown query\u{1}"
        );
    }
}
