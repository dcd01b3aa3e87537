//! Configuration lookup.
//!
//! A client is built from two layers of keys: a per-server layer that
//! overrides a shared defaults layer. Keys are looked up by path
//! (`SASL.Account` is `["SASL", "Account"]`) and match case-insensitively.
//! [`Settings::from_source`] turns any [`ConfigSource`] into typed
//! settings with the defaults applied.
//!
//! # Example
//!
//! ```
//! use slirc_client::config::{Layered, Settings, TomlSource};
//!
//! let defaults: TomlSource = r#"
//!     Port = 6697
//!     SSL = true
//!     AltNick = "helper"
//! "#.parse().unwrap();
//! let server: TomlSource = r#"
//!     Hostname = "irc.example.net"
//!     Nick = "bot"
//!     [SASL]
//!     Password = "hunter2"
//! "#.parse().unwrap();
//!
//! let settings = Settings::from_source(&Layered::new(server, &defaults)).unwrap();
//! assert_eq!(settings.port, 6697);
//! assert_eq!(settings.alt_nick, "helper");
//! assert_eq!(settings.sasl_account, "bot");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Hierarchical key lookup.
pub trait ConfigSource {
    /// The scalar value at `path`, rendered as a string.
    fn lookup(&self, path: &[&str]) -> Option<String>;

    /// The values of a list at `path`; a scalar counts as a list of one.
    fn list(&self, path: &[&str]) -> Vec<String>;

    /// The names of the sub-sections below `path`.
    fn children(&self, path: &[&str]) -> Vec<String>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn lookup(&self, path: &[&str]) -> Option<String> {
        (**self).lookup(path)
    }

    fn list(&self, path: &[&str]) -> Vec<String> {
        (**self).list(path)
    }

    fn children(&self, path: &[&str]) -> Vec<String> {
        (**self).children(path)
    }
}

/// Two sources, the primary overriding the secondary key by key.
#[derive(Debug, Clone)]
pub struct Layered<P, S> {
    pub primary: P,
    pub secondary: S,
}

impl<P: ConfigSource, S: ConfigSource> Layered<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: ConfigSource, S: ConfigSource> ConfigSource for Layered<P, S> {
    fn lookup(&self, path: &[&str]) -> Option<String> {
        self.primary
            .lookup(path)
            .or_else(|| self.secondary.lookup(path))
    }

    fn list(&self, path: &[&str]) -> Vec<String> {
        let primary = self.primary.list(path);
        if primary.is_empty() {
            self.secondary.list(path)
        } else {
            primary
        }
    }

    fn children(&self, path: &[&str]) -> Vec<String> {
        let mut names = self.primary.children(path);
        for name in self.secondary.children(path) {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
        }
        names
    }
}

/// A source backed by a TOML document.
#[derive(Debug, Clone, Default)]
pub struct TomlSource {
    table: toml::Table,
}

impl TomlSource {
    pub fn from_table(table: toml::Table) -> Self {
        Self { table }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    pub fn table(&self) -> &toml::Table {
        &self.table
    }

    /// The sub-table at `path` as a source of its own.
    pub fn section(&self, path: &[&str]) -> Option<TomlSource> {
        self.get(path)?.as_table().cloned().map(Self::from_table)
    }

    fn get(&self, path: &[&str]) -> Option<&toml::Value> {
        let (last, parents) = path.split_last()?;
        let mut table = &self.table;
        for segment in parents {
            table = find(table, segment)?.as_table()?;
        }
        find(table, last)
    }
}

impl FromStr for TomlSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            table: s.parse::<toml::Table>()?,
        })
    }
}

fn find<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    table.get(key).or_else(|| {
        table
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

impl ConfigSource for TomlSource {
    fn lookup(&self, path: &[&str]) -> Option<String> {
        self.get(path).and_then(scalar)
    }

    fn list(&self, path: &[&str]) -> Vec<String> {
        match self.get(path) {
            Some(toml::Value::Array(items)) => items.iter().filter_map(scalar).collect(),
            Some(value) => scalar(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn children(&self, path: &[&str]) -> Vec<String> {
        let table = if path.is_empty() {
            Some(&self.table)
        } else {
            self.get(path).and_then(toml::Value::as_table)
        };
        table
            .map(|t| {
                t.iter()
                    .filter(|(_, v)| v.is_table())
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Per-channel entry of the `Channels` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub name: String,
    pub auto_join: bool,
    /// Grouping used by [`Client::broadcast`](crate::Client::broadcast);
    /// negative means the channel is left as soon as it is joined.
    pub kind: i32,
    pub key: Option<String>,
}

/// Typed client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hostname: String,
    pub port: u16,
    pub ssl: bool,
    pub starttls: bool,
    /// PEM client certificate chain.
    pub certificate: Option<PathBuf>,
    /// PEM private key for the client certificate.
    pub key: Option<PathBuf>,
    pub nick: String,
    pub alt_nick: String,
    pub realname: String,
    pub sasl_account: String,
    pub sasl_password: Option<String>,
    pub auto_part_message: String,
    pub auto_join_on_kick: bool,
    pub auto_reconnect_delay: Duration,
    /// Negative means unlimited.
    pub max_reconnect_attempts: i32,
    /// Type of channels not listed in `Channels`.
    pub default_channel_type: i32,
    pub print_output: bool,
    pub log_file: Option<PathBuf>,
    pub client_address: Option<String>,
    pub client_port: Option<u16>,
    pub channels: Vec<ChannelSettings>,
    /// Lines sent verbatim once registered, before auto-joins.
    pub raw_lines: Vec<String>,
}

pub const DEFAULT_PORT: u16 = 6667;
pub const DEFAULT_TLS_PORT: u16 = 6697;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(30);

impl Settings {
    /// Settings with every default applied.
    pub fn new(hostname: &str, nick: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            port: DEFAULT_PORT,
            ssl: false,
            starttls: true,
            certificate: None,
            key: None,
            nick: nick.to_owned(),
            alt_nick: format!("{nick}_"),
            realname: nick.to_owned(),
            sasl_account: nick.to_owned(),
            sasl_password: None,
            auto_part_message: String::new(),
            auto_join_on_kick: false,
            auto_reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: -1,
            default_channel_type: 0,
            print_output: false,
            log_file: None,
            client_address: None,
            client_port: None,
            channels: Vec::new(),
            raw_lines: Vec::new(),
        }
    }

    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let hostname = required(source, "Hostname")?;
        let nick = required(source, "Nick")?;
        let mut settings = Settings::new(&hostname, &nick);

        settings.ssl = flag(source, &["SSL"])?.unwrap_or(false);
        settings.port = number(source, &["Port"])?.unwrap_or(if settings.ssl {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_PORT
        });
        settings.starttls = flag(source, &["STARTTLS"])?.unwrap_or(true);
        settings.certificate = source
            .lookup(&["Certificate"])
            .or_else(|| source.lookup(&["Cert"]))
            .map(PathBuf::from);
        settings.key = source.lookup(&["Key"]).map(PathBuf::from);

        if let Some(alt) = source.lookup(&["AltNick"]) {
            settings.alt_nick = alt;
        }
        if let Some(real) = source.lookup(&["RealName"]) {
            settings.realname = real;
        }
        if let Some(account) = source.lookup(&["SASL", "Account"]) {
            settings.sasl_account = account;
        }
        settings.sasl_password = source
            .lookup(&["SASL", "Password"])
            .or_else(|| source.lookup(&["SASL", "Pass"]))
            .filter(|p| !p.is_empty());

        if let Some(message) = source.lookup(&["AutoPartMessage"]) {
            settings.auto_part_message = message;
        }
        settings.auto_join_on_kick = flag(source, &["AutoJoinOnKick"])?.unwrap_or(false);
        if let Some(secs) = number::<u64>(source, &["AutoReconnectDelay"])? {
            settings.auto_reconnect_delay = Duration::from_secs(secs);
        }
        settings.max_reconnect_attempts =
            number(source, &["MaxReconnectAttempts"])?.unwrap_or(-1);
        settings.default_channel_type = number(source, &["Channel", "Type"])?.unwrap_or(0);
        settings.print_output = flag(source, &["PrintOutput"])?.unwrap_or(false);
        settings.log_file = source.lookup(&["LogFile"]).map(PathBuf::from);
        settings.client_address = source.lookup(&["ClientAddress"]).filter(|a| !a.is_empty());
        settings.client_port = number(source, &["ClientPort"])?;
        settings.raw_lines = source.list(&["RawLines"]);

        for name in source.children(&["Channels"]) {
            let path = |key| ["Channels", name.as_str(), key];
            settings.channels.push(ChannelSettings {
                auto_join: flag(source, &path("AutoJoin"))?.unwrap_or(false),
                kind: number(source, &path("Type"))?.unwrap_or(settings.default_channel_type),
                key: source.lookup(&path("Key")).filter(|k| !k.is_empty()),
                name,
            });
        }

        Ok(settings)
    }

    /// The configured entry for `channel`, if any.
    pub fn channel(&self, channel: &str) -> Option<&ChannelSettings> {
        self.channels
            .iter()
            .find(|c| crate::casemap::irc_eq(&c.name, channel))
    }

    /// The type of `channel`, falling back to `Channel.Type`.
    pub fn channel_type(&self, channel: &str) -> i32 {
        self.channel(channel)
            .map_or(self.default_channel_type, |c| c.kind)
    }
}

fn required(source: &dyn ConfigSource, key: &'static str) -> Result<String, ConfigError> {
    source
        .lookup(&[key])
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn flag(source: &dyn ConfigSource, path: &[&str]) -> Result<Option<bool>, ConfigError> {
    let Some(value) = source.lookup(path) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        _ => Err(invalid(path, value)),
    }
}

fn number<T: FromStr>(source: &dyn ConfigSource, path: &[&str]) -> Result<Option<T>, ConfigError> {
    match source.lookup(path) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(path, value)),
        None => Ok(None),
    }
}

fn invalid(path: &[&str], value: String) -> ConfigError {
    ConfigError::Invalid {
        key: path.join("."),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> TomlSource {
        text.parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_source(&source(
            r##"
            Hostname = "irc.example.net"
            Nick = "bot"
            "##,
        ))
        .unwrap();

        assert_eq!(settings.port, 6667);
        assert!(!settings.ssl);
        assert!(settings.starttls);
        assert_eq!(settings.alt_nick, "bot_");
        assert_eq!(settings.realname, "bot");
        assert_eq!(settings.sasl_account, "bot");
        assert_eq!(settings.sasl_password, None);
        assert_eq!(settings.auto_reconnect_delay, Duration::from_secs(30));
        assert_eq!(settings.max_reconnect_attempts, -1);
        assert!(settings.channels.is_empty());
    }

    #[test]
    fn test_ssl_changes_default_port() {
        let settings = Settings::from_source(&source(
            "Hostname = 'h'\nNick = 'n'\nSSL = 'yes'",
        ))
        .unwrap();
        assert!(settings.ssl);
        assert_eq!(settings.port, 6697);
    }

    #[test]
    fn test_missing_required() {
        let err = Settings::from_source(&source("Nick = 'n'")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("Hostname")));
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_source(&source("Hostname = 'h'\nNick = 'n'\nPort = 'abc'"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "Port"));

        let err = Settings::from_source(&source("Hostname = 'h'\nNick = 'n'\nSSL = 'maybe'"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_layered_override() {
        let defaults = source(
            r##"
            Port = 7000
            MaxReconnectAttempts = 5
            [Channels."#help"]
            AutoJoin = true
            "##,
        );
        let server = source(
            r##"
            hostname = "irc.example.net"
            Nick = "bot"
            MaxReconnectAttempts = 2
            RawLines = ["MODE bot +B", "PRIVMSG NickServ :hello"]
            [sasl]
            pass = "secret"
            [Channels."#rust"]
            AutoJoin = 1
            Type = 3
            Key = "k"
            "##,
        );
        let layered = Layered::new(server, &defaults);
        let settings = Settings::from_source(&layered).unwrap();

        assert_eq!(settings.port, 7000);
        assert_eq!(settings.max_reconnect_attempts, 2);
        assert_eq!(settings.sasl_password.as_deref(), Some("secret"));
        assert_eq!(settings.raw_lines.len(), 2);
        assert_eq!(settings.channels.len(), 2);

        let rust = settings.channel("#RUST").unwrap();
        assert!(rust.auto_join);
        assert_eq!(rust.kind, 3);
        assert_eq!(rust.key.as_deref(), Some("k"));
        assert_eq!(settings.channel_type("#help"), 0);
        assert_eq!(settings.channel_type("#elsewhere"), 0);
    }

    #[test]
    fn test_channel_type_default_applies() {
        let settings = Settings::from_source(&source(
            r##"
            Hostname = "h"
            Nick = "n"
            [Channel]
            Type = -1
            [Channels."#quiet"]
            AutoJoin = true
            "##,
        ))
        .unwrap();
        assert_eq!(settings.channel_type("#quiet"), -1);
        assert_eq!(settings.channel_type("#other"), -1);
    }

    #[test]
    fn test_sections_layer_over_defaults() {
        let file = source(
            r##"
            [defaults]
            Nick = "bot"
            Port = 7000

            [servers.libera]
            Hostname = "irc.libera.chat"
            Port = 6697
            SSL = true
            "##,
        );
        let defaults = file.section(&["defaults"]).unwrap();
        let server = file.section(&["servers", "libera"]).unwrap();
        assert!(file.section(&["servers", "oftc"]).is_none());

        let settings = Settings::from_source(&Layered::new(server, defaults)).unwrap();
        assert_eq!(settings.hostname, "irc.libera.chat");
        assert_eq!(settings.nick, "bot");
        assert_eq!(settings.port, 6697);
        assert!(settings.ssl);
    }
}
