//! # slirc-client
//!
//! A client-side IRC core: one connection per [`Client`], driven by a
//! cooperative [`Client::think`] loop without an async runtime.
//!
//! ## Features
//!
//! - Registration state machine with STARTTLS, capability negotiation
//!   and SASL PLAIN
//! - Line reassembly over a non-blocking TCP or TLS [`transport`]
//! - Lenient message parsing; malformed lines never fail
//! - Channel and user tracking with prefix ranks from ISUPPORT
//! - Observer dispatch of typed [`Event`]s
//! - Automatic reconnection with a bounded number of attempts

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```no_run
//! use slirc_client::{Client, Observer, Observers, Settings};
//! use slirc_client::message::Mask;
//!
//! struct Echo;
//!
//! impl Observer for Echo {
//!     fn on_chat(&mut self, client: &mut Client, sender: &Mask, target: &str, text: &str) {
//!         if let Some(rest) = text.strip_prefix("!echo ") {
//!             let reply_to = if target.starts_with('#') { target } else { &sender.nick };
//!             client.privmsg(reply_to, rest);
//!         }
//!     }
//! }
//!
//! let mut settings = Settings::new("irc.libera.chat", "echo-bot");
//! settings.ssl = true;
//! settings.port = 6697;
//!
//! let mut client = Client::new(settings);
//! let mut observers = Observers::new();
//! observers.register(Box::new(Echo));
//!
//! client.connect()?;
//! loop {
//!     client.think(&mut observers)?;
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//! }
//! # Ok::<(), slirc_client::ClientError>(())
//! ```
//!
//! ### Parsing IRC Messages
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let message = Message::parse(":nick!user@host PRIVMSG #channel :Hello!");
//! assert_eq!(message.command, "PRIVMSG");
//! assert_eq!(message.sender().nick, "nick");
//! assert_eq!(message.arg(1), "Hello!");
//! ```
//!
//! ## Acknowledgments
//!
//! This project was inspired by the architectural patterns established by
//! [Aaron Weiss (aatxe)](https://github.com/aatxe) in the
//! [irc](https://github.com/aatxe/irc) crate.

pub mod caps;
pub mod casemap;
pub mod client;
pub mod command;
pub mod config;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod isupport;
pub mod line;
pub mod log;
pub mod message;
pub mod mode;
pub mod model;
pub mod response;
pub mod sasl;
pub mod state;
pub mod transport;

pub use self::caps::Capability;
pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::client::Client;
pub use self::command::Command;
pub use self::config::{ConfigSource, Layered, Settings, TomlSource};
pub use self::error::{CertificateError, ClientError, ConfigError, Result, TransportError};
pub use self::event::{Event, Observer, ObserverId, Observers};
pub use self::isupport::{Isupport, ServerSupport};
pub use self::line::{LineBuffer, MAX_IRC_LINE_LEN};
pub use self::message::{Mask, MaskRef, Message};
pub use self::mode::ModeChange;
pub use self::model::{Channel, Membership, Roster, User};
pub use self::response::Response;
pub use self::state::ConnectionState;
pub use self::transport::{Endpoint, MemoryTransport, NetTransport, Transport};
