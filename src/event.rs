//! Events and the observers that receive them.
//!
//! After a line has been applied to the client's own state, the events it
//! produced are handed first to the client's hook and then to every
//! observer in the [`Observers`] registry, in registration order. The
//! [`Event::Raw`] event for a line is always delivered last.
//!
//! An observer implements only the callbacks it cares about; each has a
//! no-op default. Observers receive the originating [`Client`] mutably so
//! they can answer right away.

use std::fmt;

use crate::client::Client;
use crate::message::Mask;
use crate::mode::ModeChange;

/// Something that happened on a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Event {
    /// Registration completed.
    Connect,
    /// The connection was torn down.
    Disconnect,
    /// A reconnection attempt was made.
    Reconnect { success: bool },
    /// Every received line, after all other events for it.
    Raw { line: String },
    Numeric { code: u16, params: Vec<String> },
    /// The server sent `ERROR`.
    Error { message: String },
    Chat { sender: Mask, target: String, text: String },
    Notice { sender: Mask, target: String, text: String },
    /// A NOTICE from the server itself, or without a source.
    ServerNotice { sender: Option<String>, target: String, text: String },
    /// A CTCP query other than ACTION.
    Ctcp { sender: Mask, target: String, command: String, params: String },
    Action { sender: Mask, target: String, text: String },
    Invite { sender: Mask, channel: String },
    Join { user: Mask, channel: String },
    Part { user: Mask, channel: String, message: String },
    Nick { user: Mask, new_nick: String },
    Kick { kicker: Mask, channel: String, victim: String, reason: String },
    /// `channels` lists the tracked channels the user was in.
    Quit { user: Mask, message: String, channels: Vec<String> },
    Mode { setter: Mask, target: String, changes: Vec<ModeChange> },
}

/// Receives events from clients.
///
/// [`Observer::on_event`] routes to the per-event callbacks; override it
/// to see every event in one place instead.
#[allow(unused_variables)]
pub trait Observer {
    fn on_event(&mut self, client: &mut Client, event: &Event) {
        match event {
            Event::Connect => self.on_connect(client),
            Event::Disconnect => self.on_disconnect(client),
            Event::Reconnect { success } => self.on_reconnect(client, *success),
            Event::Raw { line } => self.on_raw(client, line),
            Event::Numeric { code, params } => self.on_numeric(client, *code, params),
            Event::Error { message } => self.on_error(client, message),
            Event::Chat { sender, target, text } => self.on_chat(client, sender, target, text),
            Event::Notice { sender, target, text } => self.on_notice(client, sender, target, text),
            Event::ServerNotice { sender, target, text } => {
                self.on_server_notice(client, sender.as_deref(), target, text)
            }
            Event::Ctcp { sender, target, command, params } => {
                self.on_ctcp(client, sender, target, command, params)
            }
            Event::Action { sender, target, text } => self.on_action(client, sender, target, text),
            Event::Invite { sender, channel } => self.on_invite(client, sender, channel),
            Event::Join { user, channel } => self.on_join(client, user, channel),
            Event::Part { user, channel, message } => self.on_part(client, user, channel, message),
            Event::Nick { user, new_nick } => self.on_nick(client, user, new_nick),
            Event::Kick { kicker, channel, victim, reason } => {
                self.on_kick(client, kicker, channel, victim, reason)
            }
            Event::Quit { user, message, channels } => self.on_quit(client, user, message, channels),
            Event::Mode { setter, target, changes } => self.on_mode(client, setter, target, changes),
        }
    }

    fn on_connect(&mut self, client: &mut Client) {}
    fn on_disconnect(&mut self, client: &mut Client) {}
    fn on_reconnect(&mut self, client: &mut Client, success: bool) {}
    fn on_raw(&mut self, client: &mut Client, line: &str) {}
    fn on_numeric(&mut self, client: &mut Client, code: u16, params: &[String]) {}
    fn on_error(&mut self, client: &mut Client, message: &str) {}
    fn on_chat(&mut self, client: &mut Client, sender: &Mask, target: &str, text: &str) {}
    fn on_notice(&mut self, client: &mut Client, sender: &Mask, target: &str, text: &str) {}
    fn on_server_notice(&mut self, client: &mut Client, sender: Option<&str>, target: &str, text: &str) {}
    fn on_ctcp(&mut self, client: &mut Client, sender: &Mask, target: &str, command: &str, params: &str) {}
    fn on_action(&mut self, client: &mut Client, sender: &Mask, target: &str, text: &str) {}
    fn on_invite(&mut self, client: &mut Client, sender: &Mask, channel: &str) {}
    fn on_join(&mut self, client: &mut Client, user: &Mask, channel: &str) {}
    fn on_part(&mut self, client: &mut Client, user: &Mask, channel: &str, message: &str) {}
    fn on_nick(&mut self, client: &mut Client, user: &Mask, new_nick: &str) {}
    fn on_kick(&mut self, client: &mut Client, kicker: &Mask, channel: &str, victim: &str, reason: &str) {}
    fn on_quit(&mut self, client: &mut Client, user: &Mask, message: &str, channels: &[String]) {}
    fn on_mode(&mut self, client: &mut Client, setter: &Mask, target: &str, changes: &[ModeChange]) {}
}

/// Handle returned by [`Observers::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// The process-wide observer list, passed explicitly to
/// [`Client::think`].
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn Observer>)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer at the end of the dispatch order.
    pub fn register(&mut self, observer: Box<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer, handing it back.
    pub fn deregister(&mut self, id: ObserverId) -> Option<Box<dyn Observer>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn dispatch(&mut self, client: &mut Client, event: &Event) {
        for (_, observer) in &mut self.entries {
            observer.on_event(client, event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}
