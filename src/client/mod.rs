//! The IRC client.
//!
//! A [`Client`] owns one server connection and everything learned over
//! it. It is driven cooperatively: the host calls [`Client::think`] in a
//! loop, and each call reads at most once from the transport, processes
//! every complete line received so far and returns without blocking.
//!
//! Each line goes through the registration state machine first, then the
//! membership model is updated, and finally the resulting events are
//! handed to the client's hook and to every registered observer.
//!
//! # Example
//!
//! ```no_run
//! use slirc_client::{Client, Observers, Settings};
//!
//! let mut client = Client::new(Settings::new("irc.libera.chat", "slirc-bot"));
//! let mut observers = Observers::new();
//!
//! client.connect()?;
//! loop {
//!     client.think(&mut observers)?;
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//! }
//! # Ok::<(), slirc_client::ClientError>(())
//! ```

mod handlers;
mod reconnect;
mod registration;

use std::cell::Ref;
use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, error, info, warn};

pub use self::reconnect::ReconnectPolicy;
use crate::caps::Capability;
use crate::casemap::irc_eq;
use crate::command::Command;
use crate::config::{ConfigSource, Settings};
use crate::ctcp;
use crate::error::{ClientError, Result, TransportError};
use crate::event::{Event, Observer, Observers};
use crate::isupport::ServerSupport;
use crate::line::LineBuffer;
use crate::log::TrafficLog;
use crate::message::Message;
use crate::model::{Channel, Roster, User};
use crate::state::{
    ConnectionState, HandshakeAction, HandshakeConfig, HandshakeMachine, SaslCredentials,
};
use crate::transport::{Endpoint, NetTransport, Received, TlsSettings, Transport};

/// What to do with the connection after a line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Disconnect,
    /// Disconnect and reconnect at once to the new endpoint.
    Bounce,
}

/// One connection to one IRC server.
pub struct Client {
    settings: Settings,
    transport: Box<dyn Transport>,
    endpoint: Endpoint,
    tls_settings: TlsSettings,
    handshake: HandshakeMachine,
    lines: LineBuffer,
    roster: Roster,
    support: ServerSupport,
    traffic: TrafficLog,
    reconnect: ReconnectPolicy,
    hook: Option<Box<dyn Observer>>,
    /// Set by `quit`: the next disconnect is final.
    dead: bool,
    /// A send failed; the connection is dropped on the next think.
    fault: bool,
}

impl Client {
    /// A client connecting over the network.
    pub fn new(settings: Settings) -> Self {
        Self::with_transport(settings, Box::new(NetTransport::new()))
    }

    /// A client using the given transport.
    pub fn with_transport(settings: Settings, transport: Box<dyn Transport>) -> Self {
        let endpoint = Endpoint {
            host: settings.hostname.clone(),
            port: settings.port,
            tls: settings.ssl,
            bind_address: settings.client_address.clone(),
            bind_port: settings.client_port,
        };
        let tls_settings = TlsSettings {
            certificate: settings.certificate.clone(),
            key: settings.key.clone(),
        };
        let handshake = HandshakeMachine::new(HandshakeConfig {
            nickname: settings.nick.clone(),
            alt_nickname: settings.alt_nick.clone(),
            realname: settings.realname.clone(),
            local_host: "localhost".to_owned(),
            server_host: settings.hostname.clone(),
            starttls: settings.starttls && !settings.ssl,
            sasl: settings.sasl_password.as_ref().map(|password| SaslCredentials {
                account: settings.sasl_account.clone(),
                password: password.clone(),
            }),
        });
        let traffic = TrafficLog::new(settings.print_output, settings.log_file.as_deref());
        let reconnect =
            ReconnectPolicy::new(settings.auto_reconnect_delay, settings.max_reconnect_attempts);

        Self {
            settings,
            transport,
            endpoint,
            tls_settings,
            handshake,
            lines: LineBuffer::new(),
            roster: Roster::new(),
            support: ServerSupport::default(),
            traffic,
            reconnect,
            hook: None,
            dead: false,
            fault: false,
        }
    }

    /// Build a network client from layered configuration.
    pub fn from_config(source: &dyn ConfigSource) -> Result<Self> {
        Ok(Self::new(Settings::from_source(source)?))
    }

    /// Install the client's own hook, called before any registered observer.
    pub fn set_hook(&mut self, hook: Box<dyn Observer>) {
        self.hook = Some(hook);
    }

    /// Open the connection and start registration.
    ///
    /// On failure a retry is scheduled; [`Client::think`] performs it once
    /// the reconnect delay has passed.
    pub fn connect(&mut self) -> Result<()> {
        self.dead = false;
        match self.open() {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(server = %self.endpoint.host, "connect failed: {}", e);
                if !self.reconnect.is_disabled() {
                    self.reconnect.schedule(Instant::now());
                }
                Err(e.into())
            }
        }
    }

    /// Drive the connection: read once, handle every complete line, or
    /// reconnect when due.
    ///
    /// Returns an error only once the reconnection policy has given up.
    pub fn think(&mut self, observers: &mut Observers) -> Result<()> {
        if self.handshake.state() == ConnectionState::Disconnected {
            if self.dead || !self.reconnect.is_due(Instant::now()) {
                return Ok(());
            }
            if self.reconnect.is_exhausted() && !self.reconnect.is_forced() {
                let attempts = self.reconnect.attempts();
                error!(attempts, "giving up reconnecting: never registered");
                self.dead = true;
                return Err(ClientError::ReconnectExhausted {
                    attempts,
                    source: None,
                });
            }
            return self.reconnect(observers);
        }

        if self.fault {
            self.drop_connection(observers);
            return Ok(());
        }

        let closed = match self.transport.receive() {
            Ok(Received::Data(data)) => {
                self.lines.push(data);
                false
            }
            Ok(Received::WouldBlock) => false,
            Ok(Received::Closed) => {
                info!(server = %self.endpoint.host, "connection closed by server");
                true
            }
            Err(e) if e.is_would_block() => false,
            Err(e) => {
                warn!(server = %self.endpoint.host, "connection lost: {}", e);
                true
            }
        };
        if closed {
            self.drop_connection(observers);
            return Ok(());
        }

        while let Some(line) = self.lines.next_line() {
            match self.handle_line(&line, observers) {
                Flow::Continue => {}
                Flow::Disconnect => {
                    self.drop_connection(observers);
                    break;
                }
                Flow::Bounce => {
                    self.reconnect.force();
                    self.drop_connection(observers);
                    break;
                }
            }
            if self.handshake.state() == ConnectionState::Disconnected {
                break;
            }
        }
        Ok(())
    }

    /// Tear the connection down now. A reconnect is scheduled unless the
    /// client has quit.
    pub fn disconnect(&mut self, observers: &mut Observers) {
        if self.handshake.state() != ConnectionState::Disconnected {
            self.drop_connection(observers);
        }
    }

    // === Outbound ===

    pub fn join(&mut self, channel: &str, key: Option<&str>) {
        self.send(Command::JOIN(channel.to_owned(), key.map(str::to_owned)));
    }

    pub fn part(&mut self, channel: &str, message: Option<&str>) {
        self.send(Command::PART(channel.to_owned(), message.map(str::to_owned)));
    }

    pub fn privmsg(&mut self, target: &str, text: &str) {
        self.send(Command::PRIVMSG(target.to_owned(), text.to_owned()));
    }

    pub fn notice(&mut self, target: &str, text: &str) {
        self.send(Command::NOTICE(target.to_owned(), text.to_owned()));
    }

    /// Send a `/me` action.
    pub fn action(&mut self, target: &str, text: &str) {
        let payload = ctcp::format(&ctcp::Command::Action, Some(text));
        self.send(Command::PRIVMSG(target.to_owned(), payload));
    }

    /// Answer a CTCP query.
    pub fn ctcp_reply(&mut self, target: &str, command: &str, params: Option<&str>) {
        let payload = ctcp::format(&ctcp::Command::from(command), params);
        self.send(Command::NOTICE(target.to_owned(), payload));
    }

    /// Leave the server for good: no reconnection follows.
    pub fn quit(&mut self, message: &str) {
        self.dead = true;
        self.send(Command::QUIT(message.to_owned()));
    }

    /// Send a line verbatim.
    pub fn raw(&mut self, line: &str) {
        self.send(Command::Raw(line.to_owned()));
    }

    /// Say `text` in every tracked channel of the given type.
    pub fn broadcast(&mut self, kind: i32, text: &str) {
        let targets: Vec<String> = self
            .roster
            .channels()
            .filter(|c| c.kind() == kind)
            .map(|c| c.name().to_owned())
            .collect();
        for target in targets {
            self.privmsg(&target, text);
        }
    }

    /// Change nickname. Also resumes registration halted by an erroneous
    /// nickname.
    pub fn set_nickname(&mut self, nick: &str) {
        for action in self.handshake.set_nickname(nick) {
            if let HandshakeAction::Send(command) = action {
                self.send(command);
            }
        }
    }

    // === Accessors ===

    pub fn status(&self) -> ConnectionState {
        self.handshake.state()
    }

    pub fn nickname(&self) -> &str {
        self.handshake.nickname()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where the next or current connection goes.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.roster.channel(name)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.roster.channels()
    }

    pub fn user(&self, nick: &str) -> Option<Ref<'_, User>> {
        self.roster.user(nick)
    }

    pub fn users(&self) -> impl Iterator<Item = Ref<'_, User>> {
        self.roster.users()
    }

    pub fn support(&self) -> &ServerSupport {
        &self.support
    }

    pub fn enabled_caps(&self) -> &HashSet<Capability> {
        self.handshake.enabled_caps()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect.attempts()
    }

    /// Whether the client has stopped for good.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether registration stopped on an erroneous nickname.
    pub fn is_halted(&self) -> bool {
        self.handshake.is_halted()
    }

    // === Internals ===

    fn is_me(&self, nick: &str) -> bool {
        irc_eq(nick, self.handshake.nickname())
    }

    /// Open the transport and send the first registration line.
    fn open(&mut self) -> Result<(), TransportError> {
        self.lines.clear();
        self.roster.clear();
        self.support = ServerSupport::default();
        self.fault = false;

        self.transport.connect(&self.endpoint, &self.tls_settings)?;

        let local_host = self.transport.local_host();
        self.handshake.set_hosts(&local_host, &self.endpoint.host);
        let actions = self.handshake.start(self.transport.is_tls());
        for action in actions {
            if let HandshakeAction::Send(command) = action {
                self.send(command);
            }
        }
        info!(server = %self.endpoint.host, port = self.endpoint.port, state = %self.status(), "connected");
        Ok(())
    }

    fn send(&mut self, command: Command) {
        if !self.transport.is_connected() {
            debug!(command = command.name(), "not connected, dropping command");
            return;
        }
        self.traffic.outbound(&self.endpoint.host, &command);

        let mut line = command.to_string();
        line.push_str("\r\n");
        if let Err(e) = self.transport.send(line.as_bytes()) {
            warn!(server = %self.endpoint.host, "send failed: {}", e);
            self.fault = true;
        }
    }

    fn handle_line(&mut self, line: &str, observers: &mut Observers) -> Flow {
        self.traffic.inbound(&self.endpoint.host, line);

        let msg = Message::parse(line);
        let mut events = Vec::new();

        let actions = self.handshake.feed(&msg);
        let mut flow = self.apply_actions(actions, &mut events);
        if flow == Flow::Continue {
            flow = self.handle_message(&msg, &mut events);
        }

        events.push(Event::Raw {
            line: line.to_owned(),
        });
        self.dispatch(events, observers);
        flow
    }

    fn drop_connection(&mut self, observers: &mut Observers) {
        let mut events = Vec::new();
        self.teardown(&mut events);
        self.dispatch(events, observers);
    }

    fn dispatch(&mut self, events: Vec<Event>, observers: &mut Observers) {
        for event in &events {
            if let Some(mut hook) = self.hook.take() {
                hook.on_event(self, event);
                if self.hook.is_none() {
                    self.hook = Some(hook);
                }
            }
            observers.dispatch(self, event);
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("nickname", &self.nickname())
            .field("status", &self.status())
            .field("dead", &self.dead)
            .finish_non_exhaustive()
    }
}
