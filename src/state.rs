//! Sans-IO registration state machine.
//!
//! [`HandshakeMachine`] performs no I/O. It consumes parsed lines and
//! produces [`HandshakeAction`]s (lines to send, a TLS upgrade to perform,
//! registration completion) which the [`Client`](crate::Client) carries
//! out. Each [`ConnectionState`] has its own transition function, and a
//! state only ever moves forward until the connection is torn down.
//!
//! # Example
//!
//! ```
//! use slirc_client::state::{ConnectionState, HandshakeAction, HandshakeConfig, HandshakeMachine};
//! use slirc_client::{Command, Message};
//!
//! let mut machine = HandshakeMachine::new(HandshakeConfig {
//!     nickname: "testbot".to_string(),
//!     alt_nickname: "testbot_".to_string(),
//!     realname: "Test Bot".to_string(),
//!     local_host: "localhost".to_string(),
//!     server_host: "irc.example.net".to_string(),
//!     starttls: false,
//!     sasl: None,
//! });
//!
//! let actions = machine.start(false);
//! assert_eq!(actions, vec![HandshakeAction::Send(Command::CapLs)]);
//!
//! let ls = Message::parse(":irc.example.net CAP * LS :multi-prefix");
//! let actions = machine.feed(&ls);
//! assert_eq!(
//!     actions[0],
//!     HandshakeAction::Send(Command::CapReq(vec!["multi-prefix".to_string()]))
//! );
//! assert_eq!(machine.state(), ConnectionState::RegistrationSent);
//! ```

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::caps::{self, Capability, LsAccumulator};
use crate::command::Command;
use crate::message::Message;
use crate::response::Response;
use crate::sasl;

/// Registration progress of one connection, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected = 0,
    /// Socket open, `STARTTLS` sent.
    SocketEstablished = 1,
    /// `CAP LS` sent, negotiating capabilities and SASL.
    CapabilityNegotiation = 2,
    /// `USER`/`NICK` sent, awaiting a welcome numeric.
    RegistrationSent = 3,
    /// Welcomed; collecting ISUPPORT until the luser summary.
    RegistrationVerified = 4,
    /// Fully registered.
    Registered = 5,
}

impl ConnectionState {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether moving from `self` to `next` is legal: forward only, or
    /// back to [`ConnectionState::Disconnected`].
    pub fn can_advance_to(self, next: ConnectionState) -> bool {
        next == ConnectionState::Disconnected || next > self
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::SocketEstablished => "socket established",
            Self::CapabilityNegotiation => "capability negotiation",
            Self::RegistrationSent => "registration sent",
            Self::RegistrationVerified => "registration verified",
            Self::Registered => "registered",
        };
        f.write_str(name)
    }
}

/// Configuration for the handshake state machine.
#[derive(Clone, Debug)]
pub struct HandshakeConfig {
    /// Desired nickname.
    pub nickname: String,
    /// First fallback when the nickname is taken.
    pub alt_nickname: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Our own host name, second `USER` parameter.
    pub local_host: String,
    /// The server's host name, third `USER` parameter.
    pub server_host: String,
    /// Try `STARTTLS` on plaintext connections.
    pub starttls: bool,
    /// SASL PLAIN credentials, if authentication is wanted.
    pub sasl: Option<SaslCredentials>,
}

/// SASL authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SaslCredentials {
    /// Account name (often same as nickname).
    pub account: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("account", &self.account)
            .field("password", &"****")
            .finish()
    }
}

/// Actions produced by the handshake state machine.
///
/// The caller is responsible for carrying them out in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this command to the server.
    Send(Command),
    /// The server accepted `STARTTLS`: upgrade the socket, then report the
    /// outcome through [`HandshakeMachine::tls_finished`].
    StartTls,
    /// Our nickname is now this.
    NickChanged(String),
    /// Registration finished.
    Complete,
    /// The server sent us elsewhere.
    Bounce { host: String, port: u16, tls: bool },
    /// The server refused our nickname as invalid; no further attempts
    /// are made until a new nickname is supplied.
    Halted(String),
}

/// Sans-IO state machine for IRC connection registration.
///
/// This handles the STARTTLS -> CAP -> AUTHENTICATE -> USER/NICK -> 001
/// -> 251 flow.
#[derive(Clone, Debug)]
pub struct HandshakeMachine {
    config: HandshakeConfig,
    state: ConnectionState,
    nickname: String,
    nick_attempts: u32,
    halted: bool,
    ls: LsAccumulator,
    /// Capabilities acknowledged by server.
    enabled_caps: HashSet<Capability>,
    awaiting_sasl: bool,
}

impl HandshakeMachine {
    #[must_use]
    pub fn new(config: HandshakeConfig) -> Self {
        let nickname = config.nickname.clone();
        Self {
            config,
            state: ConnectionState::Disconnected,
            nickname,
            nick_attempts: 0,
            halted: false,
            ls: LsAccumulator::default(),
            enabled_caps: HashSet::new(),
            awaiting_sasl: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The nickname we currently hold or are attempting.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Whether an erroneous nickname stopped registration.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn enabled_caps(&self) -> &HashSet<Capability> {
        &self.enabled_caps
    }

    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    /// Update the host names sent in `USER`.
    pub fn set_hosts(&mut self, local_host: &str, server_host: &str) {
        self.config.local_host = local_host.to_owned();
        self.config.server_host = server_host.to_owned();
    }

    /// Forget all per-connection progress.
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.nickname = self.config.nickname.clone();
        self.nick_attempts = 0;
        self.halted = false;
        self.ls.clear();
        self.enabled_caps.clear();
        self.awaiting_sasl = false;
    }

    /// The socket is open. `tls_active` tells whether it is already encrypted.
    #[must_use]
    pub fn start(&mut self, tls_active: bool) -> Vec<HandshakeAction> {
        self.reset();
        if !tls_active && self.config.starttls {
            self.advance(ConnectionState::SocketEstablished);
            vec![HandshakeAction::Send(Command::STARTTLS)]
        } else {
            self.begin_cap()
        }
    }

    /// Report the outcome of a TLS upgrade requested by [`HandshakeAction::StartTls`].
    ///
    /// On failure the caller abandons the socket; nothing is sent.
    #[must_use]
    pub fn tls_finished(&mut self, success: bool) -> Vec<HandshakeAction> {
        if success && self.state == ConnectionState::SocketEstablished {
            self.begin_cap()
        } else {
            vec![]
        }
    }

    /// Change the nickname we want, e.g. after an erroneous nickname halted
    /// registration.
    #[must_use]
    pub fn set_nickname(&mut self, nick: &str) -> Vec<HandshakeAction> {
        self.config.nickname = nick.to_owned();
        self.halted = false;
        self.nick_attempts = 0;

        match self.state {
            ConnectionState::RegistrationSent => {
                self.nickname = nick.to_owned();
                vec![HandshakeAction::Send(Command::NICK(nick.to_owned()))]
            }
            ConnectionState::Disconnected
            | ConnectionState::SocketEstablished
            | ConnectionState::CapabilityNegotiation => {
                self.nickname = nick.to_owned();
                vec![]
            }
            // Registered: the server confirms with NICK.
            _ => vec![HandshakeAction::Send(Command::NICK(nick.to_owned()))],
        }
    }

    /// The server confirmed a change of our nickname.
    pub fn nick_confirmed(&mut self, nick: &str) {
        self.nickname = nick.to_owned();
    }

    /// Feed a parsed message to the state machine.
    #[must_use]
    pub fn feed(&mut self, msg: &Message<'_>) -> Vec<HandshakeAction> {
        if msg.is("PING") {
            return vec![HandshakeAction::Send(Command::PONG(msg.remainder().to_owned()))];
        }
        if let Some(bounce) = parse_bounce(msg) {
            return vec![bounce];
        }

        // Replies to CAP REQ may arrive after CAP END was sent.
        if self.state > ConnectionState::CapabilityNegotiation
            && msg.is("CAP")
            && msg.arg(1).eq_ignore_ascii_case("ACK")
        {
            self.apply_ack(msg.trailing());
            return vec![];
        }

        match self.state {
            ConnectionState::Disconnected | ConnectionState::Registered => vec![],
            ConnectionState::SocketEstablished => self.handle_starttls(msg),
            ConnectionState::CapabilityNegotiation => self.handle_cap_negotiation(msg),
            ConnectionState::RegistrationSent => self.handle_registration(msg),
            ConnectionState::RegistrationVerified => self.handle_verified(msg),
        }
    }

    fn handle_starttls(&mut self, msg: &Message<'_>) -> Vec<HandshakeAction> {
        match msg.response() {
            Some(Response::RPL_STARTTLS) => vec![HandshakeAction::StartTls],
            Some(Response::ERR_UNKNOWNCOMMAND) => {
                debug!("server does not know STARTTLS");
                self.begin_cap()
            }
            Some(Response::ERR_STARTTLS) => {
                warn!(reason = msg.trailing(), "STARTTLS refused");
                self.begin_cap()
            }
            _ => vec![],
        }
    }

    fn handle_cap_negotiation(&mut self, msg: &Message<'_>) -> Vec<HandshakeAction> {
        if msg.response() == Some(Response::ERR_UNKNOWNCOMMAND) {
            debug!("server does not support CAP");
            return self.register();
        }

        if msg.is("AUTHENTICATE") {
            if self.awaiting_sasl && msg.arg(0) == "+" {
                return self.send_sasl_payload();
            }
            return vec![];
        }

        if let Some(response) = msg.response() {
            if self.awaiting_sasl && response.is_sasl() && response.is_error() {
                warn!(code = response.code(), reason = msg.trailing(), "SASL aborted");
                return self.finish_cap_negotiation();
            }
            return vec![];
        }

        if !msg.is("CAP") {
            return vec![];
        }

        let params = msg.params.get(2..).unwrap_or(&[]);
        match msg.arg(1).to_ascii_uppercase().as_str() {
            "LS" => match self.ls.feed(params) {
                Some(offered) => self.request_caps(&offered),
                None => vec![],
            },
            "ACK" => {
                self.apply_ack(msg.trailing());
                vec![]
            }
            "NAK" => {
                let rejected = caps::parse_list(msg.trailing());
                warn!(caps = msg.trailing(), "capabilities rejected");
                if self.awaiting_sasl && rejected.iter().any(|(cap, _)| *cap == Capability::Sasl) {
                    return self.finish_cap_negotiation();
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn apply_ack(&mut self, list: &str) {
        for (cap, enabled) in caps::parse_list(list) {
            if enabled {
                self.enabled_caps.insert(cap);
            } else {
                self.enabled_caps.remove(&cap);
            }
        }
    }

    fn request_caps(&mut self, offered: &HashSet<Capability>) -> Vec<HandshakeAction> {
        let wanted = caps::select(offered, self.config.sasl.is_some());
        if wanted.is_empty() {
            return self.finish_cap_negotiation();
        }

        let mut actions = vec![HandshakeAction::Send(Command::CapReq(
            wanted.iter().map(|cap| cap.to_string()).collect(),
        ))];

        if wanted.contains(&Capability::Sasl) {
            self.awaiting_sasl = true;
            actions.push(HandshakeAction::Send(Command::AUTHENTICATE(
                sasl::PLAIN.to_owned(),
            )));
        } else {
            actions.extend(self.finish_cap_negotiation());
        }
        actions
    }

    // Success or failure of the exchange is not awaited: the server's
    // 900-series replies arrive after CAP END and are only reported.
    fn send_sasl_payload(&mut self) -> Vec<HandshakeAction> {
        let mut actions = Vec::new();
        if let Some(creds) = &self.config.sasl {
            let encoded = sasl::encode_plain(&self.nickname, &creds.account, &creds.password);
            actions.extend(
                sasl::response_chunks(&encoded)
                    .into_iter()
                    .map(|chunk| HandshakeAction::Send(Command::AUTHENTICATE(chunk.to_owned()))),
            );
        }
        actions.extend(self.finish_cap_negotiation());
        actions
    }

    fn handle_registration(&mut self, msg: &Message<'_>) -> Vec<HandshakeAction> {
        let Some(response) = msg.response() else {
            return vec![];
        };

        if response.is_welcome() {
            self.advance(ConnectionState::RegistrationVerified);
            let mut actions = vec![];
            let assigned = msg.arg(0);
            if response == Response::RPL_WELCOME && !assigned.is_empty() && assigned != self.nickname
            {
                info!(nick = assigned, "server assigned nickname");
                self.nickname = assigned.to_owned();
                actions.push(HandshakeAction::NickChanged(assigned.to_owned()));
            }
            return actions;
        }

        if response.is_nick_taken() {
            if self.halted {
                return vec![];
            }
            self.nick_attempts += 1;
            self.nickname = self.fallback_nick();
            debug!(nick = %self.nickname, attempt = self.nick_attempts, "nickname taken, retrying");
            return vec![
                HandshakeAction::Send(Command::NICK(self.nickname.clone())),
                HandshakeAction::NickChanged(self.nickname.clone()),
            ];
        }

        if matches!(
            response,
            Response::ERR_ERRONEOUSNICKNAME | Response::ERR_NONICKNAMEGIVEN
        ) {
            warn!(nick = %self.nickname, "nickname refused as erroneous");
            self.halted = true;
            return vec![HandshakeAction::Halted(self.nickname.clone())];
        }

        vec![]
    }

    fn handle_verified(&mut self, msg: &Message<'_>) -> Vec<HandshakeAction> {
        match msg.response() {
            Some(Response::RPL_LUSERCLIENT | Response::RPL_ENDOFMOTD | Response::ERR_NOMOTD) => {
                self.advance(ConnectionState::Registered);
                info!(nick = %self.nickname, "registered");
                vec![HandshakeAction::Complete]
            }
            _ => vec![],
        }
    }

    fn begin_cap(&mut self) -> Vec<HandshakeAction> {
        self.advance(ConnectionState::CapabilityNegotiation);
        vec![HandshakeAction::Send(Command::CapLs)]
    }

    fn finish_cap_negotiation(&mut self) -> Vec<HandshakeAction> {
        self.awaiting_sasl = false;
        let mut actions = vec![HandshakeAction::Send(Command::CapEnd)];
        actions.extend(self.register());
        actions
    }

    fn register(&mut self) -> Vec<HandshakeAction> {
        self.advance(ConnectionState::RegistrationSent);
        vec![
            HandshakeAction::Send(Command::USER(
                self.nickname.clone(),
                self.config.local_host.clone(),
                self.config.server_host.clone(),
                self.config.realname.clone(),
            )),
            HandshakeAction::Send(Command::NICK(self.nickname.clone())),
        ]
    }

    /// Alternate nickname first, then the configured one with a counter.
    fn fallback_nick(&self) -> String {
        let has_alt = !self.config.alt_nickname.is_empty();
        match self.nick_attempts {
            1 if has_alt => self.config.alt_nickname.clone(),
            n => {
                let suffix = if has_alt { n - 1 } else { n };
                format!("{}{}", self.config.nickname, suffix)
            }
        }
    }

    fn advance(&mut self, next: ConnectionState) {
        if self.state.can_advance_to(next) {
            debug!(from = %self.state, to = %next, "state change");
            self.state = next;
        } else {
            warn!(from = %self.state, to = %next, "ignoring backward state change");
        }
    }
}

/// Recognize `010 <me> <host> <port>` and the RFC 1459 style
/// `005 <me> :Try server <host>, port <port>`. A port written `+port`
/// asks for TLS.
fn parse_bounce(msg: &Message<'_>) -> Option<HandshakeAction> {
    let (host, port) = match msg.response()? {
        Response::RPL_BOUNCE => (msg.arg(1), msg.arg(2)),
        Response::RPL_ISUPPORT => {
            let text = msg.trailing().strip_prefix("Try server ")?;
            let (host, rest) = text.split_once(',')?;
            let port = rest.trim_start().strip_prefix("port ")?;
            let port = port.split(|c: char| c != '+' && !c.is_ascii_digit()).next()?;
            (host.trim(), port)
        }
        _ => return None,
    };

    let (tls, digits) = match port.strip_prefix('+') {
        Some(digits) => (true, digits),
        None => (false, port),
    };
    let port = digits.parse().ok()?;
    if host.is_empty() {
        return None;
    }

    Some(HandshakeAction::Bounce {
        host: host.to_owned(),
        port,
        tls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(sasl: bool) -> HandshakeConfig {
        HandshakeConfig {
            nickname: "testbot".to_string(),
            alt_nickname: "testbot_".to_string(),
            realname: "Test Bot".to_string(),
            local_host: "localhost".to_string(),
            server_host: "irc.example.net".to_string(),
            starttls: true,
            sasl: sasl.then(|| SaslCredentials {
                account: "acct".to_string(),
                password: "secret".to_string(),
            }),
        }
    }

    fn feed(machine: &mut HandshakeMachine, line: &str) -> Vec<HandshakeAction> {
        machine.feed(&Message::parse(line))
    }

    fn sent(actions: &[HandshakeAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                HandshakeAction::Send(cmd) => Some(cmd.to_string()),
                _ => None,
            })
            .collect()
    }

    fn registered_machine() -> HandshakeMachine {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(true);
        let _ = feed(&mut machine, ":srv CAP * LS :away-notify");
        machine
    }

    #[test]
    fn test_state_order() {
        use ConnectionState::*;
        assert!(SocketEstablished.can_advance_to(CapabilityNegotiation));
        assert!(RegistrationSent.can_advance_to(Disconnected));
        assert!(!Registered.can_advance_to(RegistrationSent));
        assert_eq!(Registered.ordinal(), 5);
    }

    #[test]
    fn test_start_plaintext_tries_starttls() {
        let mut machine = HandshakeMachine::new(make_config(false));
        assert_eq!(sent(&machine.start(false)), vec!["STARTTLS"]);
        assert_eq!(machine.state(), ConnectionState::SocketEstablished);

        assert_eq!(feed(&mut machine, ":srv 670 testbot :go ahead"), vec![HandshakeAction::StartTls]);
        assert_eq!(sent(&machine.tls_finished(true)), vec!["CAP LS"]);
        assert_eq!(machine.state(), ConnectionState::CapabilityNegotiation);
    }

    #[test]
    fn test_start_tls_skips_starttls() {
        let mut machine = HandshakeMachine::new(make_config(false));
        assert_eq!(sent(&machine.start(true)), vec!["CAP LS"]);
    }

    #[test]
    fn test_starttls_unsupported_falls_through() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(false);
        assert_eq!(sent(&feed(&mut machine, ":srv 421 * STARTTLS :Unknown command")), vec!["CAP LS"]);

        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(false);
        assert_eq!(sent(&feed(&mut machine, ":srv 691 * :STARTTLS failed")), vec!["CAP LS"]);
    }

    #[test]
    fn test_failed_tls_sends_nothing() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(false);
        assert!(machine.tls_finished(false).is_empty());
    }

    #[test]
    fn test_cap_ls_with_sasl() {
        let mut machine = HandshakeMachine::new(make_config(true));
        let _ = machine.start(true);
        let out = feed(&mut machine, ":srv CAP * LS :multi-prefix sasl userhost-in-names");
        assert_eq!(
            sent(&out),
            vec!["CAP REQ :multi-prefix sasl userhost-in-names", "AUTHENTICATE PLAIN"]
        );
        assert_eq!(machine.state(), ConnectionState::CapabilityNegotiation);

        let _ = feed(&mut machine, ":srv CAP testbot ACK :multi-prefix sasl userhost-in-names");
        assert!(machine.enabled_caps().contains(&Capability::Sasl));

        let out = feed(&mut machine, "AUTHENTICATE +");
        let payload = sasl::encode_plain("testbot", "acct", "secret");
        assert_eq!(
            sent(&out),
            vec![
                format!("AUTHENTICATE {payload}"),
                "CAP END".to_string(),
                "USER testbot localhost irc.example.net :Test Bot".to_string(),
                "NICK testbot".to_string(),
            ]
        );
        assert_eq!(machine.state(), ConnectionState::RegistrationSent);
    }

    #[test]
    fn test_cap_ls_without_password() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(true);
        let out = feed(&mut machine, ":srv CAP * LS :multi-prefix sasl userhost-in-names");
        assert_eq!(
            sent(&out),
            vec![
                "CAP REQ :multi-prefix userhost-in-names",
                "CAP END",
                "USER testbot localhost irc.example.net :Test Bot",
                "NICK testbot",
            ]
        );
    }

    #[test]
    fn test_multiline_cap_ls() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(true);
        assert!(feed(&mut machine, ":srv CAP * LS * :multi-prefix").is_empty());
        let out = feed(&mut machine, ":srv CAP * LS :userhost-in-names");
        assert_eq!(sent(&out)[0], "CAP REQ :multi-prefix userhost-in-names");
    }

    #[test]
    fn test_clone_keeps_partial_cap_ls() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(true);
        let _ = feed(&mut machine, ":srv CAP * LS * :multi-prefix");

        let mut copy = machine.clone();
        let out = feed(&mut copy, ":srv CAP * LS :userhost-in-names");
        assert_eq!(sent(&out)[0], "CAP REQ :multi-prefix userhost-in-names");

        let out = feed(&mut machine, ":srv CAP * LS :away-notify");
        assert_eq!(sent(&out)[0], "CAP REQ :multi-prefix");
    }

    #[test]
    fn test_sasl_nak_proceeds() {
        let mut machine = HandshakeMachine::new(make_config(true));
        let _ = machine.start(true);
        let _ = feed(&mut machine, ":srv CAP * LS :sasl");
        let out = feed(&mut machine, ":srv CAP * NAK :sasl");
        assert_eq!(sent(&out)[0], "CAP END");
        assert_eq!(machine.state(), ConnectionState::RegistrationSent);
    }

    #[test]
    fn test_cap_unknown_registers() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(true);
        let out = feed(&mut machine, ":srv 421 * CAP :Unknown command");
        assert_eq!(sent(&out)[1], "NICK testbot");
    }

    #[test]
    fn test_nick_collision_sequence() {
        let mut machine = registered_machine();
        let out = feed(&mut machine, ":srv 433 * testbot :in use");
        assert_eq!(sent(&out), vec!["NICK testbot_"]);
        let out = feed(&mut machine, ":srv 436 * testbot_ :collision");
        assert_eq!(sent(&out), vec!["NICK testbot1"]);
        let out = feed(&mut machine, ":srv 437 * testbot1 :unavailable");
        assert_eq!(sent(&out), vec!["NICK testbot2"]);
        assert_eq!(machine.nickname(), "testbot2");
    }

    #[test]
    fn test_nick_counter_without_alt() {
        let mut config = make_config(false);
        config.alt_nickname.clear();
        let mut machine = HandshakeMachine::new(config);
        let _ = machine.start(true);
        let _ = feed(&mut machine, ":srv CAP * LS :away-notify");

        let out = feed(&mut machine, ":srv 433 * testbot :in use");
        assert_eq!(sent(&out), vec!["NICK testbot1"]);
        let out = feed(&mut machine, ":srv 433 * testbot1 :in use");
        assert_eq!(sent(&out), vec!["NICK testbot2"]);
    }

    #[test]
    fn test_erroneous_nick_halts() {
        let mut machine = registered_machine();
        let out = feed(&mut machine, ":srv 432 * testbot :Erroneous");
        assert_eq!(out, vec![HandshakeAction::Halted("testbot".into())]);
        assert!(machine.is_halted());
        assert!(feed(&mut machine, ":srv 433 * testbot :in use").is_empty());

        assert_eq!(sent(&machine.set_nickname("good")), vec!["NICK good"]);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_welcome_then_luserclient() {
        let mut machine = registered_machine();
        let out = feed(&mut machine, ":srv 001 testbot2 :Welcome");
        assert_eq!(out, vec![HandshakeAction::NickChanged("testbot2".into())]);
        assert_eq!(machine.state(), ConnectionState::RegistrationVerified);

        assert!(feed(&mut machine, ":srv 005 testbot2 PREFIX=(ov)@+ :are supported").is_empty());
        assert_eq!(feed(&mut machine, ":srv 251 testbot2 :There are 3 users"), vec![HandshakeAction::Complete]);
        assert_eq!(machine.state(), ConnectionState::Registered);
    }

    #[test]
    fn test_end_of_motd_completes() {
        let mut machine = registered_machine();
        let _ = feed(&mut machine, ":srv 004 testbot srv v1 i o");
        assert_eq!(feed(&mut machine, ":srv 422 testbot :No MOTD"), vec![HandshakeAction::Complete]);
    }

    #[test]
    fn test_ping_in_any_state() {
        let mut machine = HandshakeMachine::new(make_config(false));
        let _ = machine.start(false);
        assert_eq!(sent(&feed(&mut machine, "PING :abc")), vec!["PONG :abc"]);
    }

    #[test]
    fn test_bounce() {
        let mut machine = registered_machine();
        assert_eq!(
            feed(&mut machine, ":srv 010 testbot other.example.net +6697 :Please use this"),
            vec![HandshakeAction::Bounce {
                host: "other.example.net".into(),
                port: 6697,
                tls: true
            }]
        );
        assert_eq!(
            feed(&mut machine, ":srv 005 testbot :Try server irc.other.net, port 6667"),
            vec![HandshakeAction::Bounce {
                host: "irc.other.net".into(),
                port: 6667,
                tls: false
            }]
        );
    }
}
