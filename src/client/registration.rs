//! Carrying out what the registration state machine asks for.

use tracing::{debug, error, info, warn};

use super::{Client, Flow};
use crate::command::Command;
use crate::event::Event;
use crate::state::HandshakeAction;

impl Client {
    pub(super) fn apply_actions(
        &mut self,
        actions: Vec<HandshakeAction>,
        events: &mut Vec<Event>,
    ) -> Flow {
        for action in actions {
            match action {
                HandshakeAction::Send(command) => self.send(command),
                HandshakeAction::StartTls => {
                    let flow = self.upgrade_tls(events);
                    if flow != Flow::Continue {
                        return flow;
                    }
                }
                HandshakeAction::NickChanged(nick) => {
                    debug!(nick = %nick, "trying another nickname");
                }
                HandshakeAction::Complete => self.on_registered(events),
                HandshakeAction::Bounce { host, port, tls } => {
                    info!(host = %host, port, tls, "server redirected us");
                    self.endpoint.host = host;
                    self.endpoint.port = port;
                    self.endpoint.tls = tls;
                    return Flow::Bounce;
                }
                HandshakeAction::Halted(nick) => {
                    error!(nick = %nick, "nickname refused; registration waits for set_nickname");
                }
            }
        }
        Flow::Continue
    }

    /// Switch the open socket to TLS after `670`. A failed handshake
    /// leaves the socket unusable, so the connection is dropped.
    fn upgrade_tls(&mut self, events: &mut Vec<Event>) -> Flow {
        match self.transport.start_tls(&self.endpoint.host, &self.tls_settings) {
            Ok(()) => {
                info!(server = %self.endpoint.host, "STARTTLS handshake complete");
                let actions = self.handshake.tls_finished(true);
                self.apply_actions(actions, events)
            }
            Err(e) => {
                warn!(server = %self.endpoint.host, "STARTTLS handshake failed: {}", e);
                Flow::Disconnect
            }
        }
    }

    fn on_registered(&mut self, events: &mut Vec<Event>) {
        self.reconnect.reset();
        debug!(
            raw_lines = self.settings.raw_lines.len(),
            "running post-registration commands"
        );

        for line in self.settings.raw_lines.clone() {
            self.send(Command::Raw(line));
        }

        let joins: Vec<_> = self
            .settings
            .channels
            .iter()
            .filter(|c| c.auto_join)
            .map(|c| (c.name.clone(), c.key.clone()))
            .collect();
        for (channel, key) in joins {
            self.send(Command::JOIN(channel, key));
        }

        events.push(Event::Connect);
    }
}
