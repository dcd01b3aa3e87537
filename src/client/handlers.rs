//! Applying server messages to the membership model, and turning them
//! into events.
//!
//! Users are only ever created from JOIN and NAMES. Any other message
//! from a known user refreshes its username and hostname; messages from
//! unknown users never add them.

use tracing::{debug, info, warn};

use super::{Client, Flow};
use crate::command::Command;
use crate::ctcp;
use crate::event::Event;
use crate::isupport::Isupport;
use crate::message::{MaskRef, Message};
use crate::mode::{parse_channel_modes, parse_user_modes};
use crate::response::Response;

impl Client {
    pub(super) fn handle_message(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) -> Flow {
        if let Some(code) = msg.numeric() {
            self.on_numeric(code, msg, events);
            return Flow::Continue;
        }

        match msg.command.to_ascii_uppercase().as_str() {
            "PRIVMSG" => self.on_privmsg(msg, events),
            "NOTICE" => self.on_notice(msg, events),
            "JOIN" => self.on_join(msg, events),
            "PART" => self.on_part(msg, events),
            "KICK" => self.on_kick(msg, events),
            "QUIT" => self.on_quit(msg, events),
            "NICK" => self.on_nick(msg, events),
            "INVITE" => self.on_invite(msg, events),
            "MODE" => self.on_mode(msg, events),
            "ERROR" => {
                warn!(server = %self.endpoint.host, message = msg.trailing(), "server error");
                events.push(Event::Error {
                    message: msg.trailing().to_owned(),
                });
                return Flow::Disconnect;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_numeric(&mut self, code: u16, msg: &Message<'_>, events: &mut Vec<Event>) {
        match msg.response() {
            Some(Response::RPL_ISUPPORT) => {
                if let Some(isupport) = Isupport::from_response_args(&msg.params) {
                    self.support.apply(&isupport);
                }
            }
            Some(Response::RPL_NAMREPLY) => self.on_names(msg),
            Some(Response::RPL_ENDOFNAMES) => {
                self.roster.set_receiving_names(msg.arg(1), false);
            }
            Some(Response::RPL_LOGGEDIN) => {
                info!(account = msg.arg(2), "logged in");
            }
            Some(Response::RPL_SASLSUCCESS) => info!("SASL authentication succeeded"),
            Some(response) if response.is_sasl() && response.is_error() => {
                warn!(code, reason = msg.trailing(), "SASL authentication failed");
            }
            _ => {}
        }

        events.push(Event::Numeric {
            code,
            params: msg.params.iter().map(|p| (*p).to_owned()).collect(),
        });
    }

    /// `353 <me> <type> <channel> :<names>`
    ///
    /// An untracked channel is created on its first NAMES reply. Once the
    /// matching `366` arrived, further replies for that channel are
    /// answers to a manual NAMES and leave the model alone.
    fn on_names(&mut self, msg: &Message<'_>) {
        let n = msg.params.len();
        if n < 3 {
            return;
        }
        let channel = msg.params[n - 2];
        let names = msg.params[n - 1];

        match self.roster.channel(channel) {
            Some(chan) if !chan.is_receiving_names() => return,
            Some(_) => {}
            None => {
                let kind = self.settings.channel_type(channel);
                self.roster.channel_or_create(channel, kind);
            }
        }

        for name in names.split_whitespace() {
            let (prefixes, rest) = self.support.split_prefixes(name);
            if rest.is_empty() {
                continue;
            }
            let mask = MaskRef::parse(rest);
            self.roster.add_member(channel, &mask, prefixes, &self.support);
        }
    }

    fn on_privmsg(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let sender = msg.sender();
        self.roster.refresh(&sender);
        let target = msg.arg(0).to_owned();
        let text = msg.arg(1);

        let Some(query) = ctcp::parse_query(text) else {
            events.push(Event::Chat {
                sender: sender.to_mask(),
                target,
                text: text.to_owned(),
            });
            return;
        };

        if query.command == ctcp::Command::Action {
            events.push(Event::Action {
                sender: sender.to_mask(),
                target,
                text: query.params.unwrap_or("").to_owned(),
            });
            return;
        }

        if let Some(reply) = ctcp::auto_reply(&query, &self.settings.realname) {
            debug!(from = sender.nick, query = %query.command, "answering CTCP");
            self.send(Command::NOTICE(sender.nick.to_owned(), reply));
        }
        events.push(Event::Ctcp {
            sender: sender.to_mask(),
            target,
            command: query.command.to_string(),
            params: query.params.unwrap_or("").to_owned(),
        });
    }

    fn on_notice(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let target = msg.arg(0).to_owned();
        let text = msg.arg(1).to_owned();

        let sender = msg.sender();
        if msg.source.is_none() || sender.is_server() {
            events.push(Event::ServerNotice {
                sender: msg.source.map(str::to_owned),
                target,
                text,
            });
            return;
        }

        self.roster.refresh(&sender);
        events.push(Event::Notice {
            sender: sender.to_mask(),
            target,
            text,
        });
    }

    fn on_join(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let sender = msg.sender();
        let channel = msg.arg(0);

        if self.is_me(sender.nick) {
            let kind = self.settings.channel_type(channel);
            self.roster.create_channel(channel, kind);
            if kind < 0 {
                debug!(channel, kind, "leaving channel of negative type");
                let message = self.settings.auto_part_message.clone();
                self.send(Command::PART(channel.to_owned(), Some(message)));
            }
        } else {
            self.roster.add_member(channel, &sender, "", &self.support);
            self.roster.refresh(&sender);
        }

        events.push(Event::Join {
            user: sender.to_mask(),
            channel: channel.to_owned(),
        });
    }

    fn on_part(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let sender = msg.sender();
        let channel = msg.arg(0);
        self.roster.refresh(&sender);

        if self.is_me(sender.nick) {
            self.roster.remove_channel(channel);
        } else {
            self.roster.remove_member(channel, sender.nick);
        }

        events.push(Event::Part {
            user: sender.to_mask(),
            channel: channel.to_owned(),
            message: msg.arg(1).to_owned(),
        });
    }

    fn on_kick(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let kicker = msg.sender();
        let channel = msg.arg(0);
        let victim = msg.arg(1);
        self.roster.refresh(&kicker);

        if self.is_me(victim) {
            self.roster.remove_channel(channel);
            if self.settings.auto_join_on_kick {
                let key = self.settings.channel(channel).and_then(|c| c.key.clone());
                info!(channel, by = kicker.nick, "kicked, rejoining");
                self.send(Command::JOIN(channel.to_owned(), key));
            }
        } else {
            self.roster.remove_member(channel, victim);
        }

        events.push(Event::Kick {
            kicker: kicker.to_mask(),
            channel: channel.to_owned(),
            victim: victim.to_owned(),
            reason: msg.arg(2).to_owned(),
        });
    }

    fn on_quit(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let sender = msg.sender();
        let channels = self.roster.quit(sender.nick);

        events.push(Event::Quit {
            user: sender.to_mask(),
            message: msg.arg(0).to_owned(),
            channels,
        });
    }

    /// `:old!u@h NICK new`, or a bare `NICK new` about ourselves.
    fn on_nick(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let new_nick = msg.arg(0);
        if new_nick.is_empty() {
            return;
        }

        let user = match msg.source {
            Some(_) => {
                let sender = msg.sender();
                self.roster.refresh(&sender);
                sender.to_mask()
            }
            None => crate::message::Mask {
                nick: self.nickname().to_owned(),
                ..Default::default()
            },
        };

        if self.is_me(&user.nick) {
            self.handshake.nick_confirmed(new_nick);
        }
        self.roster.rename(&user.nick, new_nick);

        events.push(Event::Nick {
            user,
            new_nick: new_nick.to_owned(),
        });
    }

    fn on_invite(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let sender = msg.sender();
        self.roster.refresh(&sender);

        events.push(Event::Invite {
            sender: sender.to_mask(),
            channel: msg.arg(1).to_owned(),
        });
    }

    fn on_mode(&mut self, msg: &Message<'_>, events: &mut Vec<Event>) {
        let setter = msg.sender();
        self.roster.refresh(&setter);
        let target = msg.arg(0);
        let pieces = msg.params.get(1..).unwrap_or_default();

        let changes = if self.support.is_channel(target) {
            let changes = parse_channel_modes(pieces, &self.support);
            for change in &changes {
                let Some(prefix) = self.support.prefix_for_mode(change.mode) else {
                    continue;
                };
                if let Some(nick) = change.arg.as_deref() {
                    self.roster
                        .set_prefix(target, nick, prefix, change.set, &self.support);
                }
            }
            changes
        } else {
            parse_user_modes(pieces)
        };

        events.push(Event::Mode {
            setter: setter.to_mask(),
            target: target.to_owned(),
            changes,
        });
    }
}
