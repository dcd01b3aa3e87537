//! Channel and user tracking.
//!
//! The [`Roster`] holds the client-wide user table and every tracked
//! channel. A [`User`] is shared between the table and each channel it is
//! a member of; its channel count always equals the number of channels
//! holding a membership for it, and a user whose count drops to zero is
//! dropped from the table. All keys are RFC 1459 case-folded.

mod channel;
mod user;

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

pub use self::channel::{Channel, Membership};
pub use self::user::{User, UserRef};
use crate::casemap::irc_to_lower;
use crate::isupport::ServerSupport;
use crate::message::MaskRef;

#[derive(Debug, Default)]
pub struct Roster {
    users: HashMap<String, UserRef>,
    channels: HashMap<String, Channel>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, nick: &str) -> Option<Ref<'_, User>> {
        self.users.get(&irc_to_lower(nick)).map(|u| u.borrow())
    }

    pub fn users(&self) -> impl Iterator<Item = Ref<'_, User>> {
        self.users.values().map(|u| u.borrow())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Start tracking `name` afresh, dropping any stale membership.
    pub fn create_channel(&mut self, name: &str, kind: i32) -> &mut Channel {
        self.remove_channel(name);
        let key = irc_to_lower(name);
        self.channels
            .entry(key)
            .or_insert_with(|| Channel::new(name, kind))
    }

    /// Look a channel up, creating it when unknown.
    pub fn channel_or_create(&mut self, name: &str, kind: i32) -> &mut Channel {
        self.channels
            .entry(irc_to_lower(name))
            .or_insert_with(|| Channel::new(name, kind))
    }

    pub fn set_receiving_names(&mut self, name: &str, receiving: bool) {
        if let Some(channel) = self.channels.get_mut(&irc_to_lower(name)) {
            channel.receiving_names = receiving;
        }
    }

    /// Stop tracking a channel, releasing all its memberships.
    pub fn remove_channel(&mut self, name: &str) -> bool {
        let Some(channel) = self.channels.remove(&irc_to_lower(name)) else {
            return false;
        };
        for membership in channel.members.into_values() {
            self.release(&membership.user);
        }
        true
    }

    /// Add `mask` to a tracked channel with the given prefixes.
    ///
    /// An existing membership keeps its entry and only gains prefixes.
    /// Returns `false` when the channel is not tracked.
    pub fn add_member(
        &mut self,
        channel: &str,
        mask: &MaskRef<'_>,
        prefixes: &str,
        support: &ServerSupport,
    ) -> bool {
        let chan_key = irc_to_lower(channel);
        if !self.channels.contains_key(&chan_key) {
            return false;
        }

        let user = self.find_or_add(mask);
        let nick_key = irc_to_lower(mask.nick);
        let Some(chan) = self.channels.get_mut(&chan_key) else {
            return false;
        };

        let membership = chan.members.entry(nick_key).or_insert_with(|| {
            user.borrow_mut().channels += 1;
            Membership {
                user: Rc::clone(&user),
                prefixes: String::new(),
            }
        });
        for prefix in prefixes.chars() {
            membership.add_prefix(prefix, support);
        }
        true
    }

    /// Remove one membership. Returns `false` if there was none.
    pub fn remove_member(&mut self, channel: &str, nick: &str) -> bool {
        let removed = self
            .channels
            .get_mut(&irc_to_lower(channel))
            .and_then(|chan| chan.members.remove(&irc_to_lower(nick)));

        match removed {
            Some(membership) => {
                self.release(&membership.user);
                true
            }
            None => false,
        }
    }

    /// Remove a user from every channel; returns the names of the
    /// channels it was in.
    pub fn quit(&mut self, nick: &str) -> Vec<String> {
        let nick_key = irc_to_lower(nick);
        let mut left = Vec::new();
        let mut released = Vec::new();

        for chan in self.channels.values_mut() {
            if let Some(membership) = chan.members.remove(&nick_key) {
                left.push(chan.name.clone());
                released.push(membership.user);
            }
        }
        for user in released {
            self.release(&user);
        }
        left
    }

    /// Rename a user in the table and in every membership.
    ///
    /// Returns `false` if the old nickname is not tracked.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let old_key = irc_to_lower(old);
        let new_key = irc_to_lower(new);

        let Some(user) = self.users.remove(&old_key) else {
            return false;
        };
        user.borrow_mut().nick = new.to_owned();
        self.users.insert(new_key.clone(), user);

        for chan in self.channels.values_mut() {
            if let Some(membership) = chan.members.remove(&old_key) {
                chan.members.insert(new_key.clone(), membership);
            }
        }
        trace!(old, new, "renamed user");
        true
    }

    /// Update the username and hostname of a user that is already known.
    pub fn refresh(&mut self, mask: &MaskRef<'_>) {
        if let Some(user) = self.users.get(&irc_to_lower(mask.nick)) {
            user.borrow_mut().refresh(mask.user, mask.host);
        }
    }

    /// Grant or revoke a prefix on a membership.
    pub fn set_prefix(
        &mut self,
        channel: &str,
        nick: &str,
        prefix: char,
        set: bool,
        support: &ServerSupport,
    ) -> bool {
        let membership = self
            .channels
            .get_mut(&irc_to_lower(channel))
            .and_then(|chan| chan.members.get_mut(&irc_to_lower(nick)));

        match membership {
            Some(m) if set => m.add_prefix(prefix, support),
            Some(m) => m.remove_prefix(prefix),
            None => return false,
        }
        true
    }

    pub fn clear(&mut self) {
        self.channels.clear();
        self.users.clear();
    }

    fn find_or_add(&mut self, mask: &MaskRef<'_>) -> UserRef {
        let key = irc_to_lower(mask.nick);
        let user = self
            .users
            .entry(key)
            .or_insert_with(|| Rc::new(RefCell::new(User::new(mask.nick, "", ""))));
        user.borrow_mut().refresh(mask.user, mask.host);
        Rc::clone(user)
    }

    fn release(&mut self, user: &UserRef) {
        let (key, remaining) = {
            let mut u = user.borrow_mut();
            u.channels = u.channels.saturating_sub(1);
            (irc_to_lower(&u.nick), u.channels)
        };
        if remaining == 0 {
            self.users.remove(&key);
        }
    }
}
