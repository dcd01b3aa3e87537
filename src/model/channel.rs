use std::cell::Ref;
use std::collections::HashMap;

use super::user::{User, UserRef};
use crate::casemap::irc_to_lower;
use crate::isupport::ServerSupport;

/// A user's presence in one channel.
#[derive(Debug, Clone)]
pub struct Membership {
    pub(crate) user: UserRef,
    pub(crate) prefixes: String,
}

impl Membership {
    pub fn user(&self) -> Ref<'_, User> {
        self.user.borrow()
    }

    /// Prefix characters held in this channel, highest rank first.
    pub fn prefixes(&self) -> &str {
        &self.prefixes
    }

    pub fn has_prefix(&self, prefix: char) -> bool {
        self.prefixes.contains(prefix)
    }

    /// The highest-ranked prefix, as shown in front of the nickname.
    pub fn highest_prefix(&self) -> Option<char> {
        self.prefixes.chars().next()
    }

    /// Add a prefix, keeping the server's rank order.
    pub(crate) fn add_prefix(&mut self, prefix: char, support: &ServerSupport) {
        if self.has_prefix(prefix) {
            return;
        }
        let rank = support.rank(prefix).unwrap_or(usize::MAX);
        let at = self
            .prefixes
            .char_indices()
            .find(|&(_, held)| support.rank(held).unwrap_or(usize::MAX) > rank)
            .map_or(self.prefixes.len(), |(i, _)| i);
        self.prefixes.insert(at, prefix);
    }

    pub(crate) fn remove_prefix(&mut self, prefix: char) {
        self.prefixes.retain(|held| held != prefix);
    }
}

/// A channel the client is in, or is receiving NAMES for.
#[derive(Debug)]
pub struct Channel {
    pub(crate) name: String,
    pub(crate) kind: i32,
    pub(crate) members: HashMap<String, Membership>,
    pub(crate) receiving_names: bool,
}

impl Channel {
    pub(crate) fn new(name: &str, kind: i32) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            members: HashMap::new(),
            receiving_names: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured channel type; negative means the channel is not wanted.
    pub fn kind(&self) -> i32 {
        self.kind
    }

    /// Whether a NAMES listing for this channel is in progress.
    pub fn is_receiving_names(&self) -> bool {
        self.receiving_names
    }

    pub fn member(&self, nick: &str) -> Option<&Membership> {
        self.members.get(&irc_to_lower(nick))
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.members.contains_key(&irc_to_lower(nick))
    }

    pub fn members(&self) -> impl Iterator<Item = &Membership> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
