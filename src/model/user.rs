use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a [`User`]; one clone lives in the roster's user
/// table and one in each channel membership.
pub type UserRef = Rc<RefCell<User>>;

/// A network identity seen in at least one tracked channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub(crate) nick: String,
    pub(crate) user: String,
    pub(crate) host: String,
    pub(crate) channels: usize,
}

impl User {
    pub(crate) fn new(nick: &str, user: &str, host: &str) -> Self {
        Self {
            nick: nick.to_owned(),
            user: user.to_owned(),
            host: host.to_owned(),
            channels: 0,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Username (ident); empty until a full mask has been seen.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Hostname; empty until a full mask has been seen.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Number of tracked channels this user is a member of.
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Fill in username and hostname from a fresher mask.
    pub(crate) fn refresh(&mut self, user: &str, host: &str) {
        if !user.is_empty() {
            self.user = user.to_owned();
        }
        if !host.is_empty() {
            self.host = host.to_owned();
        }
    }
}
