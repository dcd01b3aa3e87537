//! Shared harness: a client over a scripted in-memory transport, plus an
//! observer that records every event it sees.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use slirc_client::transport::MemoryHandle;
use slirc_client::{Client, Event, MemoryTransport, Observer, Observers, Settings};

/// Records events in delivery order.
#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut self.events.borrow_mut())
    }
}

impl Observer for Recorder {
    fn on_event(&mut self, _client: &mut Client, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}

pub struct Harness {
    pub client: Client,
    pub server: MemoryHandle,
    pub observers: Observers,
    pub recorder: Recorder,
}

/// Plaintext settings without STARTTLS and with an immediate retry.
pub fn settings() -> Settings {
    let mut settings = Settings::new("irc.example.net", "bot");
    settings.starttls = false;
    settings.auto_reconnect_delay = Duration::ZERO;
    settings
}

impl Harness {
    pub fn new(settings: Settings) -> Self {
        let (transport, server) = MemoryTransport::new();
        let client = Client::with_transport(settings, Box::new(transport));
        let recorder = Recorder::default();
        let mut observers = Observers::new();
        observers.register(Box::new(recorder.clone()));
        Self {
            client,
            server,
            observers,
            recorder,
        }
    }

    /// Deliver `lines`, one receive each, and let the client handle them.
    pub fn feed(&mut self, lines: &[&str]) {
        for line in lines {
            self.server.push_line(line);
        }
        for _ in 0..lines.len() {
            self.think();
        }
    }

    pub fn think(&mut self) {
        self.client
            .think(&mut self.observers)
            .expect("think should not fail");
    }

    /// Connect and run a minimal registration; sent lines and events are
    /// cleared afterwards.
    pub fn register(&mut self) {
        self.client.connect().expect("connect");
        self.feed(&[
            ":irc.example.net CAP * LS :multi-prefix userhost-in-names",
            ":irc.example.net CAP bot ACK :multi-prefix userhost-in-names",
            ":irc.example.net 001 bot :Welcome to the network bot",
            ":irc.example.net 005 bot PREFIX=(qaohv)~&@%+ CHANTYPES=# :are supported by this server",
            ":irc.example.net 376 bot :End of /MOTD command.",
        ]);
        self.server.take_sent();
        self.recorder.take();
    }

    /// Join `channel` and load its member list.
    pub fn join(&mut self, channel: &str, names: &str) {
        self.feed(&[
            format!(":bot!bot@localhost JOIN {channel}").as_str(),
            format!(":irc.example.net 353 bot = {channel} :{names}").as_str(),
            format!(":irc.example.net 366 bot {channel} :End of /NAMES list.").as_str(),
        ]);
    }
}

/// Events other than the raw line echo.
pub fn without_raw(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| !matches!(e, Event::Raw { .. }))
        .collect()
}
