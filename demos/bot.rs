//! Echo bot demo
//!
//! Connects to every server listed in a TOML file and answers `!echo`.
//!
//! ```toml
//! [defaults]
//! Nick = "slirc-demo"
//! PrintOutput = true
//!
//! [servers.libera]
//! Hostname = "irc.libera.chat"
//! SSL = true
//!
//! [servers.libera.Channels."#slirc-test"]
//! AutoJoin = true
//! ```
//!
//! Run with `cargo run --example bot -- bot.toml`; set `RUST_LOG=debug`
//! for protocol-level diagnostics.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use slirc_client::message::Mask;
use slirc_client::{Client, Layered, Observer, Observers, TomlSource};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct Echo;

impl Observer for Echo {
    fn on_connect(&mut self, client: &mut Client) {
        info!(server = %client.endpoint().host, nick = %client.nickname(), "ready");
    }

    fn on_chat(&mut self, client: &mut Client, sender: &Mask, target: &str, text: &str) {
        let Some(rest) = text.strip_prefix("!echo ") else {
            return;
        };
        let reply_to = if client.support().is_channel(target) {
            target.to_owned()
        } else {
            sender.nick.clone()
        };
        client.privmsg(&reply_to, rest);
    }

    fn on_invite(&mut self, client: &mut Client, sender: &Mask, channel: &str) {
        info!(by = %sender, channel, "invited");
        client.join(channel, None);
    }

    fn on_error(&mut self, client: &mut Client, message: &str) {
        warn!(server = %client.endpoint().host, message, "server closed the link");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "bot.toml".to_owned());
    let file = TomlSource::load(&path).with_context(|| format!("loading {path}"))?;
    let defaults = file.section(&["defaults"]).unwrap_or_default();

    let names: Vec<String> = file
        .table()
        .get("servers")
        .and_then(|servers| servers.as_table())
        .map(|servers| servers.keys().cloned().collect())
        .unwrap_or_default();
    if names.is_empty() {
        bail!("{path} has no [servers.*] tables");
    }

    let mut clients = Vec::new();
    for name in &names {
        let server = file.section(&["servers", name]).unwrap_or_default();
        let mut client = Client::from_config(&Layered::new(server, &defaults))
            .with_context(|| format!("server {name}"))?;
        if let Err(e) = client.connect() {
            warn!(server = %name, "initial connect failed, will retry: {}", e);
        }
        clients.push(client);
    }

    let mut observers = Observers::new();
    observers.register(Box::new(Echo));

    while !clients.is_empty() {
        for client in &mut clients {
            if let Err(e) = client.think(&mut observers) {
                error!(server = %client.endpoint().host, "{}", e);
            }
        }
        clients.retain(|client| !client.is_dead());
        std::thread::sleep(Duration::from_millis(20));
    }

    Ok(())
}
