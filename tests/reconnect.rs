//! Disconnection handling and the reconnection policy.

mod common;

use std::time::Duration;

use common::{settings, without_raw, Harness};
use slirc_client::{ClientError, ConnectionState, Event};

#[test]
fn test_gives_up_after_max_attempts() {
    let mut config = settings();
    config.max_reconnect_attempts = 2;
    let mut h = Harness::new(config);
    h.register();

    h.server.fail_connects(10);
    h.server.reset();
    h.think();
    assert_eq!(h.client.status(), ConnectionState::Disconnected);
    assert_eq!(h.server.connects().len(), 1);

    h.think();
    assert_eq!(h.server.connects().len(), 2);
    assert!(!h.client.is_dead());

    let err = h.client.think(&mut h.observers).unwrap_err();
    assert!(matches!(err, ClientError::ReconnectExhausted { attempts: 2, .. }));
    assert_eq!(h.server.connects().len(), 3);
    assert!(h.client.is_dead());

    h.think();
    assert_eq!(h.server.connects().len(), 3);

    let events = without_raw(h.recorder.take());
    assert_eq!(
        events,
        vec![
            Event::Disconnect,
            Event::Reconnect { success: false },
            Event::Reconnect { success: false },
        ]
    );
}

#[test]
fn test_gives_up_when_connections_drop_before_registering() {
    let mut config = settings();
    config.max_reconnect_attempts = 2;
    let mut h = Harness::new(config);
    h.register();

    for round in 1..=2 {
        h.server.close();
        h.think();
        h.think();
        assert_eq!(h.client.status(), ConnectionState::CapabilityNegotiation);
        assert_eq!(h.client.reconnect_attempts(), round);
    }
    assert_eq!(h.server.connects().len(), 3);

    h.server.close();
    h.think();
    let err = h.client.think(&mut h.observers).unwrap_err();
    assert!(matches!(
        err,
        ClientError::ReconnectExhausted {
            attempts: 2,
            source: None
        }
    ));
    assert!(h.client.is_dead());

    h.think();
    assert_eq!(h.server.connects().len(), 3);
}

#[test]
fn test_registration_resets_attempts() {
    let mut config = settings();
    config.max_reconnect_attempts = 2;
    let mut h = Harness::new(config);
    h.register();

    h.server.fail_connects(1);
    h.server.close();
    h.think();
    h.think();
    assert_eq!(h.client.reconnect_attempts(), 1);

    h.think();
    assert_eq!(h.client.reconnect_attempts(), 2);
    assert_eq!(h.client.status(), ConnectionState::CapabilityNegotiation);

    h.feed(&[
        ":irc.example.net CAP * LS :",
        ":irc.example.net 001 bot :Welcome",
        ":irc.example.net 376 bot :End",
    ]);
    assert_eq!(h.client.status(), ConnectionState::Registered);
    assert_eq!(h.client.reconnect_attempts(), 0);

    let events = without_raw(h.recorder.take());
    assert!(events.contains(&Event::Reconnect { success: false }));
    assert!(events.contains(&Event::Reconnect { success: true }));
    assert!(events.contains(&Event::Connect));
}

#[test]
fn test_delay_is_respected() {
    let mut config = settings();
    config.auto_reconnect_delay = Duration::from_secs(3600);
    let mut h = Harness::new(config);
    h.register();

    h.server.close();
    h.think();
    h.think();
    h.think();
    assert_eq!(h.server.connects().len(), 1);
    assert_eq!(h.client.reconnect_attempts(), 0);
}

#[test]
fn test_initial_connect_failure_schedules_retry() {
    let mut h = Harness::new(settings());
    h.server.fail_connects(1);
    assert!(h.client.connect().is_err());
    assert_eq!(h.client.status(), ConnectionState::Disconnected);

    h.think();
    assert_eq!(h.server.connects().len(), 2);
    assert_eq!(h.client.status(), ConnectionState::CapabilityNegotiation);
    assert_eq!(h.server.take_sent(), vec!["CAP LS"]);
}

#[test]
fn test_quit_prevents_reconnect() {
    let mut h = Harness::new(settings());
    h.register();

    h.client.quit("bye");
    assert_eq!(h.server.take_sent(), vec!["QUIT :bye"]);
    assert!(h.client.is_dead());

    h.server.close();
    h.think();
    h.think();
    assert_eq!(h.server.connects().len(), 1);
    assert!(without_raw(h.recorder.take()).contains(&Event::Disconnect));
}

#[test]
fn test_zero_attempts_disables_reconnect() {
    let mut config = settings();
    config.max_reconnect_attempts = 0;
    let mut h = Harness::new(config);
    h.register();

    h.server.close();
    h.think();
    h.think();
    assert!(h.client.is_dead());
    assert_eq!(h.server.connects().len(), 1);
}

#[test]
fn test_bounce_is_followed_with_reconnect_disabled() {
    let mut config = settings();
    config.max_reconnect_attempts = 0;
    let mut h = Harness::new(config);
    h.client.connect().unwrap();
    h.feed(&[
        ":irc.example.net CAP * LS :",
        ":irc.example.net 010 bot other.example.net 6667 :Please use this server",
    ]);
    assert!(!h.client.is_dead());

    h.think();
    let hosts: Vec<_> = h.server.connects().into_iter().map(|e| e.host).collect();
    assert_eq!(hosts, vec!["irc.example.net", "other.example.net"]);
    assert_eq!(h.client.status(), ConnectionState::CapabilityNegotiation);

    h.server.close();
    h.think();
    h.think();
    assert!(h.client.is_dead());
    assert_eq!(h.server.connects().len(), 2);
}

#[test]
fn test_reconnect_keeps_nickname_preference() {
    let mut h = Harness::new(settings());
    h.client.connect().unwrap();
    h.feed(&[
        ":irc.example.net CAP * LS :",
        ":irc.example.net 433 * bot :Nickname is already in use",
        ":irc.example.net 001 bot_ :Welcome",
    ]);
    assert_eq!(h.client.nickname(), "bot_");

    h.server.reset();
    h.think();
    h.think();
    h.server.take_sent();
    h.feed(&[":irc.example.net CAP * LS :"]);
    assert!(h.server.take_sent().contains(&"NICK bot".to_owned()));
}

#[test]
fn test_explicit_disconnect() {
    let mut h = Harness::new(settings());
    h.register();
    h.client.disconnect(&mut h.observers);
    assert!(!h.server.is_connected());
    assert_eq!(without_raw(h.recorder.take()), vec![Event::Disconnect]);
}
