//! When to reconnect, and when to give up.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::Client;
use crate::error::{ClientError, Result};
use crate::event::{Event, Observers};

/// Retry schedule for a dropped connection.
///
/// A retry becomes due `delay` after the connection was lost or a connect
/// failed. Attempts are counted until registration completes again; once
/// `max_attempts` attempts have gone by without registering, the client
/// gives up. A negative `max_attempts` retries forever.
///
/// A server redirect forces one immediate attempt, even when the
/// allowance is used up or reconnection is disabled.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    max_attempts: i32,
    attempts: u32,
    next_retry: Option<Instant>,
    forced: bool,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_attempts: i32) -> Self {
        Self {
            delay,
            max_attempts,
            attempts: 0,
            next_retry: None,
            forced: false,
        }
    }

    /// Schedule the next attempt `delay` after `now`, or at `now` when
    /// forced.
    pub fn schedule(&mut self, now: Instant) {
        let at = if self.forced { now } else { now + self.delay };
        self.next_retry = Some(at);
    }

    /// Make the next attempt due immediately and exempt it from the
    /// allowance.
    pub fn force(&mut self) {
        self.forced = true;
        self.next_retry = Some(Instant::now());
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_retry.is_some_and(|at| now >= at)
    }

    /// Count an attempt and clear the schedule; returns the attempt number.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.next_retry = None;
        self.forced = false;
        self.attempts
    }

    /// Whether the attempts made so far use up the allowance.
    pub fn is_exhausted(&self) -> bool {
        u32::try_from(self.max_attempts).is_ok_and(|max| self.attempts >= max)
    }

    /// A zero allowance turns reconnection off.
    pub fn is_disabled(&self) -> bool {
        self.max_attempts == 0
    }

    /// Forget past attempts, after a successful registration.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next_retry = None;
        self.forced = false;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Client {
    /// One reconnection attempt, once the policy says it is due.
    pub(super) fn reconnect(&mut self, observers: &mut Observers) -> Result<()> {
        let attempt = self.reconnect.record_attempt();
        info!(
            server = %self.endpoint.host,
            port = self.endpoint.port,
            tls = self.endpoint.tls,
            attempt,
            "reconnecting"
        );

        let result = self.open();
        self.dispatch(
            vec![Event::Reconnect {
                success: result.is_ok(),
            }],
            observers,
        );

        match result {
            Ok(()) => Ok(()),
            Err(source) if self.reconnect.is_exhausted() => {
                error!(attempts = attempt, "giving up reconnecting: {}", source);
                self.dead = true;
                Err(ClientError::ReconnectExhausted {
                    attempts: attempt,
                    source: Some(source),
                })
            }
            Err(e) => {
                warn!(attempt, "reconnect failed: {}", e);
                self.reconnect.schedule(Instant::now());
                Ok(())
            }
        }
    }

    /// Forget the connection and everything learned over it.
    pub(super) fn teardown(&mut self, events: &mut Vec<Event>) {
        self.transport.shutdown();
        self.handshake.reset();
        self.lines.clear();
        self.roster.clear();
        self.support = Default::default();
        self.fault = false;

        if self.reconnect.is_disabled() && !self.reconnect.is_forced() {
            self.dead = true;
        }
        if self.dead {
            info!(server = %self.endpoint.host, "disconnected for good");
        } else {
            self.reconnect.schedule(Instant::now());
            debug!(
                delay = ?self.reconnect.delay(),
                tls = self.endpoint.tls,
                "reconnect scheduled"
            );
        }
        events.push(Event::Disconnect);
    }
}
