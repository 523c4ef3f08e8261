//! Per-connection request cadence gate.

use std::time::{Duration, Instant};

/// Outcome of gating one inbound message.
#[derive(Debug, Clone, Copy)]
pub enum GateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

/// Tracks when this connection last had a message accepted.
///
/// Owned exclusively by the connection task — no cross-connection state and
/// no locks. The first message is always allowed (`last_request` starts as
/// the "never" sentinel); after that a message is allowed only once the full
/// window has elapsed. A denied message does not advance the window.
#[derive(Debug)]
pub struct RequestGate {
    window: Duration,
    last_request: Option<Instant>,
}

impl RequestGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_request: None,
        }
    }

    pub fn check(&mut self) -> GateDecision {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> GateDecision {
        if let Some(last) = self.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < self.window {
                return GateDecision::Denied {
                    retry_after: self.window - elapsed,
                };
            }
        }
        self.last_request = Some(now);
        GateDecision::Allowed
    }
}
