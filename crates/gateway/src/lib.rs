//! Gateway: HTTP + WebSocket server for one-shot cookie extraction.
//!
//! Lifecycle per connection:
//! 1. Accept the WebSocket upgrade (everything else gets the health probe)
//! 2. Wait (bounded) for the first message
//! 3. Gate it against the per-connection rate limit
//! 4. Classify the payload; a `cookie` request drives the browser collaborator
//! 5. Send exactly one terminal response, then close with a defined code
//!
//! Connections are fully independent: each task owns its own gate state, and
//! the browser collaborator is acquired per request, never shared.

pub mod gate;
pub mod server;
pub mod state;
pub mod ws;
