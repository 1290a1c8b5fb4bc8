//! Descriptor handoff between unrelated processes.
//!
//! The `fdrelay` binary sends an already-open file descriptor (an accepted
//! socket, an opened file) to a separate process over a Unix datagram
//! channel, where it is either relayed to stdout or handed to a freshly
//! spawned child on a chosen descriptor slot. This library surface
//! re-exports the channel layer for programmatic senders and receivers.

/// Re-export channel endpoint and transfer types.
pub mod channel {
    pub use fdrelay_channel::*;
}
