//! Local datagram channel with file descriptor transfer.
//!
//! A channel is a Unix datagram socket addressed by a filesystem path. One
//! process binds the path ([`BoundEndpoint`]), peers connect to it
//! ([`ConnectedEndpoint`]), and single file descriptors travel between them
//! as ancillary data ([`transfer`]).
//!
//! This is the lowest layer of fdrelay. The CLI builds on the two endpoint
//! types provided here.

pub mod endpoint;
pub mod error;
pub mod transfer;

pub use endpoint::{BoundEndpoint, ConnectedEndpoint};
pub use error::{ChannelError, Result};
