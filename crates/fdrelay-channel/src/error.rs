use std::path::PathBuf;

/// Errors that can occur on a descriptor channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to bind the channel path.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the channel path.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The channel path is too long for the platform.
    #[error("channel path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Failed to transmit a descriptor message.
    #[error("failed to send descriptor: {0}")]
    Send(std::io::Error),

    /// Failed to receive a descriptor message.
    #[error("failed to receive descriptor: {0}")]
    Receive(std::io::Error),

    /// A message arrived without a descriptor in its ancillary data.
    #[error("message carried no descriptor")]
    MissingDescriptor,
}

pub type Result<T> = std::result::Result<T, ChannelError>;
