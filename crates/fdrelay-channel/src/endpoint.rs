use std::os::fd::{BorrowedFd, OwnedFd};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ChannelError, Result};
use crate::transfer;

/// Maximum channel path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

fn validate_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(ChannelError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// Receiving end of a descriptor channel.
///
/// Binds a Unix datagram socket to a filesystem path. Any existing object at
/// the path is removed before binding, so a receiver always reclaims a path
/// left behind by an earlier run. The path is not removed on drop; the next
/// bind cleans it up, and only one active receiver per path is meaningful at
/// a time.
pub struct BoundEndpoint {
    socket: UnixDatagram,
    path: PathBuf,
}

impl BoundEndpoint {
    /// Bind a datagram channel to `path`.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        validate_path_len(&path)?;

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(?path, "removed stale channel path"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(ChannelError::Bind { path, source: err }),
        }

        let socket = UnixDatagram::bind(&path).map_err(|err| ChannelError::Bind {
            path: path.clone(),
            source: err,
        })?;

        info!(?path, "listening on datagram channel");

        Ok(Self { socket, path })
    }

    /// Receive one descriptor (blocking).
    pub fn recv_descriptor(&self) -> Result<OwnedFd> {
        transfer::recv_one(&self.socket)
    }

    /// The path this channel is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sending end of a descriptor channel.
pub struct ConnectedEndpoint {
    socket: UnixDatagram,
}

impl ConnectedEndpoint {
    /// Connect to a bound datagram channel at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        validate_path_len(path)?;

        let socket = UnixDatagram::unbound().map_err(|err| ChannelError::Connect {
            path: path.to_path_buf(),
            source: err,
        })?;
        socket.connect(path).map_err(|err| ChannelError::Connect {
            path: path.to_path_buf(),
            source: err,
        })?;

        debug!(?path, "connected to datagram channel");

        Ok(Self { socket })
    }

    /// Send one descriptor. A single best-effort attempt; there is no retry.
    pub fn send_descriptor(&self, descriptor: BorrowedFd<'_>) -> Result<()> {
        transfer::send_one(&self.socket, descriptor)
    }
}
