//! Single-descriptor transfer as SCM_RIGHTS ancillary data.
//!
//! A transfer message carries a one-byte placeholder body; the descriptor
//! rides entirely out of band. On receipt the kernel installs a new entry in
//! the receiving process's descriptor table referencing the same open
//! resource. The sender's own descriptor is unaffected and stays open.

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixDatagram;

use nix::sys::socket::{
    recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr,
};

use crate::error::{ChannelError, Result};

/// Placeholder message body. Content is irrelevant, but some platforms
/// refuse ancillary-only datagrams, so one byte always travels in band.
const BODY: [u8; 1] = [0];

/// Send one descriptor on a connected datagram socket.
pub(crate) fn send_one(socket: &UnixDatagram, descriptor: BorrowedFd<'_>) -> Result<()> {
    let iov = [IoSlice::new(&BODY)];
    let fds = [descriptor.as_raw_fd()];
    let control = [ControlMessage::ScmRights(&fds)];

    sendmsg::<UnixAddr>(socket.as_raw_fd(), &iov, &control, MsgFlags::empty(), None)
        .map_err(|errno| ChannelError::Send(errno.into()))?;

    Ok(())
}

/// Receive one descriptor from a bound datagram socket (blocking).
///
/// The message body is drained into a throwaway buffer; the ancillary
/// buffer has room for exactly one descriptor entry. A message without an
/// SCM_RIGHTS entry is a [`ChannelError::MissingDescriptor`] failure; the
/// datagram is fully consumed either way.
pub(crate) fn recv_one(socket: &UnixDatagram) -> Result<OwnedFd> {
    let mut body = [0u8; 8];
    let mut iov = [IoSliceMut::new(&mut body)];
    let mut control = nix::cmsg_space!([RawFd; 1]);

    let message = recvmsg::<UnixAddr>(
        socket.as_raw_fd(),
        &mut iov,
        Some(&mut control),
        MsgFlags::empty(),
    )
    .map_err(|errno| ChannelError::Receive(errno.into()))?;

    let cmsgs = message
        .cmsgs()
        .map_err(|errno| ChannelError::Receive(errno.into()))?;
    for cmsg in cmsgs {
        if let ControlMessageOwned::ScmRights(fds) = cmsg {
            if let Some(&fd) = fds.first() {
                // SAFETY: the kernel created this descriptor in our table
                // for the SCM_RIGHTS entry; nothing else owns it yet.
                return Ok(unsafe { OwnedFd::from_raw_fd(fd) });
            }
        }
    }

    Err(ChannelError::MissingDescriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Read;
    use std::os::fd::AsFd;
    use std::path::PathBuf;

    fn temp_file(tag: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "fdrelay-transfer-{tag}-{}",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("temp file should be writable");
        path
    }

    #[test]
    fn received_descriptor_refers_to_same_file() {
        let (tx, rx) = UnixDatagram::pair().expect("datagram pair");
        let path = temp_file("fidelity", b"through the channel");
        let file = File::open(&path).expect("temp file should open");

        send_one(&tx, file.as_fd()).expect("send should succeed");
        let received = recv_one(&rx).expect("receive should succeed");

        let mut text = String::new();
        File::from(received)
            .read_to_string(&mut text)
            .expect("received descriptor should be readable");
        assert_eq!(text, "through the channel");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn sender_descriptor_stays_open_after_send() {
        let (tx, rx) = UnixDatagram::pair().expect("datagram pair");
        let path = temp_file("sender-open", b"x");
        let file = File::open(&path).expect("temp file should open");

        send_one(&tx, file.as_fd()).expect("send should succeed");
        let _received = recv_one(&rx).expect("receive should succeed");

        // fcntl(F_GETFD) fails with EBADF if the descriptor got closed.
        let flags = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_GETFD) };
        assert_ne!(flags, -1, "sender descriptor unexpectedly closed");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn message_without_ancillary_data_is_an_error() {
        let (tx, rx) = UnixDatagram::pair().expect("datagram pair");
        tx.send(b"\0").expect("plain datagram should send");

        let result = recv_one(&rx);
        assert!(matches!(result, Err(ChannelError::MissingDescriptor)));
    }
}
