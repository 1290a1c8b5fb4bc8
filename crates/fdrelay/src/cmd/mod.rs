use std::os::fd::RawFd;
use std::path::PathBuf;

use crate::exit::CliResult;

pub mod recv;
pub mod send;

/// Which side of the channel this invocation drives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Send,
    Receive,
}

/// Configuration resolved before a mode runs.
///
/// Owned by the entry point; the core operations borrow it.
#[derive(Debug)]
pub struct ModeOptions {
    /// Filesystem path of the datagram channel.
    pub socket_path: PathBuf,
    /// File to open read-only and send instead of an explicit descriptor.
    pub file: Option<PathBuf>,
    /// Source descriptor when sending without a file; target slot for the
    /// child command when receiving with one.
    pub descriptor: RawFd,
    /// Child command and arguments. Switches the receiver from relay
    /// dispatch to exec dispatch.
    pub child_argv: Option<Vec<String>>,
    /// Keep the receiver looping instead of stopping after one message.
    pub persistent: bool,
}

pub fn run(mode: Mode, options: &ModeOptions) -> CliResult<i32> {
    match mode {
        Mode::Send => send::run(options),
        Mode::Receive => recv::run(options),
    }
}
