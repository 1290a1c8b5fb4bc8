use std::fs::File;
use std::os::fd::{AsFd, BorrowedFd};

use fdrelay_channel::ConnectedEndpoint;

use crate::cmd::ModeOptions;
use crate::exit::{channel_error, io_error, CliResult, SUCCESS};

/// Resolve the source descriptor, connect, perform exactly one transfer.
pub fn run(options: &ModeOptions) -> CliResult<i32> {
    // The source is resolved before touching the channel; an unopenable
    // file aborts without any transfer attempt.
    let opened = match &options.file {
        Some(path) => Some(File::open(path).map_err(|err| {
            io_error(&format!("failed to open {}", path.display()), err)
        })?),
        None => None,
    };

    let channel = ConnectedEndpoint::connect(&options.socket_path)
        .map_err(|err| channel_error("connect failed", err))?;

    let descriptor: BorrowedFd<'_> = match &opened {
        Some(file) => file.as_fd(),
        // SAFETY: the descriptor number came from the command line; the
        // caller asserts it is open in this process for the duration of the
        // send.
        None => unsafe { BorrowedFd::borrow_raw(options.descriptor) },
    };

    channel
        .send_descriptor(descriptor)
        .map_err(|err| channel_error("send failed", err))?;

    tracing::debug!(path = ?options.socket_path, "descriptor sent");

    Ok(SUCCESS)
}
