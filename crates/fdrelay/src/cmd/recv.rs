use std::fs::File;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fdrelay_channel::BoundEndpoint;

use crate::child;
use crate::cmd::ModeOptions;
use crate::exit::{channel_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::relay;

/// Chunk size for the relay path.
const RELAY_CHUNK_SIZE: usize = 4096;

/// Bind the channel and service transfer messages.
///
/// Cancellation is cooperative: the signal handler flips a shared flag that
/// is checked only between iterations, never inside the blocking receive. A
/// signal landing mid-receive takes effect once that receive completes or
/// fails, not immediately.
pub fn run(options: &ModeOptions) -> CliResult<i32> {
    let endpoint = BoundEndpoint::bind(&options.socket_path)
        .map_err(|err| channel_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_signal_handler(running.clone())?;

    serve(&endpoint, options, &running);

    Ok(SUCCESS)
}

fn serve(endpoint: &BoundEndpoint, options: &ModeOptions, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        match endpoint.recv_descriptor() {
            Ok(descriptor) => dispatch(options, descriptor),
            // No descriptor to dispatch; the iteration is skipped but the
            // loop keeps going.
            Err(err) => tracing::warn!(error = %err, "receive failed"),
        }

        if !options.persistent {
            running.store(false, Ordering::SeqCst);
        }
    }
}

/// Hand a received descriptor to the configured child command, or relay its
/// bytes to stdout and close it. Failures on either path never abort the
/// receiver.
fn dispatch(options: &ModeOptions, descriptor: OwnedFd) {
    if let Some(argv) = &options.child_argv {
        match child::spawn_with_descriptor(descriptor, options.descriptor, argv) {
            Ok(pid) => tracing::debug!(pid, "child started"),
            Err(err) => tracing::error!(error = %err, "child startup failed"),
        }
    } else {
        let mut input = File::from(descriptor);
        let stdout = io::stdout();
        let mut output = stdout.lock();

        match relay::copy_stream(&mut output, &mut input, RELAY_CHUNK_SIZE) {
            Ok(bytes) => tracing::debug!(bytes, "relayed descriptor to stdout"),
            Err(err) => tracing::warn!(error = %err, "relay failed"),
        }
        if let Err(err) = output.flush() {
            tracing::warn!(error = %err, "stdout flush failed");
        }
        // `input` drops here, closing the received descriptor.
    }
}

fn install_signal_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(FAILURE, format!("signal handler setup failed: {err}")))
}
