//! Child process startup with descriptor remapping.

use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Spawn `argv` with `descriptor` remapped onto the `target` slot before the
/// program image is replaced.
///
/// The remap runs between fork and exec: the received descriptor is
/// duplicated onto the target slot and the original closed when the two
/// numbers differ; when they already match, the slot only has its
/// close-on-exec flag cleared so it survives the exec.
///
/// Remap or exec failure is fatal to the child alone and surfaces here as an
/// error. The child is never waited on; terminated children stay in the
/// process table until an external reaper collects them.
pub fn spawn_with_descriptor(
    descriptor: OwnedFd,
    target: RawFd,
    argv: &[String],
) -> io::Result<u32> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty child command"))?;

    let source = descriptor.as_raw_fd();
    let mut command = Command::new(program);
    command.args(args);
    // SAFETY: remap_onto makes only async-signal-safe libc calls (fcntl,
    // dup2, close), as required between fork and exec.
    unsafe {
        command.pre_exec(move || remap_onto(source, target));
    }

    let child = command.spawn()?;

    // `descriptor` drops here: the child holds its own copy, and the parent
    // is done with this one.
    Ok(child.id())
}

/// Duplicate `source` onto `target`, leaving exactly one open copy at the
/// target slot.
fn remap_onto(source: RawFd, target: RawFd) -> io::Result<()> {
    if source == target {
        // Already in place; clear close-on-exec so the slot survives exec.
        let flags = unsafe { libc::fcntl(source, libc::F_GETFD) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::fcntl(source, libc::F_SETFD, flags & !libc::FD_CLOEXEC) } == -1 {
            return Err(io::Error::last_os_error());
        }
        return Ok(());
    }

    if unsafe { libc::dup2(source, target) } == -1 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::close(source) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
