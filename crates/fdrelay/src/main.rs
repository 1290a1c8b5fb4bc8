mod child;
mod cmd;
mod exit;
mod logging;
mod relay;

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cmd::{Mode, ModeOptions};
use crate::exit::{CliError, CliResult, FAILURE};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "fdrelay",
    version,
    about = "Pass an open file descriptor to another process over a local datagram channel"
)]
struct Cli {
    /// Sender mode: write one descriptor to the channel.
    #[arg(short = 'w', conflicts_with = "receive")]
    write: bool,

    /// Receiver mode: accept descriptors from the channel.
    #[arg(short = 'r')]
    receive: bool,

    /// Channel socket path.
    #[arg(short = 's', value_name = "PATH")]
    socket: Option<PathBuf>,

    /// File to open read-only and send (sender mode).
    #[arg(short = 'f', value_name = "PATH")]
    file: Option<PathBuf>,

    /// Descriptor number: the source when sending without -f, the target
    /// slot for the child command when receiving with -e.
    #[arg(short = 'd', value_name = "N", default_value_t = 0)]
    descriptor: i32,

    /// Run the trailing arguments as a child command per received
    /// descriptor instead of relaying to stdout.
    #[arg(short = 'e')]
    exec: bool,

    /// Keep receiving until interrupted instead of stopping after one
    /// message.
    #[arg(short = 'p')]
    persistent: bool,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Child command and arguments (with -e), or the channel path when -s
    /// is absent.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

impl Cli {
    /// Resolve parsed flags into a mode and the options the core runs on.
    ///
    /// An explicit -w/-r wins over the invocation-name default.
    fn resolve(self, invocation: &str) -> CliResult<(Mode, ModeOptions)> {
        let mode = if self.write {
            Mode::Send
        } else if self.receive {
            Mode::Receive
        } else {
            mode_from_invocation(invocation)
                .ok_or_else(|| CliError::usage("no mode selected: pass -w or -r"))?
        };

        let mut rest = self.rest;
        let child_argv = if self.exec {
            if rest.is_empty() {
                return Err(CliError::usage("missing command after -e"));
            }
            Some(std::mem::take(&mut rest))
        } else {
            None
        };

        let socket_path = match self.socket {
            Some(path) => path,
            // A bare positional stands in for -s when -e has not claimed
            // the trailing arguments.
            None if child_argv.is_none() && !rest.is_empty() => PathBuf::from(rest.remove(0)),
            None => return Err(CliError::usage("channel socket path is required")),
        };

        Ok((
            mode,
            ModeOptions {
                socket_path,
                file: self.file,
                descriptor: self.descriptor,
                child_argv,
                persistent: self.persistent,
            },
        ))
    }
}

/// Mode implied by the name the program was invoked under.
fn mode_from_invocation(invocation: &str) -> Option<Mode> {
    match Path::new(invocation).file_name().and_then(|name| name.to_str()) {
        Some("sendfd") => Some(Mode::Send),
        Some("recvfd") => Some(Mode::Receive),
        _ => None,
    }
}

fn main() {
    let invocation = std::env::args().next().unwrap_or_default();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too and exit cleanly; anything
            // malformed is fatal with status 1.
            let code = if err.use_stderr() { FAILURE } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.log_format, cli.log_level);

    let result = cli
        .resolve(&invocation)
        .and_then(|(mode, options)| cmd::run(mode, &options));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_receiver_exec_invocation() {
        let cli = Cli::try_parse_from([
            "fdrelay", "-r", "-s", "/tmp/chan.sock", "-d", "0", "-e", "cat", "-n",
        ])
        .expect("receiver args should parse");

        let (mode, options) = cli.resolve("fdrelay").expect("options should resolve");
        assert_eq!(mode, Mode::Receive);
        assert_eq!(options.socket_path, PathBuf::from("/tmp/chan.sock"));
        assert_eq!(
            options.child_argv.as_deref(),
            Some(&["cat".to_string(), "-n".to_string()][..])
        );
    }

    #[test]
    fn bare_positional_supplies_the_channel_path() {
        let cli = Cli::try_parse_from(["fdrelay", "-w", "/tmp/chan.sock"])
            .expect("sender args should parse");

        let (mode, options) = cli.resolve("fdrelay").expect("options should resolve");
        assert_eq!(mode, Mode::Send);
        assert_eq!(options.socket_path, PathBuf::from("/tmp/chan.sock"));
        assert!(options.child_argv.is_none());
    }

    #[test]
    fn rejects_conflicting_mode_flags() {
        let err = Cli::try_parse_from(["fdrelay", "-w", "-r", "/tmp/chan.sock"])
            .expect_err("conflicting modes should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_non_numeric_descriptor() {
        let err = Cli::try_parse_from(["fdrelay", "-r", "-d", "zero", "/tmp/chan.sock"])
            .expect_err("non-numeric descriptor should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn missing_command_after_exec_flag_is_fatal() {
        let cli = Cli::try_parse_from(["fdrelay", "-r", "-s", "/tmp/chan.sock", "-e"])
            .expect("args should parse");

        let err = cli.resolve("fdrelay").expect_err("resolution should fail");
        assert!(err.message.contains("missing command"));
    }

    #[test]
    fn missing_channel_path_is_fatal() {
        let cli = Cli::try_parse_from(["fdrelay", "-r"]).expect("args should parse");

        let err = cli.resolve("fdrelay").expect_err("resolution should fail");
        assert!(err.message.contains("socket path"));
    }

    #[test]
    fn invocation_name_supplies_the_default_mode() {
        assert_eq!(mode_from_invocation("/usr/local/bin/sendfd"), Some(Mode::Send));
        assert_eq!(mode_from_invocation("recvfd"), Some(Mode::Receive));
        assert_eq!(mode_from_invocation("/usr/local/bin/fdrelay"), None);
    }

    #[test]
    fn explicit_mode_flag_overrides_the_invocation_name() {
        let cli = Cli::try_parse_from(["recvfd", "-w", "/tmp/chan.sock"])
            .expect("sender args should parse");

        let (mode, _options) = cli.resolve("recvfd").expect("options should resolve");
        assert_eq!(mode, Mode::Send);
    }
}
