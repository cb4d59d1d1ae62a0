// caninject/src/bin/can-inject.rs
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Command line tool to replay a CAN capture file to a CAN bridge over a
//! serial port, for testing the bridge without a vehicle bus.
//!
//! ```text
//! $ can-inject /dev/ttyUSB0 capture.txt
//! $ can-inject /dev/ttyUSB0 capture.txt --delay 50
//! $ can-inject /dev/ttyUSB0 capture.txt --filter 180,5C5,60D
//! $ can-inject /dev/ttyUSB0 capture.txt --loop
//! $ can-inject --list-ports
//! ```

use anyhow::{Context, Result};
use caninject::{
    available_ports, constants::DEFAULT_DELAY_MS, run_injection, FilterSet, InjectConfig,
};
use clap::{arg, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::{
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

// Make the app version the same as the package.
const VERSION: &str = env!("CARGO_PKG_VERSION");

// --------------------------------------------------------------------------

fn cli() -> Command<'static> {
    Command::new("can-inject")
        .version(VERSION)
        .about("Inject captured CAN frames over a serial port for CAN bridge testing")
        .disable_help_flag(true)
        .arg(
            arg!(-h --help "Print help information")
                .short_alias('?')
                .action(ArgAction::Help)
                .global(true),
        )
        .arg(arg!([port] "The serial port, like '/dev/ttyUSB0' or 'COM3'"))
        .arg(arg!([file] "The CAN capture file to replay"))
        .arg(
            arg!(-d --delay <MS> "Delay between frames in ms")
                .required(false)
                .value_parser(value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(-f --filter <IDS> "Comma-separated CAN IDs to inject (hex, e.g. 180,5C5,60D)")
                .required(false),
        )
        .arg(
            Arg::new("loop")
                .short('l')
                .long("loop")
                .help("Loop continuously through the file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress frame-by-frame output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .help("List available serial ports")
                .action(ArgAction::SetTrue),
        )
}

fn flag(opts: &ArgMatches, id: &str) -> bool {
    opts.get_one::<bool>(id).copied().unwrap_or(false)
}

// --------------------------------------------------------------------------

/// Print the attached serial ports.
fn list_ports() {
    match available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial ports found."),
        Ok(ports) => {
            println!("Available serial ports:");
            for port in ports {
                println!("  {}", port);
            }
        }
        Err(err) => eprintln!("No serial ports found ({})", err),
    }
}

/// Build the run settings from the parsed arguments.
///
/// Only a missing `--filter` means "no filter". An empty value is treated
/// as missing, but a list with no IDs in it, like ",", passes nothing.
fn inject_config(file: &str, opts: &ArgMatches) -> InjectConfig {
    let filter = opts
        .get_one::<String>("filter")
        .filter(|ids| !ids.is_empty())
        .map(|ids| FilterSet::new(ids.split(',')));

    InjectConfig::new(file)
        .with_delay_ms(
            opts.get_one::<u64>("delay")
                .copied()
                .unwrap_or(DEFAULT_DELAY_MS),
        )
        .with_filter(filter)
        .with_loop(flag(opts, "loop"))
        .with_verbose(!flag(opts, "quiet"))
}

/// Run the tool with the parsed arguments, returning the exit status.
///
/// Injection errors are reported by `run_injection` itself.
fn run(cmd: &mut Command<'static>, opts: &ArgMatches, quit: Arc<AtomicBool>) -> i32 {
    if flag(opts, "list-ports") {
        list_ports();
        return 0;
    }

    let (port, file) = match (
        opts.get_one::<String>("port"),
        opts.get_one::<String>("file"),
    ) {
        (Some(port), Some(file)) => (port, file),
        _ => {
            if let Err(err) = cmd.print_help() {
                eprintln!("{}", err);
            }
            println!();
            return 1;
        }
    };

    match run_injection(port, inject_config(file, opts), quit) {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Set the stop flag on ^C.
fn set_quit_handler(quit: &Arc<AtomicBool>) -> Result<()> {
    let quit = Arc::clone(quit);
    ctrlc::set_handler(move || {
        quit.store(true, Ordering::SeqCst);
    })
    .context("Failed to set ^C signal handler")
}

// --------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut cmd = cli();
    let opts = cmd.get_matches_mut();

    let quit = Arc::new(AtomicBool::new(false));
    if let Err(err) = set_quit_handler(&quit) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }

    process::exit(run(&mut cmd, &opts, quit));
}

// --------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::{io::Write, time::Duration};
    use tempfile::NamedTempFile;

    fn run_args(args: &[&str], quit: bool) -> anyhow::Result<i32> {
        let mut cmd = cli();
        let opts = cmd.try_get_matches_from_mut(args)?;
        Ok(run(&mut cmd, &opts, Arc::new(AtomicBool::new(quit))))
    }

    fn config_from(args: &[&str]) -> anyhow::Result<InjectConfig> {
        let opts = cli().try_get_matches_from(args)?;
        Ok(inject_config("capture.txt", &opts))
    }

    fn capture(contents: &str) -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config = config_from(&["can-inject", "/dev/ttyUSB0", "capture.txt"])?;
        assert_eq!(config.delay, Duration::from_millis(10));
        assert_eq!(config.filter, None);
        assert!(!config.loop_forever);
        assert!(config.verbose);
        Ok(())
    }

    #[test]
    fn test_options() -> anyhow::Result<()> {
        let config = config_from(&[
            "can-inject",
            "/dev/ttyUSB0",
            "capture.txt",
            "-d",
            "50",
            "-f",
            "180,5c5",
            "-l",
            "-q",
        ])?;
        assert_eq!(config.delay, Duration::from_millis(50));
        assert_eq!(config.filter, Some(FilterSet::new(["180", "5C5"])));
        assert!(config.loop_forever);
        assert!(!config.verbose);
        Ok(())
    }

    #[test]
    fn test_filter_values() -> anyhow::Result<()> {
        let config = config_from(&["can-inject", "p", "f", "--filter", ""])?;
        assert_eq!(config.filter, None);

        let config = config_from(&["can-inject", "p", "f", "--filter", ","])?;
        let filter = config.filter.expect("filter should be kept");
        assert!(filter.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_ports_ignores_other_args() -> anyhow::Result<()> {
        let code = run_args(
            &[
                "can-inject",
                "/dev/this-port-does-not-exist",
                "/this/capture/does/not/exist.txt",
                "--list-ports",
            ],
            false,
        )?;
        assert_eq!(code, 0);
        Ok(())
    }

    #[test]
    fn test_missing_positionals() -> anyhow::Result<()> {
        assert_eq!(run_args(&["can-inject"], false)?, 1);
        assert_eq!(run_args(&["can-inject", "/dev/ttyUSB0"], false)?, 1);
        Ok(())
    }

    #[test]
    fn test_nonexistent_port() -> anyhow::Result<()> {
        let code = run_args(
            &[
                "can-inject",
                "/dev/this-port-does-not-exist",
                "/this/capture/does/not/exist.txt",
            ],
            false,
        )?;
        assert_eq!(code, 1);
        Ok(())
    }

    // A pseudo-terminal pair stands in for the bridge's USB serial port.
    #[cfg(unix)]
    mod pty {
        use super::*;
        use serialport::{SerialPort, TTYPort};
        use std::io::Read;

        fn bridge() -> anyhow::Result<(TTYPort, TTYPort, String)> {
            let (master, mut slave) = TTYPort::pair()?;
            slave.set_exclusive(false)?;
            let name = slave.name().context("pty has no name")?;
            Ok((master, slave, name))
        }

        fn received(master: &mut TTYPort) -> String {
            let mut out = Vec::new();
            let mut buf = [0u8; 256];
            while let Ok(n) = master.read(&mut buf) {
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
            }
            String::from_utf8_lossy(&out).into_owned()
        }

        #[test]
        fn test_replay() -> anyhow::Result<()> {
            let (mut master, _slave, name) = bridge()?;
            let file = capture("RX ID: 0x180 | DLC: 2 | Data: 01 02\nheader\nRX ID: 0x60D | DLC: 1 | Data: 06\n")?;
            let path = file.path().to_string_lossy().into_owned();

            let code = run_args(&["can-inject", &name, &path, "-d", "0", "-q"], false)?;
            assert_eq!(code, 0);

            let sent = received(&mut master);
            assert_eq!(sent.lines().collect::<Vec<_>>(), vec![">180 01 02", ">60D 06"]);
            Ok(())
        }

        #[test]
        fn test_missing_capture_file() -> anyhow::Result<()> {
            let (_master, _slave, name) = bridge()?;
            let code = run_args(&["can-inject", &name, "/this/capture/does/not/exist.txt"], false)?;
            assert_eq!(code, 1);
            Ok(())
        }

        #[test]
        fn test_interrupt_exits_zero() -> anyhow::Result<()> {
            let (mut master, _slave, name) = bridge()?;
            let file = capture("RX ID: 0x180 | DLC: 1 | Data: 01\n")?;
            let path = file.path().to_string_lossy().into_owned();

            let code = run_args(&["can-inject", &name, &path, "--loop", "-q"], true)?;
            assert_eq!(code, 0);
            assert!(received(&mut master).is_empty());
            Ok(())
        }
    }
}
