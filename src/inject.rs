// caninject/src/inject.rs
//
// Implements the frame replay loop.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Frame injection.
//!
//! An [`Injector`] owns the link to the bridge for one run. Each pass it
//! re-reads the capture file from disk, so the file can be edited while a
//! looping run is going. For every frame in the file it:
//!
//! 1. counts the frame as seen,
//! 2. skips it if a filter is active and the ID isn't in it,
//! 3. writes the frame's command to the link,
//! 4. shows any reply line that's already waiting, and
//! 5. sleeps for the configured delay.
//!
//! A shared stop flag, normally set from a ^C handler, is checked between
//! frames.

use crate::{
    constants::{DEFAULT_DELAY_MS, SETTLE_TIME},
    dump::Reader,
    transport::open_port,
    Error, FilterSet, Frame, Result, Transport,
};
use log::debug;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// Settings for an injection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectConfig {
    /// The capture file to replay
    pub capture_path: PathBuf,
    /// Pause after each injected frame
    pub delay: Duration,
    /// Only inject frames with these IDs
    pub filter: Option<FilterSet>,
    /// Replay the file over and over until stopped
    pub loop_forever: bool,
    /// Print each command and reply
    pub verbose: bool,
}

impl InjectConfig {
    /// Creates a configuration for a single verbose pass over the file,
    /// with the default delay and no filter.
    pub fn new<P: AsRef<Path>>(capture_path: P) -> Self {
        Self {
            capture_path: capture_path.as_ref().to_path_buf(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            filter: None,
            loop_forever: false,
            verbose: true,
        }
    }

    /// Set the delay between frames, in milliseconds
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    /// Set the ID filter.
    ///
    /// A filter with no IDs passes nothing; use `None` to inject every frame.
    pub fn with_filter(mut self, filter: Option<FilterSet>) -> Self {
        self.filter = filter;
        self
    }

    /// Set whether to loop forever
    pub fn with_loop(mut self, loop_forever: bool) -> Self {
        self.loop_forever = loop_forever;
        self
    }

    /// Set whether to print each frame
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// The counts from one pass over the capture file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Frames parsed from the file, whether injected or not
    pub seen: usize,
    /// Frames written to the link
    pub injected: usize,
    /// The pass was cut short by the stop flag
    pub interrupted: bool,
}

/// The totals for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Passes started over the capture file
    pub passes: usize,
    /// Frames parsed, over all passes
    pub frames_seen: usize,
    /// Frames written, over all passes
    pub frames_injected: usize,
    /// The run ended because the stop flag was set
    pub interrupted: bool,
}

impl Summary {
    fn add(&mut self, pass: &PassSummary) {
        self.passes += 1;
        self.frames_seen += pass.seen;
        self.frames_injected += pass.injected;
        self.interrupted |= pass.interrupted;
    }
}

/// Replays a capture file to the bridge.
#[derive(Debug)]
pub struct Injector<T> {
    port: T,
    config: InjectConfig,
    stop: Arc<AtomicBool>,
}

impl<T: Transport> Injector<T> {
    /// Creates an injector that owns the link.
    pub fn new(port: T, config: InjectConfig) -> Self {
        Self {
            port,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a shared flag to stop the run.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Gets the flag that stops the run when set.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Gets the configuration.
    pub fn config(&self) -> &InjectConfig {
        &self.config
    }

    /// Gets a reference to the link.
    pub fn get_ref(&self) -> &T {
        &self.port
    }

    /// Releases the link.
    pub fn into_inner(self) -> T {
        self.port
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Runs passes over the capture file until done or stopped.
    pub fn run(&mut self) -> Result<Summary> {
        let filter = self.config.filter.clone();
        if let Some(filter) = &filter {
            println!("Filtering: {}", filter);
        }

        let mut summary = Summary::default();

        loop {
            let pass = self.run_pass(filter.as_ref())?;
            summary.add(&pass);

            if pass.interrupted {
                println!("\nStopped by user");
                break;
            }
            println!(
                "\nProcessed {} frames, injected {}",
                pass.seen, pass.injected
            );

            if !self.config.loop_forever {
                break;
            }
            if self.stopped() {
                summary.interrupted = true;
                println!("\nStopped by user");
                break;
            }
            println!("Looping... (Ctrl+C to stop)");
        }

        Ok(summary)
    }

    /// Makes one pass over the capture file.
    pub fn run_pass(&mut self, filter: Option<&FilterSet>) -> Result<PassSummary> {
        let path = &self.config.capture_path;
        debug!("Reading capture {}", path.display());

        let reader = Reader::from_file(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.clone()),
            _ => Error::Io(err),
        })?;

        let mut pass = PassSummary::default();

        for frame in reader {
            if self.stopped() {
                pass.interrupted = true;
                break;
            }

            let frame = frame?;
            pass.seen += 1;

            if filter.map_or(false, |f| !f.matches(&frame)) {
                continue;
            }

            pass.injected += 1;
            self.inject(&frame, pass.injected)?;
        }

        debug!("Pass done: {:?}", pass);
        Ok(pass)
    }

    // Writes one frame, shows any reply, and paces the output.
    fn inject(&mut self, frame: &Frame, seq: usize) -> Result<()> {
        let cmd = frame.to_command();
        self.port.write_all(cmd.as_bytes())?;
        self.port.write_all(b"\n")?;

        if self.config.verbose {
            println!("[{:04}] {}", seq, cmd);
        }

        self.poll_response();

        if !self.config.delay.is_zero() {
            thread::sleep(self.config.delay);
        }
        Ok(())
    }

    // Reads a reply only if one is already waiting. Never waits or retries.
    fn poll_response(&mut self) {
        match self.port.bytes_to_read() {
            Ok(0) => {}
            Ok(_) => match self.port.read_line() {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if self.config.verbose && !line.is_empty() {
                        println!("       <- {}", line);
                    }
                }
                Ok(None) => {}
                Err(err) => debug!("Reply read failed: {}", err),
            },
            Err(err) => debug!("Can't poll for reply: {}", err),
        }
    }
}

/// Opens the bridge's serial port and replays the capture to it.
///
/// The port is held for the whole run and closed before returning,
/// whether the run succeeded, failed, or was stopped. Any error is
/// reported on stderr here, ahead of the closing message, so callers
/// only need to pick an exit status from the result.
pub fn run_injection(port: &str, config: InjectConfig, stop: Arc<AtomicBool>) -> Result<Summary> {
    let link = match open_port(port) {
        Ok(link) => link,
        Err(err) => {
            eprintln!("Error: {}", err);
            return Err(err);
        }
    };
    println!("Connected to {}", port);

    // give the bridge time to boot
    thread::sleep(SETTLE_TIME);

    let mut injector = Injector::new(link, config).with_stop_flag(stop);
    let res = injector.run();

    if let Err(err) = &res {
        eprintln!("Error: {}", err);
    }

    drop(injector);
    println!("Serial port closed");

    res
}

/////////////////////////////////////////////////////////////////////////////
