//! Engine subprocess lifecycle.

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uci::EngineCommand;

use crate::client::ProtocolClient;
use crate::config::EngineConfig;
use crate::error::{EngineError, LaunchError};
use crate::locator::check_executable;

/// Line that ends the `uci` handshake.
pub const UCI_OK: &str = "uciok";

/// How long the engine gets to exit on its own after `quit`.
const EXIT_GRACE: Duration = Duration::from_millis(300);

/// Options sent after the handshake, in order.
pub fn configuration_commands(config: &EngineConfig) -> Vec<EngineCommand> {
    vec![
        EngineCommand::set_option("Ponder", false),
        EngineCommand::set_option("MultiPV", 1),
        EngineCommand::set_option("Threads", config.threads),
        EngineCommand::set_option("Hash", config.hash_mb),
    ]
}

/// A running engine subprocess and the client talking to it.
///
/// Lifecycle: [`start`](Self::start), any number of queries through
/// [`client`](Self::client), then [`stop`](Self::stop). Dropping an unstopped
/// session performs the same shutdown.
pub struct EngineSession {
    process: Child,
    client: ProtocolClient<ChildStdin>,
    reader: Option<JoinHandle<()>>,
    name: String,
    stopped: bool,
}

impl EngineSession {
    /// Launch the engine at `path` and configure it for single-line analysis.
    ///
    /// # Errors
    ///
    /// - [`LaunchError::NotFound`] / [`LaunchError::NotExecutable`] if `path`
    ///   is not an executable file
    /// - [`LaunchError::Spawn`] if the process cannot be started
    /// - [`EngineError::Io`] if the handshake fails on the pipes
    pub fn start(path: &Path, config: &EngineConfig) -> Result<Self, EngineError> {
        check_executable(path)?;

        let mut process = Command::new(path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(LaunchError::Spawn)?;

        let (stdin, stdout) = match (process.stdin.take(), process.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                reap(&mut process);
                let err = io::Error::new(io::ErrorKind::Other, "engine pipes unavailable");
                return Err(LaunchError::Spawn(err).into());
            }
        };

        let (tx, rx) = mpsc::channel();
        let reader = thread::Builder::new()
            .name("engine-stdout".to_string())
            .spawn(move || forward_lines(stdout, tx));
        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => {
                reap(&mut process);
                return Err(LaunchError::Spawn(e).into());
            }
        };

        let client = ProtocolClient::new(stdin, rx).with_max_wait(config.max_wait());
        let mut session = Self {
            process,
            client,
            reader: Some(reader),
            name: String::new(),
            stopped: false,
        };
        session.configure(config)?;

        info!(engine = %session.name, path = %path.display(), "engine session started");
        Ok(session)
    }

    fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let poll = config.poll_interval();

        self.client.send(&EngineCommand::Uci)?;
        let handshake = self.client.await_exact_line(UCI_OK, poll)?;
        let name = handshake
            .iter()
            .find_map(|line| line.strip_prefix("id name "))
            .map(|name| name.trim().to_string());

        for command in configuration_commands(config) {
            self.client.send(&command)?;
        }
        self.client.sync_ready(poll)?;

        self.name = name.unwrap_or_else(|| "Unknown Engine".to_string());
        Ok(())
    }

    /// The engine's name as reported during the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Client for queries; the session stays the owner of the process.
    pub fn client(&mut self) -> &mut ProtocolClient<ChildStdin> {
        &mut self.client
    }

    /// Send `quit`, close both streams, then make sure the process is gone.
    ///
    /// An engine still running 300 ms after `quit` is killed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if `quit` could not be sent or the process
    /// could not be waited on. A process that is still running is killed
    /// in either case.
    pub fn stop(mut self) -> Result<(), EngineError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        let quit = self.client.send(&EngineCommand::Quit);
        self.client.close();
        let exit = terminate(&mut self.process);
        if let Some(reader) = self.reader.take() {
            if exit.is_ok() {
                if reader.join().is_err() {
                    warn!("engine output reader panicked");
                }
            } else {
                // The pipe may still be open; the thread ends with it.
                debug!("leaving engine output reader detached");
            }
        }
        debug!(engine = %self.name, "engine session stopped");

        quit?;
        exit?;
        Ok(())
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "engine shutdown failed");
        }
    }
}

/// Run `f` against a fresh session and always stop the session afterwards.
///
/// An error from `f` takes precedence over a shutdown error.
pub fn with_session<T, E, F>(path: &Path, config: &EngineConfig, f: F) -> Result<T, E>
where
    F: FnOnce(&mut ProtocolClient<ChildStdin>) -> Result<T, E>,
    E: From<EngineError>,
{
    let mut session = EngineSession::start(path, config)?;
    let result = f(session.client());
    let stopped = session.stop();

    match (result, stopped) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(stop_err)) => {
            warn!(error = %stop_err, "engine shutdown failed after an earlier error");
            Err(e)
        }
    }
}

/// Forward engine output lines into the channel until EOF or the receiver goes away.
fn forward_lines(stdout: ChildStdout, tx: Sender<String>) {
    for line in BufReader::new(stdout).lines() {
        match line {
            Ok(line) => {
                if tx.send(line.trim_end().to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "engine output read failed");
                break;
            }
        }
    }
}

/// Wait briefly for a voluntary exit, then kill.
///
/// A failure while waiting still ends in a kill, so an error never leaves
/// the process running on purpose.
fn terminate(process: &mut Child) -> io::Result<()> {
    match wait_for_exit(process, EXIT_GRACE) {
        Ok(true) => return Ok(()),
        Ok(false) => warn!("engine still running after quit, killing it"),
        Err(e) => {
            reap(process);
            return Err(e);
        }
    }
    if let Err(e) = process.kill() {
        reap(process);
        return Err(e);
    }
    process.wait()?;
    Ok(())
}

/// True if the process exited within `grace`.
fn wait_for_exit(process: &mut Child, grace: Duration) -> io::Result<bool> {
    let deadline = Instant::now() + grace;
    loop {
        if process.try_wait()?.is_some() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn reap(process: &mut Child) {
    let _ = process.kill();
    let _ = process.wait();
}
