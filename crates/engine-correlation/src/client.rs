//! Line-oriented request/response client for a UCI engine.
//!
//! The client writes commands to the engine's input and collects its output
//! from a channel of lines. Responses are gathered with a sleep-then-drain
//! loop rather than blocking reads: search time is open-ended and the caller
//! sees progressive `info` output as it arrives.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use uci::{extract_position_fen, EngineCommand, GoOptions, BESTMOVE_PREFIX};

use crate::error::EngineError;
use crate::wait::{Backoff, CancelToken, WaitOutcome};

/// Line that acknowledges `isready`.
pub const READY_OK: &str = "readyok";

/// Raw lines collected for one command cycle, terminator included.
pub type EngineResponse = Vec<String>;

/// Protocol client over an engine's input writer and output lines.
///
/// Every query takes `&mut self`, so at most one is in flight.
pub struct ProtocolClient<W: Write> {
    writer: Option<W>,
    lines: Receiver<String>,
    cancel: CancelToken,
    max_wait: Option<Duration>,
}

impl<W: Write> ProtocolClient<W> {
    /// Client writing commands to `writer` and reading the engine's output
    /// from `lines`, one line per message without the newline.
    ///
    /// There is no response ceiling until [`Self::with_max_wait`] sets one.
    pub fn new(writer: W, lines: Receiver<String>) -> Self {
        Self {
            writer: Some(writer),
            lines,
            cancel: CancelToken::new(),
            max_wait: None,
        }
    }

    /// Fail queries whose terminator does not arrive within `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Handle that aborts waits on this client from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The underlying writer, if the client has not been closed.
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    /// Drop the writer and disconnect from the output lines.
    pub fn close(&mut self) {
        self.writer = None;
        let (_, disconnected) = mpsc::channel();
        self.lines = disconnected;
    }

    /// Send one protocol command.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the write or flush fails, or with
    /// [`io::ErrorKind::BrokenPipe`] once the client has been closed.
    pub fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        self.send_line(&command.to_uci())
    }

    /// Write one newline-terminated line and flush.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`].
    pub fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "engine input already closed")
        })?;
        debug!(cmd = line, "engine <");
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    /// Collect lines until one starts with `sentinel`.
    ///
    /// Each cycle waits per `backoff`, then drains whatever output is
    /// available. Lines after the sentinel stay queued for the next call.
    /// An interrupted wait drains early and carries on.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Cancelled`] - The cancel token fired
    /// * [`EngineError::Timeout`] - The max wait passed without the sentinel
    /// * [`EngineError::Io`] - The engine closed its output first
    pub fn await_response(
        &mut self,
        backoff: Backoff,
        sentinel: &str,
    ) -> Result<EngineResponse, EngineError> {
        self.collect(backoff, |line| line.starts_with(sentinel))
    }

    /// Collect lines until one equals `termination`, polling at a fixed interval.
    pub fn await_exact_line(
        &mut self,
        termination: &str,
        poll: Duration,
    ) -> Result<EngineResponse, EngineError> {
        self.collect(Backoff::fixed(poll), |line| line.trim_end() == termination)
    }

    fn collect(
        &mut self,
        backoff: Backoff,
        is_last: impl Fn(&str) -> bool,
    ) -> Result<EngineResponse, EngineError> {
        let start = Instant::now();
        let mut response = Vec::new();
        let mut cycle: u32 = 0;

        loop {
            match self.cancel.wait(backoff.wait_for_cycle(cycle)) {
                WaitOutcome::Elapsed => {}
                // A short sleep only means an earlier drain.
                WaitOutcome::Interrupted => debug!(cycle, "engine wait interrupted"),
                WaitOutcome::Cancelled => return Err(EngineError::Cancelled),
            }

            if self.drain_until(&mut response, &is_last)? {
                return Ok(response);
            }

            if let Some(max_wait) = self.max_wait {
                if start.elapsed() >= max_wait {
                    return Err(EngineError::Timeout(max_wait));
                }
            }
            cycle = cycle.saturating_add(1);
        }
    }

    /// Move available lines into `response`; true once the terminator was seen.
    fn drain_until(
        &mut self,
        response: &mut EngineResponse,
        is_last: &impl Fn(&str) -> bool,
    ) -> Result<bool, EngineError> {
        loop {
            match self.lines.try_recv() {
                Ok(line) => {
                    trace!(line = line.as_str(), "engine >");
                    let done = is_last(&line);
                    response.push(line);
                    if done {
                        return Ok(true);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(false),
                Err(TryRecvError::Disconnected) => return Err(EngineError::engine_exited()),
            }
        }
    }

    /// Reset the engine's internal game history.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.send(&EngineCommand::NewGame)
    }

    /// Set the engine's position to `fen`, with no moves played after it.
    pub fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        self.send(&EngineCommand::PositionFen(fen.to_string()))
    }

    /// Run a `go` search and collect its output up to the `bestmove` line.
    pub fn search(
        &mut self,
        options: GoOptions,
        backoff: Backoff,
    ) -> Result<EngineResponse, EngineError> {
        self.send(&EngineCommand::Go(options))?;
        self.await_response(backoff, BESTMOVE_PREFIX)
    }

    /// Send `isready` and wait for `readyok`.
    pub fn sync_ready(&mut self, poll: Duration) -> Result<EngineResponse, EngineError> {
        self.send(&EngineCommand::IsReady)?;
        self.await_exact_line(READY_OK, poll)
    }

    /// Piece placement of the engine's current position, from a `d` dump.
    ///
    /// The dump has no terminator of its own, so it is followed by `isready`
    /// and collected up to `readyok`.
    pub fn position_fen(&mut self, poll: Duration) -> Result<String, EngineError> {
        self.send(&EngineCommand::Debug)?;
        let dump = self.sync_ready(poll)?;
        Ok(extract_position_fen(&dump)?)
    }
}
