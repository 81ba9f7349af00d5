//! Console shell
//!
//! Stands in for the two display panels: technical-log lines are echoed to
//! stdout from a writer thread, so the hook callback never waits on console
//! I/O, and the typing buffer is kept in memory until the session ends.

use std::io::Write;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::output::{Sink, TypingBuffer};

/// Background writer for technical-log lines
struct Echo {
    tx: mpsc::UnboundedSender<String>,
    writer: JoinHandle<()>,
}

pub struct ConsoleShell {
    echo: Option<Echo>,
    lines: usize,
    buffer: TypingBuffer,
}

impl ConsoleShell {
    /// Create a shell, spawning the echo writer when `echo` is set
    pub fn new(echo: bool) -> Result<Self> {
        let echo = if echo { Some(spawn_echo()?) } else { None };

        Ok(Self {
            echo,
            lines: 0,
            buffer: TypingBuffer::new(),
        })
    }

    /// Number of technical-log lines received
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// The reconstructed text
    pub fn text(&self) -> &str {
        self.buffer.content()
    }
}

impl Sink for ConsoleShell {
    fn append_log_line(&mut self, line: &str) {
        self.lines += 1;
        if let Some(echo) = &self.echo {
            if echo.tx.send(line.to_string()).is_err() {
                warn!("log echo writer has exited");
            }
        }
    }

    fn typing_buffer(&mut self) -> &mut TypingBuffer {
        &mut self.buffer
    }
}

impl Drop for ConsoleShell {
    fn drop(&mut self) {
        if let Some(Echo { tx, writer }) = self.echo.take() {
            // Closing the channel lets the writer drain and exit
            drop(tx);
            if writer.join().is_err() {
                warn!("log echo writer panicked");
            }
        }
    }
}

fn spawn_echo() -> Result<Echo> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = thread::Builder::new()
        .name("log-echo".to_string())
        .spawn(move || {
            let stdout = std::io::stdout();
            while let Some(line) = rx.blocking_recv() {
                let mut out = stdout.lock();
                if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
                    break;
                }
            }
            debug!("log echo writer stopped");
        })
        .context("failed to spawn log echo thread")?;

    Ok(Echo { tx, writer })
}
