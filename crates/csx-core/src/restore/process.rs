//! Child process execution with captured output and an optional timeout.
//!
//! stdout and stderr are drained on their own reader threads and forwarded
//! line by line over a channel, so a chatty tool can never fill a pipe
//! buffer and stall while the caller waits for it to exit.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between exit checks while waiting on the child.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading output after the child exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Output of a finished child process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Exit status, `None` when the timeout expired and the child was killed.
    pub status: Option<ExitStatus>,

    /// stdout and stderr lines in arrival order.
    pub output: String,
}

impl CapturedOutput {
    pub fn timed_out(&self) -> bool {
        self.status.is_none()
    }

    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success())
    }
}

/// Spawn `command`, capture everything it prints and wait for it.
///
/// When `timeout` expires the child is killed and the returned status is
/// `None`.
pub fn run_captured(command: &mut Command, timeout: Option<Duration>) -> std::io::Result<CapturedOutput> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, tx.clone());
    }
    drop(tx);

    let mut output = String::new();
    let status = wait(&mut child, timeout, &rx, &mut output)?;
    drain(&rx, &mut output);

    Ok(CapturedOutput { status, output })
}

fn wait(
    child: &mut Child,
    timeout: Option<Duration>,
    rx: &Receiver<String>,
    output: &mut String,
) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        if timeout.is_some_and(|limit| start.elapsed() >= limit) {
            child.kill()?;
            // Reap the zombie
            child.wait()?;
            return Ok(None);
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => push_line(output, &line),
            // Both pipes closed; the child is about to exit.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

/// Collect what is still buffered after exit.
///
/// Readers are not joined: a grandchild that inherited the pipes (build
/// server nodes, for instance) may hold them open long after the tool
/// itself exited.
fn drain(rx: &Receiver<String>, output: &mut String) {
    let deadline = Instant::now() + DRAIN_GRACE;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => push_line(output, &line),
            Err(_) => break,
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, tx: Sender<String>) {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}
