//! Running an external checker under a timeout with bounded output capture.

use anyhow::{Context, Result, anyhow};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// How long output readers may run on after the child is gone.
///
/// A grandchild (`npx` forks `node`) can keep the pipes open after the direct child exits
/// or is killed; its remaining output is abandoned once this elapses.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

type Drained = Result<(Vec<u8>, usize)>;

#[derive(Debug)]
pub struct CheckerOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes dropped from each stream after the limit was reached.
    pub stdout_dropped: usize,
    pub stderr_dropped: usize,
    pub timed_out: bool,
}

impl CheckerOutput {
    /// stdout then stderr as lossy UTF-8, with a marker where output was dropped.
    pub fn diagnostics(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        if self.stdout_dropped > 0 {
            text.push_str(&format!("\n[stdout truncated {} bytes]\n", self.stdout_dropped));
        }
        if !self.stderr.is_empty() && !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        if self.stderr_dropped > 0 {
            text.push_str(&format!("\n[stderr truncated {} bytes]\n", self.stderr_dropped));
        }
        text
    }
}

/// Spawn `cmd` with stdin closed and wait at most `timeout`.
///
/// Both pipes are drained on their own threads while the child runs so a chatty checker
/// cannot block on a full pipe. At most `limit` bytes per stream are kept. A child that
/// outlives the timeout is killed and reported with `timed_out`. Readers still blocked
/// [`OUTPUT_DRAIN_GRACE`] after the child is gone are detached, so the call returns within
/// roughly `timeout + OUTPUT_DRAIN_GRACE` even when descendants hold the pipes open.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration, limit: usize) -> Result<CheckerOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn checker")?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let (tx, rx) = mpsc::channel();
    spawn_reader(Stream::Stdout, stdout, limit, tx.clone());
    spawn_reader(Stream::Stderr, stderr, limit, tx);

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for checker")? {
        Some(status) => (status, false),
        None => {
            warn!(timeout_secs = timeout.as_secs(), "checker timed out, killing");
            child.kill().context("kill checker")?;
            (child.wait().context("reap checker")?, true)
        }
    };

    let (out, err) = collect_streams(&rx, OUTPUT_DRAIN_GRACE)?;
    let (stdout, stdout_dropped) = out.unwrap_or_default();
    let (stderr, stderr_dropped) = err.unwrap_or_default();

    debug!(exit_code = ?status.code(), timed_out, "checker finished");
    Ok(CheckerOutput {
        status,
        stdout,
        stderr,
        stdout_dropped,
        stderr_dropped,
        timed_out,
    })
}

fn spawn_reader<R>(stream: Stream, reader: R, limit: usize, tx: mpsc::Sender<(Stream, Drained)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        // The receiver is gone once the grace period expired; nothing left to report to.
        let _ = tx.send((stream, drain_limited(reader, limit)));
    });
}

/// Wait up to `grace` for both readers. A stream whose reader has not finished is `None`.
fn collect_streams(
    rx: &mpsc::Receiver<(Stream, Drained)>,
    grace: Duration,
) -> Result<(Option<(Vec<u8>, usize)>, Option<(Vec<u8>, usize)>)> {
    let deadline = Instant::now() + grace;
    let mut stdout = None;
    let mut stderr = None;

    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, drained)) => stdout = Some(drained.context("collect stdout")?),
            Ok((Stream::Stderr, drained)) => stderr = Some(drained.context("collect stderr")?),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "checker output still open after exit, abandoning readers"
                );
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("output reader thread panicked"));
            }
        }
    }

    Ok((stdout, stderr))
}

fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read checker output")?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len()).min(n);
        kept.extend_from_slice(&chunk[..room]);
        dropped += n - room;
    }

    Ok((kept, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_limited_counts_dropped_bytes() {
        let input = vec![b'x'; 20_000];
        let (kept, dropped) = drain_limited(input.as_slice(), 10_000).expect("read");
        assert_eq!(kept.len(), 10_000);
        assert_eq!(dropped, 10_000);
    }

    #[cfg(unix)]
    #[test]
    fn captures_both_streams() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let out = run_with_timeout(cmd, Duration::from_secs(10), 1024).expect("runs");
        assert_eq!(out.status.code(), Some(3));
        assert!(!out.timed_out);
        assert_eq!(out.diagnostics(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn kills_child_after_timeout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 10"]);
        let out = run_with_timeout(cmd, Duration::from_millis(200), 1024).expect("runs");
        assert!(out.timed_out);
        assert!(!out.status.success());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_is_bounded_when_grandchild_holds_pipes() {
        // Without `exec`, sh forks sleep, which inherits the pipes and survives the kill.
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 6; true"]);
        let started = Instant::now();
        let out = run_with_timeout(cmd, Duration::from_millis(500), 1024).expect("runs");
        let elapsed = started.elapsed();

        assert!(out.timed_out);
        assert!(
            elapsed < Duration::from_secs(4),
            "returned after {elapsed:?}, timeout was 500ms"
        );
    }

    #[test]
    fn collect_streams_gives_up_after_grace() {
        let (tx, rx) = mpsc::channel();
        tx.send((Stream::Stdout, Ok((b"partial".to_vec(), 0))))
            .expect("send");
        let started = Instant::now();
        let (out, err) = collect_streams(&rx, Duration::from_millis(100)).expect("collect");
        assert_eq!(out, Some((b"partial".to_vec(), 0)));
        assert_eq!(err, None);
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(tx);
    }
}
