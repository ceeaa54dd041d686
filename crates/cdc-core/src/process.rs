//! Blocking subprocess execution with a wall-clock timeout.
//!
//! Generalizes the teacher's `tokio::time::timeout` + `tokio::process`
//! pattern (`aivcs-ci`'s stage runner) to a synchronous watchdog-thread
//! shape, per the blocking-pipeline design note (SPEC_FULL.md §1).

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{CdcError, Result};

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program args...` in `cwd` (if given), killing it if it has not
/// exited within `timeout`.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let start = Instant::now();
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| CdcError::ProcessSpawn {
        command: program.to_string(),
        source,
    })?;
    let pid = child.id();

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut stdout);
        }
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = child.wait();
        let _ = tx.send(status.map(|status| (status, stdout, stderr)));
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok((status, stdout, stderr))) => Ok(ProcessOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
            duration: start.elapsed(),
        }),
        Ok(Err(e)) => Err(CdcError::Io(e)),
        Err(_) => {
            kill_pid(pid);
            Err(CdcError::ProcessTimeout {
                command: program.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    let _ = Command::new("kill").arg("-9").arg(pid.to_string()).status();
}

#[cfg(not(unix))]
fn kill_pid(_pid: u32) {}
