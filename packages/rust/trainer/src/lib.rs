//! External fine-tuning job handle.
//!
//! The pipeline's job ends at the dataset; actual fine-tuning runs in an
//! external trainer process (typically a Python stack). This crate wraps
//! that process behind a submit/status/wait/cancel handle with streamed
//! log lines, so the CLI never blocks on or parses trainer output
//! ad hoc.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use blankforge_shared::{BlankforgeError, Result, TrainerConfig};

// ---------------------------------------------------------------------------
// TrainSpec
// ---------------------------------------------------------------------------

/// A fully resolved trainer invocation.
#[derive(Debug, Clone)]
pub struct TrainSpec {
    /// Executable to run.
    pub command: String,
    /// Arguments preceding the train-file flag.
    pub args: Vec<String>,
    /// Flag used to pass the training file (e.g. `--train_file`).
    pub train_file_flag: String,
    /// The JSONL file to train on.
    pub train_file: PathBuf,
    /// Working directory for the trainer process.
    pub workdir: Option<PathBuf>,
}

impl TrainSpec {
    /// Build a spec from configuration and a training file path.
    pub fn from_config(config: &TrainerConfig, train_file: impl Into<PathBuf>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            train_file_flag: config.train_file_flag.clone(),
            train_file: train_file.into(),
            workdir: None,
        }
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Job handle
// ---------------------------------------------------------------------------

/// Where a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// One line of trainer output.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub stream: LogStream,
    pub text: String,
}

/// Terminal or in-flight state of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    /// Non-zero exit; `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    Cancelled,
}

/// Handle to a running trainer process.
pub struct TrainJob {
    child: Child,
    logs: Option<mpsc::Receiver<LogLine>>,
    cancelled: bool,
}

/// Spawn the trainer process described by `spec`.
#[instrument(skip_all, fields(command = %spec.command, train_file = %spec.train_file.display()))]
pub fn submit(spec: &TrainSpec) -> Result<TrainJob> {
    if !spec.train_file.exists() {
        return Err(BlankforgeError::Training(format!(
            "training file not found: {}",
            spec.train_file.display()
        )));
    }

    let mut command = Command::new(&spec.command);
    command
        .args(&spec.args)
        .arg(&spec.train_file_flag)
        .arg(&spec.train_file)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.workdir {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| BlankforgeError::Training(format!("spawn '{}': {e}", spec.command)))?;

    let (tx, rx) = mpsc::channel::<LogLine>(256);

    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, LogStream::Stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, LogStream::Stderr, tx);
    }

    info!(pid = child.id(), "trainer process started");

    Ok(TrainJob {
        child,
        logs: Some(rx),
        cancelled: false,
    })
}

fn forward_lines<R>(reader: R, stream: LogStream, tx: mpsc::Sender<LogLine>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(text)) = lines.next_line().await {
            debug!(?stream, "{text}");
            if tx.send(LogLine { stream, text }).await.is_err() {
                // Receiver dropped; the pipe closes with the process.
                break;
            }
        }
    });
}

impl TrainJob {
    /// Take the log receiver. Yields merged stdout/stderr lines until the
    /// process exits. Can only be taken once.
    pub fn log_lines(&mut self) -> Option<mpsc::Receiver<LogLine>> {
        self.logs.take()
    }

    /// Non-blocking status probe.
    pub fn status(&mut self) -> Result<JobStatus> {
        if self.cancelled {
            return Ok(JobStatus::Cancelled);
        }
        match self.child.try_wait() {
            Ok(None) => Ok(JobStatus::Running),
            Ok(Some(status)) => Ok(exit_to_status(status)),
            Err(e) => Err(BlankforgeError::Training(format!("status probe: {e}"))),
        }
    }

    /// Wait for the trainer to exit.
    pub async fn wait(&mut self) -> Result<JobStatus> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| BlankforgeError::Training(format!("wait: {e}")))?;
        if self.cancelled {
            return Ok(JobStatus::Cancelled);
        }
        Ok(exit_to_status(status))
    }

    /// Kill the trainer process. Idempotent.
    pub async fn cancel(&mut self) -> Result<()> {
        if self.cancelled {
            return Ok(());
        }
        self.cancelled = true;
        match self.child.start_kill() {
            Ok(()) => {
                let _ = self.child.wait().await;
                warn!("trainer process cancelled");
                Ok(())
            }
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(BlankforgeError::Training(format!("cancel: {e}"))),
        }
    }
}

fn exit_to_status(status: std::process::ExitStatus) -> JobStatus {
    if status.success() {
        JobStatus::Succeeded
    } else {
        JobStatus::Failed {
            code: status.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn touch_train_file(dir: &Path) -> PathBuf {
        let path = dir.join("train.jsonl");
        std::fs::write(&path, "{\"text\": \"x\"}\n").unwrap();
        path
    }

    fn sh_spec(script: &str, train_file: PathBuf) -> TrainSpec {
        TrainSpec {
            command: "sh".into(),
            args: vec!["-c".into(), format!("{script} #")],
            train_file_flag: "--train_file".into(),
            train_file,
            workdir: None,
        }
    }

    #[tokio::test]
    async fn successful_job_reports_succeeded() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh_spec("exit 0", touch_train_file(dir.path()));

        let mut job = submit(&spec).unwrap();
        assert_eq!(job.wait().await.unwrap(), JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn failing_job_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh_spec("exit 3", touch_train_file(dir.path()));

        let mut job = submit(&spec).unwrap();
        assert_eq!(
            job.wait().await.unwrap(),
            JobStatus::Failed { code: Some(3) }
        );
    }

    #[tokio::test]
    async fn logs_are_streamed() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh_spec("echo step-1; echo oops >&2", touch_train_file(dir.path()));

        let mut job = submit(&spec).unwrap();
        let mut logs = job.log_lines().expect("first take");
        assert!(job.log_lines().is_none(), "receiver taken twice");

        job.wait().await.unwrap();
        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();
        while let Some(line) = logs.recv().await {
            match line.stream {
                LogStream::Stdout => stdout_lines.push(line.text),
                LogStream::Stderr => stderr_lines.push(line.text),
            }
        }
        assert_eq!(stdout_lines, ["step-1"]);
        assert_eq!(stderr_lines, ["oops"]);
    }

    #[tokio::test]
    async fn cancel_kills_running_job() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh_spec("sleep 30", touch_train_file(dir.path()));

        let mut job = submit(&spec).unwrap();
        assert_eq!(job.status().unwrap(), JobStatus::Running);

        job.cancel().await.unwrap();
        assert_eq!(job.status().unwrap(), JobStatus::Cancelled);
        // Idempotent.
        job.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn missing_train_file_rejected_at_submit() {
        let spec = sh_spec("exit 0", PathBuf::from("/nonexistent/train.jsonl"));
        assert!(submit(&spec).is_err());
    }
}
