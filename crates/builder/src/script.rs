//! Buildpack script execution
//!
//! The "run one script of one buildpack" operation sits behind a trait so
//! the phase drivers can be exercised against a fake. The real invoker
//! spawns a child process, streams its output line-by-line as events, and
//! classifies the result.

use crate::buildpack::{Buildpack, Script};
use async_trait::async_trait;
use stager_errors::{Error, Result};
use stager_events::{Event, EventEmitter, EventSender, LogStream};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Outcome of invoking one buildpack script
#[derive(Debug, Clone)]
pub enum ScriptOutcome {
    /// Exited zero. `stdout` is captured only for capture-mode scripts
    /// (detect and release); it is empty otherwise.
    Ok { stdout: String },
    /// The script file does not exist
    Missing,
    /// Present but not executable, for a phase that cannot shell out
    NotExecutable,
    /// Ran and exited non-zero
    Failed { status: Option<i32> },
}

/// Runs a single buildpack script with the prescribed argument vector
#[async_trait]
pub trait ScriptInvoker: Send + Sync {
    /// Invoke `script` of `buildpack` with `args`, with `cwd` as the
    /// child's working directory.
    ///
    /// # Errors
    ///
    /// Returns an error only when the child process cannot be spawned or
    /// waited on; script-level failures are reported as outcomes.
    async fn invoke(
        &self,
        buildpack: &Buildpack,
        script: Script,
        args: &[String],
        cwd: &Path,
    ) -> Result<ScriptOutcome>;
}

/// Child-process invoker streaming output as events
pub struct CommandInvoker {
    events: Option<EventSender>,
}

impl CommandInvoker {
    #[must_use]
    pub fn new(events: Option<EventSender>) -> Self {
        Self { events }
    }
}

impl EventEmitter for CommandInvoker {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

#[async_trait]
impl ScriptInvoker for CommandInvoker {
    async fn invoke(
        &self,
        buildpack: &Buildpack,
        script: Script,
        args: &[String],
        cwd: &Path,
    ) -> Result<ScriptOutcome> {
        let path = buildpack.script_path(script);
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            return Ok(ScriptOutcome::Missing);
        };
        if !metadata.is_file() {
            return Ok(ScriptOutcome::Missing);
        }

        let executable = metadata.permissions().mode() & 0o111 != 0;
        let mut command;
        if executable {
            command = Command::new(&path);
        } else {
            self.emit_warning(format!(
                "WARNING: buildpack script '/bin/{}' is not executable",
                script.name()
            ));
            if script.captures_output() {
                return Ok(ScriptOutcome::NotExecutable);
            }
            // Shell fallback for the phases that tolerate it
            command = Command::new("sh");
            command.arg(&path);
        }
        command
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        self.emit(Event::ScriptStarted {
            key: buildpack.key.clone(),
            script: script.name().to_string(),
        });

        let mut child = match command.spawn() {
            Ok(child) => child,
            // Not-found / permission-denied at spawn time means the
            // script is effectively absent; callers decide what that
            // means for their phase.
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                return Ok(ScriptOutcome::Missing);
            }
            Err(err) => return Err(Error::io_with_path(&err, &path)),
        };
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let capture = script.captures_output();
        let (captured, ()) = tokio::join!(
            self.stream(stdout, LogStream::Stdout, capture),
            async {
                self.stream(stderr, LogStream::Stderr, false).await;
            }
        );

        let status = child
            .wait()
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        if status.success() {
            Ok(ScriptOutcome::Ok { stdout: captured })
        } else {
            Ok(ScriptOutcome::Failed {
                status: status.code(),
            })
        }
    }
}

impl CommandInvoker {
    async fn stream<R>(&self, reader: Option<R>, stream: LogStream, capture: bool) -> String
    where
        R: AsyncRead + Unpin,
    {
        let mut captured = String::new();
        let Some(reader) = reader else {
            return captured;
        };
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if capture {
                captured.push_str(&line);
                captured.push('\n');
            }
            self.emit(Event::ScriptOutput { stream, line });
        }
        captured
    }
}
