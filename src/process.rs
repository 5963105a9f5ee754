//! External process boundary.
//!
//! Every Maven, javac and java call goes through [`ProcessRunner`]. Production code uses [`SystemRunner`]; tests
//! substitute a scripted runner so the pipeline, builder and harness can be exercised without a JDK.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A structured external command: program, argument vector and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program name without any directory, for matching in tests and logs.
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn has_arg(&self, needle: impl AsRef<OsStr>) -> bool {
        self.args.iter().any(|a| a.as_os_str() == needle.as_ref())
    }

    /// Space-joined rendering for progress lines. Arguments containing whitespace are quoted.
    pub fn command_line(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            out.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                out.push('"');
                out.push_str(&arg);
                out.push('"');
            } else {
                out.push_str(&arg);
            }
        }
        out
    }
}

/// Where one output stream of a child process goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Stream to the automation tool's own terminal.
    Inherit,
    Null,
    /// Truncate and write to a file.
    File(PathBuf),
    /// Append to a file.
    Append(PathBuf),
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutcome {
    pub fn exited(code: i32) -> Self {
        Self { exit_code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<ExitStatus> for ProcessOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("program '{program}' not found on PATH")]
    NotFound { program: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open output file '{}': {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one external command to completion.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation, stdout: &Sink, stderr: &Sink) -> Result<ProcessOutcome, ProcessError>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve_program(program: &OsStr) -> Result<PathBuf, ProcessError> {
        let path = Path::new(program);
        if path.components().count() > 1 {
            return Ok(path.to_path_buf());
        }
        which::which(program).map_err(|_| ProcessError::NotFound {
            program: program.to_string_lossy().into_owned(),
        })
    }
}

fn open_sink(sink: &Sink) -> Result<Stdio, ProcessError> {
    let redirect_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ProcessError::Redirect { path, source }
    };
    let ensure_parent = |path: &Path| -> Result<(), ProcessError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(redirect_err(path))?;
        }
        Ok(())
    };

    match sink {
        Sink::Inherit => Ok(Stdio::inherit()),
        Sink::Null => Ok(Stdio::null()),
        Sink::File(path) => {
            ensure_parent(path)?;
            let file = File::create(path).map_err(redirect_err(path))?;
            Ok(Stdio::from(file))
        }
        Sink::Append(path) => {
            ensure_parent(path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(redirect_err(path))?;
            Ok(Stdio::from(file))
        }
    }
}

fn wait_with_timeout(mut child: Child, program: &str, timeout: Duration) -> Result<ExitStatus, ProcessError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProcessError::TimedOut {
                        program: program.to_string(),
                        timeout,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                return Err(ProcessError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        }
    }
}

impl ProcessRunner for SystemRunner {
    #[tracing::instrument(skip_all, fields(program = %invocation.program_name()))]
    fn run(&self, invocation: &Invocation, stdout: &Sink, stderr: &Sink) -> Result<ProcessOutcome, ProcessError> {
        let program = Self::resolve_program(&invocation.program)?;
        let name = invocation.program_name();

        let mut cmd = Command::new(&program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(open_sink(stdout)?)
            .stderr(open_sink(stderr)?);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(command = %invocation.command_line(), "spawning");

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: name.clone(),
            source,
        })?;

        let status = match self.timeout {
            Some(timeout) => wait_with_timeout(child, &name, timeout)?,
            None => child.wait().map_err(|source| ProcessError::Wait { program: name, source })?,
        };
        tracing::debug!(exit_code = ?status.code(), "process finished");
        Ok(status.into())
    }
}
