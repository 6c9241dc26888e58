use crate::error::{Result, StatsError};
use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// One program invocation inside a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    program: String,
    args: Vec<String>,
}

impl Stage {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }

    pub fn line_count() -> Self {
        Self::new("wc", ["-l"])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

pub fn describe(pipeline: &[Stage]) -> String {
    pipeline
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Runs a pipeline of external commands and returns the final stage's output.
pub trait CommandRunner {
    fn run(&self, pipeline: &[Stage]) -> Result<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, pipeline: &[Stage]) -> Result<String> {
        (**self).run(pipeline)
    }
}

/// Spawns real processes in the repository directory, wiring each stage's
/// stdout into the next stage's stdin.
pub struct ProcessRunner {
    dir: PathBuf,
    external: Cell<Duration>,
}

impl ProcessRunner {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            external: Cell::new(Duration::ZERO),
        }
    }

    /// Total wall time spent waiting on external commands.
    pub fn external_time(&self) -> Duration {
        self.external.get()
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, pipeline: &[Stage]) -> Result<String> {
        if pipeline.is_empty() {
            return Err(StatsError::Command("Empty pipeline".to_string()));
        }

        let start = Instant::now();
        let mut children = Vec::with_capacity(pipeline.len());
        let mut upstream = None;

        for (i, stage) in pipeline.iter().enumerate() {
            let mut command = Command::new(&stage.program);
            command
                .args(&stage.args)
                .current_dir(&self.dir)
                .stdout(Stdio::piped())
                .stderr(Stdio::null());
            match upstream.take() {
                Some(stdout) => {
                    command.stdin(Stdio::from(stdout));
                }
                None => {
                    command.stdin(Stdio::null());
                }
            }

            let mut child = command
                .spawn()
                .map_err(|e| StatsError::Command(format!("Failed to spawn `{stage}`: {e}")))?;
            if i + 1 < pipeline.len() {
                upstream = child.stdout.take();
            }
            children.push(child);
        }

        let last = children
            .pop()
            .ok_or_else(|| StatsError::Command("Empty pipeline".to_string()))?;
        let output = last.wait_with_output()?;
        // a failed upstream stage fails the whole pipeline
        let mut failure = None;
        for (stage, mut child) in pipeline.iter().zip(children) {
            let status = child.wait()?;
            if !status.success() && failure.is_none() {
                failure = Some(format!("`{stage}` exited with {status}"));
            }
        }

        let elapsed = start.elapsed();
        self.external.set(self.external.get() + elapsed);
        debug!(
            "[{}] >> {}",
            humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64)),
            describe(pipeline)
        );

        if let Some(failure) = failure {
            return Err(StatsError::Command(failure));
        }
        if !output.status.success() {
            return Err(StatsError::Command(format!(
                "`{}` exited with {}",
                describe(pipeline),
                output.status
            )));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        while text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}
