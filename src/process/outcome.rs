use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Program, arguments and working directory of one process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
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

/// Classified result of one supervised process.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Exited with code 0.
    Success,
    /// Ran and exited non-zero. Termination by signal is reported as `-1`.
    NonZeroExit { code: i32 },
    /// Could not be started (missing binary, permissions, bad working dir).
    LaunchFailed { error: io::Error },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }

    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            ProcessOutcome::Success
        } else {
            ProcessOutcome::NonZeroExit { code }
        }
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessOutcome::Success => write!(f, "exited successfully"),
            ProcessOutcome::NonZeroExit { code } => write!(f, "exit code {code}"),
            ProcessOutcome::LaunchFailed { error } => write!(f, "error {error}"),
        }
    }
}
