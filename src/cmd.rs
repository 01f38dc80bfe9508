//! External command execution
//!
//! A thin builder over `std::process::Command` for the engine invocations.
//! Arguments are passed as an argv vector, never through a shell.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Builder for an external command.
///
/// # Example
/// ```ignore
/// Cmd::new("docker")
///     .args(["rm", "get-system-info-extract"])
///     .run()?;
/// ```
#[derive(Debug, Clone)]
pub struct Cmd {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    verbose: bool,
}

impl Cmd {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            verbose: false,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the command.
    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Echo the command line to stderr before running it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// The command line as a single display string.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn echo(&self) {
        if self.verbose {
            eprintln!("[exec] {}", self.display_line());
        }
    }

    /// Run the command with inherited stdio.
    ///
    /// Returns `Ok(())` if the exit code is 0. On a non-zero exit the child's
    /// own output has already reached the terminal, so the error only names
    /// the command and code.
    pub fn run(&self) -> Result<()> {
        self.echo();
        let status = self
            .build_command()
            .status()
            .with_context(|| format!("failed to start {}", self.program.display()))?;

        if !status.success() {
            bail!(
                "command failed with exit code {:?}: {}",
                status.code(),
                self.display_line()
            );
        }

        Ok(())
    }

    /// Run the command with captured output.
    ///
    /// Returns stdout on success. On failure the captured stderr is folded
    /// into the error so the caller sees the engine's diagnostic.
    pub fn run_quiet(&self) -> Result<String> {
        self.echo();
        let output = self
            .build_command()
            .output()
            .with_context(|| format!("failed to start {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "command failed with exit code {:?}: {}\n{}",
                output.status.code(),
                self.display_line(),
                stderr.trim_end()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
