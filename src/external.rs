use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::process::Command;

/// Command that is not a builtin: launched as a child process located via the
/// host's standard program search path.
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, args: Vec<OsString>) -> Self {
        Self { name, args }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// The external factory is the dispatcher's fallthrough: it accepts every
    /// name and lets the spawn attempt decide whether the program exists.
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(
            name.into(),
            args.iter().map(|x| x.into()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Spawn the program, block until it terminates, and translate its
    /// completion status: a normal exit passes through, death by signal maps
    /// to 1, an absent program reports "command not found" with 127, and a
    /// failed process creation reports status 1. None of these abort the
    /// interpreter loop.
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let name = self.name.to_string_lossy().into_owned();
        let mut child = match Command::new(&self.name)
            .args(&self.args)
            .current_dir(&env.current_dir)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                writeln!(out, "tinysh: command not found: {name}")?;
                return Ok(127);
            }
            Err(e) => {
                writeln!(out, "tinysh: cannot create process: {e}")?;
                return Ok(1);
            }
        };

        let status = child.wait()?;
        log::debug!("{name} exited with {status}");
        match status.code() {
            Some(code) => Ok(code),
            // Terminated by a signal (or otherwise without an exit code).
            None => Ok(1),
        }
    }
}
