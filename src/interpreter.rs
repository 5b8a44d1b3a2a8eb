use crate::command::{CommandFactory, ExitCode};
use crate::env::Environment;
use crate::lexer;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// Hard caps on interactive input, carried as configurable limits rather
/// than fixed buffer sizes.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Longest accepted input line, in bytes. An over-long line is rejected
    /// with a diagnostic for that iteration; it is never truncated.
    pub max_line: usize,
    /// Maximum number of tokens kept per line; tokens past the cap are
    /// silently dropped.
    pub max_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line: 1024,
            max_tokens: 64,
        }
    }
}

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and an ordered list of
/// [`CommandFactory`] objects that are queried to create commands by name;
/// the first factory to recognize a name wins, so builtins shadow external
/// programs of the same name. See [`Default`] for the factories included out
/// of the box.
///
/// Example
/// ```
/// use tinysh::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.run("pwd", &[], &mut out).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    limits: Limits,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            limits: Limits::default(),
        }
    }

    /// Replace the default input limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Run a single command invocation by name with arguments, writing any
    /// command output and diagnostics to `out`.
    ///
    /// Returns the command's exit code or an error if the command cannot be
    /// created or fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str], out: &mut dyn Write) -> Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                log::debug!("dispatching {name}");
                return cmd.execute(out, &mut self.env);
            }
        }
        // Unreachable with the default factory set, whose external launcher
        // accepts every name; kept for custom factory sets.
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Dispatch one parsed argument vector: the first token names the
    /// command, the rest are its arguments.
    ///
    /// An empty vector is a no-op that reports success.
    pub fn dispatch(&mut self, tokens: &[String], out: &mut dyn Write) -> Result<ExitCode> {
        let Some((name, args)) = tokens.split_first() else {
            return Ok(0);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(name, &args, out)
    }

    /// The interactive read-eval-print loop.
    ///
    /// Reads one line per iteration, tokenizes it and dispatches the result;
    /// an empty line is skipped without dispatching. The loop ends when the
    /// reader reaches end of input or a handler sets the exit flag. A
    /// per-command failure only affects its own iteration.
    pub fn repl(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.env.should_exit {
            match rl.readline("> ") {
                Ok(line) => {
                    if line.len() > self.limits.max_line {
                        writeln!(
                            out,
                            "tinysh: input line too long ({} > {} bytes)",
                            line.len(),
                            self.limits.max_line
                        )?;
                        continue;
                    }
                    let tokens = lexer::split_into_tokens(&line, self.limits.max_tokens);
                    if tokens.is_empty() {
                        continue;
                    }
                    match self.dispatch(&tokens, out) {
                        Ok(code) => log::debug!("{} returned status {code}", tokens[0]),
                        Err(e) => writeln!(out, "tinysh: {e}")?,
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    writeln!(out)?;
                    break;
                }
                Err(e) => {
                    log::debug!("read error: {e}");
                    writeln!(out)?;
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default command set: the nine builtins
    /// in catalog order, then the external command launcher as fallthrough.
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Ls>::default()),
            Box::new(Factory::<Mkdir>::default()),
            Box::new(Factory::<Rm>::default()),
            Box::new(Factory::<Touch>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Poweroff>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::lock_current_dir;

    #[test]
    fn test_builtin_shadows_external_program() {
        let _lock = lock_current_dir();
        let cur = std::env::current_dir().unwrap();

        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let code = sh.run("pwd", &[], &mut out).unwrap();

        assert_eq!(code, 0);
        // The builtin wrote to our sink; /bin/pwd would have inherited the
        // real stdout and left it empty.
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", cur.display())
        );
    }

    #[test]
    fn test_unknown_name_reports_127_and_loop_survives() {
        let _lock = lock_current_dir();
        let mut sh = Interpreter::default();

        let mut out = Vec::new();
        let code = sh.run("no_such_program_314159", &[], &mut out).unwrap();
        assert_eq!(code, 127);
        assert!(String::from_utf8(out).unwrap().contains("command not found"));

        // The interpreter is still usable afterwards.
        let mut out = Vec::new();
        let code = sh.run("help", &[], &mut out).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_exit_sets_the_termination_flag() {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let code = sh.run("exit", &[], &mut out).unwrap();
        assert_eq!(code, 0);
        assert!(sh.env.should_exit);
    }

    #[test]
    fn test_empty_factory_set_cannot_resolve_anything() {
        let mut sh = Interpreter::new(Vec::new());
        let err = sh.run("pwd", &[], &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    fn test_dispatch_is_case_sensitive() {
        let _lock = lock_current_dir();
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        // "PWD" is not a builtin; it falls through to the launcher and is
        // not found on any sane PATH.
        let code = sh.run("PWD_NOT_A_COMMAND", &[], &mut out).unwrap();
        assert_eq!(code, 127);
    }

    #[test]
    fn test_dispatch_of_empty_vector_is_a_successful_no_op() {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let code = sh.dispatch(&[], &mut out).unwrap();
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_dispatch_routes_first_token_to_its_handler() {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let tokens = vec!["help".to_string()];
        let code = sh.dispatch(&tokens, &mut out).unwrap();
        assert_eq!(code, 0);
        assert!(String::from_utf8(out).unwrap().contains("Built-in commands:"));
    }

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_line, 1024);
        assert_eq!(limits.max_tokens, 64);
    }
}
