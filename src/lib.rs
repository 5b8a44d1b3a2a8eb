//! A tiny interactive command interpreter.
//!
//! This crate provides the read-eval-dispatch core of a minimal shell: it
//! reads one line of input at a time, splits it into whitespace-delimited
//! tokens, resolves the first token against a fixed catalog of built-in
//! commands and otherwise launches an external program through the host's
//! process-creation facilities, waiting for and translating its completion
//! status. It is intentionally small and easy to read, suitable for running
//! as the interactive process of a minimal system.
//!
//! The main entry point is [`Interpreter`], which dispatches commands by name
//! using a set of pluggable factories and drives the interactive loop via
//! [`Interpreter::repl`]. [`Limits`] carries the configurable input caps. The
//! public modules [`command`] and [`env`] expose the traits and types needed
//! to implement your own commands.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
mod lexer;
mod remove;

pub use interpreter::{Interpreter, Limits};

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes tests that read or mutate the process working directory.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        match MUTEX.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn make_unique_temp_dir(tag: &str) -> std::io::Result<PathBuf> {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("tinysh_{tag}_{}_{}", std::process::id(), nanos));
        std::fs::create_dir_all(&p)?;
        Ok(p)
    }
}
