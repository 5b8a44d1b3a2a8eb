use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::remove::remove_tree;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided output sink and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, out, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(out, "tinysh: {e}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(out, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

/// Expand leading single-dash flag clusters (`-al` becomes `-a -l`) so that
/// argh, which only understands one switch per token, accepts the combined
/// spellings. Double-dash options and non-flag tokens pass through untouched.
fn expand_flag_clusters(args: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let cluster = arg.len() > 2
            && arg.starts_with('-')
            && !arg.starts_with("--")
            && arg[1..].chars().all(|c| c.is_ascii_alphabetic());
        if cluster {
            out.extend(arg[1..].chars().map(|c| format!("-{c}")));
        } else {
            out.push((*arg).to_string());
        }
    }
    out
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        let expanded = expand_flag_clusters(args);
        let expanded: Vec<&str> = expanded.iter().map(String::as_str).collect();
        Some(match T::from_args(&[name], &expanded) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => return Err(anyhow::anyhow!("cd: missing argument")),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: cannot change directory to {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: cannot change directory to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let cwd = env::current_dir().context("pwd: failed to get current directory")?;
        writeln!(out, "{}", cwd.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(switch, short = 'a')]
    /// include entries whose name begins with a dot
    pub all: bool,

    #[argh(switch, short = 'l')]
    /// long format: permissions, size and name
    pub long: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory
    pub path: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let dir = self.path.as_deref().unwrap_or(".");
        let entries =
            fs::read_dir(dir).with_context(|| format!("ls: cannot open directory {dir}"))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("ls: cannot read directory {dir}"))?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if !self.all && name.starts_with('.') {
                continue;
            }
            if self.long {
                let md = entry
                    .metadata()
                    .with_context(|| format!("ls: cannot stat {name}"))?;
                writeln!(out, "{}{:>10}  {}", mode_string(&md), md.len(), name)?;
            } else {
                writeln!(out, "{name}")?;
            }
        }
        Ok(0)
    }
}

/// Render the ten-character permission column of the long listing: the entry
/// type flag (`d` for directories, `-` otherwise) followed by the rwx
/// triplets for owner, group and other.
#[cfg(unix)]
fn mode_string(md: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = md.permissions().mode();
    let mut s = String::with_capacity(10);
    s.push(if md.is_dir() { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

#[cfg(not(unix))]
fn mode_string(md: &fs::Metadata) -> String {
    let mut s = String::with_capacity(10);
    s.push(if md.is_dir() { 'd' } else { '-' });
    s.push_str(if md.permissions().readonly() {
        "r--r--r--"
    } else {
        "rw-rw-rw-"
    });
    s
}

#[derive(FromArgs)]
/// Create a directory.
pub struct Mkdir {
    #[argh(positional)]
    /// path of the directory to create
    pub path: Option<String>,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn execute(self, _out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let Some(path) = self.path.filter(|p| !p.is_empty()) else {
            return Err(anyhow::anyhow!("mkdir: missing argument"));
        };
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&path)
            .with_context(|| format!("mkdir: cannot create directory {path}"))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove files or directories.
pub struct Rm {
    #[argh(switch, short = 'r')]
    /// remove directories and their contents recursively
    pub recursive: bool,

    #[argh(switch, short = 'R')]
    /// same as -r
    pub recursive_compat: bool,

    #[argh(switch, short = 'f')]
    /// keep going past per-path failures instead of aborting
    pub force: bool,

    #[argh(positional, greedy)]
    /// paths to remove, processed in order
    pub paths: Vec<String>,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn execute(self, out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        if self.paths.is_empty() {
            return Err(anyhow::anyhow!("rm: missing argument"));
        }
        let recursive = self.recursive || self.recursive_compat;

        for path in &self.paths {
            let md = match fs::symlink_metadata(path) {
                Ok(md) => md,
                Err(_) if self.force => continue,
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("rm: cannot stat {path}")));
                }
            };

            if md.is_dir() && !recursive {
                // The diagnostic is printed even under -f; only the abort is
                // suppressed.
                writeln!(out, "tinysh: rm: {path}: is a directory (use -r)")?;
                if self.force {
                    continue;
                }
                return Ok(1);
            }

            let removed = if md.is_dir() {
                remove_tree(Path::new(path))
            } else {
                fs::remove_file(path).map_err(anyhow::Error::new)
            };
            match removed {
                Ok(()) => {}
                Err(_) if self.force => continue,
                Err(e) => return Err(e.context(format!("rm: cannot remove {path}"))),
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Create an empty file if it does not already exist.
pub struct Touch {
    #[argh(positional)]
    /// file to create
    pub path: Option<String>,
}

impl BuiltinCommand for Touch {
    fn name() -> &'static str {
        "touch"
    }

    fn execute(self, _out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let Some(path) = self.path.filter(|p| !p.is_empty()) else {
            return Err(anyhow::anyhow!("touch: missing argument"));
        };
        // Opened with the create flag and dropped immediately; an existing
        // file is left untouched (no truncation).
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("touch: cannot open {path}"))?;
        Ok(0)
    }
}

const CATALOG: &str = "\
tinysh - Tiny Shell
Built-in commands:
  cd <dir>                  - Change directory
  pwd                       - Print working directory
  ls [-a] [-l] [dir]        - List directory contents
  mkdir <dir>               - Create directory (mode 0755)
  rm [-r|-R] [-f] <path>... - Remove files or directories
  touch <file>              - Create empty file
  help [command]            - Show this help or usage for one command
  exit                      - Exit shell
  poweroff                  - Exit shell and power off system
";

/// Usage text for one builtin, reusing the parser's own `--help` rendering.
fn argh_usage<T: BuiltinCommand>() -> String {
    match T::from_args(&[T::name()], &["--help"]) {
        Err(EarlyExit { output, .. }) => output,
        Ok(_) => String::new(),
    }
}

fn usage_for(name: &str) -> Option<String> {
    match name {
        "cd" => Some(argh_usage::<Cd>()),
        "pwd" => Some(argh_usage::<Pwd>()),
        "ls" => Some(argh_usage::<Ls>()),
        "mkdir" => Some(argh_usage::<Mkdir>()),
        "rm" => Some(argh_usage::<Rm>()),
        "touch" => Some(argh_usage::<Touch>()),
        "help" => Some(argh_usage::<Help>()),
        "exit" => Some(argh_usage::<Exit>()),
        "poweroff" => Some(argh_usage::<Poweroff>()),
        _ => None,
    }
}

#[derive(FromArgs)]
/// Show the command catalog or usage for one built-in.
pub struct Help {
    #[argh(positional)]
    /// name of the built-in to describe
    pub command: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        match self.command {
            None => {
                out.write_all(CATALOG.as_bytes())?;
                Ok(0)
            }
            Some(name) => match usage_for(&name) {
                Some(usage) => {
                    writeln!(out, "{}", usage.trim_end())?;
                    Ok(0)
                }
                None => Err(anyhow::anyhow!("help: unknown command: {name}")),
            },
        }
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; present so stray arguments do not trip the parser
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Flush filesystem buffers and power the system off.
pub struct Poweroff {}

impl BuiltinCommand for Poweroff {
    fn name() -> &'static str {
        "poweroff"
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(out, "Exiting shell and powering off...")?;
        out.flush()?;
        replace_with_poweroff();
        // Reached only when the image replacement failed: terminate normally.
        env.should_exit = true;
        Ok(0)
    }
}

#[cfg(unix)]
fn replace_with_poweroff() {
    use std::os::unix::process::CommandExt;
    nix::unistd::sync();
    let err = std::process::Command::new("/bin/poweroff").exec();
    log::debug!("exec /bin/poweroff failed: {err}");
}

#[cfg(not(unix))]
fn replace_with_poweroff() {}
