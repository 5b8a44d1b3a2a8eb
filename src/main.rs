use std::io::Write;
use tinysh::Interpreter;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut out = std::io::stdout();
    writeln!(out, "tinysh - Tiny Shell")?;
    writeln!(out, "Type 'help' for built-in commands")?;
    writeln!(out)?;

    Interpreter::default().repl(&mut out)?;
    Ok(())
}
