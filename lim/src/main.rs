use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use lim::{Error, Interpreter, Object};
use log::info;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Runs lim programs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Program to run. Starts an interactive session when omitted.
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.path {
        Some(path) => run_file(&path),
        None => repl(),
    }
}

fn run_file(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    info!("running `{}` ({} bytes)", path.display(), content.len());

    if let Err(err) = Interpreter::new().run(&content) {
        report(&err);
        bail!("`{}` did not run to completion", path.display());
    }
    Ok(())
}

/// Reads one line at a time. Bindings survive from one line to the next.
fn repl() -> Result<()> {
    let interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            return Ok(());
        }

        match interpreter.run(&input) {
            Ok(Object::Null) => {}
            Ok(obj) => println!("{}", obj),
            Err(err) => report(&err),
        }
    }
}

fn report(err: &Error) {
    let label = match err {
        Error::Syntax(_) => "syntax error",
        Error::Runtime(_) => "runtime error",
    };
    eprintln!("{}", style(label).red().bold());
    eprintln!("{}", err);
}
