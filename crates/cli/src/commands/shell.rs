//! `scorecap shell` — read commands line by line until `exit` or end of input.
//!
//! Lines use the same grammar as the one-shot commands, optionally prefixed
//! with `!` (`!assign alice --percent 72`). Errors are printed and the loop
//! continues.

use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufRead, Lines};

use super::{CmdResult, Command, dispatch};
use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "scorecap", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// What a single input line asks for.
#[derive(Debug, PartialEq)]
enum Parsed {
    Empty,
    Exit,
    Run(Command),
    /// Help output or a usage error, ready to print.
    Message(String),
}

fn parse_line(line: &str) -> Parsed {
    let line = line.trim();
    let line = line.strip_prefix('!').unwrap_or(line).trim_start();
    if line.is_empty() {
        return Parsed::Empty;
    }
    if matches!(line, "exit" | "quit") {
        return Parsed::Exit;
    }

    match ShellLine::try_parse_from(line.split_whitespace()) {
        Ok(parsed) => Parsed::Run(parsed.command),
        Err(e) => Parsed::Message(e.render().to_string()),
    }
}

pub async fn run<R>(app: &mut App, input: &mut Lines<R>) -> CmdResult
where
    R: AsyncBufRead + Unpin,
{
    println!();
    println!("  scorecap shell");
    println!("  Operator:  {}", app.operator());
    println!("  Records:   {}", app.ledger.len());
    println!("  Type 'help' for commands, 'exit' to quit.");
    println!();

    loop {
        print!("scorecap> ");
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Parsed::Empty => continue,
            Parsed::Exit => break,
            Parsed::Message(text) => println!("{}", text.trim_end()),
            Parsed::Run(command) => {
                if let Err(e) = dispatch(app, command, input).await {
                    eprintln!("❌ {e}");
                }
            }
        }
    }

    println!();
    Ok(())
}
