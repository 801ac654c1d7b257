#![forbid(unsafe_code)]

//! `hp` entry point.

use std::process::ExitCode;

use clap::Parser;
use hittyping::cli::{self, Cli};
use hittyping::{app, logging};
use hp_render::terminal;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = cli::usage_exit_code(&err);
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    if cli.version {
        println!("hittyping {}", hp_core::VERSION);
        return ExitCode::SUCCESS;
    }

    logging::init();
    terminal::install_panic_hook();

    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fatal");
            terminal::reset_terminal();
            eprintln!("hp: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
