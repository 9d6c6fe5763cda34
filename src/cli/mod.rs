use crate::{
    cli::{
        check_command::{CheckCommand, run_check},
        parse_command::{ParseCommand, run_parse},
        rules_command::{RulesCommand, run_rules},
    },
    config::ConfigError,
    ruleset::RegistryError,
    util::ansi::{ANSI_BOLD, ANSI_RED, ANSI_RESET},
};
use argh::FromArgs;
use std::path::PathBuf;
use thiserror::Error;

mod check_command;
mod parse_command;
mod rules_command;

/// Check natural-deduction derivations.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Check(CheckCommand),
    Rules(RulesCommand),
    Parse(ParseCommand),
}

/// Failures that stop a command before any line is checked.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no ruleset named `{0}`")]
    UnknownRuleset(String),
    #[error("no language named `{0}`")]
    UnknownLanguage(String),
    #[error("file watching failed: {0}")]
    Watch(#[from] notify::Error),
}

pub fn run_cli() {
    let args: Args = argh::from_env();

    let result = match args.command {
        Command::Check(cmd) => run_check(cmd),
        Command::Rules(cmd) => run_rules(cmd),
        Command::Parse(cmd) => run_parse(cmd),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{ANSI_RED}{ANSI_BOLD}error:{ANSI_RESET} {err}");
            std::process::exit(1);
        }
    }
}
