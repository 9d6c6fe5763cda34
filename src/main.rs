use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod config;
mod derivation;
mod diagnostics;
mod lang;
mod parse;
mod proof_file;
mod report;
mod rules;
mod ruleset;
mod semant;
mod span;
mod strings;
mod util;

#[cfg(test)]
mod tests;

fn main() {
    // FITCH_LOG works like RUST_LOG, e.g. FITCH_LOG=fitch::rules=trace
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .without_time(),
        )
        .with(EnvFilter::try_from_env("FITCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    cli::run_cli();
}
