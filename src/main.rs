use clap::Parser;
use rulesim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
