use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use mogisend::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = mogisend::run(cli) {
        if e.is_usage() {
            Cli::command().error(ErrorKind::ArgumentConflict, &e).exit();
        }
        eprintln!("mogisend: {e}");
        std::process::exit(e.exit_code());
    }
}
