use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "pmap", version, about = "pmap record tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode and validate every record file under a directory.
    ///
    /// Files ending in .yaml, .yml or .json are checked independently. Exits
    /// non-zero when any file fails.
    Validate {
        /// Directory to search recursively.
        dir: PathBuf,

        /// Only print failing files and the summary.
        #[arg(long, short, default_value_t = false)]
        quiet: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate { dir, quiet } => commands::validate::run(&dir, quiet),
    }
}
