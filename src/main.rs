use clap::Parser;
use tally::commands;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tally")]
#[command(version = "0.1.0")]
#[command(about = "Plain text double-entry accounting.", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::Global,

    #[command(subcommand)]
    command: commands::Commands,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = cli.command.run(&cli.global) {
        println!("{e}");
        std::process::exit(1)
    };
}
