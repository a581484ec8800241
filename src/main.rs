//! inkstream - render markdown incrementally from a text stream.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    inkstream::logger::set_verbose(cli.verbose);

    let config = cli::common::load_config(&cli)?;

    match &cli.command {
        Commands::Render { file, output } => cli::render::render_file(file, *output, &config),
        Commands::Stream { file, args, output } => {
            cli::stream::stream_file(file, *args, *output, &config)
        }
    }
}
