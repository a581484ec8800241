//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental markdown renderer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print per-pass debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: inkstream.toml, if present)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a markdown file in one pass
    #[command(visible_alias = "r")]
    Render {
        /// Markdown file, or `-` for stdin
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Feed a markdown file to the renderer chunk by chunk
    #[command(visible_alias = "s")]
    Stream {
        /// Markdown file, or `-` for stdin
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        args: StreamArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Output format shared by all commands.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print a JSON snapshot of the tree instead of HTML
    #[arg(short, long)]
    pub json: bool,
}

/// Stream command arguments.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct StreamArgs {
    /// Chunk size in bytes (rounded up to a char boundary)
    #[arg(short, long, default_value_t = 16)]
    pub chunk: usize,

    /// Pause between chunks, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Fail unless the streamed tree matches a one-shot render
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_args() {
        let cli = Cli::parse_from(["inkstream", "-v", "stream", "doc.md", "--chunk", "4", "--check"]);
        assert!(cli.verbose);
        let Commands::Stream { file, args, output } = cli.command else {
            panic!("expected stream command");
        };
        assert_eq!(file, PathBuf::from("doc.md"));
        assert_eq!(args.chunk, 4);
        assert!(args.check);
        assert!(!output.json);
    }

    #[test]
    fn test_parse_render_json() {
        let cli = Cli::parse_from(["inkstream", "render", "-", "--json", "-C", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Render { output: OutputArgs { json: true }, .. }));
    }
}
