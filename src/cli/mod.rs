//! Command-line surface for graphbot.

use clap::{Args, Parser, Subcommand};

/// graphbot CLI
#[derive(Parser, Debug)]
#[command(name = "graphbot", version, about = "Search-augmented chatbot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question and print the answer
    Ask(AskArgs),
    /// Read questions from stdin until EOF
    Chat(RunArgs),
}

/// Options shared by every command that runs the graph.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Model to use (format: provider:model, e.g., groq:gemma2-9b-it)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum number of step executions per question (at least 1)
    #[arg(long, value_parser = parse_max_hops)]
    pub max_hops: Option<usize>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Print every message of the run, not just the answer
    #[arg(long)]
    pub show_history: bool,

    /// Print the full history as JSON
    #[arg(long, conflicts_with = "show_history")]
    pub json: bool,
}

fn parse_max_hops(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("must be a positive integer, got '{raw}'")),
        Ok(n) => Ok(n),
    }
}

/// Arguments for `graphbot ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question (positional)
    pub question: String,

    #[command(flatten)]
    pub run: RunArgs,
}
