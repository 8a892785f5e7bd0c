//! graphbot CLI binary entry point.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use graphbot::bot::{render_answer, ChatBot, InvokeInput, InvokeOutput};
use graphbot::cli::{Cli, Commands, RunArgs};
use graphbot::config::BotConfig;
use graphbot::error::Result;
use graphbot::types::Role;

const BLANK_QUESTION: &str = "Please enter a question to get an answer.";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graphbot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(args.question, args.run).await,
        Commands::Chat(args) => handle_chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn build_bot(args: &RunArgs) -> Result<ChatBot> {
    let mut config = BotConfig::from_env()?;
    for line in config.credential_report() {
        debug!("{line}");
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(max_hops) = args.max_hops {
        config.max_hops = max_hops;
    }
    if let Some(t) = args.temperature {
        config.settings.temperature = Some(t);
    }
    ChatBot::from_config(&config)
}

async fn handle_ask(question: String, args: RunArgs) -> Result<()> {
    if question.trim().is_empty() {
        warn!("{BLANK_QUESTION}");
        return Ok(());
    }
    let bot = build_bot(&args)?;
    let outcome = bot.invoke(InvokeInput::new(question)).await;
    print_outcome(outcome, &args)
}

async fn handle_chat(args: RunArgs) -> Result<()> {
    let bot = build_bot(&args)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if let Err(e) = stdout.write_all(b"> ").await {
            warn!(error = %e, "failed to write prompt");
        }
        if let Err(e) = stdout.flush().await {
            warn!(error = %e, "failed to flush stdout");
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            warn!("{BLANK_QUESTION}");
            continue;
        }

        let outcome = bot.invoke(InvokeInput::new(line)).await;
        // Per-question failures are shown and the session continues.
        if let Err(e) = print_outcome(outcome, &args) {
            println!("{}", render_answer(&Err(e)));
        }
    }
    Ok(())
}

fn print_outcome(outcome: Result<InvokeOutput>, args: &RunArgs) -> Result<()> {
    let output = match outcome {
        Ok(output) => output,
        Err(e) => {
            println!("{}", render_answer(&Err(e)));
            return Ok(());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.history)?);
    } else if args.show_history {
        for message in output.history.iter() {
            let role = match message.role() {
                Role::User => "user",
                Role::Model => "model",
                Role::Tool => "tool",
            };
            println!("[{role}] {}", message.text());
            for call in message.tool_calls() {
                println!("  -> {}({})", call.name, call.arguments);
            }
        }
    } else {
        println!("{}", render_answer(&output.answer()));
    }
    Ok(())
}
