//! graphbot: a search-augmented chatbot driven by a small step graph.
//!
//! A question becomes a one-message history. The executor runs `respond`,
//! lets the router pick the next edge, runs `invoke_tool` whenever the model
//! asks for a tool, and stops once the model answers in plain text.
//!
//! # Quick Start
//!
//! ```no_run
//! use graphbot::prelude::*;
//!
//! # async fn example() -> graphbot::error::Result<()> {
//! let config = BotConfig::from_env()?;
//! let bot = ChatBot::from_config(&config)?;
//! let answer = bot.ask("Who is the president of the USA?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
