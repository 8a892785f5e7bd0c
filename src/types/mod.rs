//! Core types for graphbot.

pub mod generation;
pub mod history;
pub mod message;

pub use generation::*;
pub use history::*;
pub use message::*;
