//! Interactive prompt: reads lines, runs commands, places calls.

mod runner;

pub use runner::{read_terminal_line, run, PromptLine, PROMPT};
