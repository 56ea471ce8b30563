//! Terminal side of the chat client.
//!
//! Renders the banner, prompt, answers and errors for the interactive loop.

pub mod console;

pub use console::Console;
