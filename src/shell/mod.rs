//! Host shell for the hook pipeline

mod console;

pub use console::ConsoleShell;
