//! Output streams fed by the hook pipeline
//!
//! The host shell owns both streams: an append-only technical log and the
//! simulated-typing buffer. The pipeline is the only writer while a session
//! is running.

mod buffer;
mod edit;

pub use buffer::TypingBuffer;
pub use edit::TypingEdit;

/// The two capabilities a shell supplies to the hook pipeline
pub trait Sink {
    /// Append one line to the technical log
    fn append_log_line(&mut self, line: &str);

    /// The simulated-typing buffer edits are applied to
    fn typing_buffer(&mut self) -> &mut TypingBuffer;
}
