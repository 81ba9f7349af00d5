//! Keyboard hook lifecycle and event pipeline
//!
//! On Windows the hook is a `WH_KEYBOARD_LL` low-level keyboard hook. Other
//! platforms get a backend whose registration always fails.

mod backend;
mod controller;
#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

pub use controller::HookController;

#[cfg(not(windows))]
pub use unsupported::{
    current_thread_id, post_quit, run_message_loop, HeadlessDesktop as PlatformDesktop,
    UnsupportedHook as PlatformHook,
};
#[cfg(windows)]
pub use win32::{
    current_thread_id, post_quit, run_message_loop, WindowsDesktop as PlatformDesktop,
    WindowsHook as PlatformHook,
};
