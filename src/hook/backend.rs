//! Seams between the hook pipeline and the operating system
//!
//! `HookBackend` owns hook registration; `SystemState` answers the per-event
//! queries (foreground window, live key state, wall clock).

use chrono::{DateTime, Local};

use crate::keyboard::KeyStateSource;

/// Key transition reported by the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// One raw keyboard event, valid only for the duration of the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Virtual-key code
    pub vk_code: u32,
    /// Hardware scan code
    pub scan_code: u32,
    /// Raw `LLKHF_*` flag bits
    pub flags: u32,
    /// Milliseconds since boot when the event was posted
    pub time_ms: u32,
    pub action: KeyAction,
}

/// Called synchronously for every event the hook receives
pub type EventHandler = Box<dyn FnMut(&KeyEvent)>;

/// Errors that can occur while registering the hook
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    Registration(String),

    #[error("low-level keyboard hooks are not supported on this platform")]
    Unsupported,
}

/// Registration lifecycle of a low-level keyboard hook
pub trait HookBackend {
    /// Register the hook; `handler` runs for every event until `uninstall`
    fn install(&mut self, handler: EventHandler) -> Result<(), HookError>;

    /// Remove the hook; no handler invocation happens after this returns
    fn uninstall(&mut self);
}

/// Live system state queried while processing an event
pub trait SystemState: KeyStateSource {
    /// Title of the window that currently has input focus (empty if none)
    fn foreground_title(&self) -> String;

    /// Wall-clock time used for log timestamps
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
