//! Fallback for platforms without low-level keyboard hooks
//!
//! Registration always fails, so the controller stays stopped and reports
//! the reason through the technical log.

use crate::keyboard::KeyStateSource;

use super::backend::{EventHandler, HookBackend, HookError, SystemState};

#[derive(Debug, Default)]
pub struct UnsupportedHook;

impl HookBackend for UnsupportedHook {
    fn install(&mut self, _handler: EventHandler) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }

    fn uninstall(&mut self) {}
}

/// Desktop with no focused window and no keys held
#[derive(Debug, Default)]
pub struct HeadlessDesktop;

impl KeyStateSource for HeadlessDesktop {
    fn is_key_down(&self, _code: u32) -> bool {
        false
    }
}

impl SystemState for HeadlessDesktop {
    fn foreground_title(&self) -> String {
        String::new()
    }
}

pub fn current_thread_id() -> u32 {
    0
}

/// Nothing to pump without a hook
pub fn run_message_loop() {}

pub fn post_quit(_thread_id: u32) {}
