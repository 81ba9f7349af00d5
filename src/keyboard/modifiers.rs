//! Modifier key state
//!
//! Sampled from live key-down state at the instant of the call, never from the
//! event's own flags, and never cached between events.

use std::fmt;

use super::keys::vk;

/// Source of instantaneous key-down state
pub trait KeyStateSource {
    /// Whether the key with this virtual-key code is currently held
    fn is_key_down(&self, code: u32) -> bool;
}

/// Which modifier keys are held for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Control key is held
    pub ctrl: bool,
    /// Shift key is held
    pub shift: bool,
    /// Alt key is held
    pub alt: bool,
    /// Either Windows key is held
    pub win: bool,
}

impl ModifierState {
    /// Take one sample of the live modifier state
    pub fn sample<K: KeyStateSource + ?Sized>(keys: &K) -> Self {
        Self {
            ctrl: keys.is_key_down(vk::CONTROL),
            shift: keys.is_key_down(vk::SHIFT),
            alt: keys.is_key_down(vk::MENU),
            win: keys.is_key_down(vk::LWIN) || keys.is_key_down(vk::RWIN),
        }
    }

    /// Check if no modifier is held
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.shift && !self.alt && !self.win
    }
}

/// Renders as the combination prefix, always in Ctrl, Shift, Alt, Win order:
/// `[CTRL] + [ALT] + `
impl fmt::Display for ModifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = [
            (self.ctrl, "CTRL"),
            (self.shift, "SHIFT"),
            (self.alt, "ALT"),
            (self.win, "WIN"),
        ];
        for (_, name) in held.iter().filter(|(down, _)| *down) {
            write!(f, "[{name}] + ")?;
        }
        Ok(())
    }
}
