//! Keyboard decoding
//!
//! Turns virtual-key codes into typed characters and log labels, and samples
//! the modifier keys held for an event.

mod keys;
mod modifiers;

pub use keys::{decode_char, decode_key_name, vk};
pub use modifiers::{KeyStateSource, ModifierState};
