//! Virtual-key definitions and decoding
//!
//! Maps Windows virtual-key codes to the character they type (for the
//! simulated-typing buffer) and to a bracketed label (for the technical log).
//! Decoding is a locale-invariant ASCII mapping, not a keyboard-layout
//! translation.

/// Virtual-key codes used by the decoder
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const PAUSE: u32 = 0x13;
    pub const CAPITAL: u32 = 0x14;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PRIOR: u32 = 0x21;
    pub const NEXT: u32 = 0x22;
    pub const END: u32 = 0x23;
    pub const HOME: u32 = 0x24;
    pub const LEFT: u32 = 0x25;
    pub const UP: u32 = 0x26;
    pub const RIGHT: u32 = 0x27;
    pub const DOWN: u32 = 0x28;
    pub const SNAPSHOT: u32 = 0x2C;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    pub const KEY_0: u32 = 0x30;
    pub const KEY_9: u32 = 0x39;
    pub const KEY_A: u32 = 0x41;
    pub const KEY_Z: u32 = 0x5A;
    pub const LWIN: u32 = 0x5B;
    pub const RWIN: u32 = 0x5C;
    pub const APPS: u32 = 0x5D;
    pub const NUMPAD0: u32 = 0x60;
    pub const NUMPAD9: u32 = 0x69;
    pub const F1: u32 = 0x70;
    pub const F24: u32 = 0x87;
    pub const NUMLOCK: u32 = 0x90;
    pub const SCROLL: u32 = 0x91;
    pub const LSHIFT: u32 = 0xA0;
    pub const RSHIFT: u32 = 0xA1;
    pub const LCONTROL: u32 = 0xA2;
    pub const RCONTROL: u32 = 0xA3;
    pub const LMENU: u32 = 0xA4;
    pub const RMENU: u32 = 0xA5;
    pub const OEM_1: u32 = 0xBA;
    pub const OEM_PLUS: u32 = 0xBB;
    pub const OEM_COMMA: u32 = 0xBC;
    pub const OEM_MINUS: u32 = 0xBD;
    pub const OEM_PERIOD: u32 = 0xBE;
    pub const OEM_2: u32 = 0xBF;
    pub const OEM_3: u32 = 0xC0;
    pub const OEM_4: u32 = 0xDB;
    pub const OEM_5: u32 = 0xDC;
    pub const OEM_6: u32 = 0xDD;
    pub const OEM_7: u32 = 0xDE;
}

/// Symbols on the digit row when Shift is held, indexed by digit
const SHIFTED_DIGITS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Punctuation keys as (code, unshifted, shifted)
const OEM_GLYPHS: [(u32, char, char); 11] = [
    (vk::OEM_1, ';', ':'),
    (vk::OEM_PLUS, '=', '+'),
    (vk::OEM_COMMA, ',', '<'),
    (vk::OEM_MINUS, '-', '_'),
    (vk::OEM_PERIOD, '.', '>'),
    (vk::OEM_2, '/', '?'),
    (vk::OEM_3, '`', '~'),
    (vk::OEM_4, '[', '{'),
    (vk::OEM_5, '\\', '|'),
    (vk::OEM_6, ']', '}'),
    (vk::OEM_7, '\'', '"'),
];

/// Decode the character a key types, if any
///
/// Returns `None` for keys that do not type anything; the caller must not
/// touch the typing buffer in that case. Keypad digits ignore both Shift and
/// Num Lock.
pub fn decode_char(code: u32, shift: bool) -> Option<char> {
    match code {
        vk::KEY_A..=vk::KEY_Z => {
            let upper = char::from(code as u8);
            Some(if shift { upper } else { upper.to_ascii_lowercase() })
        }
        vk::KEY_0..=vk::KEY_9 => {
            let digit = (code - vk::KEY_0) as usize;
            Some(if shift {
                SHIFTED_DIGITS[digit]
            } else {
                char::from(code as u8)
            })
        }
        vk::NUMPAD0..=vk::NUMPAD9 => char::from_digit(code - vk::NUMPAD0, 10),
        vk::SPACE => Some(' '),
        vk::TAB => Some('\t'),
        _ => OEM_GLYPHS
            .iter()
            .find(|(oem, _, _)| *oem == code)
            .map(|&(_, plain, shifted)| if shift { shifted } else { plain }),
    }
}

/// Human-readable bracketed label for a key, e.g. `[ENTER]`
///
/// Total over all codes: unrecognized keys render as their numeric code.
pub fn decode_key_name(code: u32) -> String {
    if let Some(label) = fixed_label(code) {
        return format!("[{label}]");
    }

    match code {
        vk::F1..=vk::F24 => format!("[F{}]", code - vk::F1 + 1),
        vk::KEY_A..=vk::KEY_Z | vk::KEY_0..=vk::KEY_9 => format!("[{}]", char::from(code as u8)),
        vk::NUMPAD0..=vk::NUMPAD9 => format!("[NUM{}]", code - vk::NUMPAD0),
        _ => format!("[{code}]"),
    }
}

fn fixed_label(code: u32) -> Option<&'static str> {
    let label = match code {
        vk::ESCAPE => "ESC",
        vk::RETURN => "ENTER",
        vk::BACK => "BACKSPACE",
        vk::SPACE => "SPACE",
        vk::TAB => "TAB",
        vk::CAPITAL => "CAPS",
        vk::LEFT => "LEFT",
        vk::UP => "UP",
        vk::RIGHT => "RIGHT",
        vk::DOWN => "DOWN",
        vk::DELETE => "DEL",
        vk::INSERT => "INS",
        vk::HOME => "HOME",
        vk::END => "END",
        vk::PRIOR => "PGUP",
        vk::NEXT => "PGDN",
        vk::SNAPSHOT => "PRTSC",
        vk::PAUSE => "PAUSE",
        vk::NUMLOCK => "NUMLOCK",
        vk::SCROLL => "SCROLL",
        vk::APPS => "MENU",
        vk::SHIFT | vk::LSHIFT | vk::RSHIFT => "SHIFT",
        vk::CONTROL | vk::LCONTROL | vk::RCONTROL => "CTRL",
        vk::MENU | vk::LMENU | vk::RMENU => "ALT",
        vk::LWIN | vk::RWIN => "WIN",
        _ => return None,
    };
    Some(label)
}
