// src/keys.rs

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Represents a keyboard modifier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2; // Also known as Option on macOS
        const SUPER = 1 << 3; // Also known as Windows key or Command key
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK = 1 << 5;
    }
}

impl Modifiers {
    /// The modifier that drives menu shortcuts on this platform.
    #[cfg(target_os = "macos")]
    pub const PRIMARY: Modifiers = Modifiers::SUPER;
    #[cfg(not(target_os = "macos"))]
    pub const PRIMARY: Modifiers = Modifiers::CONTROL;

    /// True when Control or Super/Command is held.
    ///
    /// Both count on every platform, so a Ctrl-S typed on a Mac keyboard
    /// attached to a Linux box still works.
    pub fn has_shortcut_modifier(&self) -> bool {
        self.intersects(Modifiers::CONTROL | Modifiers::SUPER)
    }
}

/// Represents a key symbol.
///
/// Only the keys the drawing window can meaningfully react to are
/// distinguished; everything else maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    // Alphanumeric keys
    Char(char),

    // Modifier keys (when pressed and released without other keys)
    Shift,
    Control,
    Alt,
    Super,

    Enter,
    Backspace,
    Tab,
    Escape,
    Delete,

    #[default]
    Unknown,
}

impl KeySymbol {
    /// Returns true if the key symbol represents a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeySymbol::Shift | KeySymbol::Control | KeySymbol::Alt | KeySymbol::Super
        )
    }
}

/// Returns true for the "primary modifier + S" save shortcut.
pub fn is_save_shortcut(symbol: KeySymbol, modifiers: Modifiers) -> bool {
    matches!(symbol, KeySymbol::Char(c) if c.eq_ignore_ascii_case(&'s'))
        && modifiers.has_shortcut_modifier()
}
