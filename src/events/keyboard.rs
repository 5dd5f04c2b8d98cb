use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Модификаторы клавиш, разобранные из X11 маски состояния
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    // Биты KeyButMask из core протокола
    const SHIFT_MASK: u16 = 1 << 0;
    const CONTROL_MASK: u16 = 1 << 2;
    const MOD1_MASK: u16 = 1 << 3;
    const MOD4_MASK: u16 = 1 << 6;

    pub fn from_x11_mask(mask: u16) -> Self {
        Self {
            ctrl: mask & Self::CONTROL_MASK != 0,
            alt: mask & Self::MOD1_MASK != 0,
            shift: mask & Self::SHIFT_MASK != 0,
            super_key: mask & Self::MOD4_MASK != 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.super_key { result.push("super"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.to_vec().join("+"))
        }
    }
}

/// Сырое событие клавиатуры, как его доставил X-сервер
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub keycode: u8,
    pub state: KeyState,
    pub modifiers: Modifiers,
    /// Время сервера в миллисекундах
    pub time: u32,
}

impl RawKeyEvent {
    pub fn new(keycode: u8, state: KeyState, modifiers: Modifiers, time: u32) -> Self {
        Self {
            keycode,
            state,
            modifiers,
            time,
        }
    }

    pub fn press(keycode: u8) -> Self {
        Self::new(keycode, KeyState::Pressed, Modifiers::default(), 0)
    }

    #[cfg(test)]
    pub fn release(keycode: u8) -> Self {
        Self::new(keycode, KeyState::Released, Modifiers::default(), 0)
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

impl fmt::Display for RawKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keycode {} {:?} [{}] @{}",
            self.keycode, self.state, self.modifiers, self.time
        )
    }
}

/// Логическое имя клавиши ("a", "Enter", "space", "F1" ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalKey(String);

impl LogicalKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_from_x11_mask() {
        // Shift | Control | Mod4
        let modifiers = Modifiers::from_x11_mask(0x0001 | 0x0004 | 0x0040);

        assert!(modifiers.shift);
        assert!(modifiers.ctrl);
        assert!(modifiers.super_key);
        assert!(!modifiers.alt);
        assert_eq!(modifiers.to_string(), "ctrl+shift+super");
    }

    #[test]
    fn test_lock_bit_is_not_a_modifier() {
        // CapsLock (Lock) и NumLock (Mod2) не влияют на модификаторы
        let modifiers = Modifiers::from_x11_mask(0x0002 | 0x0010);
        assert!(modifiers.is_empty());
        assert_eq!(modifiers.to_string(), "none");
    }

    #[test]
    fn test_raw_event_press_release() {
        assert!(RawKeyEvent::press(38).is_press());
        assert!(!RawKeyEvent::release(38).is_press());
    }
}
