use crate::events::LogicalKey;
use crate::mappings::KeysymToName;

/// Keycode клавиши Enter в раскладках evdev/xkb
pub const ENTER_KEYCODE: u8 = 36;
/// Keycode пробела в раскладках evdev/xkb
pub const SPACE_KEYCODE: u8 = 65;

/// Колонка таблицы keysym'ов, из которой берётся символ
const KEYSYM_COLUMN: usize = 2;

/// Снимок core-раскладки клавиатуры X-сервера
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardMapping {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl KeyboardMapping {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    pub fn keysym(&self, keycode: u8, column: usize) -> Option<u32> {
        let per_keycode = usize::from(self.keysyms_per_keycode);
        if keycode < self.min_keycode || column >= per_keycode {
            return None;
        }

        let index = usize::from(keycode - self.min_keycode) * per_keycode + column;
        self.keysyms.get(index).copied().filter(|&keysym| keysym != 0)
    }
}

/// Декодер keycode -> логическое имя клавиши
///
/// Чистая функция от (keycode, раскладка): раскладка снимается один раз при
/// создании перехватчика и дальше не меняется.
#[derive(Debug, Clone)]
pub struct KeyDecoder {
    mapping: KeyboardMapping,
}

impl KeyDecoder {
    pub fn new(mapping: KeyboardMapping) -> Self {
        Self { mapping }
    }

    pub fn decode(&self, keycode: u8) -> Option<LogicalKey> {
        // Разрешение через таблицу для этих двух клавиш зависит от раскладки
        match keycode {
            ENTER_KEYCODE => return Some(LogicalKey::new("Enter")),
            SPACE_KEYCODE => return Some(LogicalKey::new("space")),
            _ => {}
        }

        self.mapping
            .keysym(keycode, KEYSYM_COLUMN)
            .and_then(KeysymToName::translate)
            .map(LogicalKey::new)
    }

    /// Является ли имя одним из фиксированных имён decode()
    pub fn is_override_name(name: &str) -> bool {
        matches!(name, "Enter" | "space")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Раскладка с keycode 8..=70, четыре колонки на keycode
    fn test_mapping() -> KeyboardMapping {
        let min_keycode = 8u8;
        let per_keycode = 4u8;
        let mut keysyms = vec![0u32; (70 - 8 + 1) * 4];

        let mut set = |keycode: u8, row: [u32; 4]| {
            let base = usize::from(keycode - min_keycode) * 4;
            keysyms[base..base + 4].copy_from_slice(&row);
        };
        // "a": a, A, a, A
        set(38, [0x61, 0x41, 0x61, 0x41]);
        // "1": 1, exclam, 1, exclam
        set(10, [0x31, 0x21, 0x31, 0x21]);
        // Return в таблице: Return, NoSymbol, Return, NoSymbol
        set(36, [0xff0d, 0, 0xff0d, 0]);
        // space в таблице неожиданно без третьей колонки
        set(65, [0x20, 0, 0, 0]);
        // Tab без третьей колонки
        set(23, [0xff09, 0xfe20, 0, 0]);

        KeyboardMapping::new(min_keycode, per_keycode, keysyms)
    }

    #[test]
    fn test_decode_through_table() {
        let decoder = KeyDecoder::new(test_mapping());
        assert_eq!(decoder.decode(38), Some(LogicalKey::from("a")));
        assert_eq!(decoder.decode(10), Some(LogicalKey::from("1")));
    }

    #[test]
    fn test_override_precedence() {
        let decoder = KeyDecoder::new(test_mapping());
        assert_eq!(decoder.decode(ENTER_KEYCODE), Some(LogicalKey::from("Enter")));
        assert_eq!(decoder.decode(SPACE_KEYCODE), Some(LogicalKey::from("space")));

        // Даже на пустой раскладке
        let empty = KeyDecoder::new(KeyboardMapping::default());
        assert_eq!(empty.decode(36), Some(LogicalKey::from("Enter")));
        assert_eq!(empty.decode(65), Some(LogicalKey::from("space")));
    }

    #[test]
    fn test_unresolvable_keycodes() {
        let decoder = KeyDecoder::new(test_mapping());
        // NoSymbol в нужной колонке
        assert_eq!(decoder.decode(23), None);
        // Ниже min_keycode и за концом таблицы
        assert_eq!(decoder.decode(3), None);
        assert_eq!(decoder.decode(200), None);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = KeyDecoder::new(test_mapping());
        for keycode in 0..=u8::MAX {
            assert_eq!(decoder.decode(keycode), decoder.decode(keycode));
        }
    }

    #[test]
    fn test_mapping_with_too_few_columns() {
        let mapping = KeyboardMapping::new(8, 2, vec![0x61, 0x41]);
        assert_eq!(mapping.keysym(8, 0), Some(0x61));
        assert_eq!(mapping.keysym(8, 2), None);
    }
}
