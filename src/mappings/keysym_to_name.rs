use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Преобразование X11 keysym в каноническое имя клавиши
/// Имена совпадают с теми, что понимает `xdotool key`
pub struct KeysymToName;

// Keysym'ы с именами, которые нельзя вывести из самого символа
static NAMED_KEYSYMS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // Пунктуация Latin-1
    map.insert(0x0020, "space");
    map.insert(0x0021, "exclam");
    map.insert(0x0022, "quotedbl");
    map.insert(0x0023, "numbersign");
    map.insert(0x0024, "dollar");
    map.insert(0x0025, "percent");
    map.insert(0x0026, "ampersand");
    map.insert(0x0027, "apostrophe");
    map.insert(0x0028, "parenleft");
    map.insert(0x0029, "parenright");
    map.insert(0x002a, "asterisk");
    map.insert(0x002b, "plus");
    map.insert(0x002c, "comma");
    map.insert(0x002d, "minus");
    map.insert(0x002e, "period");
    map.insert(0x002f, "slash");
    map.insert(0x003a, "colon");
    map.insert(0x003b, "semicolon");
    map.insert(0x003c, "less");
    map.insert(0x003d, "equal");
    map.insert(0x003e, "greater");
    map.insert(0x003f, "question");
    map.insert(0x0040, "at");
    map.insert(0x005b, "bracketleft");
    map.insert(0x005c, "backslash");
    map.insert(0x005d, "bracketright");
    map.insert(0x005e, "asciicircum");
    map.insert(0x005f, "underscore");
    map.insert(0x0060, "grave");
    map.insert(0x007b, "braceleft");
    map.insert(0x007c, "bar");
    map.insert(0x007d, "braceright");
    map.insert(0x007e, "asciitilde");

    // Управляющие клавиши
    map.insert(0xff08, "BackSpace");
    map.insert(0xff09, "Tab");
    map.insert(0xff0d, "Return");
    map.insert(0xff13, "Pause");
    map.insert(0xff14, "Scroll_Lock");
    map.insert(0xff1b, "Escape");
    map.insert(0xffff, "Delete");

    // Навигация
    map.insert(0xff50, "Home");
    map.insert(0xff51, "Left");
    map.insert(0xff52, "Up");
    map.insert(0xff53, "Right");
    map.insert(0xff54, "Down");
    map.insert(0xff55, "Prior");
    map.insert(0xff56, "Next");
    map.insert(0xff57, "End");
    map.insert(0xff63, "Insert");

    // Цифровой блок
    map.insert(0xff7f, "Num_Lock");
    map.insert(0xff8d, "KP_Enter");
    map.insert(0xffaa, "KP_Multiply");
    map.insert(0xffab, "KP_Add");
    map.insert(0xffad, "KP_Subtract");
    map.insert(0xffae, "KP_Decimal");
    map.insert(0xffaf, "KP_Divide");

    // Модификаторы
    map.insert(0xffe1, "Shift_L");
    map.insert(0xffe2, "Shift_R");
    map.insert(0xffe3, "Control_L");
    map.insert(0xffe4, "Control_R");
    map.insert(0xffe5, "Caps_Lock");
    map.insert(0xffe9, "Alt_L");
    map.insert(0xffea, "Alt_R");
    map.insert(0xffeb, "Super_L");
    map.insert(0xffec, "Super_R");

    map
});

static NAME_TO_KEYSYM: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    NAMED_KEYSYMS.iter().map(|(&keysym, &name)| (name, keysym)).collect()
});

const XK_KP_0: u32 = 0xffb0;
const XK_KP_9: u32 = 0xffb9;
const XK_F1: u32 = 0xffbe;
const XK_F24: u32 = 0xffd5;

impl KeysymToName {
    /// Получить имя клавиши по keysym; NoSymbol (0) и неизвестные keysym'ы дают None
    pub fn translate(keysym: u32) -> Option<String> {
        match keysym {
            0 => None,
            // Буквы и цифры называются своим символом
            0x30..=0x39 | 0x41..=0x5a | 0x61..=0x7a => {
                char::from_u32(keysym).map(|c| c.to_string())
            }
            XK_KP_0..=XK_KP_9 => Some(format!("KP_{}", keysym - XK_KP_0)),
            XK_F1..=XK_F24 => Some(format!("F{}", keysym - XK_F1 + 1)),
            _ => NAMED_KEYSYMS.get(&keysym).map(|name| name.to_string()),
        }
    }

    /// Проверить, является ли строка известным именем клавиши
    pub fn is_known_name(name: &str) -> bool {
        if NAME_TO_KEYSYM.contains_key(name) {
            return true;
        }

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return c.is_ascii_alphanumeric();
        }

        let numbered = |prefix: &str, range: std::ops::RangeInclusive<u32>| {
            name.strip_prefix(prefix)
                .and_then(|n| n.parse::<u32>().ok())
                .is_some_and(|n| range.contains(&n))
        };
        numbered("F", 1..=24) || numbered("KP_", 0..=9)
    }
}
