/// Named keys accepted in hotkey settings, with their virtual key codes.
const NAMED_KEYS: &[(&[&str], u32)] = &[
    (&["ENTER", "RETURN"], 0x0D),
    (&["TAB"], 0x09),
    (&["ESCAPE", "ESC"], 0x1B),
    (&["SPACE"], 0x20),
    (&["BACKSPACE"], 0x08),
    (&["DELETE", "DEL"], 0x2E),
    (&["INSERT", "INS"], 0x2D),
    (&["HOME"], 0x24),
    (&["END"], 0x23),
    (&["PAGEUP", "PGUP"], 0x21),
    (&["PAGEDOWN", "PGDN"], 0x22),
    (&["LEFT"], 0x25),
    (&["UP"], 0x26),
    (&["RIGHT"], 0x27),
    (&["DOWN"], 0x28),
    (&["MINUS", "-"], 0xBD),
    (&["PLUS", "EQUALS", "="], 0xBB),
    (&["COMMA", ","], 0xBC),
    (&["PERIOD", "DOT", "."], 0xBE),
    (&["SLASH", "/"], 0xBF),
    (&["SEMICOLON", ";"], 0xBA),
    (&["BACKSLASH", "\\"], 0xDC),
    (&["LBRACKET", "["], 0xDB),
    (&["RBRACKET", "]"], 0xDD),
    (&["QUOTE", "'"], 0xDE),
    (&["BACKTICK", "GRAVE", "`"], 0xC0),
    (&["ADD", "NUMPADPLUS"], 0x6B),
    (&["SUBTRACT", "NUMPADMINUS"], 0x6D),
];

/// Resolves a hotkey key name to a Windows virtual key code.
///
/// Accepts letters, digits, `F1`–`F24`, `Numpad0`–`Numpad9` and the
/// names in the table above, case-insensitively.
pub fn vk_from_name(name: &str) -> Option<u32> {
    let upper = name.trim().to_ascii_uppercase();

    if let [ch] = upper.as_bytes()
        && (ch.is_ascii_uppercase() || ch.is_ascii_digit())
    {
        return Some(u32::from(*ch));
    }

    if let Some(n) = numbered(&upper, "F", 1..=24) {
        return Some(0x70 + n - 1);
    }
    if let Some(n) = numbered(&upper, "NUMPAD", 0..=9) {
        return Some(0x60 + n);
    }

    NAMED_KEYS
        .iter()
        .find(|(names, _)| names.contains(&upper.as_str()))
        .map(|&(_, vk)| vk)
}

fn numbered(name: &str, prefix: &str, range: std::ops::RangeInclusive<u32>) -> Option<u32> {
    let n = name.strip_prefix(prefix)?.parse::<u32>().ok()?;
    range.contains(&n).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_map_to_ascii() {
        // Assert
        assert_eq!(vk_from_name("t"), Some(0x54));
        assert_eq!(vk_from_name("C"), Some(0x43));
        assert_eq!(vk_from_name("0"), Some(0x30));
    }

    #[test]
    fn arrows_used_by_default_hotkeys() {
        // Assert
        assert_eq!(vk_from_name("Up"), Some(0x26));
        assert_eq!(vk_from_name("DOWN"), Some(0x28));
    }

    #[test]
    fn numbered_keys_respect_their_range() {
        // Assert
        assert_eq!(vk_from_name("F1"), Some(0x70));
        assert_eq!(vk_from_name("f24"), Some(0x87));
        assert_eq!(vk_from_name("F25"), None);
        assert_eq!(vk_from_name("Numpad5"), Some(0x65));
    }

    #[test]
    fn unknown_names_are_rejected() {
        // Assert
        assert_eq!(vk_from_name("Hyper"), None);
        assert_eq!(vk_from_name(""), None);
    }
}
