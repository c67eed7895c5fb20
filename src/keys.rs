//! Keystroke sequences understood by the host.

pub const ENTER: &str = "\r";
pub const ARROW_UP: &str = "\x1b[A";
pub const ARROW_DOWN: &str = "\x1b[B";
pub const ARROW_RIGHT: &str = "\x1b[C";
pub const ARROW_LEFT: &str = "\x1b[D";
pub const PAGE_UP: &str = "\x1b[5~";
pub const PAGE_DOWN: &str = "\x1b[6~";
pub const HOME: &str = "\x1b[1~";
pub const END: &str = "\x1b[4~";
pub const BACKSPACE: &str = "\x7f";
pub const CTRL_U: &str = "\x15";

/// Resolve a key name such as `Enter`, `PgDown` or `Ctrl+U` to the bytes the
/// host expects. Names are case-insensitive.
pub fn by_name(name: &str) -> Option<String> {
    let lower = name.trim().to_ascii_lowercase();
    if let Some(letter) = lower.strip_prefix("ctrl+") {
        let mut chars = letter.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => {
                Some(char::from(c as u8 & 0x1f).to_string())
            }
            _ => None,
        };
    }
    let key = match lower.as_str() {
        "enter" | "return" => ENTER,
        "up" => ARROW_UP,
        "down" => ARROW_DOWN,
        "right" => ARROW_RIGHT,
        "left" => ARROW_LEFT,
        "pgup" | "pageup" => PAGE_UP,
        "pgdown" | "pagedown" => PAGE_DOWN,
        "home" => HOME,
        "end" => END,
        "backspace" => BACKSPACE,
        "space" => " ",
        "tab" => "\t",
        "esc" | "escape" => "\x1b",
        _ => return None,
    };
    Some(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(by_name("Enter").as_deref(), Some("\r"));
        assert_eq!(by_name("pgdown").as_deref(), Some(PAGE_DOWN));
        assert_eq!(by_name("Left").as_deref(), Some(ARROW_LEFT));
    }

    #[test]
    fn test_ctrl_keys() {
        assert_eq!(by_name("Ctrl+U").as_deref(), Some(CTRL_U));
        assert_eq!(by_name("ctrl+c").as_deref(), Some("\x03"));
        assert_eq!(by_name("Ctrl+UP"), None);
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(by_name("Hyper"), None);
    }
}
