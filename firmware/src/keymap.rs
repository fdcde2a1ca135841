// Key and Button Name Tables
//
// Human-readable names for the key codes and mouse button masks seen on the
// wire, used only by log output. The tables are informative; the codes
// themselves are forwarded to the HID driver untouched.
//
// Code ranges follow the HID driver's usage model: printable ASCII is sent
// as itself, modifiers sit at 0x80..=0x87, editing and navigation keys in
// the 0xB0/0xD0 region, function keys at 0xC2..=0xCD.

use core::fmt;

fn key_name(code: u8) -> Option<&'static str> {
    let name = match code {
        0x80 => "LEFT_CTRL",
        0x81 => "LEFT_SHIFT",
        0x82 => "LEFT_ALT",
        0x83 => "LEFT_GUI",
        0x84 => "RIGHT_CTRL",
        0x85 => "RIGHT_SHIFT",
        0x86 => "RIGHT_ALT",
        0x87 => "RIGHT_GUI",
        0xB0 => "ENTER",
        0xB1 => "ESC",
        0xB2 => "BACKSPACE",
        0xB3 => "TAB",
        0xC1 => "CAPS_LOCK",
        0xC2 => "F1",
        0xC3 => "F2",
        0xC4 => "F3",
        0xC5 => "F4",
        0xC6 => "F5",
        0xC7 => "F6",
        0xC8 => "F7",
        0xC9 => "F8",
        0xCA => "F9",
        0xCB => "F10",
        0xCC => "F11",
        0xCD => "F12",
        0xD1 => "INSERT",
        0xD2 => "HOME",
        0xD3 => "PAGE_UP",
        0xD4 => "DELETE",
        0xD5 => "END",
        0xD6 => "PAGE_DOWN",
        0xD7 => "RIGHT_ARROW",
        0xD8 => "LEFT_ARROW",
        0xD9 => "DOWN_ARROW",
        0xDA => "UP_ARROW",
        _ => return None,
    };
    Some(name)
}

/// Log-friendly rendering of a key code: named key, printable character,
/// or the raw hex value.
pub struct KeyLabel(pub u8);

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = key_name(self.0) {
            return f.write_str(name);
        }
        if self.0.is_ascii_graphic() || self.0 == b' ' {
            return write!(f, "'{}'", self.0 as char);
        }
        write!(f, "0x{:02X}", self.0)
    }
}

/// Log-friendly rendering of a mouse button mask, e.g. `LEFT+MIDDLE`.
pub struct ButtonLabel(pub u8);

impl fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for (bit, name) in [
            (crate::hid::BUTTON_LEFT, "LEFT"),
            (crate::hid::BUTTON_RIGHT, "RIGHT"),
            (crate::hid::BUTTON_MIDDLE, "MIDDLE"),
        ] {
            if self.0 & bit != 0 {
                if wrote {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                wrote = true;
            }
        }
        if !wrote {
            write!(f, "0x{:02X}", self.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(format!("{}", KeyLabel(0x80)), "LEFT_CTRL");
        assert_eq!(format!("{}", KeyLabel(0xDA)), "UP_ARROW");
        assert_eq!(format!("{}", KeyLabel(0xC6)), "F5");
    }

    #[test]
    fn test_printable_and_raw_keys() {
        assert_eq!(format!("{}", KeyLabel(b'a')), "'a'");
        assert_eq!(format!("{}", KeyLabel(0x03)), "0x03");
    }

    #[test]
    fn test_button_masks() {
        assert_eq!(format!("{}", ButtonLabel(0x01)), "LEFT");
        assert_eq!(format!("{}", ButtonLabel(0x05)), "LEFT+MIDDLE");
        assert_eq!(format!("{}", ButtonLabel(0x07)), "LEFT+RIGHT+MIDDLE");
        assert_eq!(format!("{}", ButtonLabel(0x00)), "0x00");
    }
}
