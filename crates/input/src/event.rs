/// Keys the scene reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    Space,
    Digit(u8),
    W,
    S,
    Enter,
    /// Pause or resume the animation.
    P,
    Plus,
    Minus,
}

impl Key {
    /// Parse a DOM-style key name (`"ArrowUp"`, `" "`, `"1"`, `"w"`...).
    ///
    /// Returns `None` for keys with no binding.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            " " => Self::Space,
            "w" => Self::W,
            "s" => Self::S,
            "Enter" => Self::Enter,
            "p" => Self::P,
            "+" => Self::Plus,
            "-" => Self::Minus,
            digit => match digit.as_bytes() {
                [b @ b'1'..=b'5'] => Self::Digit(b - b'0'),
                _ => return None,
            },
        };
        Some(key)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
            Self::ArrowLeft => "ArrowLeft",
            Self::Space => " ",
            Self::Digit(1) => "1",
            Self::Digit(2) => "2",
            Self::Digit(3) => "3",
            Self::Digit(4) => "4",
            Self::Digit(5) => "5",
            Self::Digit(_) => "?",
            Self::W => "w",
            Self::S => "s",
            Self::Enter => "Enter",
            Self::P => "p",
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

/// Panel controls that carry a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Gamma,
    Theta,
    MaxBoxes,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gamma => "gamma",
            Self::Theta => "theta",
            Self::MaxBoxes => "max boxes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// A slider moved or a text field was confirmed.
    ValueChanged(Control, f32),
    /// A text field gained (`true`) or lost focus.
    FocusChanged(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_key_names_parse() {
        assert_eq!(Key::from_name("ArrowUp"), Some(Key::ArrowUp));
        assert_eq!(Key::from_name(" "), Some(Key::Space));
        assert_eq!(Key::from_name("3"), Some(Key::Digit(3)));
        assert_eq!(Key::from_name("w"), Some(Key::W));
        assert_eq!(Key::from_name("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_name("p"), Some(Key::P));
        assert_eq!(Key::from_name("+"), Some(Key::Plus));
        assert_eq!(Key::from_name("-"), Some(Key::Minus));
    }

    #[test]
    fn unbound_names_are_rejected() {
        for name in ["0", "6", "W", "P", "ArrowRight", "", "12", "space", "="] {
            assert_eq!(Key::from_name(name), None, "{name:?}");
        }
    }

    #[test]
    fn names_round_trip() {
        for name in ["ArrowUp", "ArrowDown", "ArrowLeft", " ", "1", "5", "w", "s", "Enter", "p", "+", "-"] {
            let key = Key::from_name(name).unwrap();
            assert_eq!(key.name(), name);
        }
    }
}
