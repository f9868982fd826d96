use env_logger::fmt::style::{AnsiColor, Style};

/// Foreground colors used for level prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Default,
}

impl Color {
    /// The color of a lowercase level name, if the level is one that gets a prefix.
    pub fn for_level(name: &str) -> Option<Self> {
        match name {
            "error" | "exception" | "critical" => Some(Self::Red),
            "warning" => Some(Self::Yellow),
            "debug" | "info" => Some(Self::Blue),
            _ => None,
        }
    }

    fn style(self) -> Style {
        let fg = match self {
            Self::Red => AnsiColor::Red,
            Self::Yellow => AnsiColor::Yellow,
            Self::Blue => AnsiColor::Blue,
            Self::Default => return Style::new(),
        };

        Style::new().fg_color(Some(fg.into()))
    }

    /// Wraps `text` in this color's escape codes, or returns it as is when `enabled` is false.
    pub fn paint(self, text: &str, enabled: bool) -> String {
        if !enabled || self == Self::Default {
            return text.to_owned();
        }

        let style = self.style();
        format!("{}{text}{}", style.render(), style.render_reset())
    }
}
