/// Colour scheme used when rendering to the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Process-wide theme state, owned by the entry point and handed to renderers.
#[derive(Debug, Clone, Default)]
pub struct ThemeContext {
    current: Theme,
}

impl ThemeContext {
    pub fn new(theme: Theme) -> Self {
        Self { current: theme }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn set(&mut self, theme: Theme) {
        self.current = theme;
    }

    pub fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        self.current
    }
}
