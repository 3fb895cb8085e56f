//! Color palettes and the styles built from them.

use ratatui::style::{Color, Modifier, Style};

/// Color palette for a theme.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub bg_dark: Color,
    pub bg_elevated: Color,
    pub bg_highlight: Color,

    pub text: Color,
    pub text_muted: Color,
    pub text_dim: Color,

    /// One per answer button, in [`crate::models::ReviewOutcome::ALL`] order.
    pub rating_hard: Color,
    pub rating_easy: Color,
    pub rating_skip: Color,
}

/// Slate background with green/orange/grey answer colors, as in the browser app.
const SLATE: ThemeColors = ThemeColors {
    primary: Color::Rgb(124, 58, 237),
    secondary: Color::Rgb(96, 165, 250),
    accent: Color::Rgb(244, 114, 182),
    success: Color::Rgb(76, 175, 80),
    warning: Color::Rgb(255, 152, 0),
    error: Color::Rgb(239, 68, 68),
    info: Color::Rgb(56, 189, 248),
    bg_dark: Color::Rgb(18, 18, 30),
    bg_elevated: Color::Rgb(30, 30, 46),
    bg_highlight: Color::Rgb(55, 55, 80),
    text: Color::Rgb(241, 245, 249),
    text_muted: Color::Rgb(203, 213, 225),
    text_dim: Color::Rgb(100, 116, 139),
    rating_hard: Color::Rgb(255, 152, 0),
    rating_easy: Color::Rgb(76, 175, 80),
    rating_skip: Color::Rgb(158, 158, 158),
};

/// kanagawa.nvim "wave" colors.
const KANAGAWA_WAVE: ThemeColors = ThemeColors {
    primary: Color::Rgb(0x7E, 0x9C, 0xD8),      // crystalBlue
    secondary: Color::Rgb(0x95, 0x7F, 0xB8),    // oniViolet
    accent: Color::Rgb(0xD2, 0x7E, 0x99),       // sakuraPink
    success: Color::Rgb(0x98, 0xBB, 0x6C),      // springGreen
    warning: Color::Rgb(0xFF, 0x9E, 0x3B),      // roninYellow
    error: Color::Rgb(0xE8, 0x24, 0x24),        // samuraiRed
    info: Color::Rgb(0x7F, 0xB4, 0xCA),         // springBlue
    bg_dark: Color::Rgb(0x16, 0x16, 0x1D),      // sumiInk0
    bg_elevated: Color::Rgb(0x2A, 0x2A, 0x37),  // sumiInk2
    bg_highlight: Color::Rgb(0x36, 0x36, 0x46), // sumiInk3
    text: Color::Rgb(0xDC, 0xD7, 0xBA),         // fujiWhite
    text_muted: Color::Rgb(0xC8, 0xC0, 0x93),   // oldWhite
    text_dim: Color::Rgb(0x54, 0x54, 0x6D),     // sumiInk4
    rating_hard: Color::Rgb(0xFF, 0x9E, 0x3B),
    rating_easy: Color::Rgb(0x98, 0xBB, 0x6C),
    rating_skip: Color::Rgb(0x72, 0x71, 0x69),  // fujiGray
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeName {
    Default,
    KanagawaWave,
}

impl ThemeName {
    const ALL: [ThemeName; 2] = [ThemeName::Default, ThemeName::KanagawaWave];

    /// `(config key, label shown in the UI)`.
    fn names(self) -> (&'static str, &'static str) {
        match self {
            ThemeName::Default => ("default", "Default"),
            ThemeName::KanagawaWave => ("kanagawa-wave", "Kanagawa Wave"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.names().0
    }

    pub fn display_name(&self) -> &'static str {
        self.names().1
    }

    /// Unknown names fall back to the default theme.
    pub fn parse(s: &str) -> Self {
        let key = s.trim().to_lowercase().replace('_', "-");
        if key == "kanagawa" {
            return ThemeName::KanagawaWave;
        }
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == key)
            .unwrap_or(ThemeName::Default)
    }

    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|n| n == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

impl Theme {
    pub fn new(name: ThemeName) -> Self {
        let colors = match name {
            ThemeName::Default => SLATE,
            ThemeName::KanagawaWave => KANAGAWA_WAVE,
        };
        Self { name, colors }
    }

    pub fn from_name(name: &str) -> Self {
        Self::new(ThemeName::parse(name))
    }

    pub fn title(&self) -> Style {
        bold(self.colors.text)
    }

    pub fn highlight(&self) -> Style {
        bold(self.colors.primary)
    }

    pub fn selected(&self) -> Style {
        Style::default().fg(self.colors.text).bg(self.colors.bg_highlight)
    }

    pub fn card_front(&self) -> Style {
        bold(self.colors.accent)
    }

    pub fn card_back(&self) -> Style {
        bold(self.colors.success)
    }

    pub fn stats_new(&self) -> Style {
        bold(self.colors.info)
    }

    pub fn stats_learned(&self) -> Style {
        bold(self.colors.success)
    }

    pub fn stats_due(&self) -> Style {
        bold(self.colors.warning)
    }

    pub fn progress(&self) -> Style {
        Style::default().fg(self.colors.primary)
    }

    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.colors.text_dim)
    }

    pub fn key_highlight(&self) -> Style {
        bold(self.colors.accent)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeName::Default)
    }
}
