use adminshell_core::ThemeClass;
use ratatui::style::{Color, Modifier, Style};

/// Frame-wide colors for one theme class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub class: ThemeClass,
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_class(class: ThemeClass) -> Self {
        match class {
            ThemeClass::Dark => Self {
                class,
                background: Color::Rgb(20, 20, 20),
                text: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(140, 140, 140),
                accent: Color::Rgb(24, 144, 255),
                border: Color::Rgb(63, 63, 70),
                error: Color::Rgb(255, 77, 79),
            },
            ThemeClass::Light => Self {
                class,
                background: Color::Rgb(255, 255, 255),
                text: Color::Rgb(20, 20, 20),
                muted: Color::Rgb(120, 120, 120),
                accent: Color::Rgb(22, 119, 255),
                border: Color::Rgb(217, 217, 217),
                error: Color::Rgb(207, 19, 34),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.background)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }
}
