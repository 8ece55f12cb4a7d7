use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "title_case")]
pub enum ThemeName {
    #[default]
    Purple,
    Ocean,
    Forest,
    Sunset,
}

impl ThemeName {
    pub fn all() -> Vec<ThemeName> {
        ThemeName::iter().collect()
    }
}

/// One resolved palette. Styles are computed once when the theme is picked
/// and shared immutably by every screen built afterwards.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub header: Style,
    pub primary: Style,
    pub secondary: Style,
    pub accent: Style,
    pub error: Style,
    pub success: Style,
    pub warning: Style,
    pub muted: Style,
    pub selected: Style,
    pub unselected: Style,
    pub border: Color,
}

struct Palette {
    primary: u8,
    accent: u8,
    border: u8,
}

impl Theme {
    pub fn load(name: ThemeName) -> Self {
        let palette = match name {
            ThemeName::Purple => Palette {
                primary: 170,
                accent: 213,
                border: 63,
            },
            ThemeName::Ocean => Palette {
                primary: 39,
                accent: 51,
                border: 39,
            },
            ThemeName::Forest => Palette {
                primary: 34,
                accent: 46,
                border: 34,
            },
            ThemeName::Sunset => Palette {
                primary: 208,
                accent: 214,
                border: 208,
            },
        };
        let primary = Color::Indexed(palette.primary);
        let accent = Color::Indexed(palette.accent);
        Self {
            name,
            header: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            primary: Style::default().fg(primary),
            secondary: Style::default().fg(Color::Indexed(243)),
            accent: Style::default().fg(accent),
            error: Style::default().fg(Color::Indexed(196)),
            success: Style::default().fg(Color::Indexed(42)),
            warning: Style::default().fg(Color::Indexed(214)),
            muted: Style::default().fg(Color::Indexed(241)),
            selected: Style::default()
                .fg(accent)
                .bg(Color::Indexed(235))
                .add_modifier(Modifier::BOLD),
            unselected: Style::default().fg(Color::Indexed(243)),
            border: Color::Indexed(palette.border),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::load(ThemeName::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_theme_loads() {
        for name in ThemeName::all() {
            let theme = Theme::load(name);
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn theme_names_render_for_display() {
        assert_eq!(ThemeName::Purple.to_string(), "Purple");
        assert_eq!(ThemeName::Ocean.to_string(), "Ocean");
    }
}
