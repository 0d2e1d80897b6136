//! Terminal colours, with optional hex overrides from the `[theme]` section

use ratatui::style::Color;

use crate::config::ThemeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,       // Active borders, gauge fill, key hints
    pub danger: Color,       // Failed operations
    pub success: Color,      // Finished operations
    pub text: Color,
    pub text_dim: Color,
    pub bg_selected: Color,  // Selected route
    pub inactive: Color,     // Borders of unfocused boxes
    pub header: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Start from the default palette and apply every override that parses
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            ("accent", &config.accent, &mut theme.accent),
            ("danger", &config.danger, &mut theme.danger),
            ("success", &config.success, &mut theme.success),
            ("text", &config.text, &mut theme.text),
            ("text_dim", &config.text_dim, &mut theme.text_dim),
        ];

        for (name, value, slot) in overrides {
            let Some(value) = value else { continue };
            match parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring theme.{}: {:?} is not a hex colour", name, value),
            }
        }

        theme.header = theme.danger;
        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}
