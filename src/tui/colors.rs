use crate::detail::Indicator;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_BG: Color = Color::Rgb(0, 95, 135);
pub const HIGHLIGHT_BG: Color = Color::Rgb(60, 60, 80);
pub const STRIPE_BG: Color = Color::Rgb(25, 25, 35);

pub fn color_for_indicator(indicator: Indicator) -> Color {
    match indicator {
        Indicator::Positive => Color::Green,
        Indicator::Negative => Color::Red,
        Indicator::Unknown => Color::Yellow,
    }
}

pub fn indicator_style(indicator: Indicator) -> Style {
    Style::default()
        .fg(color_for_indicator(indicator))
        .add_modifier(Modifier::BOLD)
}

/// Color for the elective-coverage answer
pub fn color_for_elective(label: &str) -> Color {
    match label {
        "Yes" => Color::Green,
        "No" => Color::Red,
        _ => Color::Gray,
    }
}

pub fn link_style() -> Style {
    Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::UNDERLINED)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}
