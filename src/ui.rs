use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: color_from_hex("#5E81AC").unwrap_or(Color::Blue),
            accent: color_from_hex("#D08770").unwrap_or(Color::LightRed),
            highlight: color_from_hex("#76B3C5").unwrap_or(Color::Cyan),
            background: color_from_hex("#3B4252").unwrap_or(Color::Black),
            surface: color_from_hex("#4C566A").unwrap_or(Color::DarkGray),
            text: color_from_hex("#ECEFF4").unwrap_or(Color::White),
            muted: color_from_hex("#8A93A6").unwrap_or(Color::Gray),
            warning: color_from_hex("#EBCB8B").unwrap_or(Color::Yellow),
            error: color_from_hex("#BF616A").unwrap_or(Color::Red),
        }
    }
}

impl Theme {
    pub fn key_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn bar_style(&self) -> Style {
        Style::default()
            .bg(self.primary)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.background)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }
}

pub fn color_from_hex(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[derive(Clone)]
pub struct FormLine {
    line: Line<'static>,
    highlight: bool,
}

impl FormLine {
    pub fn plain(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: false,
        }
    }

    pub fn highlighted(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: true,
        }
    }

    fn select(line: Line<'static>, selected: bool) -> Self {
        if selected {
            Self::highlighted(line)
        } else {
            Self::plain(line)
        }
    }
}

pub fn plain_line(line: impl Into<Line<'static>>) -> FormLine {
    FormLine::plain(line.into())
}

pub fn materialize_form_lines(
    lines: &[FormLine],
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|form_line| {
            if form_line.highlight {
                highlight_line_with_width(form_line.line.clone(), width, theme)
            } else {
                form_line.line.clone()
            }
        })
        .collect()
}

pub fn highlight_line_with_width(
    mut line: Line<'static>,
    width: usize,
    theme: &Theme,
) -> Line<'static> {
    let mut text_width = 0usize;
    let style = theme.highlight_style();
    for span in &mut line.spans {
        span.style = style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), style));
    }
    line
}

pub fn make_field_line(label: &str, value: &str, selected: bool, theme: &Theme) -> FormLine {
    let value_display = if value.is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    };
    let label_span = Span::styled(format!("{label}: "), theme.key_style());
    let value_span = Span::styled(value_display, Style::default().fg(theme.text));
    FormLine::select(Line::from(vec![label_span, value_span]), selected)
}

pub fn make_action_line(label: &str, selected: bool, enabled: bool, theme: &Theme) -> FormLine {
    let style = if enabled {
        theme.key_style()
    } else {
        Style::default()
            .fg(theme.muted)
            .add_modifier(Modifier::DIM)
    };
    FormLine::select(
        Line::from(vec![Span::styled(label.to_string(), style)]),
        selected,
    )
}

/// Keyboard hints for the shortcut bar, `key label | key label`.
pub fn shortcut_line(entries: &[(&str, &str)], theme: &Theme) -> Line<'static> {
    let label_style = Style::default().fg(theme.surface);
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (idx, (key, label)) in entries.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" | ", label_style));
        }
        spans.push(Span::styled(key.to_string(), theme.key_style()));
        spans.push(Span::styled(format!(" {label}"), label_style));
    }
    Line::from(spans)
}

/// Header, shortcut bar, content, status bar.
pub fn screen_sections(area: Rect) -> [Rect; 4] {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);
    [sections[0], sections[1], sections[2], sections[3]]
}

pub fn popup_content_margin() -> Margin {
    Margin {
        horizontal: 3,
        vertical: 1,
    }
}

pub fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let width_percent = width_percent.min(100);
    let height_percent = height_percent.min(100);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

/// Truncates or pads `text` to exactly `width` terminal columns.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
