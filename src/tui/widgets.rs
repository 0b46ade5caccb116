//! Status and help bars drawn under the art

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Palette;
use crate::vim::Mode;

/// Bottom line: mode badge (or the command being typed), an optional
/// message, and the active theme on the right.
pub struct StatusBar<'a> {
    pub palette: Palette,
    pub mode: Mode,
    pub command_line: &'a str,
    pub message: Option<&'a str>,
    pub theme_name: &'a str,
    pub theme_index: usize,
    pub theme_count: usize,
    pub paused: bool,
    pub transitioning: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let p = self.palette;
        buf.set_style(area, p.text());

        let mut left = Vec::new();
        if self.mode == Mode::Command {
            left.push(Span::styled(format!(":{}", self.command_line), p.text()));
            left.push(Span::styled("█", p.key()));
        } else {
            left.push(Span::styled(format!(" {} ", self.mode.label()), p.badge()));
            if let Some(message) = self.message {
                left.push(Span::styled(format!(" {}", message), p.dim()));
            }
        }
        buf.set_line(area.x, area.y, &Line::from(left), area.width);

        let theme_style = if self.transitioning {
            p.transition()
        } else {
            p.key()
        };
        let mut right = vec![
            Span::styled(
                format!("[{}/{}] ", self.theme_index + 1, self.theme_count),
                p.dim(),
            ),
            Span::styled(self.theme_name.to_string(), theme_style),
            Span::raw(" "),
        ];
        if self.paused {
            right.insert(0, Span::styled("paused  ", p.dim()));
        }
        let width: usize = right.iter().map(|s| s.content.width()).sum();
        let width = width as u16;
        if width < area.width {
            buf.set_line(area.right() - width, area.y, &Line::from(right), width);
        }
    }
}

/// Key hints for normal mode.
pub struct HelpBar {
    pub palette: Palette,
}

impl Widget for HelpBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let p = self.palette;
        buf.set_style(area, p.dim());

        let bindings = [
            ("t/T", "theme"),
            ("i", "insert"),
            ("v", "visual"),
            (":", "command"),
            ("j/k gg G", "scroll"),
            (":q", "quit"),
        ];

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", p.dim()));
            }
            spans.push(Span::styled(*key, p.key()));
            spans.push(Span::styled(format!(" {}", desc), p.dim()));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
