use super::App;

use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Copy, Clone, PartialEq, Eq)]
pub(super) enum MessageType {
    Info,
    Error,
}

/// Horizontal share of the screen used by a message box, in percent.
const WIDTH_PERCENT: u16 = 70;

/// A box in the middle of `area`, high enough for `lines` lines of text plus borders and hint.
fn centered(area: Rect, lines: u16) -> Rect {
    let height = (lines + 3).min(area.height);
    let top = area.y + (area.height - height) / 2;

    let row = Rect::new(area.x, top, area.width, height);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - WIDTH_PERCENT) / 2),
                Constraint::Percentage(WIDTH_PERCENT),
                Constraint::Percentage((100 - WIDTH_PERCENT) / 2),
            ]
            .as_ref(),
        )
        .split(row)[1]
}

impl App {
    /// Modal box over the whole frame. The first line of `text` becomes the headline.
    pub(super) fn draw_message_chunk<B: Backend>(
        &mut self,
        frame: &mut Frame<B>,
        ty: MessageType,
        text: &str,
    ) {
        let chunk = centered(frame.size(), text.lines().count() as u16);

        let (title, fg_color) = match ty {
            MessageType::Info => ("Information", Color::Green),
            MessageType::Error => ("Error", Color::LightRed),
        };

        let style = Style::default().fg(fg_color).bg(Color::Black);

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(style);

        let inner_chunk = block.inner(chunk).inner(&Margin {
            horizontal: 1,
            vertical: 0,
        });

        frame.render_widget(Clear, chunk);
        frame.render_widget(block, chunk);

        let mut lines = text.lines();

        let mut spans: Vec<Spans> = lines
            .next()
            .map(|headline| Spans::from(Span::styled(headline, style.add_modifier(Modifier::BOLD))))
            .into_iter()
            .collect();

        spans.extend(lines.map(|line| Spans::from(Span::styled(line, style))));
        spans.push(Spans::from(Span::styled(
            "(press any key)",
            Style::default().fg(Color::DarkGray).bg(Color::Black),
        )));

        let paragraph = Paragraph::new(spans)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, inner_chunk);
    }
}
