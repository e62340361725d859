use super::{message_chunk::MessageType, App};

use tui::{
    backend::Backend,
    layout::{Margin, Rect},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

impl App {
    pub(super) fn draw_log_chunk<B: Backend>(&mut self, frame: &mut Frame<B>, chunk: Rect) {
        // Build and render the block.
        let block = Block::default()
            .title("Activity")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(Style::default().fg(Color::DarkGray).bg(Color::Black));

        let inner_chunk = block.inner(chunk).inner(&Margin {
            horizontal: 1,
            vertical: 0,
        });

        frame.render_widget(block, chunk);

        // Only the newest entries that fit are shown, oldest on top.
        let first = self
            .log
            .len()
            .saturating_sub(inner_chunk.height as usize);

        let lines: Vec<_> = self.log[first..]
            .iter()
            .map(|entry| {
                let fg_color = match entry.ty {
                    MessageType::Info => Color::Gray,
                    MessageType::Error => Color::LightRed,
                };

                Spans::from(vec![
                    Span::styled(
                        entry.time.format("%H:%M:%S ").to_string(),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(entry.text.as_str(), Style::default().fg(fg_color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner_chunk);
    }
}
