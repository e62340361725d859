use super::App;

use tui::{
    backend::Backend,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

impl App {
    pub(super) fn draw_status_chunk<B: Backend>(&mut self, frame: &mut Frame<B>, chunk: Rect) {
        // Build and render the block.
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(Style::default().fg(Color::DarkGray).bg(Color::Black));

        let inner_chunk = block.inner(chunk).inner(&Margin {
            horizontal: 1,
            vertical: 0,
        });

        frame.render_widget(block, chunk);

        let label_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let state_color = if self.printer.is_open() {
            Color::Green
        } else {
            Color::LightRed
        };

        // Printer
        let printer_line = Spans::from(vec![
            Span::styled("Printer: ", label_style),
            Span::styled(
                format!("{} ", self.printer.model()),
                Style::default().fg(Color::Gray).bg(Color::Black),
            ),
            Span::styled(
                self.state_text(),
                Style::default().fg(state_color).bg(Color::Black),
            ),
            Span::styled(
                self.now.format("  %H:%M:%S").to_string(),
                Style::default().fg(Color::DarkGray).bg(Color::Black),
            ),
        ]);

        // Endpoints
        let interface = self
            .printer
            .interface_number()
            .map_or_else(|| String::from("-"), |n| n.to_string());

        let endpoint_line = Spans::from(vec![
            Span::styled("Endpoints: ", label_style),
            Span::styled(
                format!(
                    "interface {}, write {:#04x}, read {:#04x}",
                    interface,
                    self.printer.write_endpoint(),
                    self.printer.read_endpoint()
                ),
                Style::default().fg(Color::Gray).bg(Color::Black),
            ),
        ]);

        let paragraph = Paragraph::new(vec![printer_line, endpoint_line]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner_chunk);
    }
}
