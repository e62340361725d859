use super::{App, Focus, MenuAction};

use tui::{
    backend::Backend,
    layout::{Margin, Rect},
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

impl App {
    pub(super) fn draw_menu_chunk<B: Backend>(&mut self, frame: &mut Frame<B>, chunk: Rect) {
        // Build and render the block.
        let block = Block::default()
            .title("Commands")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(
                Style::default()
                    .fg(if self.focus == Focus::Menu {
                        Color::LightBlue
                    } else {
                        Color::DarkGray
                    })
                    .bg(Color::Black),
            );

        let inner_chunk = block.inner(chunk).inner(&Margin {
            horizontal: 1,
            vertical: 0,
        });

        frame.render_widget(block, chunk);

        // Build list items for the actions, prefixed by their shortcut.
        let items: Vec<_> = MenuAction::ALL
            .iter()
            .map(|action| {
                ListItem::new(format!("[{}] {}", action.shortcut(), action.title()))
                    .style(Style::default().fg(Color::DarkGray).bg(Color::Black))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(if self.focus == Focus::Menu {
                        Color::Green
                    } else {
                        Color::White
                    })
                    .bg(Color::Black),
            )
            .highlight_symbol("⇨ ");

        frame.render_stateful_widget(list, inner_chunk, &mut self.menu_list_state);
    }
}
