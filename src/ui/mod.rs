use bematech_usb::printer::{InfoField, Printer, SessionState, UNKNOWN_COMMAND_SET};

use std::error::Error;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Local};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    widgets::ListState,
    Frame, Terminal,
};

mod log_chunk;

mod menu_chunk;

mod message_chunk;
use message_chunk::MessageType;

mod status_chunk;

/// Code page 2, a line of text and the paper feed of the test receipt.
const TEST_RECEIPT: &[u8] = b"\x1b\x74\x02bematech-usb test receipt\n\n\n\x1b\x50";

/// The clock in the status line only needs a coarse tick.
const TICK_RATE: Duration = Duration::from_millis(250);

/// Entries of the activity log kept in memory.
const LOG_CAPACITY: usize = 200;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Focus {
    Menu,
    Message,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum MenuAction {
    Open,
    Close,
    Reset,
    PrintTestReceipt,
    CommandSet,
    ProductInfo,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 7] = [
        MenuAction::Open,
        MenuAction::Close,
        MenuAction::Reset,
        MenuAction::PrintTestReceipt,
        MenuAction::CommandSet,
        MenuAction::ProductInfo,
        MenuAction::Quit,
    ];

    fn title(&self) -> &'static str {
        use MenuAction::*;

        match self {
            Open => "Open",
            Close => "Close",
            Reset => "Reset",
            PrintTestReceipt => "Print test receipt",
            CommandSet => "Get command set",
            ProductInfo => "Get product info",
            Quit => "Quit",
        }
    }

    /// Digit shortcut: 1-6, 0 for quit.
    fn shortcut(&self) -> char {
        match self {
            MenuAction::Quit => '0',
            other => char::from(b'1' + (*other as u8)),
        }
    }

    fn from_shortcut(c: char) -> Option<Self> {
        MenuAction::ALL.into_iter().find(|a| a.shortcut() == c)
    }
}

struct LogEntry {
    time: DateTime<Local>,
    ty: MessageType,
    text: String,
}

pub struct App {
    now: DateTime<Local>,
    printer: Printer,
    focus: Focus,
    popup: Option<(MessageType, String)>,
    menu_list_state: ListState,
    log: Vec<LogEntry>,
}

impl App {
    fn selected_action(&self) -> MenuAction {
        MenuAction::ALL[self.menu_list_state.selected().unwrap_or(0)]
    }

    fn select_previous_action(&mut self) {
        let idx = self.menu_list_state.selected().unwrap_or(0);

        if idx > 0 {
            self.menu_list_state.select(Some(idx - 1));
        }
    }

    fn select_next_action(&mut self) {
        let idx = self.menu_list_state.selected().unwrap_or(0);

        if idx < (MenuAction::ALL.len() - 1) {
            self.menu_list_state.select(Some(idx + 1));
        }
    }

    fn push_log(&mut self, ty: MessageType, text: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.remove(0);
        }

        self.log.push(LogEntry {
            time: self.now,
            ty,
            text,
        });
    }

    fn show_message(&mut self, ty: MessageType, text: String) {
        self.push_log(ty, text.lines().next().unwrap_or_default().to_string());
        self.popup = Some((ty, text));
        self.focus = Focus::Message;
    }

    /// Returns `false` when the app should quit.
    fn perform_action(&mut self, action: MenuAction) -> bool {
        match action {
            MenuAction::Open => match self.printer.open() {
                Ok(()) => self.push_log(
                    MessageType::Info,
                    format!("Opened {}", self.printer.model()),
                ),
                Err(err) => self.show_message(MessageType::Error, format!("Open failed: {}", err)),
            },

            MenuAction::Close => {
                self.printer.close();
                self.push_log(MessageType::Info, String::from("Closed"));
            }

            MenuAction::Reset => match self.printer.reset() {
                Ok(()) => self.push_log(MessageType::Info, String::from("Printer reset")),
                Err(err) => {
                    self.show_message(MessageType::Error, format!("Reset failed: {}", err))
                }
            },

            MenuAction::PrintTestReceipt => match self.printer.send_command(TEST_RECEIPT) {
                Ok(()) => self.push_log(MessageType::Info, String::from("Test receipt sent")),
                Err(err) => {
                    self.show_message(MessageType::Error, format!("Printing failed: {}", err))
                }
            },

            MenuAction::CommandSet => match self.printer.command_set() {
                UNKNOWN_COMMAND_SET => self.show_message(
                    MessageType::Error,
                    String::from("The printer did not report its command set."),
                ),
                command_set => {
                    self.show_message(MessageType::Info, format!("Command set: {}", command_set))
                }
            },

            MenuAction::ProductInfo => {
                let info = self.printer.product_info();

                if info.is_empty() {
                    self.show_message(
                        MessageType::Error,
                        String::from("The printer answered none of the product info queries."),
                    );
                } else {
                    let text = InfoField::ALL
                        .iter()
                        .map(|field| {
                            format!(
                                "{}: {}",
                                field,
                                info.text(*field).unwrap_or_else(|| String::from("-"))
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n");

                    self.show_message(MessageType::Info, format!("Product info\n{}", text));
                }
            }

            MenuAction::Quit => return false,
        }

        true
    }

    fn run_in_terminal<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), Box<dyn Error>> {
        self.menu_list_state.select(Some(0));
        self.push_log(
            MessageType::Info,
            format!("Session for {} created", self.printer.model()),
        );

        loop {
            self.now = Local::now();

            terminal.draw(|frame| self.draw_ui(frame))?;

            if !event::poll(TICK_RATE)? {
                continue;
            }

            let Event::Key(key) = event::read()? else {
                continue;
            };

            if self.focus == Focus::Message {
                // Any key dismisses the message.
                self.popup = None;
                self.focus = Focus::Menu;
                continue;
            }

            let keep_running = match key.code {
                KeyCode::Char('q') => false,
                KeyCode::Up => {
                    self.select_previous_action();
                    true
                }
                KeyCode::Down => {
                    self.select_next_action();
                    true
                }
                KeyCode::Enter => self.perform_action(self.selected_action()),
                KeyCode::Char(c) => match MenuAction::from_shortcut(c) {
                    Some(action) => self.perform_action(action),
                    None => true,
                },

                _ => true,
            };

            if !keep_running {
                return Ok(());
            }
        }
    }

    fn draw_ui<B: Backend>(&mut self, frame: &mut Frame<B>) {
        // Split the window into body and status line.
        let vert_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)].as_ref())
            .split(frame.size());

        let body_chunk = vert_chunks[0];
        let status_chunk = vert_chunks[1];

        // Split the body into menu and activity log.
        let horz_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
            .split(body_chunk);

        self.draw_menu_chunk(frame, horz_chunks[0]);
        self.draw_log_chunk(frame, horz_chunks[1]);
        self.draw_status_chunk(frame, status_chunk);

        // Borrow checker shenanigans ...
        if let Some((ty, text)) = self.popup.take() {
            self.draw_message_chunk(frame, ty, &text);
            self.popup = Some((ty, text));
        }
    }

    fn state_text(&self) -> &'static str {
        match self.printer.state() {
            SessionState::Closed => "closed",
            SessionState::Opening => "handshake incomplete (close to release)",
            SessionState::Open => "open",
            SessionState::Resetting => "resetting",
        }
    }

    pub fn run(printer: Printer) -> Result<(), Box<dyn Error>> {
        let mut app = App {
            now: Local::now(),
            printer,
            focus: Focus::Menu,
            popup: None,
            menu_list_state: Default::default(),
            log: Vec::with_capacity(LOG_CAPACITY),
        };

        // Configure the terminal.
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Run the app.
        let result = app.run_in_terminal(&mut terminal);

        // Restore the terminal.
        disable_raw_mode()?;

        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;

        terminal.show_cursor()?;

        // Release the printer before handing the terminal back.
        app.printer.close();

        result
    }
}
