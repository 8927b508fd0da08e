//! Terminal interface: renders store snapshots and forwards user intents
//! to the controller.
//!
//! The loop redraws after input events and whenever the controller's
//! listener fires, so in-flight sends repaint the transcript the moment
//! the reply settles. While the poller reports the backend down, typing
//! is disabled and a full-screen notice with a manual retry replaces the
//! chat view.

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tui_textarea::TextArea;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::ModelEntry;
use crate::core::constants::FALLBACK_MODEL;
use crate::core::controller::ChatController;
use crate::core::message::{Conversation, Message};
use crate::core::store::BackendStatus;

const SIDEBAR_WIDTH: u16 = 26;

/// Read-only view of controller state, captured once per frame.
struct Snapshot {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    messages: Vec<Message>,
    models: Vec<ModelEntry>,
    current_model: Option<String>,
    status: BackendStatus,
}

impl Snapshot {
    async fn capture(controller: &ChatController) -> Self {
        let active = controller.active_conversation().await;
        Self {
            conversations: controller.all_conversations().await,
            active_id: active.as_ref().map(|c| c.id.clone()),
            messages: controller.conversation_messages(None).await,
            models: controller.available_models().await,
            current_model: controller.current_model().await,
            status: controller.backend_status().await,
        }
    }

    /// Model shown in the status line: the same priority the controller
    /// applies when sending.
    fn model_in_effect(&self) -> String {
        self.current_model
            .clone()
            .or_else(|| {
                self.active_id.as_deref().and_then(|id| {
                    self.conversations
                        .iter()
                        .find(|c| c.id == id)
                        .and_then(|c| c.model_id.clone())
                })
            })
            .or_else(|| self.models.first().map(|m| m.name.clone()))
            .unwrap_or_else(|| FALLBACK_MODEL.to_string())
    }
}

struct UiState {
    input: TextArea<'static>,
    scroll_offset: u16,
    auto_scroll: bool,
}

fn input_area() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_style(Style::default().fg(Color::Yellow));
    input.set_cursor_line_style(Style::default());
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title("Message (Enter to send)"),
    );
    input
}

pub async fn run_chat(controller: Arc<ChatController>) -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let listener = controller
        .add_listener(move || {
            let _ = tx.send(());
        })
        .await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut ui = UiState {
        input: input_area(),
        scroll_offset: 0,
        auto_scroll: true,
    };

    let result = loop {
        let snapshot = Snapshot::capture(&controller).await;
        if ui.auto_scroll {
            let (width, height) = transcript_size(&terminal);
            ui.scroll_offset = max_scroll_offset(&snapshot.messages, width, height);
        }
        terminal.draw(|f| draw(f, &snapshot, &ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Char('c') if ctrl => break Ok(()),
                    _ if !snapshot.status.running => {
                        // Input is disabled while the backend is down;
                        // only the manual retry is honored.
                        if key.code == KeyCode::Char('r') {
                            let retry = Arc::clone(&controller);
                            tokio::spawn(async move { retry.refresh_models().await });
                        }
                    }
                    KeyCode::Enter => {
                        let text = ui.input.lines().join("\n");
                        if text.trim().is_empty() {
                            continue;
                        }
                        ui.input = input_area();
                        ui.auto_scroll = true;
                        // The send runs detached so the loop keeps
                        // handling input during the round-trip.
                        let sender = Arc::clone(&controller);
                        tokio::spawn(async move { sender.send_message(&text).await });
                    }
                    KeyCode::Char('n') if ctrl => {
                        controller.create_new_conversation(None, None).await;
                        ui.auto_scroll = true;
                    }
                    KeyCode::Char('d') if ctrl => {
                        if let Some(id) = snapshot.active_id.clone() {
                            controller.delete_conversation(&id).await;
                            ui.auto_scroll = true;
                        }
                    }
                    KeyCode::Tab => {
                        switch_conversation(&controller, &snapshot, 1).await;
                        ui.auto_scroll = true;
                    }
                    KeyCode::BackTab => {
                        switch_conversation(&controller, &snapshot, -1).await;
                        ui.auto_scroll = true;
                    }
                    KeyCode::Char('l') if ctrl => {
                        cycle_model(&controller, &snapshot).await;
                    }
                    KeyCode::Up => {
                        ui.auto_scroll = false;
                        ui.scroll_offset = ui.scroll_offset.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        let (width, height) = transcript_size(&terminal);
                        let max = max_scroll_offset(&snapshot.messages, width, height);
                        ui.scroll_offset = ui.scroll_offset.saturating_add(1).min(max);
                        if ui.scroll_offset >= max {
                            ui.auto_scroll = true;
                        }
                    }
                    // Everything else is text editing and goes to the
                    // textarea (cursor movement, word ops, backspace).
                    _ => {
                        ui.input.input(tui_textarea::Input::from(key));
                    }
                }
            }
        }

        // Drain change notifications; the next iteration redraws from a
        // fresh snapshot either way.
        while rx.try_recv().is_ok() {}
    };

    controller.remove_listener(listener).await;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn switch_conversation(controller: &ChatController, snapshot: &Snapshot, step: isize) {
    let current = snapshot
        .conversations
        .iter()
        .position(|c| Some(c.id.as_str()) == snapshot.active_id.as_deref());
    if let Some(index) = cycle_index(snapshot.conversations.len(), current, step) {
        let id = snapshot.conversations[index].id.clone();
        controller.set_active_conversation(&id).await;
    }
}

async fn cycle_model(controller: &ChatController, snapshot: &Snapshot) {
    let current = snapshot
        .models
        .iter()
        .position(|m| Some(m.name.as_str()) == snapshot.current_model.as_deref());
    if let Some(index) = cycle_index(snapshot.models.len(), current, 1) {
        let name = snapshot.models[index].name.clone();
        controller.set_model(&name).await;
    }
}

/// Next position when stepping through `len` items from `current`,
/// wrapping at both ends. `None` when there is nothing to step through.
fn cycle_index(len: usize, current: Option<usize>, step: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let current = current.map(|c| c as isize).unwrap_or(-step);
    Some(((current + step).rem_euclid(len)) as usize)
}

fn transcript_size<B: ratatui::backend::Backend>(terminal: &Terminal<B>) -> (u16, u16) {
    let size = terminal.size().unwrap_or_default();
    let width = size.width.saturating_sub(SIDEBAR_WIDTH);
    // Input area (3) and status line (1), plus the transcript title.
    let height = size.height.saturating_sub(4).saturating_sub(1);
    (width, height)
}

/// Rows the transcript occupies once wrapped to `width`, minus what fits
/// on screen. Scrolling to this offset pins the newest line to the
/// bottom of the viewport.
fn max_scroll_offset(messages: &[Message], width: u16, available_height: u16) -> u16 {
    let total = build_display_lines(messages, width).len() as u16;
    total.saturating_sub(available_height)
}

/// Word-wraps `text` to display rows no wider than `width` columns.
/// Words wider than a whole row are split hard at the column boundary.
fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        let mut current_width = 0usize;
        for word in raw.split_whitespace() {
            let mut word = word;
            while word.width() > width {
                if current_width > 0 {
                    rows.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                let (head, tail) = split_at_width(word, width);
                rows.push(head.to_string());
                word = tail;
            }
            let sep = usize::from(current_width > 0);
            if current_width + sep + word.width() > width {
                rows.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word.width();
        }
        rows.push(current);
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}

fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, ch) in word.char_indices() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            return (&word[..idx], &word[idx..]);
        }
        used += w;
    }
    (word, "")
}

/// Pre-wrapped styled lines for the transcript. Wrapping here instead of
/// at render time keeps the scroll math working from the rows that
/// actually end up on screen.
fn build_display_lines(messages: &[Message], width: u16) -> Vec<Line<'static>> {
    let width = width.max(6) as usize;
    let mut lines = Vec::new();
    for msg in messages {
        if msg.sender.is_user() {
            let prefix_style = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            for (i, row) in wrap_to_width(&msg.text, width - 5).into_iter().enumerate() {
                let prefix = if i == 0 { "You: " } else { "     " };
                lines.push(Line::from(vec![
                    Span::styled(prefix, prefix_style),
                    Span::styled(row, Style::default().fg(Color::Cyan)),
                ]));
            }
        } else {
            for row in wrap_to_width(&msg.text, width) {
                lines.push(Line::from(Span::styled(
                    row,
                    Style::default().fg(Color::White),
                )));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

fn draw(f: &mut Frame, snapshot: &Snapshot, ui: &UiState) {
    if !snapshot.status.running {
        draw_backend_notice(f, &snapshot.status);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(f.area());

    draw_sidebar(f, snapshot, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    let lines = build_display_lines(&snapshot.messages, rows[0].width);
    let available_height = rows[0].height.saturating_sub(1);
    let max_offset = (lines.len() as u16).saturating_sub(available_height);
    let transcript = Paragraph::new(lines)
        .block(Block::default().title("Ollama Chat"))
        .scroll((ui.scroll_offset.min(max_offset), 0));
    f.render_widget(transcript, rows[0]);

    f.render_widget(&ui.input, rows[1]);

    let status = Line::from(vec![
        Span::styled(
            format!(" model: {} ", snapshot.model_in_effect()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            "· ^N new · ^D delete · Tab switch · ^L model · ^C quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(status), rows[2]);
}

fn draw_sidebar(f: &mut Frame, snapshot: &Snapshot, area: ratatui::layout::Rect) {
    let items: Vec<ListItem> = snapshot
        .conversations
        .iter()
        .map(|c| {
            let active = Some(c.id.as_str()) == snapshot.active_id.as_deref();
            let style = if active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Span::styled(c.title.clone(), style))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT)
            .title("Conversations"),
    );
    f.render_widget(list, area);
}

fn draw_backend_notice(f: &mut Frame, status: &BackendStatus) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Ollama is not running",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if let Some(error) = &status.error {
        lines.push(Line::from(error.as_str()));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Press r to retry · Ctrl+C to quit",
        Style::default().fg(Color::DarkGray),
    )));

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Min(5),
            Constraint::Percentage(40),
        ])
        .split(f.area());
    let notice = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(notice, vertical[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Sender;
    use tui_textarea::{CursorMove, Input, Key};

    #[test]
    fn cycle_index_wraps_in_both_directions() {
        assert_eq!(cycle_index(3, Some(2), 1), Some(0));
        assert_eq!(cycle_index(3, Some(0), -1), Some(2));
        assert_eq!(cycle_index(3, None, 1), Some(0));
        assert_eq!(cycle_index(0, None, 1), None);
    }

    #[test]
    fn display_lines_prefix_user_messages() {
        let messages = vec![
            Message::new(Sender::User, "hi", None),
            Message::new(Sender::Assistant, "hello\nthere", None),
        ];
        let lines = build_display_lines(&messages, 40);
        // User line, spacer, two assistant lines, spacer.
        assert_eq!(lines.len(), 5);
        assert!(lines[0]
            .spans
            .first()
            .map(|s| s.content.contains("You"))
            .unwrap_or(false));
    }

    #[test]
    fn input_cursor_tracks_characters_not_bytes() {
        let mut input = input_area();
        for ch in "café".chars() {
            input.input(Input {
                key: Key::Char(ch),
                ..Default::default()
            });
        }
        // Four characters typed, six bytes; the cursor sits after the
        // fourth column.
        assert_eq!(input.cursor(), (0, 4));
        input.move_cursor(CursorMove::Head);
        input.input(Input {
            key: Key::Char('¡'),
            ..Default::default()
        });
        assert_eq!(input.lines(), ["¡café"]);
    }

    #[test]
    fn wrap_splits_at_word_boundaries_and_hard_breaks_long_words() {
        assert_eq!(
            wrap_to_width("word word word", 9),
            vec!["word word", "word"]
        );
        assert_eq!(wrap_to_width("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_to_width("", 10), vec![""]);
    }

    #[test]
    fn scroll_offset_counts_wrapped_rows() {
        // Twenty 4-wide words in a 9-column transcript wrap to ten rows
        // of "word word", plus the spacer after the message.
        let text = "word ".repeat(20);
        let messages = vec![Message::new(Sender::Assistant, text.trim(), None)];
        assert_eq!(max_scroll_offset(&messages, 9, 4), 7);
        // Unwrapped, the same message is a single logical line.
        assert_eq!(max_scroll_offset(&messages, 200, 4), 0);
    }
}
