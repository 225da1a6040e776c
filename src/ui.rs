use crate::app::App;
use crate::transcript::{EntryRole, EntryStatus, TranscriptEntry};
use ratatui::{
    layout::{Constraint, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(app: &mut App, frame: &mut Frame) {
    // Chat transcript on top, input box at the bottom
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(frame.area());

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat: {} ", app.client.endpoint()));

    let chat_text = if app.transcript.is_empty() {
        Text::from(Span::styled(
            "Send a message to start chatting...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for entry in app.transcript.entries() {
            render_entry(entry, app.animation_frame, &mut lines);
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, chat_area);

    // Input box - dim while a reply is pending
    let input_border_color = if app.is_waiting() {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let input_title = if app.is_waiting() {
        " Waiting for reply... "
    } else {
        " Message (Enter to send, Shift+Enter for newline) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input (newlines shown as pilcrows)
    let visible_text: String = app
        .input
        .chars()
        .map(|c| if c == '\n' { '¶' } else { c })
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .block(input_block)
        .style(Style::default().fg(Color::Cyan));

    frame.render_widget(input, input_area);

    // Place the terminal cursor inside the input box
    let cursor_x = input_area.x + 1 + (cursor_pos - scroll_offset) as u16;
    let cursor_y = input_area.y + 1;
    frame.set_cursor_position(Position::new(cursor_x, cursor_y));
}

fn render_entry(entry: &TranscriptEntry, animation_frame: u8, lines: &mut Vec<Line<'static>>) {
    match entry.role {
        EntryRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            for line in entry.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }
        EntryRole::Bot => {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            match entry.status {
                EntryStatus::Pending => {
                    // Animated ellipsis: cycles through ".", "..", "..."
                    let dots = ".".repeat((animation_frame as usize) + 1);
                    lines.push(Line::from(Span::styled(
                        format!("Thinking{}", dots),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    )));
                }
                EntryStatus::Error => {
                    for line in entry.text.lines() {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Red),
                        )));
                    }
                }
                EntryStatus::Final => {
                    for line in entry.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
            }
            lines.push(Line::default());
        }
    }
}
