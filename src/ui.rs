use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::session::{ChatRole, QUICK_REPLIES};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    if !app.session.started() {
        render_welcome(frame, area);
        return;
    }

    // Quick replies take a row only when they are offered.
    let quick_height: u16 = if app.session.quick_replies_visible() {
        1
    } else {
        0
    };

    let [chat_area, quick_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(quick_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size
    // minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_transcript(app, frame, chat_area);
    if quick_height > 0 {
        render_quick_replies(frame, quick_area);
    }
    render_input(app, frame, input_area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" HCIL IT Helpdesk ");

    let top_padding = area.height.saturating_sub(8) / 2;
    let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::default()).collect();
    lines.push(Line::from("\u{1F916}"));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Welcome to the Helpdesk",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press Enter to start the conversation.",
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(Span::styled(
        "q to quit",
        Style::default().fg(Color::DarkGray),
    )));

    let welcome = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(welcome, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" HCIL IT Helpdesk ");

    let messages = app.session.messages();
    let mut lines: Vec<Line> = Vec::new();

    for (idx, msg) in messages.iter().enumerate() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            ChatRole::Bot => {
                lines.push(Line::from(Span::styled(
                    "Helpdesk:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            }
        }

        // The newest bot message may still be mid-reveal.
        let is_revealing =
            idx + 1 == messages.len() && msg.role == ChatRole::Bot && app.reveal.is_some();
        let content: String = if let (true, Some(shown)) = (is_revealing, app.reveal) {
            msg.content.chars().take(shown).collect()
        } else {
            msg.content.clone()
        };

        for line in content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.session.pending() {
        lines.push(Line::from(Span::styled(
            "Helpdesk:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let transcript = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_quick_replies(frame: &mut Frame, area: Rect) {
    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (i, reply) in QUICK_REPLIES.iter().enumerate() {
        spans.push(Span::styled(
            format!("[{}] {}", i + 1, reply),
            Style::default().fg(Color::Magenta),
        ));
        spans.push(Span::raw("  "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.session.pending() {
        " Waiting for a reply... "
    } else {
        " Message (i to type, Enter to send, n for new chat) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
