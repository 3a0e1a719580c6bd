use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, Focus};
use crate::input::TextField;
use crate::message::Origin;
use crate::transcript::TranscriptStore;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, endpoint, message + send, footer
    let [header_area, transcript_area, endpoint_area, message_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let [message_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(message_row);

    // Store areas for mouse hit-testing
    app.transcript_area = Some(transcript_area);
    app.endpoint_area = Some(endpoint_area);
    app.message_area = Some(message_area);
    app.send_button_area = Some(send_area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);

    let editing = app.alert.is_none();
    render_field(
        frame,
        endpoint_area,
        " Endpoint URL ",
        &app.inputs.endpoint,
        editing && app.focus == Focus::Endpoint,
    );
    render_field(
        frame,
        message_area,
        " Message (Enter to send) ",
        &app.inputs.question,
        editing && app.focus == Focus::Message,
    );
    render_send_button(frame, send_area);

    render_footer(app, frame, footer_area);

    if let Some(alert) = &app.alert {
        render_alert(alert, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.pending_count();
    let pending_indicator = if pending > 0 {
        format!(" [{} pending]", pending)
    } else {
        String::new()
    };
    let count = app.transcript.len();
    let count_indicator = match count {
        0 => String::new(),
        1 => " 1 message".to_string(),
        n => format!(" {} messages", n),
    };

    let title = Line::from(vec![
        Span::styled(" chatline ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(count_indicator, Style::default().fg(Color::White)),
        Span::styled(pending_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn origin_style(origin: Origin) -> Style {
    let color = match origin {
        Origin::User => Color::Cyan,
        Origin::Server => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    if app.follow_tail {
        app.scroll_to_bottom();
    }

    let entries = app.transcript.entries();
    let pending = app.pending_count();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Transcript ");

    let text = if entries.is_empty() && pending == 0 {
        Text::from(Span::styled(
            "Enter an endpoint URL and a message, then press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &entries {
            lines.push(Line::from(Span::styled(
                format!("{}:", msg.origin().label()),
                origin_style(msg.origin()),
            )));
            // Plain text only; an empty answer still gets its own line
            let before = lines.len();
            for line in msg.text().lines() {
                lines.push(Line::from(line.to_string()));
            }
            if lines.len() == before {
                lines.push(Line::default());
            }
            lines.push(Line::default());
        }

        if pending > 0 {
            lines.push(Line::from(Span::styled(
                format!("{}:", Origin::Server.label()),
                origin_style(Origin::Server),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            let noun = if pending == 1 { "response" } else { "responses" };
            lines.push(Line::from(Span::styled(
                format!("Waiting for {} {}{}", pending, noun, dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_field(frame: &mut Frame, area: Rect, title: &str, field: &TextField, focused: bool) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = field.visible(inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if focused {
        // `visible` keeps the column inside the window, which fits in a u16
        let cursor_x = area.x.saturating_add(cursor_col as u16).saturating_add(1);
        frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
    }
}

fn render_send_button(frame: &mut Frame, area: Rect) {
    let button = Paragraph::new(Span::styled(
        "Send",
        Style::default().fg(Color::Black).bg(Color::Green).bold(),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(button, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.alert.is_some() {
        vec![
            Span::styled(" Enter/Esc ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" switch field ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Rectangle of the given size centered in `area`, clamped to fit
fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_alert(text: &str, frame: &mut Frame, area: Rect) {
    let width = (text.chars().count() as u16 + 6).max(30);
    let popup = centered(width, 5, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Alert ")
        .title_bottom(Line::from(" Enter to dismiss ").alignment(Alignment::Center));

    let body = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::app_with;
    use crate::chat::tests::ScriptedClient;
    use crate::message::Message;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_transcript_labels_each_origin() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.transcript.append(Message::user("hi"));
        app.transcript.append(Message::server("hello"));

        let screen = draw(&mut app);

        assert!(screen.contains("You:"));
        assert!(screen.contains("Server:"));
        assert!(screen.contains("hello"));
        assert!(screen.contains("http://x/chat"));
        assert!(app.send_button_area.is_some());
    }

    #[test]
    fn test_markup_is_shown_literally() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.transcript.append(Message::user("**<b>bold</b>**"));

        let screen = draw(&mut app);

        assert!(screen.contains("**<b>bold</b>**"));
    }

    #[test]
    fn test_alert_is_drawn_over_screen() {
        let (mut app, _) = app_with(ScriptedClient::default(), "");
        app.show_alert("Please enter both URL and message.");

        let screen = draw(&mut app);

        assert!(screen.contains("Please enter both URL and message."));
        assert!(screen.contains("dismiss"));
    }

    #[test]
    fn test_header_counts_messages() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.transcript.append(Message::user("hi"));
        app.transcript.append(Message::server("hello"));

        assert!(draw(&mut app).contains("2 messages"));
    }

    #[test]
    fn test_cursor_stays_inside_narrow_field() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.inputs.question = TextField::new("y".repeat(500));

        // Message field is 2 columns wide next to the Send button
        let mut terminal = Terminal::new(TestBackend::new(12, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        let message_area = app.message_area.unwrap();
        assert!(cursor.x < message_area.x + message_area.width);
        assert_eq!(cursor.y, message_area.y + 1);
    }

    #[test]
    fn test_centered_is_clamped() {
        let area = Rect::new(0, 0, 20, 4);
        let popup = centered(40, 5, area);
        assert_eq!(popup, Rect::new(0, 0, 20, 4));

        let popup = centered(10, 2, Rect::new(0, 0, 20, 10));
        assert_eq!(popup, Rect::new(5, 4, 10, 2));
    }
}
