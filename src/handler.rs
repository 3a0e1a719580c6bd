use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, Focus};
use crate::tui::AppEvent;
use tracing::warn;

/// Handle the next item from the event channel. A closed channel ends the session.
pub fn handle_next(app: &mut App, event: Option<AppEvent>) {
    match event {
        Some(event) => handle_event(app, event),
        None => {
            warn!("Terminal event stream closed, quitting");
            app.should_quit = true;
        }
    }
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        KeyCode::Tab | KeyCode::BackTab => app.focus_next(),

        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.submit(),

        KeyCode::Enter => match app.focus {
            Focus::Message => app.submit(),
            Focus::Endpoint => app.focus = Focus::Message,
        },

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let page = app.page_size();
            app.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.page_size();
            app.scroll_down(page);
        }

        // Field editing
        KeyCode::Backspace => app.focused_field().backspace(),
        KeyCode::Delete => app.focused_field().delete(),
        KeyCode::Left => app.focused_field().move_left(),
        KeyCode::Right => app.focused_field().move_right(),
        KeyCode::Home => app.focused_field().move_home(),
        KeyCode::End => app.focused_field().move_end(),
        KeyCode::Char(c) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.focused_field().insert(c);
            }
        }

        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn hit(area: Option<Rect>, mouse: &MouseEvent) -> bool {
    area.is_some_and(|rect| point_in_rect(mouse.column, mouse.row, rect))
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.alert.is_some() {
                app.dismiss_alert();
            } else if hit(app.send_button_area, &mouse) {
                app.submit();
            } else if hit(app.endpoint_area, &mouse) {
                app.focus = Focus::Endpoint;
            } else if hit(app.message_area, &mouse) {
                app.focus = Focus::Message;
            }
        }
        MouseEventKind::ScrollUp if hit(app.transcript_area, &mouse) => app.scroll_up(3),
        MouseEventKind::ScrollDown if hit(app.transcript_area, &mouse) => app.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with, settle};
    use crate::chat::tests::ScriptedClient;
    use crate::error::MISSING_INPUT_ALERT;
    use crate::message::Message;
    use crate::transcript::TranscriptStore;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    fn click(column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[tokio::test]
    async fn test_enter_in_message_field_sends() {
        let (mut app, client) = app_with(
            ScriptedClient::default().respond(200, r#"{"answer":"hello"}"#),
            "http://x/chat",
        );
        type_text(&mut app, "hi");

        handle_event(&mut app, key(KeyCode::Enter));
        settle(&mut app).await;

        assert_eq!(
            app.transcript.entries(),
            vec![Message::user("hi"), Message::server("hello")]
        );
        assert_eq!(client.request_count(), 1);
        assert!(app.inputs.question.is_empty());
    }

    #[tokio::test]
    async fn test_send_button_click_sends() {
        let (mut app, client) = app_with(
            ScriptedClient::default().respond(200, r#"{"answer":"clicked"}"#),
            "http://x/chat",
        );
        type_text(&mut app, "hi");
        app.send_button_area = Some(Rect::new(50, 10, 10, 3));

        handle_event(&mut app, click(55, 11));
        settle(&mut app).await;

        assert_eq!(app.transcript.len(), 2);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_ctrl_s_sends() {
        let (mut app, client) = app_with(
            ScriptedClient::default().respond(200, r#"{"answer":"ok"}"#),
            "http://x/chat",
        );
        type_text(&mut app, "hi");

        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
        );
        settle(&mut app).await;

        assert_eq!(client.request_count(), 1);
        assert!(app.inputs.question.is_empty());
    }

    #[tokio::test]
    async fn test_enter_in_endpoint_field_moves_focus() {
        let (mut app, client) = app_with(ScriptedClient::default(), "");
        type_text(&mut app, "http://x/chat");

        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.focus, Focus::Message);
        assert_eq!(app.inputs.endpoint.value(), "http://x/chat");
        assert_eq!(client.request_count(), 0);
        assert!(app.alert.is_none());
    }

    #[tokio::test]
    async fn test_alert_swallows_keys_until_dismissed() {
        let (mut app, client) = app_with(ScriptedClient::default(), "http://x/chat");

        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.alert.as_deref(), Some(MISSING_INPUT_ALERT));

        type_text(&mut app, "ignored");
        assert!(app.inputs.question.is_empty());
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Esc));
        assert!(app.alert.is_none());
        assert!(!app.should_quit);
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_tab_switches_fields() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        assert_eq!(app.focus, Focus::Message);

        handle_event(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "/v2");

        assert_eq!(app.focus, Focus::Endpoint);
        assert_eq!(app.inputs.endpoint.value(), "http://x/chat/v2");
        assert!(app.inputs.question.is_empty());
    }

    #[test]
    fn test_click_focuses_fields() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.endpoint_area = Some(Rect::new(0, 5, 40, 3));
        app.message_area = Some(Rect::new(0, 8, 40, 3));

        handle_event(&mut app, click(3, 6));
        assert_eq!(app.focus, Focus::Endpoint);

        handle_event(&mut app, click(3, 9));
        assert_eq!(app.focus, Focus::Message);
    }

    #[test]
    fn test_closed_event_stream_quits() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");

        handle_next(&mut app, Some(key(KeyCode::Char('a'))));
        assert!(!app.should_quit);

        handle_next(&mut app, None);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_even_with_alert() {
        let (mut app, _) = app_with(ScriptedClient::default(), "http://x/chat");
        app.show_alert("boom");

        let mut event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        event.kind = KeyEventKind::Press;
        handle_event(&mut app, AppEvent::Key(event));

        assert!(app.should_quit);
    }
}
