use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.poll_reply().await;
            app.tick();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if !app.session.started() {
        handle_welcome_key(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_welcome_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('s') => app.start_chat(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Focus the input line
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Quick replies
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(digit) = c.to_digit(10) {
                app.send_quick_reply(digit as usize - 1);
            }
        }

        // New conversation over the old one
        KeyCode::Char('n') => app.new_conversation(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_input();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::ResponderClient;
    use crate::session::Session;
    use crate::store::SessionStore;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path());
        let session = Session::restore(&store);
        let app = App::new(session, store, ResponderClient::new("http://127.0.0.1:1/"));
        (dir, app)
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::from(code))
    }

    #[test]
    fn char_to_byte_index_handles_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3); // 'é' is two bytes
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[tokio::test]
    async fn enter_on_welcome_screen_starts_the_chat() {
        let (_dir, mut app) = test_app();
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert!(app.session.started());
        assert!(app.session.pending());
        assert!(app.reply_task.is_some());
    }

    #[tokio::test]
    async fn editing_inserts_and_deletes_at_cursor() {
        let (_dir, mut app) = test_app();
        app.session.start(&app.store);
        app.session
            .settle(Ok("hi".to_string()), &app.store);
        app.input_mode = InputMode::Editing;

        for c in "vpn".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        assert_eq!(app.input, "vpn");
        assert_eq!(app.input_cursor, 3);

        handle_event(&mut app, press(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, press(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.input, "vn");
        assert_eq!(app.input_cursor, 1);
    }

    #[tokio::test]
    async fn enter_submits_and_returns_to_normal_mode() {
        let (_dir, mut app) = test_app();
        app.session.start(&app.store);
        app.session
            .settle(Ok("hi".to_string()), &app.store);
        app.input_mode = InputMode::Editing;
        app.input = "Reset password".to_string();
        app.input_cursor = app.input.chars().count();

        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.session.pending());
        assert_eq!(
            app.session.messages().last().unwrap().content,
            "Reset password"
        );
    }
}
