use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;

use crate::responder::ResponderClient;
use crate::session::{ChatRole, Session, GREETING, GREETING_DELAY_MS, QUICK_REPLIES};
use crate::store::SessionStore;

/// Characters of a fresh bot message revealed per tick.
const REVEAL_CHARS_PER_TICK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: Session,
    pub store: SessionStore,
    pub responder: ResponderClient,

    // The single outstanding call: the greeting delay or a responder
    // request. `pending` on the session gates creating a second one.
    pub reply_task: Option<JoinHandle<anyhow::Result<String>>>,

    // Input line state
    pub input: String,
    pub input_cursor: usize, // char index, not byte index

    // Transcript viewport (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for the thinking ellipsis
    pub reveal: Option<usize>, // chars shown of the newest bot message
}

impl App {
    pub fn new(session: Session, store: SessionStore, responder: ResponderClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            session,
            store,
            responder,
            reply_task: None,
            input: String::new(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            reveal: None,
        }
    }

    /// Begin a conversation from the welcome screen.
    pub fn start_chat(&mut self) {
        self.session.start(&self.store);
        self.reveal = None;
        self.chat_scroll = 0;
        self.spawn_greeting();
    }

    /// Throw away the current conversation and start over.
    pub fn new_conversation(&mut self) {
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
        self.session.reset(&self.store);
        self.reveal = None;
        self.chat_scroll = 0;
        self.spawn_greeting();
    }

    /// Submit whatever is in the input line.
    pub fn submit_input(&mut self) {
        if self.input.trim().is_empty() || self.session.pending() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.dispatch(&text);
    }

    /// Send the n-th canned quick reply, if they are currently offered.
    pub fn send_quick_reply(&mut self, index: usize) {
        if !self.session.quick_replies_visible() {
            return;
        }
        if let Some(reply) = QUICK_REPLIES.get(index) {
            self.dispatch(reply);
        }
    }

    fn dispatch(&mut self, text: &str) {
        if let Some(outgoing) = self.session.begin_send(text, &self.store) {
            let responder = self.responder.clone();
            self.reply_task = Some(tokio::spawn(async move {
                responder.send(&outgoing).await
            }));
            self.scroll_to_bottom();
        }
    }

    fn spawn_greeting(&mut self) {
        self.reply_task = Some(tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(GREETING_DELAY_MS)).await;
            Ok(GREETING.to_string())
        }));
    }

    /// Fold a finished call back into the session. No-op while the task
    /// is still running.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.reply_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow!("responder task failed: {err}")),
            };
            self.session.settle(result, &self.store);
            self.reveal = Some(0);
            self.scroll_to_bottom();
        }
    }

    /// Advance the thinking ellipsis and the typing reveal.
    pub fn tick(&mut self) {
        if self.session.pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
            self.scroll_to_bottom();
        }
        if let Some(shown) = self.reveal {
            let target = self
                .session
                .messages()
                .last()
                .filter(|msg| msg.role == ChatRole::Bot)
                .map(|msg| msg.content.chars().count())
                .unwrap_or(0);
            let next = shown + REVEAL_CHARS_PER_TICK;
            self.reveal = if next >= target { None } else { Some(next) };
        }
    }

    // Transcript scrolling
    pub fn scroll_down(&mut self) {
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.chat_height);
        if self.chat_scroll < max_scroll {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll so the newest message (or the thinking indicator) is
    /// visible.
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Wrapped line count of the rendered transcript, mirroring the
    /// layout in `ui::render`.
    fn transcript_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if
        // not measured yet.
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.session.messages() {
            total_lines += 1; // Role line ("You:" or "Helpdesk:")
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content.
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.session.pending() {
            total_lines += 2; // "Helpdesk:" + "Thinking..."
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FALLBACK_REPLY;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_with_url(url: &str) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path());
        let session = Session::restore(&store);
        let app = App::new(session, store, ResponderClient::new(url));
        (dir, app)
    }

    /// Drive the app until the outstanding call settles.
    async fn settle(app: &mut App) {
        for _ in 0..500 {
            app.poll_reply().await;
            if !app.session.pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply task never settled");
    }

    #[tokio::test(start_paused = true)]
    async fn greeting_arrives_after_the_delay() {
        let (_dir, mut app) = app_with_url("http://127.0.0.1:1/api/chat");
        app.start_chat();
        assert!(app.session.pending());
        assert!(app.session.messages().is_empty());

        tokio::time::sleep(Duration::from_millis(GREETING_DELAY_MS + 50)).await;
        tokio::task::yield_now().await;
        app.poll_reply().await;

        assert!(!app.session.pending());
        assert_eq!(app.session.messages().len(), 1);
        assert_eq!(app.session.messages()[0].content, GREETING);
    }

    #[tokio::test]
    async fn quick_reply_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "Here's how to reset it." })),
            )
            .mount(&server)
            .await;

        let (_dir, mut app) = app_with_url(&format!("{}/api/chat", server.uri()));
        // Reach Idle without waiting out the greeting delay.
        app.session.start(&app.store);
        app.session.settle(Ok(GREETING.to_string()), &app.store);

        app.send_quick_reply(0);
        assert!(app.session.pending());
        assert_eq!(app.session.messages()[1].content, "Reset password");

        settle(&mut app).await;
        let last = app.session.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Bot);
        assert_eq!(last.content, "Here's how to reset it.");
    }

    #[tokio::test]
    async fn failed_call_leaves_a_usable_session() {
        let (_dir, mut app) = app_with_url("http://127.0.0.1:1/api/chat");
        app.session.start(&app.store);
        app.session.settle(Ok(GREETING.to_string()), &app.store);

        app.input = "VPN issues".to_string();
        app.submit_input();
        assert!(app.input.is_empty());

        settle(&mut app).await;
        let last = app.session.messages().last().unwrap();
        assert_eq!(last.content, FALLBACK_REPLY);
        assert!(app.session.quick_replies_visible());
    }

    #[tokio::test]
    async fn quick_replies_are_gated_while_pending() {
        let (_dir, mut app) = app_with_url("http://127.0.0.1:1/api/chat");
        app.start_chat(); // greeting outstanding

        app.send_quick_reply(0);
        assert!(app.session.messages().is_empty());

        app.input = "hello".to_string();
        app.submit_input();
        assert!(app.session.messages().is_empty());
        assert_eq!(app.input, "hello"); // rejected input is not lost
    }
}
