//! Chat session state and the rules for mutating it.
//!
//! The session owns the transcript and the two flags the rest of the app
//! derives its behavior from: `started` (the user opened a conversation)
//! and `pending` (a reply is outstanding). Everything else in the crate
//! reads the session through its accessors and mutates it only through
//! the operations here, so the `pending` guard is enforced in one place.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::SessionStore;

/// Canned greeting appended after the start-of-chat delay.
pub const GREETING: &str = "Konnichiwa! \u{1F44B} How can I help you with your IT issues today?";

/// Shown in place of a reply when the responder call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting. Please try again later.";

/// One-click suggested utterances, offered whenever the session is idle.
pub const QUICK_REPLIES: [&str; 3] = ["Reset password", "VPN issues", "Software install"];

/// Delay before the greeting lands. UX pacing, not a network call.
pub const GREETING_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// In-memory conversation state for one run of the app.
///
/// `messages` and `started` are mirrored to the store after every
/// mutation; `pending` never persists and is false after a restore.
#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<ChatMessage>,
    started: bool,
    pending: bool,
}

impl Session {
    /// Load the persisted transcript, falling back to a fresh session if
    /// the store is unreadable or holds malformed data.
    pub fn restore(store: &SessionStore) -> Self {
        match store.load() {
            Ok(saved) => Self {
                messages: saved.messages,
                started: saved.started,
                pending: false,
            },
            Err(err) => {
                warn!("failed to restore chat session: {err:#}");
                Self::default()
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Quick replies show whenever the session is started, nothing is in
    /// flight, and there is at least one message to reply to.
    pub fn quick_replies_visible(&self) -> bool {
        self.started && !self.pending && !self.messages.is_empty()
    }

    /// Begin a conversation: clear the transcript and mark a greeting as
    /// outstanding. The caller schedules `settle(Ok(GREETING))` after
    /// [`GREETING_DELAY_MS`].
    pub fn start(&mut self, store: &SessionStore) {
        self.started = true;
        self.messages.clear();
        self.pending = true;
        self.persist(store);
    }

    /// Discard the persisted transcript and begin a new conversation.
    pub fn reset(&mut self, store: &SessionStore) {
        if let Err(err) = store.clear() {
            warn!("failed to clear persisted session: {err:#}");
        }
        self.start(store);
    }

    /// Accept a user utterance for sending. Returns the trimmed text to
    /// dispatch to the responder, or `None` if the text is blank or a
    /// call is already outstanding (in which case nothing changes).
    pub fn begin_send(&mut self, text: &str, store: &SessionStore) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || self.pending {
            return None;
        }
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.to_string(),
        });
        self.pending = true;
        self.persist(store);
        Some(text.to_string())
    }

    /// Integrate the outcome of the outstanding call. A failed call
    /// becomes the fallback apology; either way exactly one bot message
    /// is appended and `pending` is cleared.
    pub fn settle(&mut self, result: anyhow::Result<String>, store: &SessionStore) {
        let content = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!("responder call failed: {err:#}");
                FALLBACK_REPLY.to_string()
            }
        };
        self.messages.push(ChatMessage {
            role: ChatRole::Bot,
            content,
        });
        self.pending = false;
        self.persist(store);
    }

    fn persist(&self, store: &SessionStore) {
        if let Err(err) = store.save(&self.messages, self.started) {
            warn!("failed to persist chat session: {err:#}");
        }
    }
}
