//! Persistence for the chat transcript.
//!
//! Two JSON files under the platform config directory mirror the two
//! persisted session fields: the message list and the started flag.
//! There is no schema versioning; renaming a file is the only way old
//! data gets invalidated across revisions.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::session::ChatMessage;

const MESSAGES_FILE: &str = "chat_messages.json";
const STARTED_FILE: &str = "chat_started.json";

/// The two fields that survive a restart.
#[derive(Debug, Default)]
pub struct SavedSession {
    pub messages: Vec<ChatMessage>,
    pub started: bool,
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at the user's config directory.
    pub fn open() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("could not determine config directory"))?
            .join("helpdesk-chat");
        Ok(Self::at(dir))
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read both fields. Missing files yield defaults; unreadable or
    /// malformed files are an error the caller decides how to absorb.
    pub fn load(&self) -> Result<SavedSession> {
        let mut saved = SavedSession::default();

        let messages_path = self.dir.join(MESSAGES_FILE);
        if messages_path.exists() {
            let raw = fs::read_to_string(&messages_path)?;
            saved.messages = serde_json::from_str(&raw)?;
        }

        let started_path = self.dir.join(STARTED_FILE);
        if started_path.exists() {
            let raw = fs::read_to_string(&started_path)?;
            saved.started = serde_json::from_str(&raw)?;
        }

        Ok(saved)
    }

    /// Write both fields, creating the directory on first use.
    pub fn save(&self, messages: &[ChatMessage], started: bool) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.dir.join(MESSAGES_FILE),
            serde_json::to_string(messages)?,
        )?;
        fs::write(
            self.dir.join(STARTED_FILE),
            serde_json::to_string(&started)?,
        )?;
        Ok(())
    }

    /// Remove both files. Files that never existed are not an error.
    pub fn clear(&self) -> Result<()> {
        for name in [MESSAGES_FILE, STARTED_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
