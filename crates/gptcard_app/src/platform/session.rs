use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One thing the host page or its user does during a replay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum HostStep {
    /// The background script reports the page as loaded.
    Signal,
    /// The page opens a card whose editor contains `html`.
    OpenCard { html: String },
    /// The user types a line at the end of the open card.
    Type { text: String },
    /// The user presses Enter in the open card.
    Enter,
    /// The page closes the open card.
    CloseCard,
    /// The options page saved new settings.
    ReloadConfig,
    /// Time passes; the page keeps processing events.
    Wait { millis: u64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub steps: Vec<HostStep>,
}

pub fn load_session(path: &Path) -> anyhow::Result<Session> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading session script {}", path.display()))?;
    parse_session(&text).with_context(|| format!("parsing session script {}", path.display()))
}

pub fn parse_session(text: &str) -> anyhow::Result<Session> {
    Ok(ron::from_str(text)?)
}
