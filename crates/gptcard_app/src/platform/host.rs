use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use gptcard_core::ENTER_KEY_CODE;
use gptcard_engine::{ContentScript, NodeId, Signal};

use super::session::HostStep;

const TOOLBAR_CLASS: &str = "card-toolbar";
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Plays the host page's side of a session: it owns no state of the
/// content script, it only edits the document and forwards keystrokes.
#[derive(Debug, Default)]
pub struct HostPage {
    open_card: Option<NodeId>,
}

impl HostPage {
    pub fn apply(&mut self, script: &mut ContentScript, step: HostStep) -> anyhow::Result<()> {
        match step {
            HostStep::Signal => script.handle_signal(Signal::Init),
            HostStep::OpenCard { html } => self.open(script, &html)?,
            HostStep::Type { text } => {
                let editor = self.current()?;
                let line = format!("<p>{}</p>", escape_text(&text));
                script.document_mut().append_html(editor, &line)?;
            }
            HostStep::Enter => {
                let editor = self.current()?;
                script.key_down(editor, ENTER_KEY_CODE);
                // The editor's own Enter handling runs after the content script's.
                script.document_mut().append_html(editor, "<p></p>")?;
            }
            HostStep::CloseCard => self.close(script)?,
            HostStep::ReloadConfig => script.reload_config(),
            HostStep::Wait { millis } => wait(script, Duration::from_millis(millis)),
        }
        script.pump();
        Ok(())
    }

    fn current(&self) -> anyhow::Result<NodeId> {
        self.open_card.ok_or_else(|| anyhow!("no card is open"))
    }

    fn open(&mut self, script: &mut ContentScript, body: &str) -> anyhow::Result<()> {
        if self.open_card.is_some() {
            self.close(script)?;
        }
        let container = script
            .document()
            .query_selector(".editor-container")?
            .context("host page has no .editor-container")?;
        let card = format!(
            r#"<div class="ProseMirror" contenteditable="true">{body}</div><div class="{TOOLBAR_CLASS}"></div>"#
        );
        let added = script.document_mut().append_html(container, &card)?;
        self.open_card = added.first().copied();
        Ok(())
    }

    fn close(&mut self, script: &mut ContentScript) -> anyhow::Result<()> {
        let editor = self.current()?;
        let doc = script.document_mut();
        if let Some(toolbar) = doc.find_by_class(TOOLBAR_CLASS) {
            doc.remove(toolbar)?;
        }
        doc.remove(editor)?;
        self.open_card = None;
        Ok(())
    }
}

fn wait(script: &mut ContentScript, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        script.pump();
        thread::sleep(WAIT_SLICE);
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
