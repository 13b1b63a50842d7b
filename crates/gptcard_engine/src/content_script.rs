use std::collections::HashMap;
use std::time::{Duration, Instant};

use card_logging::{card_debug, card_info, card_trace, card_warn, set_batch_seq};
use ego_tree::NodeId;
use gptcard_core::{update, AppState, Effect, LifecycleView, Msg, PrefillState, RequestId};

use crate::config::ContentScriptSettings;
use crate::dom::{DomError, Document};
use crate::engine::EngineHandle;
use crate::storage::LocalStorage;

const PENDING_MARKER_HTML: &str = "<p>Please wait...</p>";
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Signals delivered by the background side of the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The host page finished loading.
    Init,
}

/// Page-side runtime: owns the document, the lifecycle state and the
/// effect runner. Everything here runs on the page thread.
pub struct ContentScript {
    document: Document,
    state: AppState<NodeId>,
    settings: ContentScriptSettings,
    engine: EngineHandle,
    storage: LocalStorage,
    markers: HashMap<RequestId, NodeId>,
    batch_seq: u64,
}

impl ContentScript {
    pub fn new(document: Document, storage: LocalStorage, settings: ContentScriptSettings) -> Self {
        let engine = EngineHandle::new(storage.gpt_config().clone());
        Self::with_engine(document, storage, settings, engine)
    }

    pub fn with_engine(
        document: Document,
        storage: LocalStorage,
        settings: ContentScriptSettings,
        engine: EngineHandle,
    ) -> Self {
        Self {
            document,
            state: AppState::with_settings(settings.core.clone()),
            settings,
            engine,
            storage,
            markers: HashMap::new(),
            batch_seq: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Host-side access, for the page's own edits.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn view(&self) -> LifecycleView<NodeId> {
        self.state.view()
    }

    pub fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Init => self.initialize(),
        }
    }

    fn initialize(&mut self) {
        if self.document.is_observing() {
            card_debug!("Init signal while already observing");
        } else {
            match self.document.query_selector(&self.settings.root_selector) {
                Ok(Some(root)) => {
                    self.document.observe(root);
                    card_info!("Observing {}", self.settings.root_selector);
                }
                Ok(None) => {
                    card_info!(
                        "Got init signal, but {} is not in the page",
                        self.settings.root_selector
                    );
                    return;
                }
                Err(err) => {
                    card_warn!("Cannot observe root: {}", err);
                    return;
                }
            }
        }
        self.dispatch(Msg::Initialized);
    }

    /// Delivers a keydown on `node`. Only nodes carrying a key handler react.
    pub fn key_down(&mut self, node: NodeId, key_code: u32) {
        if !self.document.has_key_listener(node) {
            return;
        }
        let text = match self.document.inner_text(node) {
            Ok(text) => text,
            Err(err) => {
                card_warn!("Keydown on unreadable node: {}", err);
                return;
            }
        };
        self.dispatch(Msg::KeyDown {
            instance: node,
            key_code,
            text,
        });
    }

    /// Re-reads storage and rebuilds the completion client if its settings changed.
    pub fn reload_config(&mut self) {
        match self.storage.reload() {
            Ok(true) => self.engine.reconfigure(self.storage.gpt_config().clone()),
            Ok(false) => {}
            Err(err) => card_warn!("Failed to reload storage: {}", err),
        }
    }

    /// Drains pending mutation records and engine events until both are empty.
    /// Returns the number of messages dispatched.
    pub fn pump(&mut self) -> usize {
        let mut dispatched = 0;
        loop {
            let records = self.document.take_records();
            let had_records = !records.is_empty();
            if had_records {
                self.batch_seq += 1;
                set_batch_seq(self.batch_seq);
                card_trace!("Mutation batch with {} records", records.len());
            }
            for record in records {
                self.dispatch(Msg::Mutation(record));
                dispatched += 1;
            }

            let mut had_events = false;
            while let Some(event) = self.engine.try_recv() {
                had_events = true;
                self.dispatch(event.into());
                dispatched += 1;
            }

            if !had_records && !had_events {
                return dispatched;
            }
        }
    }

    /// Pumps until no request is pending and no prefill is scheduled.
    /// Returns false if `timeout` elapsed first.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            let view = self.state.view();
            if view.pending_requests.is_empty() && view.prefill != PrefillState::Scheduled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if let Some(event) = self.engine.recv_timeout(IDLE_POLL.min(deadline - now)) {
                self.dispatch(event.into());
            }
        }
    }

    fn dispatch(&mut self, msg: Msg<NodeId>) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            if let Err(err) = self.apply(effect) {
                card_warn!("Effect failed: {}", err);
            }
        }
    }

    fn apply(&mut self, effect: Effect<NodeId>) -> Result<(), DomError> {
        match effect {
            Effect::AttachKeyHandler { instance } => {
                self.document.add_key_listener(instance);
            }
            Effect::DetachKeyHandler { instance } => {
                if !self.document.remove_key_listener(instance) {
                    card_debug!("No key handler on {:?} to detach", instance);
                }
            }
            Effect::InsertPendingMarker {
                request_id,
                instance,
            } => {
                let inserted = self.insert_before_trailing(instance, PENDING_MARKER_HTML)?;
                if let Some(marker) = inserted.first() {
                    self.markers.insert(request_id, *marker);
                }
            }
            Effect::RequestCompletion { request_id, query } => {
                self.engine.complete(request_id, query);
            }
            Effect::RemovePendingMarker { request_id } => {
                if let Some(marker) = self.markers.remove(&request_id) {
                    if self.document.is_attached(marker) {
                        self.document.remove(marker)?;
                    }
                }
            }
            Effect::InsertResult { instance, text } => {
                if !self.document.is_attached(instance) {
                    card_warn!("Card {:?} is gone, dropping completion result", instance);
                    return Ok(());
                }
                let block = format!("<blockquote>{text}</blockquote><p></p>");
                self.document.append_html(instance, &block)?;
            }
            Effect::MoveCaretToEnd { instance } => {
                if self.document.is_attached(instance) {
                    self.document.focus(instance)?;
                    self.document.collapse_caret_to_end(instance)?;
                }
            }
            Effect::SchedulePrefill { delay } => {
                self.engine.schedule_prefill(delay);
            }
            Effect::ApplyPrefill { instance } => self.apply_prefill(instance)?,
        }
        Ok(())
    }

    fn apply_prefill(&mut self, instance: Option<NodeId>) -> Result<(), DomError> {
        let target = instance
            .filter(|node| self.document.is_attached(*node))
            .or_else(|| self.document.find_by_class(&self.settings.core.markers.editor));
        let Some(target) = target else {
            card_info!("Prefill due, but no card element found");
            return Ok(());
        };

        let template = match self.storage.take_insert_template() {
            Ok(Some(template)) => template,
            Ok(None) => return Ok(()),
            Err(err) => {
                card_warn!("Failed to take the insert template: {}", err);
                return Ok(());
            }
        };
        card_info!("Inserting template ({} bytes) into {:?}", template.len(), target);
        self.insert_before_trailing(target, &template)?;
        Ok(())
    }

    fn insert_before_trailing(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        match self.document.last_element_child(parent)? {
            Some(trailing) => self.document.insert_html_before(trailing, html),
            None => self.document.append_html(parent, html),
        }
    }
}
