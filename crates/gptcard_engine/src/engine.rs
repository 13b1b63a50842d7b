use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use card_logging::{card_error, card_info};
use gptcard_core::RequestId;

use crate::completion::{execute_query, CompletionClient, OpenAiCompletionClient};
use crate::config::GptConfig;
use crate::EngineEvent;

enum EngineCommand {
    Complete { request_id: RequestId, query: String },
    SchedulePrefill { delay: Duration },
    Reconfigure(GptConfig),
}

/// Handle to the background runtime that runs completion calls and timers.
///
/// Results come back as [`EngineEvent`]s, to be drained on the page thread.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: GptConfig) -> Self {
        Self::with_client(Arc::new(OpenAiCompletionClient::new(config)))
    }

    /// Uses `client` until the first [`EngineHandle::reconfigure`].
    pub fn with_client(client: Arc<dyn CompletionClient>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    card_error!("Failed to start the engine runtime: {}", err);
                    return;
                }
            };
            let mut client = client;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Reconfigure(config) => {
                        card_info!("Completion client rebuilt from new configuration");
                        client = Arc::new(OpenAiCompletionClient::new(config));
                    }
                    EngineCommand::Complete { request_id, query } => {
                        let client = client.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let text = execute_query(client.as_ref(), &query).await;
                            let _ = event_tx.send(EngineEvent::CompletionSettled { request_id, text });
                        });
                    }
                    EngineCommand::SchedulePrefill { delay } => {
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = event_tx.send(EngineEvent::PrefillDue);
                        });
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn complete(&self, request_id: RequestId, query: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Complete {
            request_id,
            query: query.into(),
        });
    }

    pub fn schedule_prefill(&self, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::SchedulePrefill { delay });
    }

    /// Replaces the completion client; requests already in flight keep the old one.
    pub fn reconfigure(&self, config: GptConfig) {
        let _ = self.cmd_tx.send(EngineCommand::Reconfigure(config));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
