//! gptcard engine: DOM model, IO and effect execution for the content script.
mod completion;
mod config;
mod content_script;
mod dom;
mod engine;
mod storage;
mod text;
mod types;

pub use completion::{execute_query, CompletionClient, OpenAiCompletionClient, INLINE_ERROR_TEXT};
pub use config::{
    ContentScriptSettings, GptConfig, DEFAULT_API_BASE, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMPERATURE,
};
pub use content_script::{ContentScript, Signal};
pub use dom::{Caret, Document, DomError};
pub use engine::EngineHandle;
pub use storage::{LocalStorage, StorageContents, StorageError};
pub use types::{CompletionError, EngineEvent};

/// Node handle used by the document model.
pub use ego_tree::NodeId;
